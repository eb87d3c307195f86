use crate::jpeg::{header::SegmentKind, jpeg_reader::JPEGMarker};

/// What to do after reading a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerRule {
    /// The marker this rule applies to
    pub marker: JPEGMarker,
    /// The segment that follows the marker, if any.
    pub kind: Option<SegmentKind>,
    /// Parsing stops at this marker.
    pub terminates: bool,
    /// Entropy coded scan data follows the segment.
    pub scan_follows: bool,
}

impl MarkerRule {
    const fn segment(marker: JPEGMarker, kind: SegmentKind) -> Self {
        Self {
            marker,
            kind: Some(kind),
            terminates: false,
            scan_follows: false,
        }
    }
}

/// Sorted by marker code. Lookups binary search this table.
pub static MARKER_RULES: [MarkerRule; 6] = [
    MarkerRule::segment(JPEGMarker::SOF0, SegmentKind::FrameHeader),
    MarkerRule::segment(JPEGMarker::DHT, SegmentKind::HuffmanTable),
    MarkerRule {
        marker: JPEGMarker::EOI,
        kind: None,
        terminates: true,
        scan_follows: false,
    },
    MarkerRule {
        marker: JPEGMarker::SOS,
        kind: Some(SegmentKind::ScanHeader),
        terminates: false,
        scan_follows: true,
    },
    MarkerRule::segment(JPEGMarker::DQT, SegmentKind::Quantization),
    MarkerRule::segment(JPEGMarker::APP0, SegmentKind::Application),
];

/// Finds the rule for a marker code. `None` means the marker isn't supported.
pub fn lookup(code: u16) -> Option<&'static MarkerRule> {
    MARKER_RULES
        .binary_search_by_key(&code, |rule| rule.marker.word())
        .ok()
        .map(|index| &MARKER_RULES[index])
}

#[test]
fn rules_are_sorted_and_unique() {
    assert!(MARKER_RULES
        .windows(2)
        .all(|pair| pair[0].marker.word() < pair[1].marker.word()));
}

#[test]
fn lookup_finds_every_rule() {
    for rule in MARKER_RULES.iter() {
        assert_eq!(lookup(rule.marker.word()), Some(rule));
    }
    assert_eq!(
        lookup(0xFFDA).and_then(|rule| rule.kind),
        Some(SegmentKind::ScanHeader)
    );
    assert!(lookup(0xFFD9).unwrap().terminates);
}

#[test]
fn lookup_misses_unknown_codes() {
    for code in [0x0000, 0xFFC2, 0xFFD8, 0xFFDD, 0xFFE1, 0xFFFE, 0xFFFF] {
        assert_eq!(lookup(code), None);
    }
}

#[test]
fn every_segment_kind_has_a_rule() {
    for kind in SegmentKind::ALL {
        assert_eq!(
            MARKER_RULES
                .iter()
                .filter(|rule| rule.kind == Some(kind))
                .count(),
            1
        );
    }
}
