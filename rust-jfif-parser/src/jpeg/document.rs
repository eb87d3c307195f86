use crate::jpeg::header::*;

/// The entropy coded words that follow a scan header, up to but excluding the end-of-image
/// marker. Never decoded.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanPayload {
    /// Big endian words in stream order
    pub words: Vec<u16>,
}

impl ScanPayload {
    /// Number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True when no scan data was collected.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The payload as it appeared in the stream.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.words.iter().flat_map(|word| word.to_be_bytes()).collect()
    }
}

/// Problems that were reported but did not stop parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// The stream did not open with SOI followed by APP0. Holds the two words found instead.
    FormatMismatch {
        /// The first two words, `None` where the input ended
        found: [Option<u16>; 2],
    },
}

/// Why parsing stopped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// An end-of-image marker was reached.
    EndOfImage,
    /// A marker with no rule was found at `offset`. Everything from there on is ignored.
    UnrecognizedMarker {
        /// The marker code
        code: u16,
        /// Where the marker starts
        offset: u64,
    },
    /// The input ran out where a marker was expected.
    #[default]
    Exhausted,
}

/// Every segment of a JFIF stream, grouped by kind in stream order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Document {
    /// APP0 segments
    pub applications: Vec<ApplicationSegment>,
    /// DQT segments
    pub quantization_tables: Vec<QuantizationSegment>,
    /// SOF0 segments
    pub frame_headers: Vec<FrameHeaderSegment>,
    /// DHT segments
    pub huffman_tables: Vec<HuffmanTableSegment>,
    /// SOS segments
    pub scan_headers: Vec<ScanHeaderSegment>,
    /// Scan data following the last scan header
    pub scan_payload: ScanPayload,
    /// Problems found along the way
    pub diagnostics: Vec<Diagnostic>,
    /// Why parsing stopped
    pub termination: Termination,
}

impl Document {
    /// Appends a segment to the list for its kind.
    pub fn push(&mut self, segment: Segment) {
        match segment {
            Segment::Application(segment) => self.applications.push(segment),
            Segment::Quantization(segment) => self.quantization_tables.push(segment),
            Segment::FrameHeader(segment) => self.frame_headers.push(segment),
            Segment::HuffmanTable(segment) => self.huffman_tables.push(segment),
            Segment::ScanHeader(segment) => self.scan_headers.push(segment),
        }
    }

    /// Number of segments of the given kind.
    pub fn count(&self, kind: SegmentKind) -> usize {
        match kind {
            SegmentKind::Application => self.applications.len(),
            SegmentKind::Quantization => self.quantization_tables.len(),
            SegmentKind::FrameHeader => self.frame_headers.len(),
            SegmentKind::HuffmanTable => self.huffman_tables.len(),
            SegmentKind::ScanHeader => self.scan_headers.len(),
        }
    }

    /// False if the stream did not start with the JFIF signature.
    pub fn is_jfif(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|diagnostic| matches!(diagnostic, Diagnostic::FormatMismatch { .. }))
    }
}

#[test]
fn payload_bytes_keep_stream_order() {
    let payload = ScanPayload {
        words: vec![0x1234, 0xFF00],
    };
    assert_eq!(payload.to_bytes(), vec![0x12, 0x34, 0xFF, 0x00]);
    assert_eq!(payload.len(), 2);
}

#[test]
fn segments_group_by_kind() {
    let mut document = Document::default();
    document.push(Segment::HuffmanTable(HuffmanTableSegment {
        table_info: 0x00,
        ..Default::default()
    }));
    document.push(Segment::HuffmanTable(HuffmanTableSegment {
        table_info: 0x10,
        ..Default::default()
    }));
    document.push(Segment::Quantization(Default::default()));

    assert_eq!(document.count(SegmentKind::HuffmanTable), 2);
    assert_eq!(document.count(SegmentKind::Quantization), 1);
    assert_eq!(document.count(SegmentKind::ScanHeader), 0);
    assert_eq!(document.huffman_tables[1].table_class(), 1);
    assert!(document.is_jfif());
}
