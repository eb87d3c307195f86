use rust_jfif_parser::{
    image::ImageDecoder,
    jpeg::{Diagnostic, Document, JFIFDecoder, SegmentKind, Termination},
    Error,
};

#[rustfmt::skip]
const APP0: [u8; 18] = [
    0xFF, 0xE0,
    0, 16,
    b'J', b'F', b'I', b'F', 0,
    1, 1,
    0,
    0, 1, 0, 1,
    0, 0,
];

fn dqt(table_id: u8) -> Vec<u8> {
    let mut segment = vec![0xFF, 0xDB, 0, 67, table_id];
    segment.extend((1..=64).map(|value| value as u8));
    segment
}

fn sof() -> Vec<u8> {
    #[rustfmt::skip]
    let segment = vec![
        0xFF, 0xC0,
        0, 17, 8,
        0, 16, 0, 32,
        3,
        1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1,
    ];
    segment
}

fn dht(table_info: u8, symbols: &[u8]) -> Vec<u8> {
    let length = (19 + symbols.len()) as u16;
    let mut segment = vec![0xFF, 0xC4];
    segment.extend(length.to_be_bytes());
    segment.push(table_info);
    let mut counts = [0u8; 16];
    counts[0] = symbols.len() as u8;
    segment.extend(counts);
    segment.extend_from_slice(symbols);
    segment
}

fn sos(payload: &[u8]) -> Vec<u8> {
    #[rustfmt::skip]
    let mut segment = vec![
        0xFF, 0xDA,
        0, 12, 3,
        1, 0x00, 2, 0x11, 3, 0x11,
        0, 63, 0,
    ];
    segment.extend_from_slice(payload);
    segment.extend([0xFF, 0xD9]);
    segment
}

fn stream(parts: &[&[u8]]) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8];
    for part in parts {
        data.extend_from_slice(part);
    }
    data
}

fn decode(data: &[u8]) -> rust_jfif_parser::Result<Document> {
    JFIFDecoder::new(data).decode()
}

#[test]
fn application_and_quantization_only() {
    let data = stream(&[&APP0, &dqt(0), &[0xFF, 0xD9]]);
    let document = decode(&data).unwrap();

    assert!(document.diagnostics.is_empty());
    assert_eq!(document.count(SegmentKind::Application), 1);
    assert_eq!(document.count(SegmentKind::Quantization), 1);
    assert_eq!(document.count(SegmentKind::FrameHeader), 0);
    assert!(document.scan_payload.is_empty());
    assert_eq!(document.termination, Termination::EndOfImage);

    let app = &document.applications[0];
    assert_eq!(app.identifier, b"JFIF");
    assert_eq!((app.main_version, app.sub_version), (1, 1));
    assert_eq!((app.horizontal_density, app.vertical_density), (1, 1));
    assert_eq!(document.quantization_tables[0].table[0], 0x0102);
}

#[test]
fn full_baseline_stream() {
    let data = stream(&[
        &APP0,
        &dqt(0),
        &dqt(1),
        &sof(),
        &dht(0x00, &[0x05]),
        &dht(0x10, &[0x01, 0x02, 0x03]),
        &sos(&[0x12, 0x34, 0xFF, 0x00, 0x56, 0x78]),
    ]);
    let document = decode(&data).unwrap();

    assert!(document.is_jfif());
    assert_eq!(document.count(SegmentKind::Quantization), 2);
    assert_eq!(document.quantization_tables[1].table_id(), 1);

    let frame = &document.frame_headers[0];
    assert_eq!((frame.image_width, frame.image_height), (32, 16));
    assert_eq!(frame.component_count, 3);

    assert_eq!(document.huffman_tables.len(), 2);
    assert_eq!(document.huffman_tables[0].symbols, vec![0x05]);
    assert_eq!(document.huffman_tables[1].symbols, vec![0x01, 0x02, 0x03]);
    assert_eq!(document.huffman_tables[1].table_class(), 1);

    assert_eq!(document.scan_headers[0].component_selectors.len(), 6);
    assert_eq!(document.scan_payload.words, vec![0x1234, 0xFF00, 0x5678]);
    assert_eq!(document.termination, Termination::EndOfImage);
}

#[test]
fn quantization_consumes_fixed_size() {
    // The declared length is wrong; the following marker is still found 67 bytes on.
    let mut table = dqt(0);
    table[2] = 0x00;
    table[3] = 0x10;
    let data = stream(&[&APP0, &table, &[0xFF, 0xD9]]);
    let document = decode(&data).unwrap();
    assert_eq!(document.quantization_tables[0].segment_length, 0x10);
    assert_eq!(document.termination, Termination::EndOfImage);
}

#[test]
fn unrecognized_marker_ends_parsing() {
    let data = stream(&[&APP0, &[0xFF, 0xFE, 0x00, 0x04], &dqt(0)]);
    let document = decode(&data).unwrap();
    assert_eq!(document.count(SegmentKind::Application), 1);
    assert_eq!(document.count(SegmentKind::Quantization), 0);
    assert_eq!(
        document.termination,
        Termination::UnrecognizedMarker {
            code: 0xFFFE,
            offset: 20
        }
    );
}

#[test]
fn missing_signature_is_reported_but_parsed() {
    let mut data = vec![0x00, 0x00];
    data.extend_from_slice(&APP0);
    data.extend([0xFF, 0xD9]);
    let document = decode(&data).unwrap();
    assert_eq!(
        document.diagnostics,
        vec![Diagnostic::FormatMismatch {
            found: [Some(0x0000), Some(0xFFE0)]
        }]
    );
    assert_eq!(document.count(SegmentKind::Application), 1);
}

#[test]
fn stream_without_eoi_is_exhausted() {
    let data = stream(&[&APP0]);
    let document = decode(&data).unwrap();
    assert_eq!(document.termination, Termination::Exhausted);
    assert_eq!(document.count(SegmentKind::Application), 1);
}

#[test]
fn truncated_segment_reports_kind_and_offset() {
    let mut data = stream(&[&APP0, &sof()]);
    data.truncate(data.len() - 4);
    match decode(&data) {
        Err(Error::TruncatedSegment { kind, offset }) => {
            assert_eq!(kind, SegmentKind::FrameHeader);
            assert_eq!(offset, 30);
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn short_huffman_length_is_malformed() {
    let mut table = dht(0x00, &[]);
    table[3] = 18;
    let data = stream(&[&APP0, &table, &[0xFF, 0xD9]]);
    assert!(matches!(
        decode(&data),
        Err(Error::MalformedSegment {
            kind: SegmentKind::HuffmanTable,
            ..
        })
    ));
}

#[test]
fn scan_without_eoi_is_unterminated() {
    let mut data = stream(&[&APP0, &sos(&[0x01, 0x02])]);
    data.truncate(data.len() - 2);
    assert!(matches!(
        decode(&data),
        Err(Error::UnterminatedScan { offset: 34 })
    ));
}
