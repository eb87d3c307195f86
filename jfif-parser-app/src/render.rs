use std::fmt::{LowerHex, Write};

use rust_jfif_parser::jpeg::{
    ApplicationSegment, Diagnostic, Document, FrameHeaderSegment, HuffmanTableSegment,
    QuantizationSegment, ScanHeaderSegment, SegmentKind, Termination,
};

/// Renders each entry as `0x..`, separated by spaces.
pub fn hex_list<T: LowerHex>(values: &[T]) -> String {
    let mut rendered = String::with_capacity(values.len() * 5);
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            rendered.push(' ');
        }
        let _ = write!(rendered, "{:#x}", value);
    }
    rendered
}

fn identifier(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| {
            if byte.is_ascii_graphic() {
                *byte as char
            } else {
                '.'
            }
        })
        .collect()
}

fn application(segment: &ApplicationSegment) -> String {
    format!(
        "  payloadLength: {}\n  type: {}\n  version: {}.{:02}\n  pixelUnitDensity: {}\n  \
         density: {}x{}\n  thumbnail: {}x{}\n",
        segment.payload_length,
        identifier(&segment.identifier),
        segment.main_version,
        segment.sub_version,
        segment.density_units,
        segment.horizontal_density,
        segment.vertical_density,
        segment.thumbnail_width,
        segment.thumbnail_height,
    )
}

fn quantization(segment: &QuantizationSegment) -> String {
    format!(
        "  segmentLength: {}\n  precision: {}\n  tableId: {}\n  tableData: {}\n",
        segment.segment_length,
        segment.precision(),
        segment.table_id(),
        hex_list(&segment.table),
    )
}

fn frame_header(segment: &FrameHeaderSegment) -> String {
    format!(
        "  segmentLength: {}\n  precision: {}\n  size: {}x{}\n  numComponents: {}\n  \
         componentData: {}\n",
        segment.segment_length,
        segment.precision,
        segment.image_width,
        segment.image_height,
        segment.component_count,
        hex_list(&segment.component_data),
    )
}

fn huffman_table(segment: &HuffmanTableSegment) -> String {
    format!(
        "  segmentLength: {}\n  class: {}\n  destination: {}\n  symbolCounts: {}\n  \
         symbols: {}\n",
        segment.segment_length,
        if segment.table_class() == 0 { "DC" } else { "AC" },
        segment.destination_id(),
        hex_list(&segment.symbol_counts),
        hex_list(&segment.symbols),
    )
}

fn scan_header(segment: &ScanHeaderSegment) -> String {
    format!(
        "  segmentLength: {}\n  componentCount: {}\n  componentSelectors: {}\n",
        segment.segment_length,
        segment.component_count,
        hex_list(&segment.component_selectors),
    )
}

fn section<T>(out: &mut String, kind: SegmentKind, segments: &[T], render: fn(&T) -> String) {
    for (index, segment) in segments.iter().enumerate() {
        let _ = writeln!(out, "{} #{}", kind, index);
        out.push_str(&render(segment));
    }
}

/// Human readable dump of a parsed document, grouped by segment kind.
pub fn document(document: &Document, with_payload: bool) -> String {
    let mut out = String::new();

    for diagnostic in &document.diagnostics {
        match diagnostic {
            Diagnostic::FormatMismatch { .. } => {
                out.push_str("ERROR: Not a jpeg:jfif file\n");
            }
        }
    }

    section(&mut out, SegmentKind::Application, &document.applications, application);
    section(&mut out, SegmentKind::Quantization, &document.quantization_tables, quantization);
    section(&mut out, SegmentKind::FrameHeader, &document.frame_headers, frame_header);
    section(&mut out, SegmentKind::HuffmanTable, &document.huffman_tables, huffman_table);
    section(&mut out, SegmentKind::ScanHeader, &document.scan_headers, scan_header);

    let _ = writeln!(out, "imageData: {} words", document.scan_payload.len());
    if with_payload {
        let _ = writeln!(out, "  {}", hex_list(&document.scan_payload.words));
    }

    let _ = match document.termination {
        Termination::EndOfImage => writeln!(out, "end of image"),
        Termination::UnrecognizedMarker { code, offset } => {
            writeln!(out, "stopped at unsupported marker {:#06x} (offset {})", code, offset)
        }
        Termination::Exhausted => writeln!(out, "input ended before an end of image marker"),
    };

    out
}

#[test]
fn hex_entries() {
    assert_eq!(hex_list(&[0x01u8, 0xAB, 0x00]), "0x1 0xab 0x0");
    assert_eq!(hex_list(&[0xFF00u16]), "0xff00");
    assert_eq!(hex_list::<u8>(&[]), "");
}

#[test]
fn document_dump() {
    let mut parsed = Document {
        termination: Termination::UnrecognizedMarker {
            code: 0xFFFE,
            offset: 20,
        },
        ..Default::default()
    };
    parsed.huffman_tables.push(HuffmanTableSegment {
        segment_length: 20,
        table_info: 0x11,
        symbol_counts: vec![1],
        symbols: vec![0x7F],
    });
    parsed.scan_payload.words = vec![0x1234];

    let rendered = document(&parsed, true);
    assert!(rendered.contains("DHT #0\n"));
    assert!(rendered.contains("class: AC\n"));
    assert!(rendered.contains("symbols: 0x7f\n"));
    assert!(rendered.contains("imageData: 1 words\n  0x1234\n"));
    assert!(rendered.contains("unsupported marker 0xfffe (offset 20)"));
    assert!(!rendered.contains("Not a jpeg"));
}
