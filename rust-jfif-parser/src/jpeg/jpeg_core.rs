use log::{debug, info, warn};

use crate::{
    error::{Error, Result},
    jpeg::document::{Diagnostic, Document, ScanPayload, Termination},
    jpeg::jpeg_reader::{JFIFReader, JPEGMarker},
    jpeg::marker_table::lookup,
};

pub struct JFIFParser<'data> {
    reader: JFIFReader<'data>,
}

impl<'data> JFIFParser<'data> {
    pub fn new(data: &'data [u8]) -> Self {
        Self {
            reader: JFIFReader::new(data),
        }
    }

    /// Walks every marker in the stream and collects the segments into a [`Document`].
    ///
    /// Stops at the end-of-image marker, at the first marker without a rule, or when the input
    /// runs out between segments. Errors inside a segment or inside the scan data abort parsing.
    pub fn parse(&mut self) -> Result<Document> {
        let mut document = Document::default();

        if let Some(diagnostic) = self.check_signature() {
            warn!("Not a JPEG/JFIF file: {:?}", diagnostic);
            document.diagnostics.push(diagnostic);
        }

        document.termination = loop {
            if self.reader.remaining() < 2 {
                debug!("Input exhausted at offset {}", self.reader.position());
                break Termination::Exhausted;
            }

            let offset = self.reader.position();
            let code = self
                .reader
                .read_next_word()
                .map_err(|_| Error::InternalError("Marker read past checked length"))?;

            let rule = match lookup(code) {
                Some(rule) => rule,
                None => {
                    info!("Stopping at unrecognized marker {:#06x} (offset {})", code, offset);
                    break Termination::UnrecognizedMarker { code, offset };
                }
            };

            if rule.terminates {
                break Termination::EndOfImage;
            }

            if let Some(kind) = rule.kind {
                document.push(kind.read(&mut self.reader)?);
            }

            if rule.scan_follows {
                document.scan_payload = self.read_scan_payload()?;
                // The payload ends on the end-of-image word.
                break Termination::EndOfImage;
            }
        };

        Ok(document)
    }

    /// Reads the SOI marker and peeks at the APP0 marker after it, which the main loop parses.
    fn check_signature(&mut self) -> Option<Diagnostic> {
        let soi = self.reader.read_next_word().ok();
        let app0 = self.reader.peek_next_word().ok();

        if soi == Some(JPEGMarker::SOI.word()) && app0 == Some(JPEGMarker::APP0.word()) {
            None
        } else {
            Some(Diagnostic::FormatMismatch { found: [soi, app0] })
        }
    }

    /// Collects words until the end-of-image word, which is consumed but not kept.
    ///
    /// Every word boundary is a candidate marker. Stuffed `0xFF00` bytes are not interpreted.
    fn read_scan_payload(&mut self) -> Result<ScanPayload> {
        let start = self.reader.position();
        let mut words = vec![];

        loop {
            let word = self
                .reader
                .read_next_word()
                .map_err(|_| Error::UnterminatedScan { offset: start })?;

            if word == JPEGMarker::EOI.word() {
                debug!("Scan data: {} words from offset {}", words.len(), start);
                return Ok(ScanPayload { words });
            }
            words.push(word);
        }
    }
}

#[rustfmt::skip]
#[allow(dead_code)]
static SCAN: [u8; 24] = [
    0xFF, 0xD8, // Start of image
    0xFF, 0xDA, // Start of scan
    0, 8,           // Length
    1,              // Component count
    1, 0x00,        // Selector
    0, 63, 0,       // Skipped
    0x12, 0x34,
    0xFF, 0x00,
    0xAB, 0xFF,
    0xD9, 0x00,     // Misaligned, not a marker
    0xFF, 0xD9, // End of image
    0xFF, 0xFE, // Ignored
];

#[test]
fn scan_payload_stops_at_aligned_eoi() {
    let mut parser = JFIFParser::new(&SCAN);
    let document = parser.parse().unwrap();
    assert_eq!(
        document.scan_payload.words,
        vec![0x1234, 0xFF00, 0xABFF, 0xD900]
    );
    assert_eq!(document.scan_headers.len(), 1);
    assert_eq!(document.scan_headers[0].component_selectors, vec![1, 0x00]);
    assert_eq!(document.termination, Termination::EndOfImage);
    assert_eq!(
        document.diagnostics,
        vec![Diagnostic::FormatMismatch {
            found: [Some(0xFFD8), Some(0xFFDA)]
        }]
    );
}

#[test]
fn unterminated_scan_is_an_error() {
    let mut parser = JFIFParser::new(&SCAN[..20]);
    match parser.parse() {
        Err(Error::UnterminatedScan { offset }) => assert_eq!(offset, 12),
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn empty_input_is_exhausted() {
    let document = JFIFParser::new(&[]).parse().unwrap();
    assert_eq!(document.termination, Termination::Exhausted);
    assert_eq!(
        document.diagnostics,
        vec![Diagnostic::FormatMismatch {
            found: [None, None]
        }]
    );
}
