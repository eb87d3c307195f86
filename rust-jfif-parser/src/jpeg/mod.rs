mod document;
mod header;
mod jpeg_core;
mod jpeg_reader;
mod layout;
mod marker_table;

pub use document::{Diagnostic, Document, ScanPayload, Termination};
pub use header::{
    ApplicationSegment, FrameHeaderSegment, HuffmanTableSegment, QuantizationSegment,
    ScanHeaderSegment, Segment, SegmentKind,
};
pub use jpeg_reader::JPEGMarker;
pub use marker_table::{lookup, MarkerRule, MARKER_RULES};

use crate::{error::Result, image::ImageDecoder};

/// Splits a JFIF byte stream into its marker segments.
pub struct JFIFDecoder<'data> {
    image_data: &'data [u8],
}

impl<'data> ImageDecoder<'data> for JFIFDecoder<'data> {
    type Output = Document;

    /// Initializes the JFIF decoder from a byte slice
    fn new(image_data: &'data [u8]) -> Self {
        Self { image_data }
    }

    fn decode(&self) -> Result<Document> {
        jpeg_core::JFIFParser::new(self.image_data).parse()
    }
}
