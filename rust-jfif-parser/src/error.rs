use thiserror::Error;

use crate::jpeg::SegmentKind;

/// Result type used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Describes an error encountered while reading an image.
#[derive(Error, Debug)]
pub enum Error {
    /// A segment's fields ran past the end of the input.
    #[error("{kind} segment truncated at byte offset {offset}")]
    TruncatedSegment {
        /// The segment being read
        kind: SegmentKind,
        /// Where the unsatisfied read started
        offset: u64,
    },
    /// A segment's fields describe an impossible layout.
    #[error("{kind} segment malformed at byte offset {offset}: {reason}")]
    MalformedSegment {
        /// The segment being read
        kind: SegmentKind,
        /// Where the offending field would start
        offset: u64,
        /// What is wrong with the layout
        reason: &'static str,
    },
    /// The scan data starting at `offset` never reached an end-of-image marker.
    #[error("scan data starting at byte offset {offset} has no end-of-image marker")]
    UnterminatedScan {
        /// First byte of the scan data
        offset: u64,
    },
    /// The image is malformed in some way. The string describes how.
    #[error("malformed image: {0}")]
    Malformed(&'static str),
    /// A feature is not supported by the decoder
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),
    /// The decoder had a problem
    #[error("internal error: {0}")]
    InternalError(&'static str),
    /// There was an error reading or writing the image
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
