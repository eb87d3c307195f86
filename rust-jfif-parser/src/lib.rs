#![warn(missing_docs)]
//! Splits JFIF (JPEG) files into their marker segments, and converts RGB pixels to YCbCr.
//!
//! Only the segment structure is read. The entropy coded scan data is kept as opaque words.
mod error;
/// Fixed point RGB to YCbCr conversion
pub mod color;
/// Defines types for decoding and encoding images
pub mod image;
/// Marker segment parser for JFIF images
pub mod jpeg;
/// Decoder and encoder for PPM images
pub mod ppm;

pub use error::{Error, Result};
