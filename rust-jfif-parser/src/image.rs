use std::path::Path;

use crate::error::{Error, Result};

/// A two dimensional grid of pixels stored row by row.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PixelGrid<T> {
    /// Number of rows (the image height)
    pub rows: usize,
    /// Number of columns (the image width)
    pub columns: usize,
    /// The pixels, `rows * columns` of them
    pub data: Vec<T>,
}

impl<T> PixelGrid<T> {
    /// Wraps pixel data in a grid, checking it matches the shape.
    pub fn new(rows: usize, columns: usize, data: Vec<T>) -> Result<Self> {
        if rows.checked_mul(columns) != Some(data.len()) {
            return Err(Error::Malformed("Pixel data does not match the grid size"));
        }
        Ok(Self {
            rows,
            columns,
            data,
        })
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&T> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        self.data.get(row * self.columns + column)
    }

    /// Iterates over the grid one row at a time.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks() panics on a zero chunk size
        self.data.chunks(self.columns.max(1))
    }
}

/// Used to decode an image. This trait can be implemented for any format I want to decode.
pub trait ImageDecoder<'data> {
    /// What decoding produces
    type Output;
    /// Supplies the decoder with the image data
    fn new(image_data: &'data [u8]) -> Self;
    /// Decodes the image
    fn decode(&self) -> Result<Self::Output>;
}

/// Used to encode an image. This trait can be implemented for any format I want to encode.
pub trait ImageEncoder<'grid> {
    /// Supplies the encoder with a pixel grid to encode.
    fn new(grid: &'grid PixelGrid<[u8; 3]>) -> Self;
    /// Encodes the grid into a byte buffer.
    fn encode(&self) -> Vec<u8>;
    /// Encodes the grid and saves the result to a file at the given path.
    fn encode_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.encode())
    }
}

#[test]
fn grid_shape_is_checked() {
    assert!(PixelGrid::new(2, 3, vec![0u8; 6]).is_ok());
    assert!(PixelGrid::new(2, 3, vec![0u8; 5]).is_err());
    assert!(PixelGrid::new(usize::MAX, 2, vec![0u8; 2]).is_err());
}

#[test]
fn grid_indexing() {
    let grid = PixelGrid::new(2, 2, vec![1, 2, 3, 4]).unwrap();
    assert_eq!(grid.get(1, 0), Some(&3));
    assert_eq!(grid.get(0, 2), None);
    assert_eq!(grid.iter_rows().collect::<Vec<_>>(), vec![&[1, 2][..], &[3, 4][..]]);
}
