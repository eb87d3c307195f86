//! Integer RGB to YCbCr conversion.
//!
//! Uses the studio swing BT.601 matrix with every coefficient rounded to a whole number of
//! 1/256ths and built out of shifts:
//!
//! ```text
//! Y  = ( 66 R + 129 G +  25 B) >> 8 +  16
//! Cb = (-38 R -  74 G + 112 B) >> 8 + 128
//! Cr = (112 R -  94 G -  18 B) >> 8 + 128
//! ```
//!
//! Output pixels are always ordered (Y, Cb, Cr).

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::image::PixelGrid;

/// Luma, 16 to 235 for 8 bit input.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let scaled = (r << 6) + (r << 1) + (g << 7) + g + (b << 4) + (b << 3) + b;
    clamp((scaled >> 8) + 16)
}

/// Blue difference chroma, 16 to 240 for 8 bit input.
pub fn chroma_blue(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let scaled = -(r << 5) - (r << 2) - (r << 1) - (g << 6) - (g << 3) - (g << 1)
        + (b << 6)
        + (b << 5)
        + (b << 4);
    clamp((scaled >> 8) + 128)
}

/// Red difference chroma, 16 to 240 for 8 bit input.
pub fn chroma_red(r: u8, g: u8, b: u8) -> u8 {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let scaled = (r << 6) + (r << 5) + (r << 4)
        - (g << 6)
        - (g << 4)
        - (g << 3)
        - (g << 2)
        - (g << 1)
        - (b << 4)
        - (b << 1);
    clamp((scaled >> 8) + 128)
}

fn clamp(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// Converts one (R, G, B) pixel.
pub fn rgb_to_ycbcr_pixel([r, g, b]: [u8; 3]) -> [u8; 3] {
    [luma(r, g, b), chroma_blue(r, g, b), chroma_red(r, g, b)]
}

/// Converts a grid of (R, G, B) pixels to a grid of the same shape holding (Y, Cb, Cr).
pub fn rgb_to_ycbcr(grid: &PixelGrid<[u8; 3]>) -> PixelGrid<[u8; 3]> {
    #[cfg(feature = "parallel")]
    let data = grid
        .data
        .par_iter()
        .map(|pixel| rgb_to_ycbcr_pixel(*pixel))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let data = grid
        .data
        .iter()
        .map(|pixel| rgb_to_ycbcr_pixel(*pixel))
        .collect();

    PixelGrid {
        rows: grid.rows,
        columns: grid.columns,
        data,
    }
}

#[test]
fn black_sits_on_the_offsets() {
    assert_eq!(rgb_to_ycbcr_pixel([0, 0, 0]), [16, 128, 128]);
}

#[test]
fn white_is_nominal_peak() {
    assert_eq!(rgb_to_ycbcr_pixel([255, 255, 255]), [235, 128, 128]);
}

#[test]
fn primaries() {
    // Reference values from the floating point matrix, within one step of truncation.
    let close = |actual: [u8; 3], expected: [i32; 3]| {
        actual
            .iter()
            .zip(expected)
            .all(|(a, e)| (*a as i32 - e).abs() <= 1)
    };
    assert!(close(rgb_to_ycbcr_pixel([255, 0, 0]), [81, 90, 240]));
    assert!(close(rgb_to_ycbcr_pixel([0, 255, 0]), [145, 54, 34]));
    assert!(close(rgb_to_ycbcr_pixel([0, 0, 255]), [41, 240, 110]));
}

#[test]
fn grid_keeps_shape_and_order() {
    let grid = PixelGrid::new(
        2,
        2,
        vec![[0, 0, 0], [255, 255, 255], [255, 0, 0], [0, 0, 255]],
    )
    .unwrap();
    let converted = rgb_to_ycbcr(&grid);
    assert_eq!((converted.rows, converted.columns), (2, 2));
    assert_eq!(converted.data[0], [16, 128, 128]);
    assert_eq!(converted.data[1], [235, 128, 128]);
    assert_eq!(converted.data[2], rgb_to_ycbcr_pixel([255, 0, 0]));
    assert_eq!(converted.data[3], rgb_to_ycbcr_pixel([0, 0, 255]));
}
