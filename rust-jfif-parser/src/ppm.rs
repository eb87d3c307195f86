use std::io::Write;

use log::debug;

use crate::{
    error::{Error, Result},
    image::{ImageDecoder, ImageEncoder, PixelGrid},
};

/// PPM decoder. Reads binary (P6) and ASCII (P3) files with a maxval of at most 255.
pub struct PPMDecoder<'data> {
    data: &'data [u8],
}

/// Splits a PPM file into whitespace separated tokens, skipping `#` comments.
struct Tokens<'data> {
    data: &'data [u8],
    position: usize,
}

impl<'data> Tokens<'data> {
    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&byte) = self.data.get(self.position) {
            if byte == b'#' {
                while let Some(&byte) = self.data.get(self.position) {
                    self.position += 1;
                    if byte == b'\n' || byte == b'\r' {
                        break;
                    }
                }
            } else if byte.is_ascii_whitespace() {
                self.position += 1;
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Option<&'data [u8]> {
        self.skip_whitespace_and_comments();
        let start = self.position;
        while let Some(byte) = self.data.get(self.position) {
            if byte.is_ascii_whitespace() || *byte == b'#' {
                break;
            }
            self.position += 1;
        }
        if start == self.position {
            None
        } else {
            Some(&self.data[start..self.position])
        }
    }

    fn next_number(&mut self) -> Result<usize> {
        let token = self
            .next_token()
            .ok_or(Error::Malformed("PPM data ended early"))?;
        std::str::from_utf8(token)
            .ok()
            .and_then(|text| text.parse().ok())
            .ok_or(Error::Malformed("PPM value is not a number"))
    }
}

impl<'data> ImageDecoder<'data> for PPMDecoder<'data> {
    type Output = PixelGrid<[u8; 3]>;

    fn new(image_data: &'data [u8]) -> Self {
        Self { data: image_data }
    }

    fn decode(&self) -> Result<PixelGrid<[u8; 3]>> {
        let mut tokens = Tokens {
            data: self.data,
            position: 0,
        };

        let binary = match tokens.next_token() {
            Some(b"P6") => true,
            Some(b"P3") => false,
            _ => return Err(Error::UnsupportedFeature("Only P3 and P6 PPM files are supported")),
        };

        let columns = tokens.next_number()?;
        let rows = tokens.next_number()?;
        let max_value = tokens.next_number()?;
        if max_value == 0 || max_value > 255 {
            return Err(Error::UnsupportedFeature("PPM maxval must be between 1 and 255"));
        }

        let samples = rows
            .checked_mul(columns)
            .and_then(|pixels| pixels.checked_mul(3))
            .ok_or(Error::Malformed("PPM dimensions overflow"))?;

        let channels: Vec<usize> = if binary {
            // Exactly one whitespace byte separates the header from the raster.
            let start = tokens.position + 1;
            let raster = self
                .data
                .get(start..)
                .and_then(|rest| rest.get(..samples))
                .ok_or(Error::Malformed("PPM raster is truncated"))?;
            raster.iter().map(|&sample| sample as usize).collect()
        } else {
            // Every ASCII sample takes at least one byte
            if samples > self.data.len() - tokens.position {
                return Err(Error::Malformed("PPM data ended early"));
            }
            let mut channels = Vec::with_capacity(samples);
            for _ in 0..samples {
                channels.push(tokens.next_number()?);
            }
            channels
        };

        let mut channels = channels
            .into_iter()
            .map(|value| {
                if value > max_value {
                    return Err(Error::Malformed("PPM sample exceeds maxval"));
                }
                Ok(value as u8)
            })
            .collect::<Result<Vec<u8>>>()?;

        if max_value != 255 {
            for sample in channels.iter_mut() {
                *sample = (*sample as usize * 255 / max_value).min(255) as u8;
            }
        }

        debug!(
            "Decoded {} PPM, {}x{} maxval {}",
            if binary { "P6" } else { "P3" },
            columns,
            rows,
            max_value
        );

        let pixels = channels
            .chunks_exact(3)
            .map(|rgb| [rgb[0], rgb[1], rgb[2]])
            .collect();
        PixelGrid::new(rows, columns, pixels)
    }
}

/// PPM encoder. Always writes binary (P6) files.
pub struct PPMEncoder<'grid> {
    grid: &'grid PixelGrid<[u8; 3]>,
}

impl<'grid> ImageEncoder<'grid> for PPMEncoder<'grid> {
    fn new(grid: &'grid PixelGrid<[u8; 3]>) -> Self {
        Self { grid }
    }

    fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.grid.data.len() * 3 + 20);
        // Writing into a Vec can't fail
        let _ = write!(buffer, "P6\n{} {}\n255\n", self.grid.columns, self.grid.rows);
        for pixel in &self.grid.data {
            buffer.extend_from_slice(pixel);
        }
        buffer
    }
}

#[test]
fn decode_ascii_with_comments() {
    let data = b"P3\n# made by hand\n2 1 # width height\n255\n255 0 0   0 0 255\n";
    let grid = PPMDecoder::new(data).decode().unwrap();
    assert_eq!((grid.rows, grid.columns), (1, 2));
    assert_eq!(grid.data, vec![[255, 0, 0], [0, 0, 255]]);
}

#[test]
fn decode_scales_small_maxval() {
    let data = b"P3 1 1 15 15 0 5";
    let grid = PPMDecoder::new(data).decode().unwrap();
    assert_eq!(grid.data, vec![[255, 0, 85]]);
}

#[test]
fn binary_round_trip() {
    let grid = PixelGrid::new(2, 1, vec![[1, 2, 3], [250, 128, 0]]).unwrap();
    let encoded = PPMEncoder::new(&grid).encode();
    assert!(encoded.starts_with(b"P6\n1 2\n255\n"));
    assert_eq!(PPMDecoder::new(&encoded).decode().unwrap(), grid);
}

#[test]
fn rejects_bad_input() {
    assert!(matches!(
        PPMDecoder::new(b"P5 1 1 255 0").decode(),
        Err(Error::UnsupportedFeature(_))
    ));
    assert!(matches!(
        PPMDecoder::new(b"P3 1 1 65535 0 0 0").decode(),
        Err(Error::UnsupportedFeature(_))
    ));
    assert!(matches!(
        PPMDecoder::new(b"P6 2 2 255\n\x00\x01").decode(),
        Err(Error::Malformed(_))
    ));
    assert!(matches!(
        PPMDecoder::new(b"P3 1 1 255 0 x 0").decode(),
        Err(Error::Malformed(_))
    ));
}

#[test]
fn rejects_samples_above_maxval() {
    assert!(matches!(
        PPMDecoder::new(b"P3 1 1 15 16 0 0").decode(),
        Err(Error::Malformed(_))
    ));
    assert!(matches!(
        PPMDecoder::new(b"P6 1 1 15\n\x10\x00\x00").decode(),
        Err(Error::Malformed(_))
    ));
}

#[test]
fn huge_dimensions_are_malformed() {
    assert!(matches!(
        PPMDecoder::new(b"P3 2147483648 2147483648 255 0 0 0").decode(),
        Err(Error::Malformed(_))
    ));
    assert!(matches!(
        PPMDecoder::new(b"P6 100000 100000 255\n\x00\x00\x00").decode(),
        Err(Error::Malformed(_))
    ));
}
