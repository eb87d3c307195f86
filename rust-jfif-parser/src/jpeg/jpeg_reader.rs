use byteorder::{BigEndian, ReadBytesExt};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use std::io::{Cursor, Read, Seek, SeekFrom};

/// The marker codes this parser knows about.
#[allow(non_camel_case_types)]
#[derive(PartialEq, Eq, PartialOrd, Ord, FromPrimitive, Debug, Clone, Copy)]
pub enum JPEGMarker {
    /// Start of frame, baseline DCT only
    SOF0 = 0xFFC0,
    /// Define Huffman table
    DHT = 0xFFC4,
    /// Start of image
    SOI = 0xFFD8,
    /// End of image
    EOI = 0xFFD9,
    /// Start of scan
    SOS = 0xFFDA,
    /// Define quantization table
    DQT = 0xFFDB,
    /// JFIF application segment
    APP0 = 0xFFE0,
}

impl JPEGMarker {
    /// The marker for a code, if it is one this parser knows.
    pub fn from_word(word: u16) -> Option<Self> {
        FromPrimitive::from_u16(word)
    }

    /// The two byte code of the marker.
    pub fn word(self) -> u16 {
        self as u16
    }
}

/// The reader ran out of input. `offset` is where the unsatisfied read started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfData {
    pub offset: u64,
}

pub type ReadResult<T> = core::result::Result<T, OutOfData>;

/// Forward-only big endian reader over a JFIF byte stream.
pub struct JFIFReader<'data> {
    cursor: Cursor<&'data [u8]>,
}

impl<'data> JFIFReader<'data> {
    pub fn new(data: &'data [u8]) -> Self {
        Self {
            cursor: Cursor::new(data),
        }
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn remaining(&self) -> u64 {
        (self.cursor.get_ref().len() as u64).saturating_sub(self.cursor.position())
    }

    fn ensure(&self, bytes: usize) -> ReadResult<()> {
        if self.remaining() < bytes as u64 {
            return Err(OutOfData {
                offset: self.position(),
            });
        }
        Ok(())
    }

    fn out_of_data(&self) -> OutOfData {
        OutOfData {
            offset: self.position(),
        }
    }

    pub fn read_next_word(&mut self) -> ReadResult<u16> {
        self.ensure(2)?;
        self.cursor
            .read_u16::<BigEndian>()
            .map_err(|_| self.out_of_data())
    }

    /// Returns the next word without moving the cursor.
    pub fn peek_next_word(&self) -> ReadResult<u16> {
        self.ensure(2)?;
        let start = self.position() as usize;
        let bytes = &self.cursor.get_ref()[start..start + 2];
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a big endian unsigned integer of `bytes` length (1 to 8 bytes).
    pub fn read_uint(&mut self, bytes: usize) -> ReadResult<u64> {
        self.ensure(bytes)?;
        self.cursor
            .read_uint::<BigEndian>(bytes)
            .map_err(|_| self.out_of_data())
    }

    pub fn read_bytes(&mut self, count: usize) -> ReadResult<Vec<u8>> {
        self.ensure(count)?;
        let mut bytes = vec![0u8; count];
        self.cursor
            .read_exact(&mut bytes)
            .map_err(|_| self.out_of_data())?;
        Ok(bytes)
    }

    pub fn read_words(&mut self, count: usize) -> ReadResult<Vec<u16>> {
        self.ensure(count * 2)?;
        let mut words = vec![0u16; count];
        self.cursor
            .read_u16_into::<BigEndian>(&mut words)
            .map_err(|_| self.out_of_data())?;
        Ok(words)
    }

    pub fn skip_bytes(&mut self, count: usize) -> ReadResult<()> {
        self.ensure(count)?;
        self.cursor
            .seek(SeekFrom::Current(count as i64))
            .map_err(|_| self.out_of_data())?;
        Ok(())
    }
}

#[rustfmt::skip]
#[allow(dead_code)]
static TEST_HEADER: [u8; 15] = [
    0xFF, 0xD8, // Start of image
    0xFF, 0xC0, // Start of frame
    0, 17,          // Length
    8,              // Precision
    0, 128,         // Height
    0, 128,         // Width
    3,              // Component count
    0x01, 0x22,
    0xFF,           // Odd trailing byte
];

#[test]
fn read_words() {
    let mut reader = JFIFReader::new(&TEST_HEADER);
    assert_eq!(reader.read_uint(1).unwrap(), 0xFF);
    assert_eq!(reader.read_uint(1).unwrap(), 0xD8);

    assert_eq!(reader.peek_next_word().unwrap(), 0xFFC0);
    assert_eq!(reader.position(), 2);
    assert_eq!(reader.read_next_word().unwrap(), 0xFFC0);
}

#[test]
fn read_markers() {
    let mut reader = JFIFReader::new(&TEST_HEADER);
    let soi = reader.read_next_word().unwrap();
    assert_eq!(JPEGMarker::from_word(soi), Some(JPEGMarker::SOI));
    let sof = reader.read_next_word().unwrap();
    assert_eq!(JPEGMarker::from_word(sof), Some(JPEGMarker::SOF0));
    assert_eq!(JPEGMarker::from_word(0xFFFE), None);
    assert_eq!(JPEGMarker::APP0.word(), 0xFFE0);
}

#[test]
fn read_mixed_widths() {
    let mut reader = JFIFReader::new(&TEST_HEADER);
    reader.skip_bytes(4).unwrap();
    assert_eq!(reader.read_uint(2).unwrap(), 17);
    assert_eq!(reader.read_uint(1).unwrap(), 8);
    assert_eq!(reader.read_words(2).unwrap(), vec![128, 128]);
    assert_eq!(reader.read_bytes(3).unwrap(), vec![3, 0x01, 0x22]);
    assert_eq!(reader.remaining(), 1);
}

#[test]
fn reads_past_end_fail_without_moving() {
    let mut reader = JFIFReader::new(&TEST_HEADER);
    reader.skip_bytes(14).unwrap();
    assert_eq!(reader.read_next_word(), Err(OutOfData { offset: 14 }));
    assert_eq!(reader.read_bytes(2), Err(OutOfData { offset: 14 }));
    assert_eq!(reader.skip_bytes(2), Err(OutOfData { offset: 14 }));
    assert_eq!(reader.position(), 14);
    assert_eq!(reader.read_uint(1).unwrap(), 0xFF);
    assert_eq!(reader.read_uint(1), Err(OutOfData { offset: 15 }));
}
