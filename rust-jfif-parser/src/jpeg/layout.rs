//! Table driven field extraction.
//!
//! A segment is described by an ordered list of [`Step`]s. [`read_segment`] walks the list,
//! resolves the byte count of every field and hands each decoded [`FieldValue`] to the record
//! being built.

use std::fmt::Debug;

use log::trace;
use num_traits::FromPrimitive;

use crate::error::{Error, Result};
use crate::jpeg::header::SegmentKind;
use crate::jpeg::jpeg_reader::{JFIFReader, OutOfData};

/// A decoded field, before it is narrowed into its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Big endian unsigned integer.
    Uint(u64),
    /// Raw bytes with no further meaning to the parser, ex. an identifier tag.
    Opaque(Vec<u8>),
    /// One entry per byte.
    Bytes(Vec<u8>),
    /// One entry per big endian word.
    Words(Vec<u16>),
}

impl FieldValue {
    /// Narrows a numeric value into the integer type its record stores.
    pub fn into_uint<T: FromPrimitive>(self) -> Result<T> {
        match self {
            FieldValue::Uint(value) => T::from_u64(value)
                .ok_or(Error::InternalError("Field value does not fit its record type")),
            _ => Err(Error::InternalError("Expected a numeric field")),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            FieldValue::Opaque(bytes) | FieldValue::Bytes(bytes) => Ok(bytes),
            _ => Err(Error::InternalError("Expected a byte field")),
        }
    }

    pub fn into_words(self) -> Result<Vec<u16>> {
        match self {
            FieldValue::Words(words) => Ok(words),
            _ => Err(Error::InternalError("Expected a word list field")),
        }
    }
}

/// Byte count derived from a numeric field read earlier in the same segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency<F> {
    /// `field - n`. A negative result makes the segment malformed.
    Minus(F, u64),
    /// `field * n`
    Times(F, u64),
}

impl<F: Copy> Dependency<F> {
    pub fn source(&self) -> F {
        match *self {
            Dependency::Minus(field, _) | Dependency::Times(field, _) => field,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLength<F> {
    /// Big endian unsigned integer of n bytes (1 to 8).
    Fixed(usize),
    /// n raw bytes.
    Opaque(usize),
    /// n single bytes.
    Bytes(usize),
    /// n big endian words.
    Words(usize),
    /// Single bytes, as many as the dependency evaluates to.
    Dependent(Dependency<F>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<F> {
    Field(F, FieldLength<F>),
    /// Bytes that are read and thrown away.
    Skip(usize),
}

/// A segment record that can be filled in from a layout.
pub trait SegmentLayout: Default {
    /// Names the fields of this segment.
    type Field: Copy + PartialEq + Debug + 'static;

    const KIND: SegmentKind;
    const LAYOUT: &'static [Step<Self::Field>];

    /// Stores a decoded value. Called once per field, in layout order.
    fn assign(&mut self, field: Self::Field, value: FieldValue) -> Result<()>;
}

/// Reads one segment (everything after its marker) described by `S::LAYOUT`.
///
/// The reader is advanced by exactly the number of bytes the layout consumes. Nothing is
/// returned unless every field was read.
pub fn read_segment<S: SegmentLayout>(reader: &mut JFIFReader) -> Result<S> {
    let truncated = |OutOfData { offset }: OutOfData| Error::TruncatedSegment {
        kind: S::KIND,
        offset,
    };

    debug_assert!(dependencies_resolve(S::LAYOUT));

    let mut record = S::default();
    let mut numeric_fields: Vec<(S::Field, u64)> = Vec::with_capacity(S::LAYOUT.len());

    for step in S::LAYOUT {
        let (field, length) = match step {
            Step::Skip(count) => {
                reader.skip_bytes(*count).map_err(truncated)?;
                continue;
            }
            Step::Field(field, length) => (*field, *length),
        };

        let value = match length {
            FieldLength::Fixed(count) => {
                if !(1..=8).contains(&count) {
                    return Err(Error::InternalError(
                        "Fixed fields must be between 1 and 8 bytes",
                    ));
                }
                FieldValue::Uint(reader.read_uint(count).map_err(truncated)?)
            }
            FieldLength::Opaque(count) => {
                FieldValue::Opaque(reader.read_bytes(count).map_err(truncated)?)
            }
            FieldLength::Bytes(count) => {
                FieldValue::Bytes(reader.read_bytes(count).map_err(truncated)?)
            }
            FieldLength::Words(count) => {
                FieldValue::Words(reader.read_words(count).map_err(truncated)?)
            }
            FieldLength::Dependent(dependency) => {
                let count = resolve::<S>(dependency, &numeric_fields, reader.position())?;
                FieldValue::Bytes(reader.read_bytes(count).map_err(truncated)?)
            }
        };

        trace!("{} {:?} = {:?}", S::KIND, field, value);

        if let FieldValue::Uint(number) = value {
            numeric_fields.push((field, number));
        }
        record.assign(field, value)?;
    }

    Ok(record)
}

fn resolve<S: SegmentLayout>(
    dependency: Dependency<S::Field>,
    numeric_fields: &[(S::Field, u64)],
    offset: u64,
) -> Result<usize> {
    let source = dependency.source();
    let base = numeric_fields
        .iter()
        .find(|(field, _)| *field == source)
        .map(|(_, value)| *value)
        .ok_or(Error::InternalError(
            "Dependent field refers to a field that has not been read",
        ))?;

    let count = match dependency {
        Dependency::Minus(_, overhead) => {
            base.checked_sub(overhead)
                .ok_or(Error::MalformedSegment {
                    kind: S::KIND,
                    offset,
                    reason: "Declared length is shorter than the segment header",
                })?
        }
        Dependency::Times(_, factor) => {
            base.checked_mul(factor)
                .ok_or(Error::MalformedSegment {
                    kind: S::KIND,
                    offset,
                    reason: "Dependent field length overflows",
                })?
        }
    };

    usize::try_from(count).map_err(|_| Error::MalformedSegment {
        kind: S::KIND,
        offset,
        reason: "Dependent field length overflows",
    })
}

/// Checks that every dependent field refers to a numeric field earlier in the layout.
pub fn dependencies_resolve<F: Copy + PartialEq>(layout: &[Step<F>]) -> bool {
    let mut numeric: Vec<F> = Vec::new();
    for step in layout {
        if let Step::Field(field, length) = step {
            match length {
                FieldLength::Fixed(_) => numeric.push(*field),
                FieldLength::Dependent(dependency) => {
                    if !numeric.contains(&dependency.source()) {
                        return false;
                    }
                }
                _ => {}
            }
        }
    }
    true
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum ProbeField {
        Length,
        Tag,
        Count,
        Items,
        Words,
    }

    #[derive(Debug, Default)]
    struct Probe {
        length: u16,
        tag: Vec<u8>,
        count: u8,
        items: Vec<u8>,
        words: Vec<u16>,
    }

    impl SegmentLayout for Probe {
        type Field = ProbeField;
        const KIND: SegmentKind = SegmentKind::Application;
        #[rustfmt::skip]
        const LAYOUT: &'static [Step<ProbeField>] = &[
            Step::Field(ProbeField::Length, FieldLength::Fixed(2)),
            Step::Field(ProbeField::Tag, FieldLength::Opaque(2)),
            Step::Skip(1),
            Step::Field(ProbeField::Count, FieldLength::Fixed(1)),
            Step::Field(ProbeField::Items, FieldLength::Dependent(Dependency::Times(ProbeField::Count, 2))),
            Step::Field(ProbeField::Words, FieldLength::Words(1)),
        ];

        fn assign(&mut self, field: ProbeField, value: FieldValue) -> Result<()> {
            match field {
                ProbeField::Length => self.length = value.into_uint()?,
                ProbeField::Tag => self.tag = value.into_bytes()?,
                ProbeField::Count => self.count = value.into_uint()?,
                ProbeField::Items => self.items = value.into_bytes()?,
                ProbeField::Words => self.words = value.into_words()?,
            }
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Headerless;

    impl SegmentLayout for Headerless {
        type Field = ProbeField;
        const KIND: SegmentKind = SegmentKind::HuffmanTable;
        #[rustfmt::skip]
        const LAYOUT: &'static [Step<ProbeField>] = &[
            Step::Field(ProbeField::Length, FieldLength::Fixed(1)),
            Step::Field(ProbeField::Items, FieldLength::Dependent(Dependency::Minus(ProbeField::Length, 4))),
        ];

        fn assign(&mut self, _: ProbeField, _: FieldValue) -> Result<()> {
            Ok(())
        }
    }

    #[rustfmt::skip]
    static PROBE: [u8; 13] = [
        0x01, 0x02,     // Length
        b'J', b'F',     // Tag
        0xEE,           // Skipped
        2,              // Count
        1, 2, 3, 4,     // Items
        0xAB, 0xCD,     // Words
        0x99,           // Next segment
    ];

    #[test]
    fn reads_every_length_mode() {
        let mut reader = JFIFReader::new(&PROBE);
        let probe: Probe = read_segment(&mut reader).unwrap();
        assert_eq!(probe.length, 0x0102);
        assert_eq!(probe.tag, b"JF");
        assert_eq!(probe.count, 2);
        assert_eq!(probe.items, vec![1, 2, 3, 4]);
        assert_eq!(probe.words, vec![0xABCD]);
        assert_eq!(reader.position(), 12);
    }

    #[test]
    fn truncation_reports_offset() {
        let mut reader = JFIFReader::new(&PROBE[..9]);
        match read_segment::<Probe>(&mut reader) {
            Err(Error::TruncatedSegment { kind, offset }) => {
                assert_eq!(kind, SegmentKind::Application);
                assert_eq!(offset, 6);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn negative_dependent_length_is_malformed() {
        let mut reader = JFIFReader::new(&[3, 0, 0, 0]);
        match read_segment::<Headerless>(&mut reader) {
            Err(Error::MalformedSegment { kind, offset, .. }) => {
                assert_eq!(kind, SegmentKind::HuffmanTable);
                assert_eq!(offset, 1);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn zero_dependent_length_reads_nothing() {
        let mut reader = JFIFReader::new(&[4, 0xFF]);
        read_segment::<Headerless>(&mut reader).unwrap();
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn numeric_narrowing() {
        assert_eq!(FieldValue::Uint(300).into_uint::<u16>().unwrap(), 300);
        assert!(FieldValue::Uint(300).into_uint::<u8>().is_err());
        assert!(FieldValue::Bytes(vec![1]).into_uint::<u8>().is_err());
        assert!(FieldValue::Uint(1).into_bytes().is_err());
    }

    #[test]
    fn dependency_order_check() {
        assert!(dependencies_resolve(Probe::LAYOUT));
        let count_after_items = Dependency::Minus(ProbeField::Count, 1);
        assert!(!dependencies_resolve(&[
            Step::Field(ProbeField::Items, FieldLength::Dependent(count_after_items)),
            Step::Field(ProbeField::Count, FieldLength::<ProbeField>::Fixed(1)),
        ]));
    }
}
