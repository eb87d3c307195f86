use std::fmt;

use log::debug;

use crate::{
    error::Result,
    jpeg::jpeg_reader::JFIFReader,
    jpeg::layout::{read_segment, Dependency, FieldLength, FieldValue, SegmentLayout, Step},
};

/// The kinds of segment this parser can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// APP0
    Application,
    /// DQT
    Quantization,
    /// SOF0
    FrameHeader,
    /// DHT
    HuffmanTable,
    /// SOS
    ScanHeader,
}

impl SegmentKind {
    /// Every kind, in the order segments are printed.
    pub const ALL: [SegmentKind; 5] = [
        SegmentKind::Application,
        SegmentKind::Quantization,
        SegmentKind::FrameHeader,
        SegmentKind::HuffmanTable,
        SegmentKind::ScanHeader,
    ];

    /// Short name of the marker introducing this kind of segment.
    pub fn name(self) -> &'static str {
        match self {
            SegmentKind::Application => "APP",
            SegmentKind::Quantization => "DQT",
            SegmentKind::FrameHeader => "SOF",
            SegmentKind::HuffmanTable => "DHT",
            SegmentKind::ScanHeader => "SOS",
        }
    }

    /// Reads a segment of this kind. The reader must be positioned right after the marker.
    pub fn read(self, reader: &mut JFIFReader) -> Result<Segment> {
        let start = reader.position();
        let segment = match self {
            SegmentKind::Application => Segment::Application(read_segment(reader)?),
            SegmentKind::Quantization => Segment::Quantization(read_segment(reader)?),
            SegmentKind::FrameHeader => Segment::FrameHeader(read_segment(reader)?),
            SegmentKind::HuffmanTable => Segment::HuffmanTable(read_segment(reader)?),
            SegmentKind::ScanHeader => Segment::ScanHeader(read_segment(reader)?),
        };
        debug!(
            "Read {} segment at offset {} ({} bytes)",
            self,
            start,
            reader.position() - start
        );
        Ok(segment)
    }
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One parsed segment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Segment {
    Application(ApplicationSegment),
    Quantization(QuantizationSegment),
    FrameHeader(FrameHeaderSegment),
    HuffmanTable(HuffmanTableSegment),
    ScanHeader(ScanHeaderSegment),
}

impl Segment {
    /// The kind of this segment.
    pub fn kind(&self) -> SegmentKind {
        match self {
            Segment::Application(_) => SegmentKind::Application,
            Segment::Quantization(_) => SegmentKind::Quantization,
            Segment::FrameHeader(_) => SegmentKind::FrameHeader,
            Segment::HuffmanTable(_) => SegmentKind::HuffmanTable,
            Segment::ScanHeader(_) => SegmentKind::ScanHeader,
        }
    }
}

/// JFIF application segment (APP0).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplicationSegment {
    /// Declared length, including these two bytes
    pub payload_length: u16,
    /// The first four bytes of the identifier, normally `JFIF`. Its terminating byte is skipped.
    pub identifier: Vec<u8>,
    /// Major JFIF version
    pub main_version: u8,
    /// Minor JFIF version
    pub sub_version: u8,
    /// 0 = no units (aspect ratio only), 1 = dots per inch, 2 = dots per cm
    pub density_units: u8,
    /// Horizontal pixel density
    pub horizontal_density: u16,
    /// Vertical pixel density
    pub vertical_density: u16,
    /// Thumbnail width in pixels
    pub thumbnail_width: u8,
    /// Thumbnail height in pixels
    pub thumbnail_height: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Fields of an [`ApplicationSegment`].
#[allow(missing_docs)]
pub enum ApplicationField {
    PayloadLength,
    Identifier,
    MainVersion,
    SubVersion,
    DensityUnits,
    HorizontalDensity,
    VerticalDensity,
    ThumbnailWidth,
    ThumbnailHeight,
}

impl SegmentLayout for ApplicationSegment {
    type Field = ApplicationField;
    const KIND: SegmentKind = SegmentKind::Application;
    #[rustfmt::skip]
    const LAYOUT: &'static [Step<ApplicationField>] = &[
        Step::Field(ApplicationField::PayloadLength, FieldLength::Fixed(2)),
        Step::Field(ApplicationField::Identifier, FieldLength::Opaque(4)),
        Step::Skip(1),
        Step::Field(ApplicationField::MainVersion, FieldLength::Fixed(1)),
        Step::Field(ApplicationField::SubVersion, FieldLength::Fixed(1)),
        Step::Field(ApplicationField::DensityUnits, FieldLength::Fixed(1)),
        Step::Field(ApplicationField::HorizontalDensity, FieldLength::Fixed(2)),
        Step::Field(ApplicationField::VerticalDensity, FieldLength::Fixed(2)),
        Step::Field(ApplicationField::ThumbnailWidth, FieldLength::Fixed(1)),
        Step::Field(ApplicationField::ThumbnailHeight, FieldLength::Fixed(1)),
    ];

    fn assign(&mut self, field: ApplicationField, value: FieldValue) -> Result<()> {
        match field {
            ApplicationField::PayloadLength => self.payload_length = value.into_uint()?,
            ApplicationField::Identifier => self.identifier = value.into_bytes()?,
            ApplicationField::MainVersion => self.main_version = value.into_uint()?,
            ApplicationField::SubVersion => self.sub_version = value.into_uint()?,
            ApplicationField::DensityUnits => self.density_units = value.into_uint()?,
            ApplicationField::HorizontalDensity => self.horizontal_density = value.into_uint()?,
            ApplicationField::VerticalDensity => self.vertical_density = value.into_uint()?,
            ApplicationField::ThumbnailWidth => self.thumbnail_width = value.into_uint()?,
            ApplicationField::ThumbnailHeight => self.thumbnail_height = value.into_uint()?,
        }
        Ok(())
    }
}

/// Quantization table segment (DQT). Always reads a 64 byte table, whatever the declared length.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QuantizationSegment {
    /// Declared length. Not used to size the table.
    pub segment_length: u16,
    /// Precision in the high nibble, table id in the low nibble
    pub precision_and_table_id: u8,
    /// The 64 table bytes, read as 32 big endian words in stream (zigzag) order.
    pub table: Vec<u16>,
}

impl QuantizationSegment {
    /// 0 = 8 bit entries, 1 = 16 bit entries
    pub fn precision(&self) -> u8 {
        self.precision_and_table_id >> 4
    }

    /// Destination slot of the table, 0 to 3.
    pub fn table_id(&self) -> u8 {
        self.precision_and_table_id & 0x0F
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Fields of a [`QuantizationSegment`].
#[allow(missing_docs)]
pub enum QuantizationField {
    SegmentLength,
    PrecisionAndTableId,
    Table,
}

impl SegmentLayout for QuantizationSegment {
    type Field = QuantizationField;
    const KIND: SegmentKind = SegmentKind::Quantization;
    const LAYOUT: &'static [Step<QuantizationField>] = &[
        Step::Field(QuantizationField::SegmentLength, FieldLength::Fixed(2)),
        Step::Field(QuantizationField::PrecisionAndTableId, FieldLength::Fixed(1)),
        Step::Field(QuantizationField::Table, FieldLength::Words(32)),
    ];

    fn assign(&mut self, field: QuantizationField, value: FieldValue) -> Result<()> {
        match field {
            QuantizationField::SegmentLength => self.segment_length = value.into_uint()?,
            QuantizationField::PrecisionAndTableId => {
                self.precision_and_table_id = value.into_uint()?
            }
            QuantizationField::Table => self.table = value.into_words()?,
        }
        Ok(())
    }
}

/// Baseline start of frame segment (SOF0).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FrameHeaderSegment {
    /// Declared length
    pub segment_length: u16,
    /// Bits per sample
    pub precision: u8,
    /// Height in pixels
    pub image_height: u16,
    /// Width in pixels
    pub image_width: u16,
    /// Number of color components
    pub component_count: u8,
    /// Always 9 bytes. A conforming frame header carries `component_count * 3` bytes here, so
    /// this only lines up with three component images.
    pub component_data: Vec<u8>,
}

impl FrameHeaderSegment {
    /// Splits the component data into (identifier, sampling factors, quantization table) triples.
    pub fn component_triples(&self) -> impl Iterator<Item = (u8, u8, u8)> + '_ {
        self.component_data
            .chunks_exact(3)
            .map(|triple| (triple[0], triple[1], triple[2]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Fields of a [`FrameHeaderSegment`].
#[allow(missing_docs)]
pub enum FrameHeaderField {
    SegmentLength,
    Precision,
    ImageHeight,
    ImageWidth,
    ComponentCount,
    ComponentData,
}

impl SegmentLayout for FrameHeaderSegment {
    type Field = FrameHeaderField;
    const KIND: SegmentKind = SegmentKind::FrameHeader;
    const LAYOUT: &'static [Step<FrameHeaderField>] = &[
        Step::Field(FrameHeaderField::SegmentLength, FieldLength::Fixed(2)),
        Step::Field(FrameHeaderField::Precision, FieldLength::Fixed(1)),
        Step::Field(FrameHeaderField::ImageHeight, FieldLength::Fixed(2)),
        Step::Field(FrameHeaderField::ImageWidth, FieldLength::Fixed(2)),
        Step::Field(FrameHeaderField::ComponentCount, FieldLength::Fixed(1)),
        Step::Field(FrameHeaderField::ComponentData, FieldLength::Bytes(9)),
    ];

    fn assign(&mut self, field: FrameHeaderField, value: FieldValue) -> Result<()> {
        match field {
            FrameHeaderField::SegmentLength => self.segment_length = value.into_uint()?,
            FrameHeaderField::Precision => self.precision = value.into_uint()?,
            FrameHeaderField::ImageHeight => self.image_height = value.into_uint()?,
            FrameHeaderField::ImageWidth => self.image_width = value.into_uint()?,
            FrameHeaderField::ComponentCount => self.component_count = value.into_uint()?,
            FrameHeaderField::ComponentData => self.component_data = value.into_bytes()?,
        }
        Ok(())
    }
}

/// Huffman table segment (DHT). Holds a single table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HuffmanTableSegment {
    /// Declared length, which sizes the symbol list
    pub segment_length: u16,
    /// Table class in the high nibble, destination id in the low nibble
    pub table_info: u8,
    /// Number of codes of each bit length, 1 through 16.
    pub symbol_counts: Vec<u8>,
    /// `segment_length - 19` symbol bytes.
    pub symbols: Vec<u8>,
}

impl HuffmanTableSegment {
    /// 0 = DC, 1 = AC
    pub fn table_class(&self) -> u8 {
        self.table_info >> 4
    }

    /// Destination slot of the table, 0 to 3.
    pub fn destination_id(&self) -> u8 {
        self.table_info & 0x0F
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Fields of a [`HuffmanTableSegment`].
#[allow(missing_docs)]
pub enum HuffmanTableField {
    SegmentLength,
    TableInfo,
    SymbolCounts,
    Symbols,
}

impl SegmentLayout for HuffmanTableSegment {
    type Field = HuffmanTableField;
    const KIND: SegmentKind = SegmentKind::HuffmanTable;
    // Length (2) + table info (1) + symbol counts (16) = 19 bytes ahead of the symbols.
    #[rustfmt::skip]
    const LAYOUT: &'static [Step<HuffmanTableField>] = &[
        Step::Field(HuffmanTableField::SegmentLength, FieldLength::Fixed(2)),
        Step::Field(HuffmanTableField::TableInfo, FieldLength::Fixed(1)),
        Step::Field(HuffmanTableField::SymbolCounts, FieldLength::Bytes(16)),
        Step::Field(HuffmanTableField::Symbols, FieldLength::Dependent(Dependency::Minus(HuffmanTableField::SegmentLength, 19))),
    ];

    fn assign(&mut self, field: HuffmanTableField, value: FieldValue) -> Result<()> {
        match field {
            HuffmanTableField::SegmentLength => self.segment_length = value.into_uint()?,
            HuffmanTableField::TableInfo => self.table_info = value.into_uint()?,
            HuffmanTableField::SymbolCounts => self.symbol_counts = value.into_bytes()?,
            HuffmanTableField::Symbols => self.symbols = value.into_bytes()?,
        }
        Ok(())
    }
}

/// Start of scan segment (SOS). The spectral selection and successive approximation bytes
/// are skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanHeaderSegment {
    /// Declared length
    pub segment_length: u16,
    /// Number of components in the scan
    pub component_count: u8,
    /// (selector, table ids) pairs, two bytes per component.
    pub component_selectors: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Fields of a [`ScanHeaderSegment`].
#[allow(missing_docs)]
pub enum ScanHeaderField {
    SegmentLength,
    ComponentCount,
    ComponentSelectors,
}

impl SegmentLayout for ScanHeaderSegment {
    type Field = ScanHeaderField;
    const KIND: SegmentKind = SegmentKind::ScanHeader;
    #[rustfmt::skip]
    const LAYOUT: &'static [Step<ScanHeaderField>] = &[
        Step::Field(ScanHeaderField::SegmentLength, FieldLength::Fixed(2)),
        Step::Field(ScanHeaderField::ComponentCount, FieldLength::Fixed(1)),
        Step::Field(ScanHeaderField::ComponentSelectors, FieldLength::Dependent(Dependency::Times(ScanHeaderField::ComponentCount, 2))),
        Step::Skip(3),
    ];

    fn assign(&mut self, field: ScanHeaderField, value: FieldValue) -> Result<()> {
        match field {
            ScanHeaderField::SegmentLength => self.segment_length = value.into_uint()?,
            ScanHeaderField::ComponentCount => self.component_count = value.into_uint()?,
            ScanHeaderField::ComponentSelectors => self.component_selectors = value.into_bytes()?,
        }
        Ok(())
    }
}

#[cfg(test)]
use crate::{error::Error, jpeg::layout::dependencies_resolve};

#[rustfmt::skip]
#[allow(dead_code)]
static APP0: [u8; 16] = [
    0, 16,                      // Length
    b'J', b'F', b'I', b'F', 0,  // Identifier
    1, 2,                       // Version
    1,                          // Units
    0, 72, 0, 72,               // Density
    0, 0,                       // Thumbnail
];

#[test]
fn layouts_only_depend_on_earlier_fields() {
    assert!(dependencies_resolve(ApplicationSegment::LAYOUT));
    assert!(dependencies_resolve(QuantizationSegment::LAYOUT));
    assert!(dependencies_resolve(FrameHeaderSegment::LAYOUT));
    assert!(dependencies_resolve(HuffmanTableSegment::LAYOUT));
    assert!(dependencies_resolve(ScanHeaderSegment::LAYOUT));
}

#[test]
fn read_application_segment() {
    let mut reader = JFIFReader::new(&APP0);
    let segment = SegmentKind::Application.read(&mut reader).unwrap();
    assert_eq!(
        segment,
        Segment::Application(ApplicationSegment {
            payload_length: 16,
            identifier: b"JFIF".to_vec(),
            main_version: 1,
            sub_version: 2,
            density_units: 1,
            horizontal_density: 72,
            vertical_density: 72,
            thumbnail_width: 0,
            thumbnail_height: 0,
        })
    );
    assert_eq!(reader.position(), 16);
}

#[test]
fn quantization_ignores_declared_length() {
    let mut data = vec![0x00, 0x05, 0x01];
    data.extend(0u8..64);
    data.extend([0xFF, 0xD9]);

    let mut reader = JFIFReader::new(&data);
    let segment: QuantizationSegment = read_segment(&mut reader).unwrap();
    assert_eq!(reader.position(), 67);
    assert_eq!(segment.segment_length, 5);
    assert_eq!(segment.table_id(), 1);
    assert_eq!(segment.precision(), 0);
    assert_eq!(segment.table.len(), 32);
    assert_eq!(segment.table[0], 0x0001);
    assert_eq!(segment.table[31], 0x3E3F);
}

#[test]
fn frame_header_reads_nine_component_bytes() {
    #[rustfmt::skip]
    let data = [
        0, 17, 8,
        0x01, 0xE0,         // Height 480
        0x02, 0x80,         // Width 640
        1,                  // One component, still nine bytes follow
        1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1,
    ];
    let mut reader = JFIFReader::new(&data);
    let segment: FrameHeaderSegment = read_segment(&mut reader).unwrap();
    assert_eq!(reader.position(), 17);
    assert_eq!(segment.image_height, 480);
    assert_eq!(segment.image_width, 640);
    assert_eq!(segment.component_count, 1);
    assert_eq!(
        segment.component_triples().collect::<Vec<_>>(),
        vec![(1, 0x22, 0), (2, 0x11, 1), (3, 0x11, 1)]
    );
}

#[test]
fn huffman_symbols_follow_declared_length() {
    let mut data = vec![0, 22, 0x10];
    data.extend([0u8; 16]);
    data.extend([7, 8, 9, 0xAA]);

    let mut reader = JFIFReader::new(&data);
    let segment: HuffmanTableSegment = read_segment(&mut reader).unwrap();
    assert_eq!(segment.symbols, vec![7, 8, 9]);
    assert_eq!(segment.symbol_counts.len(), 16);
    assert_eq!(segment.table_class(), 1);
    assert_eq!(segment.destination_id(), 0);
    assert_eq!(reader.position(), 22);
}

#[test]
fn huffman_length_below_header_is_malformed() {
    let mut data = vec![0, 18, 0x00];
    data.extend([0u8; 16]);
    let mut reader = JFIFReader::new(&data);
    let result = SegmentKind::HuffmanTable.read(&mut reader);
    assert!(matches!(
        result,
        Err(Error::MalformedSegment {
            kind: SegmentKind::HuffmanTable,
            ..
        })
    ));
}

#[test]
fn huffman_table_without_symbols() {
    let mut data = vec![0, 19, 0x01];
    data.extend([0u8; 16]);
    data.extend([0xFF, 0xDA]);

    let mut reader = JFIFReader::new(&data);
    let segment: HuffmanTableSegment = read_segment(&mut reader).unwrap();
    assert!(segment.symbols.is_empty());
    assert_eq!(segment.destination_id(), 1);
    assert_eq!(reader.position(), 19);
    assert_eq!(reader.read_next_word().unwrap(), 0xFFDA);
}

#[test]
fn scan_header_without_components() {
    let data = [0, 6, 0, 0, 63, 0, 0x12];
    let mut reader = JFIFReader::new(&data);
    let segment: ScanHeaderSegment = read_segment(&mut reader).unwrap();
    assert_eq!(segment.component_count, 0);
    assert!(segment.component_selectors.is_empty());
    assert_eq!(reader.position(), 6);
}

#[test]
fn scan_header_skips_trailing_bytes() {
    #[rustfmt::skip]
    let data = [
        0, 12, 3,
        1, 0x00, 2, 0x11, 3, 0x11,  // Selectors
        0, 63, 0,                   // Skipped
        0xAB,
    ];
    let mut reader = JFIFReader::new(&data);
    let segment: ScanHeaderSegment = read_segment(&mut reader).unwrap();
    assert_eq!(segment.component_selectors, vec![1, 0x00, 2, 0x11, 3, 0x11]);
    assert_eq!(reader.position(), 12);
    assert_eq!(reader.read_bytes(1).unwrap(), vec![0xAB]);
}

#[test]
fn truncated_segment_names_kind() {
    let mut reader = JFIFReader::new(&APP0[..10]);
    match SegmentKind::Application.read(&mut reader) {
        Err(Error::TruncatedSegment { kind, offset }) => {
            assert_eq!(kind, SegmentKind::Application);
            assert_eq!(offset, 10);
        }
        other => panic!("unexpected result {:?}", other),
    }
}
