//! HRIT header records.
//!
//! Every xRIT file starts with a sequence of header records, each made of a
//! 1-byte record type and a 2-byte record length followed by the record
//! body. The first record is always the 16-byte primary header, which gives
//! the total length of all header records and the length of the data field
//! that follows them. All values are big-endian.
//!
//! | type | record                          | length   |
//! |------|---------------------------------|----------|
//! | 0    | primary header                  | 16       |
//! | 1    | image structure                 | 9        |
//! | 2    | image navigation                | 51       |
//! | 4    | annotation                      | variable |
//! | 5    | time stamp (CDS)                | 10       |
//! | 128  | segment identification (MSG)    | 13       |
//!
//! Records of any other type are skipped using their declared length.

use std::{
    fmt::{self, Display, Formatter},
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use crate::{
    error::*,
    helpers::{ascii_field, ensure_len, read_as},
    time::UtcDateTime,
};

pub const PRIMARY_HEADER_SIZE: usize = 16;
pub(crate) const IMAGE_STRUCTURE_SIZE: usize = 9;
pub(crate) const IMAGE_NAVIGATION_SIZE: usize = 51;
pub(crate) const TIME_STAMP_SIZE: usize = 10;
pub(crate) const SEGMENT_IDENTIFICATION_SIZE: usize = 13;
const PROJECTION_NAME_SIZE: usize = 32;
/// Upper bound on the total length of header records.
const MAX_HEADER_LENGTH: u32 = 1 << 16;

/// File type codes found in the primary header.
pub mod file_type {
    pub const IMAGE: u8 = 0;
    pub const PROLOGUE: u8 = 128;
    pub const EPILOGUE: u8 = 129;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimaryHeader {
    /// File type code (0 for image data, 128 for prologue, 129 for epilogue)
    pub file_type_code: u8,
    /// Total length of all header records, including this one, in bytes
    pub total_header_length: u32,
    /// Length of the data field in bits
    pub data_field_length: u64,
}

impl PrimaryHeader {
    pub(crate) fn from_buf(buf: &[u8]) -> Result<Self, ParseError> {
        ensure_len(buf, PRIMARY_HEADER_SIZE)?;
        let record_type = buf[0];
        if record_type != 0 {
            return Err(ParseError::NotPrimaryHeader(record_type));
        }
        let record_length = read_as!(u16, buf, 1);
        if usize::from(record_length) != PRIMARY_HEADER_SIZE {
            return Err(ParseError::InvalidRecordLength(0, record_length));
        }
        let total_header_length = read_as!(u32, buf, 4);
        if (total_header_length as usize) < PRIMARY_HEADER_SIZE {
            return Err(ParseError::HeaderLengthMismatch(
                total_header_length,
                PRIMARY_HEADER_SIZE,
            ));
        }
        if total_header_length > MAX_HEADER_LENGTH {
            return Err(ParseError::HeaderTooLong(total_header_length));
        }
        Ok(Self {
            file_type_code: buf[3],
            total_header_length,
            data_field_length: read_as!(u64, buf, 8),
        })
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut buf = record_prefix(0, PRIMARY_HEADER_SIZE);
        buf.push(self.file_type_code);
        buf.extend_from_slice(&self.total_header_length.to_be_bytes());
        buf.extend_from_slice(&self.data_field_length.to_be_bytes());
        buf
    }

    /// Length of the data field in whole bytes.
    pub fn data_field_bytes(&self) -> usize {
        self.data_field_length.div_ceil(8) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageStructure {
    pub bits_per_pixel: u8,
    /// Number of columns of one segment
    pub columns: u16,
    /// Number of lines of one segment
    pub lines: u16,
    /// 0 for uncompressed, 1 for lossless and 2 for lossy compression
    pub compression: u8,
}

impl ImageStructure {
    fn from_buf(buf: &[u8]) -> Self {
        Self {
            bits_per_pixel: buf[3],
            columns: read_as!(u16, buf, 4),
            lines: read_as!(u16, buf, 6),
            compression: buf[8],
        }
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut buf = record_prefix(1, IMAGE_STRUCTURE_SIZE);
        buf.push(self.bits_per_pixel);
        buf.extend_from_slice(&self.columns.to_be_bytes());
        buf.extend_from_slice(&self.lines.to_be_bytes());
        buf.push(self.compression);
        buf
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageNavigation {
    /// Projection name such as `GEOS(+000.0)`
    pub projection_name: String,
    /// Column scaling factor (CFAC)
    pub column_factor: i32,
    /// Line scaling factor (LFAC)
    pub line_factor: i32,
    /// Column offset (COFF)
    pub column_offset: i32,
    /// Line offset (LOFF)
    pub line_offset: i32,
}

impl ImageNavigation {
    fn from_buf(buf: &[u8]) -> Self {
        let name_end = 3 + PROJECTION_NAME_SIZE;
        Self {
            projection_name: ascii_field(&buf[3..name_end]),
            column_factor: read_as!(i32, buf, name_end),
            line_factor: read_as!(i32, buf, name_end + 4),
            column_offset: read_as!(i32, buf, name_end + 8),
            line_offset: read_as!(i32, buf, name_end + 12),
        }
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut buf = record_prefix(2, IMAGE_NAVIGATION_SIZE);
        let mut name = [b' '; PROJECTION_NAME_SIZE];
        let len = self.projection_name.len().min(PROJECTION_NAME_SIZE);
        name[..len].copy_from_slice(&self.projection_name.as_bytes()[..len]);
        buf.extend_from_slice(&name);
        for v in [
            self.column_factor,
            self.line_factor,
            self.column_offset,
            self.line_offset,
        ] {
            buf.extend_from_slice(&v.to_be_bytes());
        }
        buf
    }

    /// Sub-satellite longitude encoded in a `GEOS(<lon>)` projection name.
    pub fn sub_satellite_longitude(&self) -> Option<f32> {
        let inner = self
            .projection_name
            .strip_prefix("GEOS(")?
            .strip_suffix(')')?;
        inner.trim().parse::<f32>().ok()
    }
}

/// Time stamp record, holding a CCSDS day segmented time code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimeStamp {
    pub days: u16,
    pub millis_of_day: u32,
}

impl TimeStamp {
    fn from_buf(buf: &[u8]) -> Self {
        // buf[3] is the CDS P field
        Self {
            days: read_as!(u16, buf, 4),
            millis_of_day: read_as!(u32, buf, 6),
        }
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut buf = record_prefix(5, TIME_STAMP_SIZE);
        buf.push(0x40);
        buf.extend_from_slice(&self.days.to_be_bytes());
        buf.extend_from_slice(&self.millis_of_day.to_be_bytes());
        buf
    }

    pub fn to_utc(&self) -> Result<UtcDateTime, XritError> {
        UtcDateTime::from_cds(self.days, self.millis_of_day)
    }
}

/// MSG segment identification record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentIdentification {
    /// HRIT spacecraft code (GP_SC_ID)
    pub spacecraft_id: u16,
    pub channel_id: u8,
    /// 1-based sequence number of this segment
    pub sequence_number: u16,
    pub planned_start_segment: u16,
    pub planned_end_segment: u16,
    /// Data field representation; 0 means the data is a raw binary dump
    pub data_field_format: u8,
}

impl SegmentIdentification {
    pub const NO_FORMAT: u8 = 0;
    pub const NATIVE_FORMAT: u8 = 1;

    fn from_buf(buf: &[u8]) -> Self {
        Self {
            spacecraft_id: read_as!(u16, buf, 3),
            channel_id: buf[5],
            sequence_number: read_as!(u16, buf, 6),
            planned_start_segment: read_as!(u16, buf, 8),
            planned_end_segment: read_as!(u16, buf, 10),
            data_field_format: buf[12],
        }
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut buf = record_prefix(128, SEGMENT_IDENTIFICATION_SIZE);
        buf.extend_from_slice(&self.spacecraft_id.to_be_bytes());
        buf.push(self.channel_id);
        buf.extend_from_slice(&self.sequence_number.to_be_bytes());
        buf.extend_from_slice(&self.planned_start_segment.to_be_bytes());
        buf.extend_from_slice(&self.planned_end_segment.to_be_bytes());
        buf.push(self.data_field_format);
        buf
    }

    pub fn is_binary_dump(&self) -> bool {
        self.data_field_format == Self::NO_FORMAT
    }
}

/// All header records of one xRIT file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentHeader {
    pub primary: PrimaryHeader,
    pub image_structure: Option<ImageStructure>,
    pub navigation: Option<ImageNavigation>,
    pub annotation: Option<String>,
    pub timestamp: Option<TimeStamp>,
    pub segment_id: Option<SegmentIdentification>,
}

impl SegmentHeader {
    fn new(primary: PrimaryHeader) -> Self {
        Self {
            primary,
            image_structure: None,
            navigation: None,
            annotation: None,
            timestamp: None,
            segment_id: None,
        }
    }

    /// Decodes header records from a buffer starting with the primary header
    /// and spanning `total_header_length` bytes.
    pub fn from_buf(buf: &[u8]) -> Result<Self, ParseError> {
        let primary = PrimaryHeader::from_buf(buf)?;
        let total = primary.total_header_length as usize;
        ensure_len(buf, total)?;
        let mut header = Self::new(primary);

        let mut offset = PRIMARY_HEADER_SIZE;
        while offset < total {
            ensure_len(buf, offset + 3)?;
            let record_type = buf[offset];
            let record_length = read_as!(u16, buf, offset + 1);
            let len = usize::from(record_length);
            if len < 3 || offset + len > total {
                return Err(ParseError::InvalidRecordLength(record_type, record_length));
            }
            let record = &buf[offset..offset + len];
            let check = |expected: usize| {
                if len < expected {
                    Err(ParseError::InvalidRecordLength(record_type, record_length))
                } else {
                    Ok(())
                }
            };

            match record_type {
                0 => return Err(ParseError::InvalidRecordLength(0, record_length)),
                1 => {
                    check(IMAGE_STRUCTURE_SIZE)?;
                    header.image_structure = Some(ImageStructure::from_buf(record));
                }
                2 => {
                    check(IMAGE_NAVIGATION_SIZE)?;
                    header.navigation = Some(ImageNavigation::from_buf(record));
                }
                4 => header.annotation = Some(ascii_field(&record[3..])),
                5 => {
                    check(TIME_STAMP_SIZE)?;
                    header.timestamp = Some(TimeStamp::from_buf(record));
                }
                128 => {
                    check(SEGMENT_IDENTIFICATION_SIZE)?;
                    header.segment_id = Some(SegmentIdentification::from_buf(record));
                }
                _ => {}
            }
            offset += len;
        }

        if offset != total {
            return Err(ParseError::HeaderLengthMismatch(
                header.primary.total_header_length,
                offset,
            ));
        }
        Ok(header)
    }

    pub fn is_image(&self) -> bool {
        self.primary.file_type_code == file_type::IMAGE
    }

    pub fn image_structure(&self) -> Result<&ImageStructure, ParseError> {
        self.image_structure
            .as_ref()
            .ok_or(ParseError::MissingRecord("image structure"))
    }

    pub fn navigation(&self) -> Result<&ImageNavigation, ParseError> {
        self.navigation
            .as_ref()
            .ok_or(ParseError::MissingRecord("image navigation"))
    }

    pub fn segment_id(&self) -> Result<&SegmentIdentification, ParseError> {
        self.segment_id
            .as_ref()
            .ok_or(ParseError::MissingRecord("segment identification"))
    }

    /// Checks that this header describes image data this crate can read:
    /// an image file with a formatted, uncompressed data field.
    pub fn check_image_data(&self) -> Result<(), XritError> {
        if !self.is_image() {
            return Err(ParseError::UnexpectedFileType(self.primary.file_type_code).into());
        }
        if self.segment_id()?.is_binary_dump() {
            return Err(FormatError::BinaryDump.into());
        }
        let structure = self.image_structure()?;
        if structure.compression != 0 {
            return Err(FormatError::Compressed(structure.compression).into());
        }
        if !(1..=16).contains(&structure.bits_per_pixel) {
            return Err(FormatError::UnsupportedBitsPerPixel(structure.bits_per_pixel).into());
        }
        self.navigation()?;
        Ok(())
    }
}

impl Display for SegmentHeader {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(
            f,
            "File type code:                         {}",
            self.primary.file_type_code
        )?;
        writeln!(
            f,
            "Data field length:                      {} bytes",
            self.primary.data_field_bytes()
        )?;
        if let Some(s) = &self.segment_id {
            writeln!(
                f,
                "Segment:                                {} of {}-{}",
                s.sequence_number, s.planned_start_segment, s.planned_end_segment
            )?;
        }
        if let Some(s) = &self.image_structure {
            writeln!(
                f,
                "Segment size:                           {} x {} ({} bits)",
                s.columns, s.lines, s.bits_per_pixel
            )?;
        }
        if let Some(n) = &self.navigation {
            writeln!(
                f,
                "Projection:                             {}",
                n.projection_name
            )?;
        }
        Ok(())
    }
}

fn record_prefix(record_type: u8, len: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(len);
    buf.push(record_type);
    buf.extend_from_slice(&(len as u16).to_be_bytes());
    buf
}

/// Reads xRIT header records and data fields from an I/O stream.
pub struct HritReader<R> {
    reader: R,
}

impl<R> HritReader<R> {
    pub fn new(r: R) -> Self {
        Self { reader: r }
    }
}

impl<R: Read> HritReader<R> {
    pub fn read_header(&mut self) -> Result<SegmentHeader, ParseError> {
        let mut buf = vec![0; PRIMARY_HEADER_SIZE];
        self.reader.read_exact(&mut buf[..])?;
        let primary = PrimaryHeader::from_buf(&buf)?;

        let rest = primary.total_header_length as usize - PRIMARY_HEADER_SIZE;
        buf.resize(PRIMARY_HEADER_SIZE + rest, 0);
        self.reader.read_exact(&mut buf[PRIMARY_HEADER_SIZE..])?;
        SegmentHeader::from_buf(&buf)
    }

    /// Reads the data field following the header records.
    ///
    /// The buffer grows with what is actually read, so a corrupt length
    /// cannot force a huge allocation.
    pub fn read_data_field(&mut self, header: &SegmentHeader) -> Result<Vec<u8>, ParseError> {
        let declared = header.primary.data_field_length;
        if let Some(s) = &header.image_structure {
            let expected =
                u64::from(s.columns) * u64::from(s.lines) * u64::from(s.bits_per_pixel);
            if declared > expected {
                return Err(ParseError::DataFieldTooLong(declared, expected));
            }
        }
        let len = declared.div_ceil(8);
        let mut buf = Vec::new();
        (&mut self.reader).take(len).read_to_end(&mut buf)?;
        if (buf.len() as u64) < len {
            return Err(ParseError::UnexpectedEndOfData(buf.len()));
        }
        Ok(buf)
    }
}

fn open<P: AsRef<Path>>(path: P) -> Result<HritReader<BufReader<File>>, XritError> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|e| XritError::at(path, e))?;
    Ok(HritReader::new(BufReader::new(f)))
}

/// Reads only the header records of the file at `path`.
pub fn read_file_header<P: AsRef<Path>>(path: P) -> Result<SegmentHeader, XritError> {
    let path = path.as_ref();
    open(path)?
        .read_header()
        .map_err(|e| XritError::at(path, e))
}

/// Reads header records and data field of the file at `path`.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<(SegmentHeader, Vec<u8>), XritError> {
    let path = path.as_ref();
    let mut reader = open(path)?;
    let header = reader.read_header().map_err(|e| XritError::at(path, e))?;
    let data = reader
        .read_data_field(&header)
        .map_err(|e| XritError::at(path, e))?;
    Ok((header, data))
}
