use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
    path::PathBuf,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum XritError {
    ConfigError(String),
    LocateError(LocateError),
    ParseError(ParseError),
    FormatError(FormatError),
    IoError(PathBuf, String),
    InvalidValueError(String),
    Cancelled,
}

impl Error for XritError {}

impl From<LocateError> for XritError {
    fn from(e: LocateError) -> Self {
        Self::LocateError(e)
    }
}

impl From<ParseError> for XritError {
    fn from(e: ParseError) -> Self {
        Self::ParseError(e)
    }
}

impl From<FormatError> for XritError {
    fn from(e: FormatError) -> Self {
        Self::FormatError(e)
    }
}

impl Display for XritError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::ConfigError(s) => write!(f, "Configuration error: {s}"),
            Self::LocateError(e) => write!(f, "{e}"),
            Self::ParseError(e) => write!(f, "{e}"),
            Self::FormatError(e) => write!(f, "{e}"),
            Self::IoError(path, s) => {
                write!(f, "cannot open/parse segment {}: {s}", path.display())
            }
            Self::InvalidValueError(s) => write!(f, "{s}"),
            Self::Cancelled => write!(f, "decoding cancelled"),
        }
    }
}

impl XritError {
    /// Attaches the path of the file being read to a low-level error.
    pub(crate) fn at<P: Into<PathBuf>>(path: P, e: impl Display) -> Self {
        Self::IoError(path.into(), e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocateError {
    NoSuchFile(String),
    NonUnivocalPrologue(String, usize),
    NoSuchSegments(String),
    BadPattern(String),
}

impl Error for LocateError {}

impl Display for LocateError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::NoSuchFile(pattern) => write!(f, "no such file {pattern}"),
            Self::NonUnivocalPrologue(pattern, n) => write!(
                f,
                "non-univocal prologue ({n} files match {pattern}): do not trust calibration"
            ),
            Self::NoSuchSegments(pattern) => write!(f, "no such file(s) {pattern}"),
            Self::BadPattern(s) => write!(f, "invalid file name pattern: {s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParseError {
    ReadError(String),
    UnexpectedEndOfData(usize),
    NotPrimaryHeader(u8),
    InvalidRecordLength(u8, u16),
    HeaderLengthMismatch(u32, usize),
    HeaderTooLong(u32),
    DataFieldTooLong(u64, u64),
    MissingRecord(&'static str),
    UnexpectedFileType(u8),
}

impl Error for ParseError {}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::ReadError(s) => write!(f, "Read error: {s}"),
            Self::UnexpectedEndOfData(i) => write!(f, "Unexpected end of data at {i}"),
            Self::NotPrimaryHeader(t) => {
                write!(f, "first header record has type {t}, expected primary header")
            }
            Self::InvalidRecordLength(t, len) => {
                write!(f, "header record of type {t} has invalid length {len}")
            }
            Self::HeaderLengthMismatch(declared, actual) => write!(
                f,
                "header records span {actual} bytes but {declared} were declared"
            ),
            Self::HeaderTooLong(len) => write!(f, "declared header length {len} is too long"),
            Self::DataFieldTooLong(declared, expected) => write!(
                f,
                "data field of {declared} bits declared, image records allow {expected}"
            ),
            Self::MissingRecord(name) => write!(f, "mandatory {name} record not found"),
            Self::UnexpectedFileType(code) => write!(f, "unexpected file type code {code}"),
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        Self::ReadError(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormatError {
    BinaryDump,
    Compressed(u8),
    UnsupportedBitsPerPixel(u8),
    UnknownChannel(u8),
    ShortPayload(usize, usize),
    GeometryMismatch(String),
    SampleOutOfRange(u32, usize),
    CalibrationTableTooSmall(usize, u8),
}

impl Error for FormatError {}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::BinaryDump => write!(f, "product dumped in binary format"),
            Self::Compressed(flag) => write!(
                f,
                "segment is compressed (flag {flag}); decompress it before decoding"
            ),
            Self::UnsupportedBitsPerPixel(n) => write!(f, "unsupported bits per pixel: {n}"),
            Self::UnknownChannel(id) => write!(f, "unknown spectral channel id {id}"),
            Self::ShortPayload(expected, actual) => write!(
                f,
                "pixel payload holds {actual} bytes, {expected} were expected"
            ),
            Self::GeometryMismatch(s) => write!(f, "segment geometry mismatch: {s}"),
            Self::SampleOutOfRange(v, len) => write!(
                f,
                "raw sample {v} is outside the calibration table of {len} entries"
            ),
            Self::CalibrationTableTooSmall(len, bpp) => write!(
                f,
                "calibration table of {len} entries cannot hold {bpp}-bit samples"
            ),
        }
    }
}
