//! Finding the files making up one xRIT product.
//!
//! xRIT file names look like
//! `H-000-MSG2__-MSG2________-IR_108___-000001___-200611141200-C_`, that is
//! `<resolution>-???-??????-<product id 1>-<product id 2>-<sequence>-<timing>-<scan>`
//! with identifiers padded with underscores. Prologue and epilogue files use
//! `PRO______` and `EPI______` as sequence and `_` as product id 2.

use std::{
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
    str::FromStr,
};

use log::{debug, info, warn};

use crate::{
    error::*,
    header::{self, SegmentHeader},
    helpers::underscore_padded,
};

const PRODUCT_ID1_WIDTH: usize = 12;
const PRODUCT_ID2_WIDTH: usize = 9;
const SEGMENT_SEQUENCE_WILDCARD: &str = "0?????___";
const PROLOGUE_SEQUENCE: &str = "PRO______";
const EPILOGUE_SEQUENCE: &str = "EPI______";
const SCAN_WILDCARD: &str = "?_";

/// Identification of one product, written as the pseudo file name
/// `<directory>/<resolution>:<product id 1>:<product id 2>:<timing>`, for
/// example `/data/H:MSG2:IR_108:200611141200`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductName {
    pub directory: PathBuf,
    pub resolution: String,
    pub product_id1: String,
    pub product_id2: String,
    pub timing: String,
}

impl ProductName {
    pub fn new(
        directory: impl Into<PathBuf>,
        resolution: &str,
        product_id1: &str,
        product_id2: &str,
        timing: &str,
    ) -> Result<Self, XritError> {
        let name = Self {
            directory: directory.into(),
            resolution: resolution.to_owned(),
            product_id1: product_id1.to_owned(),
            product_id2: product_id2.to_owned(),
            timing: timing.to_owned(),
        };
        name.validate()?;
        Ok(name)
    }

    fn validate(&self) -> Result<(), XritError> {
        let fields = [
            ("resolution", &self.resolution, 1),
            ("product id 1", &self.product_id1, PRODUCT_ID1_WIDTH),
            ("product id 2", &self.product_id2, PRODUCT_ID2_WIDTH),
            ("timing", &self.timing, 12),
        ];
        for (what, value, max_len) in fields {
            if value.is_empty() {
                return Err(XritError::ConfigError(format!("missing {what}")));
            }
            if value.len() > max_len {
                return Err(XritError::ConfigError(format!(
                    "{what} '{value}' is longer than {max_len} characters"
                )));
            }
            if value.contains(['/', '*', '?', '[', ']', '-']) {
                return Err(XritError::ConfigError(format!(
                    "{what} '{value}' contains characters not allowed in file names"
                )));
            }
        }
        Ok(())
    }

    fn pattern(&self, product_id2: &str, sequence: &str) -> String {
        let directory = glob::Pattern::escape(&self.directory.to_string_lossy());
        let file_name = format!(
            "{}-???-??????-{}-{}-{}-{}-{}",
            self.resolution,
            underscore_padded(&self.product_id1, PRODUCT_ID1_WIDTH),
            underscore_padded(product_id2, PRODUCT_ID2_WIDTH),
            sequence,
            self.timing,
            SCAN_WILDCARD,
        );
        Path::new(&directory)
            .join(file_name)
            .to_string_lossy()
            .into_owned()
    }

    pub fn prologue_pattern(&self) -> String {
        self.pattern("_", PROLOGUE_SEQUENCE)
    }

    pub fn epilogue_pattern(&self) -> String {
        self.pattern("_", EPILOGUE_SEQUENCE)
    }

    pub fn segments_pattern(&self) -> String {
        self.pattern(&self.product_id2, SEGMENT_SEQUENCE_WILDCARD)
    }

    /// Name of the segment file with sequence number `sequence`, as written
    /// by [`crate::writer`].
    pub fn segment_file_name(&self, sequence: u16) -> String {
        self.file_name(&self.product_id2, &format!("{sequence:06}___"))
    }

    pub fn prologue_file_name(&self) -> String {
        self.file_name("_", PROLOGUE_SEQUENCE)
    }

    pub fn epilogue_file_name(&self) -> String {
        self.file_name("_", EPILOGUE_SEQUENCE)
    }

    fn file_name(&self, product_id2: &str, sequence: &str) -> String {
        format!(
            "{}-000-{}-{}-{}-{}-{}-C_",
            self.resolution,
            underscore_padded(&self.product_id1, 6),
            underscore_padded(&self.product_id1, PRODUCT_ID1_WIDTH),
            underscore_padded(product_id2, PRODUCT_ID2_WIDTH),
            sequence,
            self.timing,
        )
    }
}

impl FromStr for ProductName {
    type Err = XritError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (directory, product) = match s.rfind('/') {
            Some(pos) => (&s[..pos.max(1)], &s[pos + 1..]),
            None => (".", s),
        };
        let parts = product.split(':').collect::<Vec<_>>();
        let [resolution, product_id1, product_id2, timing] = parts[..] else {
            return Err(XritError::ConfigError(format!(
                "'{s}' is not of the form <directory>/<resolution>:<product id 1>:<product id 2>:<timing>"
            )));
        };
        Self::new(directory, resolution, product_id1, product_id2, timing)
    }
}

impl Display for ProductName {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}/{}:{}:{}:{}",
            self.directory.display(),
            self.resolution,
            self.product_id1,
            self.product_id2,
            self.timing
        )
    }
}

/// Files found on disk for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedProduct {
    pub name: ProductName,
    pub prologue: PathBuf,
    pub epilogue: Option<PathBuf>,
    /// Segment files indexed by sequence number minus one; `None` for
    /// segments not found on disk.
    pub segments: Vec<Option<PathBuf>>,
    /// Header of the first segment found.
    pub first_header: SegmentHeader,
}

impl LocatedProduct {
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn present_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_some()).count()
    }

    /// Sequence numbers of the segments that were not found.
    pub fn missing_sequences(&self) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(i, _)| i + 1)
            .collect()
    }
}

fn glob_paths(pattern: &str) -> Result<Vec<PathBuf>, XritError> {
    let entries =
        glob::glob(pattern).map_err(|e| LocateError::BadPattern(format!("{pattern}: {e}")))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| XritError::at(e.path(), e.error()))?;
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

/// Finds prologue, epilogue and segment files of `name`.
///
/// Exactly one prologue must exist. Segments are ordered by the sequence
/// number read from their headers; gaps are left as `None`.
pub fn locate(name: &ProductName) -> Result<LocatedProduct, XritError> {
    let pattern = name.prologue_pattern();
    let mut prologues = glob_paths(&pattern)?;
    let prologue = match prologues.len() {
        0 => return Err(LocateError::NoSuchFile(pattern).into()),
        1 => prologues.remove(0),
        n => return Err(LocateError::NonUnivocalPrologue(pattern, n).into()),
    };

    let pattern = name.epilogue_pattern();
    let mut epilogues = glob_paths(&pattern)?;
    if epilogues.len() > 1 {
        warn!(
            "{} files match {pattern}, using {}",
            epilogues.len(),
            epilogues[0].display()
        );
    }
    let epilogue = (!epilogues.is_empty()).then(|| epilogues.remove(0));

    let pattern = name.segments_pattern();
    let paths = glob_paths(&pattern)?;
    if paths.is_empty() {
        return Err(LocateError::NoSuchSegments(pattern).into());
    }

    let mut headers = Vec::with_capacity(paths.len());
    for path in paths {
        let header = header::read_file_header(&path)?;
        let seq = header
            .segment_id()
            .map_err(|e| XritError::at(&path, e))?
            .sequence_number;
        headers.push((seq, path, header));
    }
    headers.sort_by_key(|(seq, _, _)| *seq);

    let total = headers
        .iter()
        .filter_map(|(_, _, h)| h.segment_id.as_ref())
        .map(|s| usize::from(s.planned_end_segment))
        .max()
        .unwrap_or(0);
    let mut segments: Vec<Option<PathBuf>> = vec![None; total];
    let mut first_header = None;
    for (seq, path, header) in headers {
        let index = usize::from(seq).wrapping_sub(1);
        match segments.get_mut(index) {
            None => warn!(
                "{}: sequence number {seq} outside 1..={total}, ignored",
                path.display()
            ),
            Some(Some(existing)) => warn!(
                "{}: duplicate sequence number {seq} (already found {}), ignored",
                path.display(),
                existing.display()
            ),
            Some(slot) => {
                debug!("segment {seq}: {}", path.display());
                *slot = Some(path);
                if first_header.is_none() {
                    first_header = Some(header);
                }
            }
        }
    }
    let first_header = first_header.ok_or_else(|| LocateError::NoSuchSegments(pattern.clone()))?;

    let product = LocatedProduct {
        name: name.clone(),
        prologue,
        epilogue,
        segments,
        first_header,
    };
    let missing = product.missing_sequences();
    if !missing.is_empty() {
        warn!("{name}: missing segments {missing:?}");
    }
    info!(
        "{name}: {} of {} segments found",
        product.present_count(),
        product.segment_count()
    );
    Ok(product)
}
