use std::path::PathBuf;

use log::debug;

use crate::{error::*, header, stream::unpack_samples};

/// Provider of segment pixel payloads, addressed by 0-based segment index.
pub trait SegmentSource {
    fn segment_count(&self) -> usize;

    /// Whether segment `index` exists. Absent segments are never loaded.
    fn is_present(&self, index: usize) -> bool;

    /// Loads the raw samples of a present segment.
    fn load(&mut self, index: usize) -> Result<Vec<u16>, XritError>;
}

/// Shape every segment of a product must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentShape {
    pub columns: u16,
    pub lines: u16,
    pub bits_per_pixel: u8,
}

impl SegmentShape {
    pub fn pixels(&self) -> usize {
        usize::from(self.columns) * usize::from(self.lines)
    }
}

/// Reads segments from the files found by [`crate::locate`].
pub struct FileSegmentSource {
    paths: Vec<Option<PathBuf>>,
    shape: SegmentShape,
}

impl FileSegmentSource {
    pub fn new(paths: Vec<Option<PathBuf>>, shape: SegmentShape) -> Self {
        Self { paths, shape }
    }
}

impl SegmentSource for FileSegmentSource {
    fn segment_count(&self) -> usize {
        self.paths.len()
    }

    fn is_present(&self, index: usize) -> bool {
        matches!(self.paths.get(index), Some(Some(_)))
    }

    fn load(&mut self, index: usize) -> Result<Vec<u16>, XritError> {
        let Some(Some(path)) = self.paths.get(index) else {
            return Err(XritError::InvalidValueError(format!(
                "segment {index} is not available"
            )));
        };
        let (header, data) = header::read_file(path)?;
        header
            .check_image_data()
            .map_err(|e| XritError::at(path, e))?;

        let structure = header.image_structure()?;
        let shape = SegmentShape {
            columns: structure.columns,
            lines: structure.lines,
            bits_per_pixel: structure.bits_per_pixel,
        };
        if shape != self.shape {
            let e = FormatError::GeometryMismatch(format!(
                "expected {:?}, found {shape:?}",
                self.shape
            ));
            return Err(XritError::at(path, e));
        }

        unpack_samples(&data, shape.bits_per_pixel, shape.pixels())
            .map_err(|e| XritError::at(path, e))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheState {
    Empty,
    Holding(usize),
}

/// Single-slot segment cache.
///
/// At most one segment payload is held at a time; asking for a different
/// segment drops the held one before loading the new one. Row-major access
/// visits each segment's pixels contiguously, so this is enough for
/// line-by-line assembly.
pub struct SegmentCache<S> {
    source: S,
    state: CacheState,
    samples: Vec<u16>,
    loads: usize,
}

impl<S: SegmentSource> SegmentCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: CacheState::Empty,
            samples: Vec::new(),
            loads: 0,
        }
    }

    /// Returns the samples of segment `index`, or `None` when the segment is
    /// out of range or absent.
    pub fn segment(&mut self, index: usize) -> Result<Option<&[u16]>, XritError> {
        if index >= self.source.segment_count() || !self.source.is_present(index) {
            return Ok(None);
        }
        if self.state != CacheState::Holding(index) {
            self.load(index)?;
        }
        Ok(Some(&self.samples))
    }

    fn load(&mut self, index: usize) -> Result<(), XritError> {
        self.state = CacheState::Empty;
        self.samples = Vec::new();

        debug!("loading segment {index}");
        self.samples = self.source.load(index)?;
        self.state = CacheState::Holding(index);
        self.loads += 1;
        Ok(())
    }

    pub fn state(&self) -> CacheState {
        self.state
    }

    /// Number of segment loads performed so far.
    pub fn load_count(&self) -> usize {
        self.loads
    }
}
