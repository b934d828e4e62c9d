use std::{
    fs,
    path::{Path, PathBuf},
};

use tempfile::TempDir;
use xrit::{
    Epilogue, HrvCoverage, ProductName, ProductWriter, Prologue, RadiometricProcessing,
    SegmentIdentification, UtcDateTime, XritError, codetables::Channel,
};

pub(crate) const COLUMNS: u16 = 16;
pub(crate) const SEGMENT_LINES: u16 = 4;
pub(crate) const SEGMENTS: u16 = 3;
pub(crate) const FRAME_LINES: usize = SEGMENT_LINES as usize * SEGMENTS as usize;

pub(crate) const HRV_COLUMNS: u16 = 5568;
pub(crate) const HRV_SEGMENT_LINES: u16 = 464;
pub(crate) const HRV_SEGMENTS: u16 = 24;

/// Raw count written at `offset` of the segment with sequence number
/// `sequence`. Never 0, so that present pixels can be told from missing ones.
pub(crate) fn sample_value(sequence: u16, offset: usize) -> u16 {
    ((usize::from(sequence) * 100 + offset) % 1000 + 1) as u16
}

pub(crate) fn segment_samples(writer: &ProductWriter, sequence: u16) -> Vec<u16> {
    let n = usize::from(writer.segment_columns) * usize::from(writer.segment_lines);
    (0..n).map(|o| sample_value(sequence, o)).collect()
}

/// Raw count expected at `(x, y)` of a decoded non-HRV frame with all
/// segments present.
pub(crate) fn expected_raw(x: usize, y: usize) -> u16 {
    let columns = usize::from(COLUMNS);
    let r = FRAME_LINES - 1 - y;
    let c = columns - 1 - x;
    let seglines = usize::from(SEGMENT_LINES);
    let sequence = (r / seglines + 1) as u16;
    sample_value(sequence, (r % seglines) * columns + c)
}

pub(crate) fn time() -> UtcDateTime {
    UtcDateTime::new(2006, 11, 14, 12, 0, 0)
}

pub(crate) fn radiometric_processing() -> RadiometricProcessing {
    let mut coefficients = [(0.2, -10.2); 12];
    coefficients[0] = (0.0234, -1.19);
    RadiometricProcessing {
        satellite_id: 322,
        coefficients,
    }
}

pub(crate) fn hrv_coverage() -> HrvCoverage {
    HrvCoverage {
        lower_south_line: 1,
        lower_north_line: 8128,
        lower_east_column: 1,
        lower_west_column: 5568,
        upper_south_line: 8129,
        upper_north_line: 11136,
        upper_east_column: 2233,
        upper_west_column: 7800,
    }
}

pub(crate) fn writer(directory: &Path, channel: Channel) -> Result<ProductWriter, XritError> {
    let name = ProductName::new(directory, "H", "MSG2", channel.product_name(), "200611141200")?;
    let (columns, lines, segments, factor) = if channel == Channel::Hrv {
        (HRV_COLUMNS, HRV_SEGMENT_LINES, HRV_SEGMENTS, -40927014)
    } else {
        (COLUMNS, SEGMENT_LINES, SEGMENTS, -13642337)
    };
    let frame_lines = i32::from(lines) * i32::from(segments);
    Ok(ProductWriter {
        name,
        spacecraft_id: 322,
        channel,
        bits_per_pixel: 10,
        segment_columns: columns,
        segment_lines: lines,
        planned_end_segment: segments,
        column_factor: factor,
        line_factor: factor,
        column_offset: i32::from(columns) / 2,
        line_offset: frame_lines / 2,
        sub_satellite_longitude: 0.0,
        time: time(),
        data_field_format: SegmentIdentification::NATIVE_FORMAT,
    })
}

/// A product written into its own temporary directory.
pub(crate) struct Product {
    pub(crate) dir: TempDir,
    pub(crate) writer: ProductWriter,
}

impl Product {
    /// Writes prologue, epilogue and the segments listed in `sequences`.
    pub(crate) fn write(channel: Channel, sequences: &[u16]) -> Result<Self, XritError> {
        let dir = TempDir::new().map_err(|e| XritError::ConfigError(e.to_string()))?;
        let writer = writer(dir.path(), channel)?;
        writer.write_prologue(&Prologue {
            satellite_id: 322,
            acquisition_time: time(),
            sub_satellite_longitude: 0.0,
            planned_hrv_coverage: hrv_coverage(),
            radiometric_processing: radiometric_processing(),
        })?;
        writer.write_epilogue(&Epilogue {
            actual_hrv_coverage: hrv_coverage(),
        })?;
        let product = Self { dir, writer };
        for sequence in sequences {
            product.write_segment(*sequence)?;
        }
        Ok(product)
    }

    /// Writes every planned segment of a non-HRV product.
    pub(crate) fn complete(channel: Channel) -> Result<Self, XritError> {
        Self::write(channel, &(1..=SEGMENTS).collect::<Vec<_>>())
    }

    pub(crate) fn write_segment(&self, sequence: u16) -> Result<PathBuf, XritError> {
        self.writer
            .write_segment(sequence, &segment_samples(&self.writer, sequence))
    }

    pub(crate) fn name(&self) -> &ProductName {
        &self.writer.name
    }

    pub(crate) fn path_of(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(file_name)
    }

    pub(crate) fn segment_path(&self, sequence: u16) -> PathBuf {
        self.path_of(&self.name().segment_file_name(sequence))
    }

    pub(crate) fn prologue_path(&self) -> PathBuf {
        self.path_of(&self.name().prologue_file_name())
    }

    /// Cuts the file at `path` down to `len` bytes.
    pub(crate) fn truncate(path: &Path, len: usize) -> std::io::Result<()> {
        let bytes = fs::read(path)?;
        fs::write(path, &bytes[..len.min(bytes.len())])
    }
}
