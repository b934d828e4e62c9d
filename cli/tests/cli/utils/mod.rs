use std::{
    fs::File,
    io::{self, BufReader, Read},
};

use tempfile::TempDir;
use xrit::{
    Epilogue, HrvCoverage, ProductName, ProductWriter, Prologue, RadiometricProcessing,
    SegmentIdentification, UtcDateTime, codetables::Channel,
};

/// A small product written into a temporary directory: 4 x 4 pixels in two
/// segments of 4 x 2.
pub(crate) struct TestProduct {
    pub(crate) dir: TempDir,
    pub(crate) name: ProductName,
}

impl TestProduct {
    /// Pseudo file name to pass on the command line.
    pub(crate) fn arg(&self) -> String {
        self.name.to_string()
    }
}

/// Writes a product of `channel` with the segments listed in `sequences`.
/// Segment `s` holds the counts `10 * s`, `10 * s + 1`, ... in native order.
pub(crate) fn product(
    channel: Channel,
    sequences: &[u16],
) -> Result<TestProduct, Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let name = ProductName::new(dir.path(), "H", "MSG2", channel.product_name(), "200611141200")?;
    let time = UtcDateTime::new(2006, 11, 14, 12, 0, 0);
    let writer = ProductWriter {
        name: name.clone(),
        spacecraft_id: 322,
        channel,
        bits_per_pixel: 10,
        segment_columns: 4,
        segment_lines: 2,
        planned_end_segment: 2,
        column_factor: -13642337,
        line_factor: -13642337,
        column_offset: 2,
        line_offset: 2,
        sub_satellite_longitude: 0.0,
        time,
        data_field_format: SegmentIdentification::NATIVE_FORMAT,
    };

    let mut coefficients = [(0.2, -10.2); 12];
    coefficients[0] = (0.5, -1.0);
    writer.write_prologue(&Prologue {
        satellite_id: 322,
        acquisition_time: time,
        sub_satellite_longitude: 0.0,
        planned_hrv_coverage: HrvCoverage::default(),
        radiometric_processing: RadiometricProcessing {
            satellite_id: 322,
            coefficients,
        },
    })?;
    writer.write_epilogue(&Epilogue {
        actual_hrv_coverage: HrvCoverage::default(),
    })?;
    for sequence in sequences {
        let samples = (0..8).map(|o| sequence * 10 + o).collect::<Vec<_>>();
        writer.write_segment(*sequence, &samples)?;
    }
    Ok(TestProduct { dir, name })
}

pub(crate) fn ir108() -> Result<TestProduct, Box<dyn std::error::Error>> {
    product(Channel::Ir108, &[1, 2])
}

pub(crate) fn cat_as_bytes(file_name: &str) -> Result<Vec<u8>, io::Error> {
    let mut buf = Vec::new();

    let f = File::open(file_name)?;
    let mut f = BufReader::new(f);
    f.read_to_end(&mut buf)?;

    Ok(buf)
}
