//! MSG Level 1.5 prologue and epilogue records.
//!
//! Only the fields needed to decode and calibrate image segments are read.
//! Their positions inside the prologue and epilogue data fields are kept
//! together in [`layout`].

use std::path::Path;

use log::warn;

use crate::{
    codetables::Channel,
    error::*,
    header::{self, file_type},
    helpers::{ensure_len, read_as},
    time::UtcDateTime,
};

/// Byte offsets of the fields read from the prologue and epilogue data
/// fields.
pub mod layout {
    /// Spacecraft id (HRIT code) in the satellite status record.
    pub const SATELLITE_ID: usize = 0;
    /// True repeat cycle start, CDS expanded time (days, milliseconds).
    pub const TRUE_REPEAT_CYCLE_START: usize = 60134;
    /// Longitude of the sub-satellite point, `f32` degrees.
    pub const LONGITUDE_OF_SSP: usize = 386893;
    /// Planned HRV coverage, 8 x `i32`.
    pub const PLANNED_COVERAGE_HRV: usize = 386947;
    /// Level 1.5 image calibration, 12 x (slope `f64`, offset `f64`).
    pub const LEVEL15_IMAGE_CALIBRATION: usize = 387065;
    pub const CALIBRATION_RECORD_SIZE: usize = 16;
    pub const PROLOGUE_LENGTH: usize = LEVEL15_IMAGE_CALIBRATION + 12 * CALIBRATION_RECORD_SIZE;

    /// Actual Level 1.5 HRV coverage in the epilogue, 8 x `i32`.
    pub const ACTUAL_COVERAGE_HRV: usize = 308;
    pub const EPILOGUE_LENGTH: usize = ACTUAL_COVERAGE_HRV + 32;
}

/// Line and column bounds of the two HRV half-images, 1-based and counted
/// in the native (south-up, east-left) frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HrvCoverage {
    pub lower_south_line: i32,
    pub lower_north_line: i32,
    pub lower_east_column: i32,
    pub lower_west_column: i32,
    pub upper_south_line: i32,
    pub upper_north_line: i32,
    pub upper_east_column: i32,
    pub upper_west_column: i32,
}

impl HrvCoverage {
    fn from_buf(buf: &[u8], start: usize) -> Self {
        let at = |i: usize| read_as!(i32, buf, start + 4 * i);
        Self {
            lower_south_line: at(0),
            lower_north_line: at(1),
            lower_east_column: at(2),
            lower_west_column: at(3),
            upper_south_line: at(4),
            upper_north_line: at(5),
            upper_east_column: at(6),
            upper_west_column: at(7),
        }
    }

    fn write_to(&self, buf: &mut [u8], start: usize) {
        let values = [
            self.lower_south_line,
            self.lower_north_line,
            self.lower_east_column,
            self.lower_west_column,
            self.upper_south_line,
            self.upper_north_line,
            self.upper_east_column,
            self.upper_west_column,
        ];
        for (i, v) in values.iter().enumerate() {
            let pos = start + 4 * i;
            buf[pos..pos + 4].copy_from_slice(&v.to_be_bytes());
        }
    }
}

/// Content of the prologue of one product.
#[derive(Debug, Clone, PartialEq)]
pub struct Prologue {
    /// HRIT spacecraft code
    pub satellite_id: u16,
    pub acquisition_time: UtcDateTime,
    pub sub_satellite_longitude: f32,
    pub planned_hrv_coverage: HrvCoverage,
    pub radiometric_processing: RadiometricProcessing,
}

impl Prologue {
    pub fn from_data_field(buf: &[u8]) -> Result<Self, XritError> {
        ensure_len(buf, layout::PROLOGUE_LENGTH)?;

        let satellite_id = read_as!(u16, buf, layout::SATELLITE_ID);
        let days = read_as!(u16, buf, layout::TRUE_REPEAT_CYCLE_START);
        let millis = read_as!(u32, buf, layout::TRUE_REPEAT_CYCLE_START + 2);

        let mut coefficients = [(0.0, 0.0); 12];
        for (i, c) in coefficients.iter_mut().enumerate() {
            let pos = layout::LEVEL15_IMAGE_CALIBRATION + i * layout::CALIBRATION_RECORD_SIZE;
            *c = (read_as!(f64, buf, pos), read_as!(f64, buf, pos + 8));
        }

        Ok(Self {
            satellite_id,
            acquisition_time: UtcDateTime::from_cds(days, millis)?,
            sub_satellite_longitude: read_as!(f32, buf, layout::LONGITUDE_OF_SSP),
            planned_hrv_coverage: HrvCoverage::from_buf(buf, layout::PLANNED_COVERAGE_HRV),
            radiometric_processing: RadiometricProcessing {
                satellite_id,
                coefficients,
            },
        })
    }

    /// Reads the prologue file at `path`.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, XritError> {
        let path = path.as_ref();
        let data = read_data_field(path, file_type::PROLOGUE)?;
        Self::from_data_field(&data).map_err(|e| XritError::at(path, e))
    }

    /// Encodes the fields known to this crate into a prologue data field.
    /// Everything else is left zeroed.
    pub(crate) fn to_data_field(&self) -> Result<Vec<u8>, XritError> {
        let mut buf = vec![0; layout::PROLOGUE_LENGTH];
        let (days, millis) = self.acquisition_time.to_cds()?;

        buf[layout::SATELLITE_ID..layout::SATELLITE_ID + 2]
            .copy_from_slice(&self.satellite_id.to_be_bytes());
        let pos = layout::TRUE_REPEAT_CYCLE_START;
        buf[pos..pos + 2].copy_from_slice(&days.to_be_bytes());
        buf[pos + 2..pos + 6].copy_from_slice(&millis.to_be_bytes());
        let pos = layout::LONGITUDE_OF_SSP;
        buf[pos..pos + 4].copy_from_slice(&self.sub_satellite_longitude.to_be_bytes());
        self.planned_hrv_coverage
            .write_to(&mut buf, layout::PLANNED_COVERAGE_HRV);
        for (i, (slope, offset)) in self.radiometric_processing.coefficients.iter().enumerate() {
            let pos = layout::LEVEL15_IMAGE_CALIBRATION + i * layout::CALIBRATION_RECORD_SIZE;
            buf[pos..pos + 8].copy_from_slice(&slope.to_be_bytes());
            buf[pos + 8..pos + 16].copy_from_slice(&offset.to_be_bytes());
        }
        Ok(buf)
    }
}

/// Content of the epilogue of one product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Epilogue {
    pub actual_hrv_coverage: HrvCoverage,
}

impl Epilogue {
    pub fn from_data_field(buf: &[u8]) -> Result<Self, XritError> {
        ensure_len(buf, layout::EPILOGUE_LENGTH)?;
        Ok(Self {
            actual_hrv_coverage: HrvCoverage::from_buf(buf, layout::ACTUAL_COVERAGE_HRV),
        })
    }

    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, XritError> {
        let path = path.as_ref();
        let data = read_data_field(path, file_type::EPILOGUE)?;
        Self::from_data_field(&data).map_err(|e| XritError::at(path, e))
    }

    pub(crate) fn to_data_field(&self) -> Vec<u8> {
        let mut buf = vec![0; layout::EPILOGUE_LENGTH];
        self.actual_hrv_coverage
            .write_to(&mut buf, layout::ACTUAL_COVERAGE_HRV);
        buf
    }
}

fn read_data_field(path: &Path, expected_type: u8) -> Result<Vec<u8>, XritError> {
    let (header, data) = header::read_file(path)?;
    if header.primary.file_type_code != expected_type {
        return Err(XritError::at(
            path,
            ParseError::UnexpectedFileType(header.primary.file_type_code),
        ));
    }
    Ok(data)
}

/// Planck function constants for radiances in mW m-2 sr-1 (cm-1)-1.
const C1: f64 = 1.19104e-5;
const C2: f64 = 1.43877;

/// Central wavenumber and band correction coefficients of one thermal
/// channel: `(vc, A, B)`.
type ThermalCoefficients = (f64, f64, f64);

/// Coefficients for channels IR 3.9 to IR 13.4 of MSG-1 to MSG-4.
const THERMAL_COEFFICIENTS: [[ThermalCoefficients; 8]; 4] = [
    [
        (2567.330, 0.9956, 3.410),
        (1598.103, 0.9962, 2.218),
        (1362.081, 0.9991, 0.478),
        (1149.069, 0.9996, 0.179),
        (1034.343, 0.9999, 0.060),
        (930.647, 0.9983, 0.625),
        (839.660, 0.9988, 0.397),
        (752.387, 0.9981, 0.578),
    ],
    [
        (2568.832, 0.9954, 3.438),
        (1600.548, 0.9963, 2.185),
        (1360.330, 0.9991, 0.470),
        (1148.620, 0.9996, 0.179),
        (1035.289, 0.9999, 0.056),
        (931.700, 0.9983, 0.640),
        (836.445, 0.9988, 0.408),
        (751.792, 0.9981, 0.561),
    ],
    [
        (2547.771, 0.9915, 2.9002),
        (1595.621, 0.9960, 2.0337),
        (1360.377, 0.9991, 0.4340),
        (1148.130, 0.9996, 0.1714),
        (1034.715, 0.9999, 0.0527),
        (929.842, 0.9983, 0.6084),
        (838.659, 0.9988, 0.3882),
        (750.653, 0.9982, 0.5390),
    ],
    [
        (2555.280, 0.9916, 2.9438),
        (1596.080, 0.9959, 2.0780),
        (1361.748, 0.9990, 0.4929),
        (1147.433, 0.9996, 0.1731),
        (1034.851, 0.9998, 0.0597),
        (931.122, 0.9983, 0.6256),
        (839.113, 0.9988, 0.4002),
        (748.585, 0.9981, 0.5635),
    ],
];

/// Radiometric processing derived from the Level 1.5 image calibration
/// record of a prologue.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiometricProcessing {
    /// HRIT spacecraft code, selecting the thermal channel coefficients
    pub satellite_id: u16,
    /// `(Cal_Slope, Cal_Offset)` for channels 1 to 12
    pub coefficients: [(f64, f64); 12],
}

impl RadiometricProcessing {
    /// Returns `(slope, offset, is_linear)` for `channel`.
    ///
    /// The transform is linear, and hence storable as scaled integers, only
    /// for the reflective channels; thermal channels go through the inverse
    /// Planck function.
    pub fn slope_offset(&self, channel: Channel) -> (f64, f64, bool) {
        let (slope, offset) = self.coefficients[channel.index()];
        (slope, offset, channel.is_reflective())
    }

    /// Builds the lookup table mapping every raw count representable in
    /// `bpp` bits to a physical value: radiance for reflective channels and
    /// brightness temperature in kelvin for thermal channels.
    ///
    /// Count 0 is the no-data marker and maps to NaN, as do counts whose
    /// radiance is not positive on thermal channels.
    pub fn calibration_table(&self, channel: Channel, bpp: u8) -> Result<Vec<f32>, FormatError> {
        if !(1..=16).contains(&bpp) {
            return Err(FormatError::UnsupportedBitsPerPixel(bpp));
        }
        let (slope, offset) = self.coefficients[channel.index()];
        let thermal = if channel.is_reflective() {
            None
        } else {
            Some(self.thermal_coefficients(channel))
        };

        let size = 1usize << bpp;
        let mut table = Vec::with_capacity(size);
        table.push(f32::NAN);
        for count in 1..size {
            let radiance = offset + slope * count as f64;
            let value = match thermal {
                None => radiance,
                Some(_) if radiance <= 0.0 => f64::NAN,
                Some((vc, a, b)) => brightness_temperature(radiance, vc, a, b),
            };
            table.push(value as f32);
        }
        Ok(table)
    }

    fn thermal_coefficients(&self, channel: Channel) -> ThermalCoefficients {
        let satellite = match self.satellite_id {
            321 => 0,
            322 => 1,
            323 => 2,
            324 => 3,
            id => {
                warn!("no thermal coefficients for spacecraft {id}, using those of MSG-2");
                1
            }
        };
        THERMAL_COEFFICIENTS[satellite][channel.index() - 3]
    }
}

fn brightness_temperature(radiance: f64, vc: f64, a: f64, b: f64) -> f64 {
    (C2 * vc / (1.0 + C1 * vc.powi(3) / radiance).ln() - b) / a
}
