use num::ToPrimitive;

use crate::error::*;

/// Types pixel samples can be stored as.
pub trait Sample: ToPrimitive + Copy {
    /// Whether this value marks a pixel without data.
    fn is_missing(self) -> bool;
}

macro_rules! impl_sample_for_unsigned {
    ($($ty:ty),*) => ($(
        impl Sample for $ty {
            fn is_missing(self) -> bool {
                self == 0
            }
        }
    )*);
}

impl_sample_for_unsigned!(u8, u16, u32);

impl Sample for f32 {
    fn is_missing(self) -> bool {
        self.is_nan()
    }
}

/// Pixel storage, chosen once per image.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    /// Values already calibrated, apart from the offset
    F32(Vec<f32>),
}

impl Samples {
    /// Storage for `len` raw counts of `bpp` bits, initialised to the missing
    /// marker.
    pub fn raw(bpp: u8, len: usize) -> Self {
        match bpp {
            0..=8 => Self::U8(vec![0; len]),
            9..=16 => Self::U16(vec![0; len]),
            _ => Self::U32(vec![0; len]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, indices: impl Iterator<Item = usize>) -> Self {
        match self {
            Self::U8(v) => Self::U8(indices.map(|i| v[i]).collect()),
            Self::U16(v) => Self::U16(indices.map(|i| v[i]).collect()),
            Self::U32(v) => Self::U32(indices.map(|i| v[i]).collect()),
            Self::F32(v) => Self::F32(indices.map(|i| v[i]).collect()),
        }
    }
}

#[inline]
fn scale<T: Sample>(v: T, slope: f64, offset: f64, missing: f32) -> f32 {
    if v.is_missing() {
        return missing;
    }
    match v.to_f64() {
        Some(v) => (v * slope + offset) as f32,
        None => missing,
    }
}

/// Pixel buffer of an image together with its scaling.
///
/// The physical value of a pixel is `stored * slope + offset`. Raw counts
/// use 0 as missing marker; prescaled values use NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub columns: usize,
    pub lines: usize,
    pub slope: f64,
    pub offset: f64,
    pub bpp: u8,
    /// Whether scaled values can be turned into integers at
    /// [`ImageData::decimal_digits_of_scaled_values`] digits without loss
    pub scales_to_int: bool,
    pub missing_value: f32,
    samples: Samples,
}

/// Decimal digits kept for values that do not scale to integers.
const PRESCALED_DIGITS: i32 = 2;

impl ImageData {
    /// Wraps raw counts; `scales_to_int` is derived from slope and offset.
    pub fn with_raw_counts(
        columns: usize,
        lines: usize,
        samples: Samples,
        bpp: u8,
        slope: f64,
        offset: f64,
    ) -> Result<Self, XritError> {
        if matches!(samples, Samples::F32(_)) {
            return Err(XritError::InvalidValueError(
                "raw counts must be stored as integers".to_owned(),
            ));
        }
        Self::new(columns, lines, samples, bpp, slope, offset)
            .map(|d| Self {
                scales_to_int: scales_to_int(slope, offset),
                ..d
            })
    }

    /// Wraps calibrated values from which `offset` has been subtracted.
    pub fn prescaled(
        columns: usize,
        lines: usize,
        values: Vec<f32>,
        offset: f64,
    ) -> Result<Self, XritError> {
        Self::new(columns, lines, Samples::F32(values), 32, 1.0, offset)
    }

    fn new(
        columns: usize,
        lines: usize,
        samples: Samples,
        bpp: u8,
        slope: f64,
        offset: f64,
    ) -> Result<Self, XritError> {
        if samples.len() != columns * lines {
            return Err(XritError::InvalidValueError(format!(
                "{} samples cannot fill {columns} x {lines} pixels",
                samples.len()
            )));
        }
        Ok(Self {
            columns,
            lines,
            slope,
            offset,
            bpp,
            scales_to_int: false,
            missing_value: f32::NAN,
            samples,
        })
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn is_prescaled(&self) -> bool {
        matches!(self.samples, Samples::F32(_))
    }

    /// Physical value at `(column, line)`, or the missing value.
    pub fn scaled(&self, column: usize, line: usize) -> f32 {
        let i = line * self.columns + column;
        let (slope, offset, missing) = (self.slope, self.offset, self.missing_value);
        match &self.samples {
            Samples::U8(v) => scale(v[i], slope, offset, missing),
            Samples::U16(v) => scale(v[i], slope, offset, missing),
            Samples::U32(v) => scale(v[i], slope, offset, missing),
            Samples::F32(v) => scale(v[i], slope, offset, missing),
        }
    }

    /// Stored count at `(column, line)` for raw-count storage.
    pub fn raw(&self, column: usize, line: usize) -> Option<u32> {
        let i = line * self.columns + column;
        match &self.samples {
            Samples::U8(v) => Some(u32::from(v[i])),
            Samples::U16(v) => Some(u32::from(v[i])),
            Samples::U32(v) => Some(v[i]),
            Samples::F32(_) => None,
        }
    }

    /// All physical values in row-major order.
    pub fn all_scaled(&self) -> Vec<f32> {
        (0..self.lines)
            .flat_map(|l| (0..self.columns).map(move |c| (c, l)))
            .map(|(c, l)| self.scaled(c, l))
            .collect()
    }

    /// Copies out the `width` x `height` rectangle starting at `(x, y)`.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> Result<Self, XritError> {
        if x + width > self.columns || y + height > self.lines {
            return Err(XritError::InvalidValueError(format!(
                "area {width}x{height}+{x}+{y} exceeds {}x{} image",
                self.columns, self.lines
            )));
        }
        let columns = self.columns;
        let indices = (y..y + height).flat_map(|l| (x..x + width).map(move |c| l * columns + c));
        Ok(Self {
            columns: width,
            lines: height,
            samples: self.samples.select(indices),
            ..*self
        })
    }

    /// Number of decimal digits needed to represent scaled values as
    /// integers.
    pub fn decimal_digits_of_scaled_values(&self) -> i32 {
        if self.is_prescaled() || self.slope <= 0.0 {
            return PRESCALED_DIGITS;
        }
        let digits = -self.slope.log10();
        let digits = if self.scales_to_int {
            digits.round() as i32
        } else {
            digits.ceil() as i32 + 1
        };
        digits.max(0)
    }

    /// Scaled value at `(column, line)` as an integer in units of
    /// `10^-digits`, `None` for missing pixels.
    pub fn quantized(&self, column: usize, line: usize) -> Option<i64> {
        let v = self.scaled(column, line);
        if v.is_nan() || v == self.missing_value {
            return None;
        }
        let factor = 10f64.powi(self.decimal_digits_of_scaled_values());
        Some((f64::from(v) * factor).round() as i64)
    }
}

/// Whether `raw * slope + offset` is an integer multiple of a power of ten
/// for every integer `raw`.
fn scales_to_int(slope: f64, offset: f64) -> bool {
    if slope <= 0.0 || !slope.is_finite() || !offset.is_finite() {
        return false;
    }
    let digits = (-slope.log10()).round();
    let factor = 10f64.powf(digits);
    let is_int = |v: f64| (v - v.round()).abs() < 1e-6;
    is_int(slope * factor) && is_int(offset * factor)
}
