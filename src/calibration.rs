use crate::{codetables::Channel, error::*, prologue::RadiometricProcessing};

/// Conversion of raw sample counts into physical values.
#[derive(Debug, Clone, PartialEq)]
pub enum Calibrator {
    /// Raw counts, no physical meaning attached
    Identity,
    /// `physical = raw * slope + offset`
    Linear { slope: f64, offset: f64 },
    /// `physical = table[raw] - base`, `table` holding at least `2^bpp`
    /// entries
    Table { table: Vec<f32>, base: f32 },
}

impl Calibrator {
    /// Builds a table calibrator, rejecting tables that cannot hold every
    /// `bpp`-bit count.
    pub fn from_table(table: Vec<f32>, bpp: u8, base: f32) -> Result<Self, FormatError> {
        let needed = 1usize.checked_shl(u32::from(bpp)).unwrap_or(usize::MAX);
        if table.len() < needed {
            return Err(FormatError::CalibrationTableTooSmall(table.len(), bpp));
        }
        Ok(Self::Table { table, base })
    }

    /// Chooses the calibration of `channel` from the prologue's radiometric
    /// processing: linear for reflective channels, a brightness temperature
    /// table for thermal channels.
    pub fn for_channel(
        processing: &RadiometricProcessing,
        channel: Channel,
        bpp: u8,
    ) -> Result<Self, FormatError> {
        let (slope, offset, is_linear) = processing.slope_offset(channel);
        if is_linear {
            Ok(Self::Linear { slope, offset })
        } else {
            let table = processing.calibration_table(channel, bpp)?;
            Self::from_table(table, bpp, channel.calibration_base())
        }
    }

    /// Whether the output keeps raw counts, with calibration expressed as
    /// slope and offset.
    pub fn keeps_raw_counts(&self) -> bool {
        !matches!(self, Self::Table { .. })
    }

    /// Slope and offset turning stored values into physical values.
    pub fn slope_offset(&self) -> (f64, f64) {
        match self {
            Self::Identity => (1.0, 0.0),
            Self::Linear { slope, offset } => (*slope, *offset),
            Self::Table { base, .. } => (1.0, f64::from(*base)),
        }
    }

    pub fn calibrate(&self, raw: u16) -> Result<f32, FormatError> {
        match self {
            Self::Identity => Ok(f32::from(raw)),
            Self::Linear { slope, offset } => Ok((f64::from(raw) * slope + offset) as f32),
            Self::Table { table, base } => table
                .get(usize::from(raw))
                .map(|v| v - base)
                .ok_or(FormatError::SampleOutOfRange(u32::from(raw), table.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_calibration() {
        let calibrator = Calibrator::Linear {
            slope: 0.5,
            offset: -2.0,
        };
        assert_eq!(calibrator.calibrate(10), Ok(3.0));
        assert!(calibrator.keeps_raw_counts());
        assert_eq!(calibrator.slope_offset(), (0.5, -2.0));
    }

    #[test]
    fn table_calibration_subtracts_base() {
        let table = (0..4).map(|v| v as f32 * 100.0).collect::<Vec<_>>();
        let calibrator = Calibrator::from_table(table, 2, 145.0).unwrap();
        assert_eq!(calibrator.calibrate(3), Ok(155.0));
        assert!(!calibrator.keeps_raw_counts());
        assert_eq!(calibrator.slope_offset(), (1.0, 145.0));
    }

    #[test]
    fn sample_outside_table_is_an_error() {
        let calibrator = Calibrator::Table {
            table: vec![0.0; 4],
            base: 0.0,
        };
        assert_eq!(
            calibrator.calibrate(4),
            Err(FormatError::SampleOutOfRange(4, 4))
        );
    }

    #[test]
    fn short_table_is_rejected() {
        assert_eq!(
            Calibrator::from_table(vec![0.0; 1023], 10, 0.0),
            Err(FormatError::CalibrationTableTooSmall(1023, 10))
        );
    }

    #[test]
    fn channel_selects_calibration_mode() {
        let processing = RadiometricProcessing {
            satellite_id: 322,
            coefficients: [(0.25, -5.0); 12],
        };
        assert_eq!(
            Calibrator::for_channel(&processing, Channel::Vis008, 10),
            Ok(Calibrator::Linear {
                slope: 0.25,
                offset: -5.0
            })
        );
        let calibrator = Calibrator::for_channel(&processing, Channel::Wv062, 10).unwrap();
        match calibrator {
            Calibrator::Table { table, base } => {
                assert_eq!(table.len(), 1024);
                assert_eq!(base, 145.0);
            }
            _ => panic!("thermal channel must use a table"),
        }
    }
}
