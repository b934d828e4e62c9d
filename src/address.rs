//! Mapping of image pixels to segment samples.
//!
//! Images are addressed north-up and west-left with 0-based `(x, y)`
//! coordinates. SEVIRI segments are stored the other way round when the
//! scaling factors are negative: line 1 is the southernmost and column 1 the
//! easternmost, so such images are rotated by 180 degrees when read.
//!
//! HRV segments are only 5568 columns wide, half the width of the HRV frame.
//! The strip covered by each line depends on which of the two HRV half
//! images (lower or upper) the line belongs to; pixels outside the strip
//! have no data.

use crate::{error::*, prologue::HrvCoverage};

/// Number of columns of the full HRV frame.
pub const HRV_FRAME_COLUMNS: usize = 11136;

/// Position of one pixel in the segmented product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelAddress {
    /// 0-based segment index, i.e. sequence number minus one
    pub segment: usize,
    /// Index of the sample inside the segment
    pub offset: usize,
}

/// Placement of the two HRV half images inside the HRV frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HrvLayout {
    /// First native line (1-based, counted from the south) of the upper half
    pub upper_south_line: usize,
    /// Westernmost native column (1-based, counted from the east) of the
    /// lower half
    pub lower_west_column: usize,
    pub upper_west_column: usize,
}

impl HrvLayout {
    pub fn from_coverage(coverage: &HrvCoverage, segment_columns: usize) -> Result<Self, XritError> {
        let check_column = |name: &str, v: i32| -> Result<usize, XritError> {
            let v = usize::try_from(v).unwrap_or(0);
            if v < segment_columns || v > HRV_FRAME_COLUMNS {
                return Err(FormatError::GeometryMismatch(format!(
                    "HRV {name} west column {v} outside {segment_columns}..={HRV_FRAME_COLUMNS}"
                ))
                .into());
            }
            Ok(v)
        };
        let upper_south_line = usize::try_from(coverage.upper_south_line)
            .ok()
            .filter(|l| *l >= 1)
            .ok_or_else(|| {
                FormatError::GeometryMismatch(format!(
                    "HRV upper south line {}",
                    coverage.upper_south_line
                ))
            })?;
        Ok(Self {
            upper_south_line,
            lower_west_column: check_column("lower", coverage.lower_west_column)?,
            upper_west_column: check_column("upper", coverage.upper_west_column)?,
        })
    }
}

/// Geometry of a segmented product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentGeometry {
    /// Columns of one segment
    pub columns: usize,
    /// Lines of one segment
    pub seglines: usize,
    /// Planned number of segments
    pub segments: usize,
    /// Columns are stored east to west
    pub swap_x: bool,
    /// Lines are stored south to north
    pub swap_y: bool,
    pub hrv: Option<HrvLayout>,
}

impl SegmentGeometry {
    pub fn npixperseg(&self) -> usize {
        self.columns * self.seglines
    }

    pub fn lines(&self) -> usize {
        self.seglines * self.segments
    }

    /// Width of the assembled frame.
    pub fn frame_columns(&self) -> usize {
        match self.hrv {
            Some(_) => HRV_FRAME_COLUMNS,
            None => self.columns,
        }
    }

    fn native_line(&self, y: usize) -> usize {
        if self.swap_y {
            self.lines() - 1 - y
        } else {
            y
        }
    }

    /// First frame column holding data on line `y`. Always 0 except for
    /// HRV.
    pub fn line_start(&self, y: usize) -> usize {
        match &self.hrv {
            None => 0,
            Some(hrv) => {
                let west = if self.native_line(y) + 1 >= hrv.upper_south_line {
                    hrv.upper_west_column
                } else {
                    hrv.lower_west_column
                };
                HRV_FRAME_COLUMNS.saturating_sub(west)
            }
        }
    }

    /// Locates pixel `(x, y)` of the frame, or returns `None` when it falls
    /// outside the frame or outside the HRV strip of its line.
    pub fn resolve(&self, x: usize, y: usize) -> Option<PixelAddress> {
        if x >= self.frame_columns() || y >= self.lines() {
            return None;
        }
        let s = x.checked_sub(self.line_start(y))?;
        if s >= self.columns {
            return None;
        }
        let c = if self.swap_x { self.columns - 1 - s } else { s };
        let r = self.native_line(y);
        let pos = r * self.columns + c;
        let npixperseg = self.npixperseg();
        Some(PixelAddress {
            segment: pos / npixperseg,
            offset: pos % npixperseg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_disc() -> SegmentGeometry {
        SegmentGeometry {
            columns: 3712,
            seglines: 464,
            segments: 8,
            swap_x: true,
            swap_y: true,
            hrv: None,
        }
    }

    fn hrv() -> SegmentGeometry {
        SegmentGeometry {
            columns: 5568,
            seglines: 464,
            segments: 24,
            swap_x: true,
            swap_y: true,
            hrv: Some(HrvLayout {
                upper_south_line: 8129,
                lower_west_column: 5568,
                upper_west_column: 7800,
            }),
        }
    }

    macro_rules! test_resolve {
        ($(($name:ident, $geometry:expr, $x:expr, $y:expr, $expected:expr),)*) => ($(
            #[test]
            fn $name() {
                assert_eq!($geometry.resolve($x, $y), $expected);
            }
        )*);
    }

    test_resolve! {
        (
            resolving_north_west_corner,
            full_disc(), 0, 0,
            Some(PixelAddress { segment: 7, offset: 464 * 3712 - 1 })
        ),
        (
            resolving_south_east_corner,
            full_disc(), 3711, 3711,
            Some(PixelAddress { segment: 0, offset: 0 })
        ),
        (
            resolving_last_line_of_first_segment,
            full_disc(), 3711, 3712 - 464,
            Some(PixelAddress { segment: 0, offset: 463 * 3712 })
        ),
        (
            resolving_first_line_of_second_segment,
            full_disc(), 3711, 3712 - 465,
            Some(PixelAddress { segment: 1, offset: 0 })
        ),
        (resolving_outside_columns, full_disc(), 3712, 0, None),
        (resolving_outside_lines, full_disc(), 0, 3712, None),
        (
            resolving_hrv_west_edge_of_upper_strip,
            hrv(), 11136 - 7800, 0,
            Some(PixelAddress { segment: 23, offset: 464 * 5568 - 1 })
        ),
        (resolving_hrv_west_of_upper_strip, hrv(), 11136 - 7801, 0, None),
        (resolving_hrv_east_of_upper_strip, hrv(), 11136 - 7800 + 5568, 0, None),
        (
            resolving_hrv_south_east_corner,
            hrv(), 11135, 11135,
            Some(PixelAddress { segment: 0, offset: 0 })
        ),
    }

    #[test]
    fn unswapped_geometry_is_read_as_is() {
        let geometry = SegmentGeometry {
            swap_x: false,
            swap_y: false,
            ..full_disc()
        };
        assert_eq!(
            geometry.resolve(1, 465),
            Some(PixelAddress {
                segment: 1,
                offset: 3712 + 1
            })
        );
    }

    #[test]
    fn line_start_without_hrv_split() {
        let geometry = full_disc();
        assert_eq!(geometry.npixperseg(), 3712 * 464);
        assert!((0..geometry.lines()).all(|y| geometry.line_start(y) == 0));
    }

    #[test]
    fn line_start_changes_between_hrv_halves() {
        let geometry = hrv();
        assert_eq!(geometry.frame_columns(), 11136);
        assert_eq!(geometry.lines(), 11136);
        assert_eq!(geometry.line_start(0), 11136 - 7800);
        assert_eq!(geometry.line_start(3007), 11136 - 7800);
        assert_eq!(geometry.line_start(3008), 11136 - 5568);
        assert_eq!(geometry.line_start(11135), 11136 - 5568);
    }

    #[test]
    fn hrv_layout_from_coverage() {
        let coverage = HrvCoverage {
            lower_south_line: 1,
            lower_north_line: 8128,
            lower_east_column: 1,
            lower_west_column: 5568,
            upper_south_line: 8129,
            upper_north_line: 11136,
            upper_east_column: 2233,
            upper_west_column: 7800,
        };
        assert_eq!(
            HrvLayout::from_coverage(&coverage, 5568),
            Ok(HrvLayout {
                upper_south_line: 8129,
                lower_west_column: 5568,
                upper_west_column: 7800,
            })
        );

        let coverage = HrvCoverage {
            upper_west_column: 12000,
            ..coverage
        };
        assert!(HrvLayout::from_coverage(&coverage, 5568).is_err());
    }
}
