//! Normalized geostationary projection, as defined for LRIT/HRIT by the
//! CGMS global specification.

use crate::error::*;

/// Distance from the centre of the Earth to the satellite in km.
const SAT_HEIGHT: f64 = 42164.0;
const R_POL: f64 = 6356.5838;
/// `(R_POL / R_EQ)^2` with an equatorial radius of 6378.169 km
const POLAR_RATIO: f64 = 0.993243;
/// `(R_EQ^2 - R_POL^2) / R_EQ^2`
const ECCENTRICITY_SQ: f64 = 0.00675701;
/// `(R_EQ / R_POL)^2`
const EQUATORIAL_RATIO: f64 = 1.006803;
/// `SAT_HEIGHT^2 - R_EQ^2`
const VISIBILITY: f64 = 1737121856.0;

/// Space view of an image: pixel coordinates relative to the image
/// (column 0 at the west edge, line 0 at the north edge) against geographic
/// coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpaceView {
    pub sub_satellite_longitude: f64,
    pub column_factor: f64,
    pub line_factor: f64,
    pub column_offset: f64,
    pub line_offset: f64,
}

/// Rectangle in geographic coordinates, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoArea {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl GeoArea {
    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Result<Self, XritError> {
        if !(lat_min < lat_max && lon_min < lon_max)
            || lat_min < -90.0
            || lat_max > 90.0
            || lon_min < -180.0
            || lon_max > 180.0
        {
            return Err(XritError::ConfigError(format!(
                "invalid geographic area: latitude {lat_min}..{lat_max}, longitude {lon_min}..{lon_max}"
            )));
        }
        Ok(Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        })
    }
}

/// Rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelArea {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelArea {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Fails unless the area is non-empty and inside a `columns` x `lines`
    /// image.
    pub fn check_within(&self, columns: usize, lines: usize) -> Result<(), XritError> {
        if self.width == 0
            || self.height == 0
            || self.x + self.width > columns
            || self.y + self.height > lines
        {
            return Err(XritError::ConfigError(format!(
                "area {}x{}+{}+{} is not inside the {columns}x{lines} image",
                self.width, self.height, self.x, self.y
            )));
        }
        Ok(())
    }
}

/// Points sampled along each edge of a geographic area when converting it to
/// pixels.
const EDGE_SAMPLES: usize = 64;

impl SpaceView {
    /// Pixel `(column, line)` seeing `(lat, lon)`, or `None` if the point is
    /// not visible from the satellite.
    pub fn pixel(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        let lat = lat.to_radians();
        let dlon = (lon - self.sub_satellite_longitude).to_radians();

        let c_lat = (POLAR_RATIO * lat.tan()).atan();
        let rl = R_POL / (1.0 - ECCENTRICITY_SQ * c_lat.cos().powi(2)).sqrt();
        let r1 = SAT_HEIGHT - rl * c_lat.cos() * dlon.cos();
        let r2 = -rl * c_lat.cos() * dlon.sin();
        let r3 = rl * c_lat.sin();
        let rn = (r1 * r1 + r2 * r2 + r3 * r3).sqrt();

        if r1 * (r1 - SAT_HEIGHT) + r2 * r2 + EQUATORIAL_RATIO * r3 * r3 >= 0.0 {
            return None;
        }

        let x = (-r2 / r1).atan().to_degrees();
        let y = (-r3 / rn).asin().to_degrees();
        let column = self.column_offset + x * self.column_factor / 65536.0;
        let line = self.line_offset + y * self.line_factor / 65536.0;
        Some((column, line))
    }

    /// Geographic `(lat, lon)` seen at pixel `(column, line)`, or `None` off
    /// the Earth disc.
    pub fn geographic(&self, column: f64, line: f64) -> Option<(f64, f64)> {
        let x = ((column - self.column_offset) * 65536.0 / self.column_factor).to_radians();
        let y = ((line - self.line_offset) * 65536.0 / self.line_factor).to_radians();

        let (cos_x, sin_x, cos_y, sin_y) = (x.cos(), x.sin(), y.cos(), y.sin());
        let a = cos_y * cos_y + EQUATORIAL_RATIO * sin_y * sin_y;
        let sd2 = (SAT_HEIGHT * cos_x * cos_y).powi(2) - a * VISIBILITY;
        if sd2 < 0.0 {
            return None;
        }
        let sn = (SAT_HEIGHT * cos_x * cos_y - sd2.sqrt()) / a;
        let s1 = SAT_HEIGHT - sn * cos_x * cos_y;
        let s2 = sn * sin_x * cos_y;
        let s3 = -sn * sin_y;
        let sxy = (s1 * s1 + s2 * s2).sqrt();

        let lon = (s2 / s1).atan().to_degrees() + self.sub_satellite_longitude;
        let lat = (EQUATORIAL_RATIO * s3 / sxy).atan().to_degrees();
        Some((lat, lon))
    }

    /// Smallest pixel rectangle of a `columns` x `lines` image covering the
    /// visible part of `area`.
    pub fn pixel_area(
        &self,
        area: &GeoArea,
        columns: usize,
        lines: usize,
    ) -> Result<PixelArea, XritError> {
        if columns == 0 || lines == 0 {
            return Err(XritError::ConfigError(format!(
                "geographic area {area:?} cannot be located in an empty image"
            )));
        }
        let step_lat = (area.lat_max - area.lat_min) / EDGE_SAMPLES as f64;
        let step_lon = (area.lon_max - area.lon_min) / EDGE_SAMPLES as f64;
        let edges = (0..=EDGE_SAMPLES).flat_map(|i| {
            let lat = area.lat_min + step_lat * i as f64;
            let lon = area.lon_min + step_lon * i as f64;
            [
                (lat, area.lon_min),
                (lat, area.lon_max),
                (area.lat_min, lon),
                (area.lat_max, lon),
            ]
        });

        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for (lat, lon) in edges {
            let Some((c, l)) = self.pixel(lat, lon) else {
                continue;
            };
            bounds = Some(match bounds {
                None => (c, c, l, l),
                Some((c0, c1, l0, l1)) => (c0.min(c), c1.max(c), l0.min(l), l1.max(l)),
            });
        }

        let clip = |v: f64, max: usize| v.round().clamp(0.0, (max - 1) as f64) as usize;
        match bounds {
            Some((c0, c1, l0, l1))
                if c1 >= 0.0 && l1 >= 0.0 && c0 < columns as f64 && l0 < lines as f64 =>
            {
                let (x0, x1) = (clip(c0, columns), clip(c1, columns));
                let (y0, y1) = (clip(l0, lines), clip(l1, lines));
                Ok(PixelArea::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1))
            }
            _ => Err(XritError::ConfigError(format!(
                "geographic area {area:?} is not visible in the image"
            ))),
        }
    }
}
