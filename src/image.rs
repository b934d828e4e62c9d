#[cfg(feature = "gridpoints-proj")]
use proj::Proj;

use crate::{
    codetables::{Channel, spacecraft_name},
    data::ImageData,
    error::*,
    facts,
    projection::{GeoArea, PixelArea, SpaceView},
    time::UtcDateTime,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    /// Every planned segment was found
    Complete,
    /// Some segments were missing and their pixels left without data
    MissingSegments,
}

/// One decoded image with its navigation metadata.
///
/// Pixel coordinates run west to east and north to south. Scaling factors
/// are stored as absolute values and offsets are expressed in this
/// orientation.
#[derive(Debug)]
pub struct Image {
    pub time: UtcDateTime,
    /// WMO Common Code Table C-5 code of the satellite
    pub spacecraft_id: u16,
    pub channel_id: u8,
    pub sub_satellite_longitude: f32,
    pub column_factor: i32,
    pub line_factor: i32,
    /// Column of the sub-satellite point
    pub column_offset: i32,
    /// Line of the sub-satellite point
    pub line_offset: i32,
    /// Column of the first pixel in the uncropped frame
    pub x0: usize,
    /// Line of the first pixel in the uncropped frame
    pub y0: usize,
    pub quality: Quality,
    pub history: String,
    data: ImageData,
}

impl Image {
    pub fn new(data: ImageData) -> Self {
        Self {
            time: UtcDateTime::default(),
            spacecraft_id: crate::codetables::WMO_SPACECRAFT_UNKNOWN,
            channel_id: 0,
            sub_satellite_longitude: 0.0,
            column_factor: 0,
            line_factor: 0,
            column_offset: 0,
            line_offset: 0,
            x0: 0,
            y0: 0,
            quality: Quality::Complete,
            history: String::new(),
            data,
        }
    }

    pub fn data(&self) -> &ImageData {
        &self.data
    }

    /// Replaces the pixel buffer, dropping the previous one.
    pub fn set_data(&mut self, data: ImageData) {
        self.data = data;
    }

    pub fn into_data(self) -> ImageData {
        self.data
    }

    pub fn columns(&self) -> usize {
        self.data.columns
    }

    pub fn lines(&self) -> usize {
        self.data.lines
    }

    pub fn channel(&self) -> Option<Channel> {
        Channel::try_from(self.channel_id).ok()
    }

    pub fn add_to_history(&mut self, event: &str) {
        if !self.history.is_empty() {
            self.history.push('\n');
        }
        self.history.push_str(event);
    }

    /// Keeps only the pixels of `area`.
    pub fn crop(&mut self, area: &PixelArea) -> Result<(), XritError> {
        area.check_within(self.columns(), self.lines())?;
        let data = self.data.crop(area.x, area.y, area.width, area.height)?;
        self.set_data(data);
        self.column_offset -= area.x as i32;
        self.line_offset -= area.y as i32;
        self.x0 += area.x;
        self.y0 += area.y;
        self.add_to_history(&format!(
            "cropped to {}x{}+{}+{}",
            area.width, area.height, area.x, area.y
        ));
        Ok(())
    }

    /// Keeps only the pixels covering the visible part of `area`.
    pub fn crop_geographic(&mut self, area: &GeoArea) -> Result<(), XritError> {
        let pixels = self
            .projection()
            .pixel_area(area, self.columns(), self.lines())?;
        self.crop(&pixels)
    }

    pub fn projection(&self) -> SpaceView {
        SpaceView {
            sub_satellite_longitude: f64::from(self.sub_satellite_longitude),
            column_factor: f64::from(self.column_factor),
            line_factor: f64::from(self.line_factor),
            column_offset: f64::from(self.column_offset),
            line_offset: f64::from(self.line_offset),
        }
    }

    pub fn seviri_dx(&self) -> u32 {
        facts::seviri_dx_from_column_factor(self.column_factor)
    }

    pub fn seviri_dy(&self) -> u32 {
        facts::seviri_dy_from_line_factor(self.line_factor)
    }

    /// Pixel width at the sub-satellite point in km.
    pub fn pixel_h_size(&self) -> f64 {
        facts::pixel_h_size_from_column_factor(self.column_factor)
    }

    /// Pixel height at the sub-satellite point in km.
    pub fn pixel_v_size(&self) -> f64 {
        facts::pixel_v_size_from_line_factor(self.line_factor)
    }

    pub fn decimal_digits_of_scaled_values(&self) -> i32 {
        self.data.decimal_digits_of_scaled_values()
    }

    /// File name stem identifying satellite, channel, time and crop origin.
    pub fn default_file_name(&self) -> String {
        let channel = self
            .channel()
            .map_or_else(|| format!("CH{:02}", self.channel_id), |c| c.to_string());
        let mut name = format!(
            "{}_{}_{}",
            spacecraft_name(self.spacecraft_id),
            channel,
            self.time.timing()
        );
        if self.x0 != 0 || self.y0 != 0 {
            name.push_str(&format!("_{}x{}+{}+{}", self.columns(), self.lines(), self.x0, self.y0));
        }
        name
    }

    /// Computes `(latitude, longitude)` of every pixel in row-major order
    /// through PROJ. Pixels off the Earth disc get NaN.
    #[cfg(feature = "gridpoints-proj")]
    pub fn latlons(&self) -> Result<std::vec::IntoIter<(f32, f32)>, XritError> {
        // height above the surface in metres
        const H: f64 = 35785831.0;
        let proj_def = format!(
            "+proj=geos +a=6378169 +b=6356583.8 +h={H} +lon_0={} +sweep=y",
            self.sub_satellite_longitude
        );
        let projection = Proj::new(&proj_def).map_err(|e| XritError::ConfigError(e.to_string()))?;
        let view = self.projection();

        let latlons = (0..self.lines())
            .flat_map(|l| (0..self.columns()).map(move |c| (c, l)))
            .map(|(c, l)| {
                let x = ((c as f64 - view.column_offset) * 65536.0 / view.column_factor)
                    .to_radians()
                    * H;
                let y = -((l as f64 - view.line_offset) * 65536.0 / view.line_factor)
                    .to_radians()
                    * H;
                match projection.project((x, y), true) {
                    Ok((lon, lat)) if lon.is_finite() && lat.is_finite() => {
                        (lat.to_degrees() as f32, lon.to_degrees() as f32)
                    }
                    _ => (f32::NAN, f32::NAN),
                }
            })
            .collect::<Vec<_>>();
        Ok(latlons.into_iter())
    }
}
