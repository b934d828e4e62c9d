//! Space-view geometry of the SEVIRI grid.
//!
//! Column and line scaling factors (CFAC/LFAC) are fixed-point values in
//! units of 2^-16 per microradian. The apparent diameter of the Earth seen
//! from the satellite, expressed in grid units, is the `dx`/`dy` figure used
//! by space-view grid definitions.

/// Equatorial radius of the Earth in km.
pub const EARTH_RADIUS: f64 = 6378.137;
/// Distance of the geostationary orbit from the centre of the Earth in km.
pub const ORBIT_RADIUS: f64 = 42164.0;

/// Grid units of apparent Earth diameter per unit of scaling factor.
fn diameter_per_factor() -> f64 {
    (EARTH_RADIUS / ORBIT_RADIUS).asin() * 2f64.powi(-15) * 180.0 / std::f64::consts::PI
}

fn apparent_diameter(factor: i32) -> u32 {
    (f64::from(factor).abs() * diameter_per_factor()).round() as u32
}

fn factor_from_diameter(d: u32) -> i32 {
    (f64::from(d) / diameter_per_factor()).round() as i32
}

/// Apparent Earth diameter in columns for a column scaling factor.
pub fn seviri_dx_from_column_factor(column_factor: i32) -> u32 {
    apparent_diameter(column_factor)
}

/// Apparent Earth diameter in lines for a line scaling factor.
pub fn seviri_dy_from_line_factor(line_factor: i32) -> u32 {
    apparent_diameter(line_factor)
}

/// Inverse of [`seviri_dx_from_column_factor`].
///
/// `dx -> factor -> dx` is exact, but `factor -> dx -> factor` is not, since
/// `dx` is rounded to an integer: 13642337 comes back as 13641224.
pub fn column_factor_from_seviri_dx(dx: u32) -> i32 {
    factor_from_diameter(dx)
}

pub fn line_factor_from_seviri_dy(dy: u32) -> i32 {
    factor_from_diameter(dy)
}

/// Angular size of one pixel in degrees.
fn pixel_angle(factor: i32) -> f64 {
    65536.0 / f64::from(factor).abs()
}

/// Width of a pixel at the sub-satellite point in km.
pub fn pixel_h_size_from_column_factor(column_factor: i32) -> f64 {
    (ORBIT_RADIUS - EARTH_RADIUS) * pixel_angle(column_factor).to_radians().tan()
}

/// Height of a pixel at the sub-satellite point in km.
pub fn pixel_v_size_from_line_factor(line_factor: i32) -> f64 {
    (ORBIT_RADIUS - EARTH_RADIUS) * pixel_angle(line_factor).to_radians().tan()
}

/// Inverse of [`pixel_h_size_from_column_factor`].
pub fn column_factor_from_pixel_h_size(size: f64) -> i32 {
    (65536.0 / (size / (ORBIT_RADIUS - EARTH_RADIUS)).atan().to_degrees()).round() as i32
}

pub fn line_factor_from_pixel_v_size(size: f64) -> i32 {
    column_factor_from_pixel_h_size(size)
}
