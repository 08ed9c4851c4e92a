//! Calibration constants shared by every georeferencing call.
//!
//! Two historical pipelines disagreed on some of these values. Both options
//! are named here; none is applied implicitly.

/// Approximate equatorial radius used for meters per degree of longitude
pub const EARTH_RADIUS_KM: f64 = 6378.0;

/// Meters per degree of latitude (default)
pub const METERS_PER_DEGREE_LATITUDE: f64 = 111_317.1;

/// Rounded meters per degree of latitude, differs from the default by ~0.28%
pub const METERS_PER_DEGREE_LATITUDE_ROUNDED: f64 = 111_000.0;

/// Systematic offset observed between EXIF GPS altitude and flight altitude.
///
/// Pending confirmation; only applied through [`corrected_gps_altitude`].
pub const GPS_ALTITUDE_CORRECTION_M: f64 = -0.12;

pub fn corrected_gps_altitude(gps_altitude_m: f64) -> f64 {
    gps_altitude_m + GPS_ALTITUDE_CORRECTION_M
}

/// Meters spanned by one degree of longitude at `latitude` degrees
pub fn meters_per_degree_longitude(latitude: f64) -> f64 {
    (std::f64::consts::PI / 180.0) * EARTH_RADIUS_KM * latitude.to_radians().cos() * 1000.0
}
