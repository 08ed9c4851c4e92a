use super::{GeoreferenceError, GeoreferenceResult, RotationMatrix};
use nalgebra::Vector3;
use std::collections::BTreeMap;
use std::fmt::Display;

pub const GPS_LATITUDE_REF_TAG: &str = "GPSLatitudeRef";
pub const GPS_LATITUDE_TAG: &str = "GPSLatitude";
pub const GPS_LONGITUDE_REF_TAG: &str = "GPSLongitudeRef";
pub const GPS_LONGITUDE_TAG: &str = "GPSLongitude";
pub const GPS_ALTITUDE_REF_TAG: &str = "GPSAltitudeRef";
pub const GPS_ALTITUDE_TAG: &str = "GPSAltitude";

/// WGS84 position in decimal degrees, altitude in meters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    pub fn new_2d(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, 0.0)
    }

    /// Position from EXIF style GPS degrees/minutes/seconds triples.
    ///
    /// `latitude_ref` is `N` or `S`, `longitude_ref` is `E` or `W`.
    pub fn from_gps_dms(
        latitude_ref: char,
        latitude: [f64; 3],
        longitude_ref: char,
        longitude: [f64; 3],
        altitude: f64,
    ) -> GeoreferenceResult<Self> {
        let latitude = match latitude_ref.to_ascii_uppercase() {
            'N' | 'S' => dms_to_degrees(latitude_ref, latitude[0], latitude[1], latitude[2])?,
            other => {
                return Err(GeoreferenceError::InvalidInput(format!(
                    "Latitude reference must be N or S, got {other}"
                )))
            }
        };
        let longitude = match longitude_ref.to_ascii_uppercase() {
            'E' | 'W' => {
                dms_to_degrees(longitude_ref, longitude[0], longitude[1], longitude[2])?
            }
            other => {
                return Err(GeoreferenceError::InvalidInput(format!(
                    "Longitude reference must be E or W, got {other}"
                )))
            }
        };
        Self::new(latitude, longitude, altitude).validated()
    }

    /// Position from EXIF GPS tags rendered as text.
    ///
    /// Coordinates are three rationals or decimals such as `5/1 21/1 3582/100`.
    /// `GPSAltitudeRef` of `1` puts the altitude below sea level.
    pub fn from_gps_tags(tags: &BTreeMap<String, String>) -> GeoreferenceResult<Self> {
        let altitude = parse_number(GPS_ALTITUDE_TAG, required_tag(tags, GPS_ALTITUDE_TAG)?)?;
        let altitude = match tags.get(GPS_ALTITUDE_REF_TAG).map(|r| r.trim()) {
            Some("1") => -altitude,
            _ => altitude,
        };
        Self::from_gps_dms(
            parse_ref(tags, GPS_LATITUDE_REF_TAG)?,
            parse_dms(tags, GPS_LATITUDE_TAG)?,
            parse_ref(tags, GPS_LONGITUDE_REF_TAG)?,
            parse_dms(tags, GPS_LONGITUDE_TAG)?,
            altitude,
        )
    }

    pub fn validated(self) -> GeoreferenceResult<Self> {
        let finite = self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.altitude.is_finite();
        if !finite || self.latitude.abs() > 90.0 || self.longitude.abs() > 180.0 {
            Err(GeoreferenceError::InvalidInput(format!(
                "Position out of range: {self}"
            )))
        } else {
            Ok(self)
        }
    }
}

impl Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({:.7}, {:.7}, {:.2}m)",
            self.latitude, self.longitude, self.altitude
        )
    }
}

fn required_tag<'a>(tags: &'a BTreeMap<String, String>, key: &str) -> GeoreferenceResult<&'a str> {
    tags.get(key)
        .map(String::as_str)
        .ok_or_else(|| GeoreferenceError::InvalidInput(format!("Missing tag {key}")))
}

/// `a/b` rational or plain decimal
fn parse_number(key: &str, text: &str) -> GeoreferenceResult<f64> {
    let text = text.trim();
    let value = match text.split_once('/') {
        Some((num, den)) => match (num.trim().parse::<f64>(), den.trim().parse::<f64>()) {
            (Ok(num), Ok(den)) if den != 0.0 => Some(num / den),
            _ => None,
        },
        None => text.parse().ok(),
    };
    value.ok_or_else(|| GeoreferenceError::InvalidInput(format!("Bad value for {key}: {text}")))
}

fn parse_dms(tags: &BTreeMap<String, String>, key: &str) -> GeoreferenceResult<[f64; 3]> {
    let text = required_tag(tags, key)?;
    let values = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| parse_number(key, part))
        .collect::<GeoreferenceResult<Vec<f64>>>()?;
    match values.as_slice() {
        [d, m, s] => Ok([*d, *m, *s]),
        _ => Err(GeoreferenceError::InvalidInput(format!(
            "{key} needs degrees, minutes and seconds: {text}"
        ))),
    }
}

fn parse_ref(tags: &BTreeMap<String, String>, key: &str) -> GeoreferenceResult<char> {
    let text = required_tag(tags, key)?.trim();
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(GeoreferenceError::InvalidInput(format!("Bad value for {key}: {text}"))),
    }
}

/// Signed decimal degrees, negative for `S` and `W`
pub fn dms_to_degrees(
    hemisphere: char,
    degrees: f64,
    minutes: f64,
    seconds: f64,
) -> GeoreferenceResult<f64> {
    let dms = [degrees, minutes, seconds];
    if dms.iter().any(|v| !v.is_finite() || *v < 0.0) || minutes >= 60.0 || seconds >= 60.0 {
        return Err(GeoreferenceError::InvalidInput(format!(
            "Bad degrees/minutes/seconds {dms:?}"
        )));
    }
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    match hemisphere.to_ascii_uppercase() {
        'N' | 'E' => Ok(value),
        'S' | 'W' => Ok(-value),
        other => Err(GeoreferenceError::InvalidInput(format!(
            "Unknown hemisphere {other}"
        ))),
    }
}

/// Rotated offset with all three components
pub fn rotate_point_raw(offset: &Vector3<f64>, rotation: &RotationMatrix) -> Vector3<f64> {
    rotation.apply(offset)
}

/// Rotate an angular offset `(lat, lng, z)` and translate it onto `center`.
///
/// Returns `(latitude, longitude)`; the vertical component is dropped.
pub fn rotate_point(
    offset: &Vector3<f64>,
    rotation: &RotationMatrix,
    center: &GeoPoint,
) -> (f64, f64) {
    let rotated = rotate_point_raw(offset, rotation);
    (center.latitude + rotated.x, center.longitude + rotated.y)
}
