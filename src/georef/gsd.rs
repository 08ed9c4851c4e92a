use super::calibration::{meters_per_degree_longitude, METERS_PER_DEGREE_LATITUDE};
use super::{GeoreferenceError, GeoreferenceResult};
use tracing::debug;

/// Camera geometry at capture time. Sensor and focal lengths in centimeters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParameters {
    pub sensor_width_cm: f64,
    pub sensor_height_cm: f64,
    pub focal_length_cm: f64,
    pub altitude_m: f64,
}

impl CameraParameters {
    pub fn new(
        sensor_width_cm: f64,
        sensor_height_cm: f64,
        focal_length_cm: f64,
        altitude_m: f64,
    ) -> Self {
        Self {
            sensor_width_cm,
            sensor_height_cm,
            focal_length_cm,
            altitude_m,
        }
    }

    pub fn from_millimeters(
        sensor_width_mm: f64,
        sensor_height_mm: f64,
        focal_length_mm: f64,
        altitude_m: f64,
    ) -> Self {
        Self::new(
            sensor_width_mm / 10.0,
            sensor_height_mm / 10.0,
            focal_length_mm / 10.0,
            altitude_m,
        )
    }

    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude_m = altitude_m;
        self
    }

    pub fn validate(&self) -> GeoreferenceResult<()> {
        let fields = [
            ("sensor width", self.sensor_width_cm),
            ("sensor height", self.sensor_height_cm),
            ("focal length", self.focal_length_cm),
            ("altitude", self.altitude_m),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(GeoreferenceError::InvalidInput(format!(
                    "Camera {name} must be positive, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Cameras flown by the survey, chosen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraProfile {
    SonyIlce7m2,
    SonyIlce6000,
}

impl CameraProfile {
    /// `(width, height)` in millimeters
    pub fn sensor_mm(&self) -> (f64, f64) {
        match self {
            CameraProfile::SonyIlce7m2 => (35.8, 23.9),
            CameraProfile::SonyIlce6000 => (23.5, 15.6),
        }
    }

    pub fn focal_length_mm(&self) -> f64 {
        match self {
            CameraProfile::SonyIlce7m2 => 24.0,
            CameraProfile::SonyIlce6000 => 16.0,
        }
    }

    /// EXIF `Model` string
    pub fn model(&self) -> &'static str {
        match self {
            CameraProfile::SonyIlce7m2 => "ILCE-7M2",
            CameraProfile::SonyIlce6000 => "ILCE-6000",
        }
    }

    pub fn from_model(model: &str) -> Option<Self> {
        match model.trim() {
            "ILCE-7M2" => Some(CameraProfile::SonyIlce7m2),
            "ILCE-6000" => Some(CameraProfile::SonyIlce6000),
            _ => None,
        }
    }

    pub fn parameters(&self, altitude_m: f64) -> CameraParameters {
        let (width, height) = self.sensor_mm();
        CameraParameters::from_millimeters(width, height, self.focal_length_mm(), altitude_m)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundSampling {
    /// Centimeters per pixel along the image x axis
    pub x_resolution_cm: f64,
    pub y_resolution_cm: f64,
    /// Half footprint in meters
    pub x_offset_m: f64,
    pub y_offset_m: f64,
    /// Half footprint in degrees
    pub lat_offset: f64,
    pub lng_offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundSampleEstimator {
    meters_per_degree_latitude: f64,
}

impl Default for GroundSampleEstimator {
    fn default() -> Self {
        Self {
            meters_per_degree_latitude: METERS_PER_DEGREE_LATITUDE,
        }
    }
}

impl GroundSampleEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_meters_per_degree_latitude(mut self, meters: f64) -> Self {
        self.meters_per_degree_latitude = meters;
        self
    }

    pub fn meters_per_degree_latitude(&self) -> f64 {
        self.meters_per_degree_latitude
    }

    /// Ground footprint of a `width` x `height` pixel image taken at `latitude`.
    ///
    /// The longer sensor side is matched with the longer image side, so
    /// portrait images swap the sensor dimensions.
    pub fn estimate(
        &self,
        camera: &CameraParameters,
        width: u32,
        height: u32,
        latitude: f64,
    ) -> GeoreferenceResult<GroundSampling> {
        camera.validate()?;
        if width == 0 || height == 0 {
            return Err(GeoreferenceError::InvalidInput(format!(
                "Image has no pixels: {width}x{height}"
            )));
        }
        if !latitude.is_finite() || latitude.abs() >= 90.0 {
            return Err(GeoreferenceError::InvalidInput(format!(
                "Latitude out of range: {latitude}"
            )));
        }
        if !self.meters_per_degree_latitude.is_finite() || self.meters_per_degree_latitude <= 0.0 {
            return Err(GeoreferenceError::InvalidInput(format!(
                "Meters per degree latitude must be positive, got {}",
                self.meters_per_degree_latitude
            )));
        }

        let long_side = camera.sensor_width_cm.max(camera.sensor_height_cm);
        let short_side = camera.sensor_width_cm.min(camera.sensor_height_cm);
        let (sensor_x, sensor_y) = if width >= height {
            (long_side, short_side)
        } else {
            (short_side, long_side)
        };

        let altitude_cm = camera.altitude_m * 100.0;
        let x_resolution_cm = altitude_cm * sensor_x / (camera.focal_length_cm * width as f64);
        let y_resolution_cm = altitude_cm * sensor_y / (camera.focal_length_cm * height as f64);

        let x_offset_m = (width as f64 / 2.0) * x_resolution_cm / 100.0;
        let y_offset_m = (height as f64 / 2.0) * y_resolution_cm / 100.0;

        let sampling = GroundSampling {
            x_resolution_cm,
            y_resolution_cm,
            x_offset_m,
            y_offset_m,
            lat_offset: y_offset_m / self.meters_per_degree_latitude,
            lng_offset: x_offset_m / meters_per_degree_longitude(latitude),
        };
        debug!("Ground sampling for {width}x{height} at {latitude}: {sampling:?}");
        Ok(sampling)
    }
}
