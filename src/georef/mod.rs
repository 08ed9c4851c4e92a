//! Georeferencing of single nadir drone photographs.
//!
//! A rotation matrix, the camera geometry and the GPS position of the image
//! center are turned into four corner control points and an affine
//! pixel-to-WGS84 transform.

mod builder;
pub mod calibration;
mod error;
mod extent;
mod gcp;
mod gsd;
mod point;
mod rotation;

pub use builder::{
    GeoreferencedRaster, GeoreferencedRasterBuilder, SourceImage, DEFAULT_NODATA,
    MODEL_TAG, PRESERVED_TAGS, ROTATION_SOURCE_TAG, WGS84_EPSG,
};
pub use error::{GeoreferenceError, GeoreferenceResult};
pub use extent::{
    rotate_extent, rotate_extent_debug, AxisConvention, Corner, ExtentDiagnostics,
    RotatedExtent,
};
pub use gcp::{AffineTransform, GroundControlPoint};
pub use gsd::{CameraParameters, CameraProfile, GroundSampleEstimator, GroundSampling};
pub use point::{
    dms_to_degrees, rotate_point, rotate_point_raw, GeoPoint, GPS_ALTITUDE_REF_TAG,
    GPS_ALTITUDE_TAG, GPS_LATITUDE_REF_TAG, GPS_LATITUDE_TAG, GPS_LONGITUDE_REF_TAG,
    GPS_LONGITUDE_TAG,
};
pub use rotation::{RotationMatrix, RotationSource};
