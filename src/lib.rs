//! Georeferenced Cloud Optimized GeoTIFFs from nadir drone photographs.
//!
//! ```no_run
//! use placecog::georef::{CameraProfile, GeoPoint, GeoreferencedRasterBuilder, RotationMatrix, SourceImage};
//! use placecog::raster::DataType;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let image = SourceImage::new(&[4000, 6000, 3], DataType::UInt8, vec![0; 4000 * 6000 * 3])?;
//! let rotation = RotationMatrix::from_elements([1., 0., 0., 0., 1., 0., 0., 0., 1.]);
//! let camera = CameraProfile::SonyIlce6000.parameters(120.0);
//! let raster = GeoreferencedRasterBuilder::default().build(
//!     image,
//!     GeoPoint::new(5.35995, -4.00826, 120.0),
//!     &camera,
//!     &rotation,
//! )?;
//! let cog = raster.into_encoder().encode_to_vec()?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod cogify;
pub mod encode;
mod error;
pub mod georef;
pub mod geotags;
pub mod io;
pub mod raster;
pub mod table;
pub mod tiff;

pub use encode::{Compression, Encoder};
pub use error::{CogifyError, CogifyResult};
pub use georef::{
    AffineTransform, CameraParameters, CameraProfile, GeoPoint, GeoreferencedRaster,
    GeoreferencedRasterBuilder, RotationMatrix, SourceImage,
};
