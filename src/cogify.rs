use crate::encode::{Compression, DEFAULT_TILE_SIZE};
use crate::georef::calibration::corrected_gps_altitude;
use crate::georef::{
    CameraParameters, GeoPoint, GeoreferencedRasterBuilder, RotationMatrix, SourceImage,
};
use crate::CogifyResult;
use std::collections::BTreeMap;
use tracing::*;

/// Output options for one georeferenced COG
#[derive(Debug, Clone)]
pub struct CogifySettings {
    pub builder: GeoreferencedRasterBuilder,
    pub tile_size: u16,
    pub compression: Compression,
    pub overviews: bool,
    pub big_tiff: bool,
    /// Apply the GPS altitude correction to positions read from image tags
    pub correct_altitude: bool,
}

impl Default for CogifySettings {
    fn default() -> Self {
        Self {
            builder: GeoreferencedRasterBuilder::default(),
            tile_size: DEFAULT_TILE_SIZE,
            compression: Compression::DeflateAdobe,
            overviews: true,
            big_tiff: false,
            correct_altitude: false,
        }
    }
}

/// Georeference decoded pixels and encode them as COG bytes
pub fn cogify_source(
    image: SourceImage,
    center: GeoPoint,
    camera: &CameraParameters,
    rotation: &RotationMatrix,
    settings: &CogifySettings,
) -> CogifyResult<Vec<u8>> {
    let raster = settings.builder.build(image, center, camera, rotation)?;
    debug!(
        "Corners of {}x{} image: {:?}",
        raster.width(),
        raster.height(),
        raster.extent
    );
    let bytes = raster
        .into_encoder()
        .with_tile_size(settings.tile_size)
        .with_compression(settings.compression)
        .with_overviews(settings.overviews)
        .with_big_tiff(settings.big_tiff)
        .encode_to_vec()?;
    Ok(bytes)
}

/// Georeference with the GPS position and camera model recorded in the
/// image tags.
///
/// Fails with `InvalidInput` when either is missing or not understood.
pub fn cogify_tagged(
    image: SourceImage,
    rotation: &RotationMatrix,
    settings: &CogifySettings,
) -> CogifyResult<Vec<u8>> {
    let mut center = image.gps_center()?;
    if settings.correct_altitude {
        center.altitude = corrected_gps_altitude(center.altitude);
    }
    let profile = image.camera_profile()?;
    info!("Georeferencing {} image at {center}", profile.model());
    let camera = profile.parameters(center.altitude);
    cogify_source(image, center, &camera, rotation, settings)
}

/// Decode a JPEG or PNG photograph and turn it into COG bytes.
///
/// `tags` are the source metadata; only the preserved subset reaches the output.
#[cfg(feature = "image")]
pub fn cogify_bytes(
    bytes: &[u8],
    tags: BTreeMap<String, String>,
    center: GeoPoint,
    camera: &CameraParameters,
    rotation: &RotationMatrix,
    settings: &CogifySettings,
) -> CogifyResult<Vec<u8>> {
    let img = image::load_from_memory(bytes)?;
    let image = SourceImage::from_image(&img)?.with_tags(tags);
    cogify_source(image, center, camera, rotation, settings)
}
