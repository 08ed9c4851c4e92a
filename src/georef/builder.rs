use super::{
    rotate_extent, AffineTransform, AxisConvention, CameraParameters, CameraProfile, Corner,
    GeoPoint, GeoreferenceError, GeoreferenceResult, GroundControlPoint, GroundSampleEstimator,
    GroundSampling, RotatedExtent, RotationMatrix, RotationSource,
};
use crate::encode::Encoder;
use crate::raster::{DataType, Raster};
use std::collections::BTreeMap;
use tracing::debug;

/// WGS84 geographic coordinates
pub const WGS84_EPSG: u16 = 4326;

pub const DEFAULT_NODATA: f64 = 1.0;

/// Source tags copied to the output
pub const PRESERVED_TAGS: [&str; 3] = ["DateTime", "Model", "Software"];

/// Camera model tag, as written by the camera
pub const MODEL_TAG: &str = "Model";

/// Tag recording how the rotation matrix was obtained
pub const ROTATION_SOURCE_TAG: &str = "ROTATION_SOURCE";

/// Decoded pixels plus the tags read from the source file
#[derive(Clone, Debug)]
pub struct SourceImage {
    raster: Raster,
    tags: BTreeMap<String, String>,
}

impl SourceImage {
    /// Pixel array of `shape` `[height, width, bands]` with interleaved samples
    /// in native byte order.
    pub fn new(shape: &[usize], data_type: DataType, buffer: Vec<u8>) -> GeoreferenceResult<Self> {
        let [height, width, bands] = match shape {
            [h, w, b] => [*h, *w, *b],
            _ => {
                return Err(GeoreferenceError::InvalidInput(format!(
                    "Pixel array must have shape [height, width, bands], got {shape:?}"
                )))
            }
        };
        if height == 0 || width == 0 || bands == 0 {
            return Err(GeoreferenceError::InvalidInput(format!(
                "Pixel array is empty: {shape:?}"
            )));
        }
        let (width, height, bands) = match (
            u32::try_from(width),
            u32::try_from(height),
            u16::try_from(bands),
        ) {
            (Ok(w), Ok(h), Ok(b)) => (w, h, b),
            _ => {
                return Err(GeoreferenceError::InvalidInput(format!(
                    "Pixel array too large: {shape:?}"
                )))
            }
        };
        let raster = Raster::from_samples((width, height), bands, data_type, buffer)
            .map_err(|e| GeoreferenceError::InvalidInput(format!("{e:?}")))?;
        Ok(Self::from_raster(raster))
    }

    pub fn from_raster(raster: Raster) -> Self {
        Self {
            raster,
            tags: BTreeMap::new(),
        }
    }

    #[cfg(feature = "image")]
    pub fn from_image(img: &image::DynamicImage) -> GeoreferenceResult<Self> {
        Raster::from_image(img)
            .map(Self::from_raster)
            .map_err(|e| GeoreferenceError::InvalidInput(format!("{e:?}")))
    }

    pub fn with_tag<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_tags<I, K, V>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// `[height, width, bands]`
    pub fn shape(&self) -> [usize; 3] {
        [
            self.raster.height() as usize,
            self.raster.width() as usize,
            self.raster.bands(),
        ]
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Image center from the GPS tags, with the altitude as recorded
    pub fn gps_center(&self) -> GeoreferenceResult<GeoPoint> {
        GeoPoint::from_gps_tags(&self.tags)
    }

    /// Known camera named by the `Model` tag
    pub fn camera_profile(&self) -> GeoreferenceResult<CameraProfile> {
        let model = self.tags.get(MODEL_TAG).ok_or_else(|| {
            GeoreferenceError::InvalidInput(format!("Missing tag {MODEL_TAG}"))
        })?;
        CameraProfile::from_model(model)
            .ok_or_else(|| GeoreferenceError::InvalidInput(format!("Unknown camera {model}")))
    }
}

/// Everything needed to write one georeferenced image
#[derive(Clone, Debug)]
pub struct GeoreferencedRaster {
    pub raster: Raster,
    pub transform: AffineTransform,
    pub gcps: [GroundControlPoint; 4],
    pub extent: RotatedExtent,
    pub sampling: GroundSampling,
    pub epsg: u16,
    pub nodata: Option<f64>,
    pub tags: BTreeMap<String, String>,
    pub rotation_source: RotationSource,
}

impl GeoreferencedRaster {
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn bands(&self) -> usize {
        self.raster.bands()
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.raster.data_type()
    }

    pub fn into_encoder(self) -> Encoder {
        let encoder = Encoder::from_raster(self.raster)
            .with_transform(self.epsg, &self.transform)
            .with_metadata(self.tags);
        match self.nodata {
            Some(nodata) => encoder.with_nodata(nodata),
            None => encoder,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GeoreferencedRasterBuilder {
    estimator: GroundSampleEstimator,
    convention: AxisConvention,
    nodata: Option<f64>,
    preserved_tags: Vec<String>,
}

impl Default for GeoreferencedRasterBuilder {
    fn default() -> Self {
        Self {
            estimator: GroundSampleEstimator::default(),
            convention: AxisConvention::default(),
            nodata: Some(DEFAULT_NODATA),
            preserved_tags: PRESERVED_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl GeoreferencedRasterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_axis_convention(mut self, convention: AxisConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn with_meters_per_degree_latitude(mut self, meters: f64) -> Self {
        self.estimator = self.estimator.with_meters_per_degree_latitude(meters);
        self
    }

    pub fn with_nodata(mut self, nodata: Option<f64>) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn with_preserved_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preserved_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn build(
        &self,
        image: SourceImage,
        center: GeoPoint,
        camera: &CameraParameters,
        rotation: &RotationMatrix,
    ) -> GeoreferenceResult<GeoreferencedRaster> {
        let center = center.validated()?;
        let SourceImage { raster, tags } = image;
        let (width, height) = raster.dimensions;

        let sampling = self
            .estimator
            .estimate(camera, width, height, center.latitude)?;
        let extent = rotate_extent(
            &center,
            sampling.lat_offset,
            sampling.lng_offset,
            rotation,
            self.convention,
        );

        let gcps = [
            Corner::NorthWest,
            Corner::SouthWest,
            Corner::SouthEast,
            Corner::NorthEast,
        ]
        .map(|corner| {
            let (row, col) = corner.pixel(width, height);
            let ground = extent[corner];
            GroundControlPoint::new(row, col, ground.longitude, ground.latitude, 0.0)
        });
        let transform = AffineTransform::from_gcps(&gcps)?;

        let mut tags: BTreeMap<String, String> = tags
            .into_iter()
            .filter(|(key, _)| self.preserved_tags.iter().any(|t| t == key))
            .collect();
        let source = match rotation.source() {
            RotationSource::FromCoefficients => "coefficients".to_string(),
            RotationSource::FromAngles { omega, phi, kappa } => {
                format!("omega/phi/kappa {omega} {phi} {kappa}")
            }
        };
        tags.insert(ROTATION_SOURCE_TAG.to_string(), source);

        debug!(
            "Georeferenced {width}x{height} image at {center}: {:?}",
            transform.to_gdal()
        );

        Ok(GeoreferencedRaster {
            raster,
            transform,
            gcps,
            extent,
            sampling,
            epsg: WGS84_EPSG,
            nodata: self.nodata,
            tags,
            rotation_source: rotation.source(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn center() -> GeoPoint {
        GeoPoint::new(5.35995, -4.00826, 120.0)
    }

    fn ilce6000() -> CameraParameters {
        CameraParameters::from_millimeters(23.5, 15.6, 16.0, 120.0)
    }

    fn image(width: usize, height: usize) -> SourceImage {
        SourceImage::new(&[height, width, 3], DataType::UInt8, vec![0; width * height * 3])
            .unwrap()
            .with_tag("DateTime", "2022:03:14 10:21:07")
            .with_tag("Model", "ILCE-6000")
            .with_tag("GPSLatitude", "5/1 21/1 3582/100")
    }

    #[test]
    fn end_to_end_scenario() {
        let raster = GeoreferencedRasterBuilder::default()
            .build(image(600, 400), center(), &ilce6000(), &RotationMatrix::identity())
            .unwrap();

        assert!(raster.sampling.lat_offset > 1e-4 && raster.sampling.lat_offset < 1e-3);
        assert!(raster.sampling.lng_offset > 1e-4 && raster.sampling.lng_offset < 1e-3);
        assert_eq!(raster.epsg, 4326);
        assert_eq!(raster.nodata, Some(1.0));
        assert_eq!(raster.bands(), 3);
        assert_eq!(raster.data_type(), Some(DataType::UInt8));
        assert!(raster.transform.b.abs() < 1e-12);
        assert!(raster.transform.d.abs() < 1e-12);

        let (x, y) = raster.transform.apply(300.0, 200.0);
        assert_relative_eq!(x, center().longitude, epsilon = 1e-9);
        assert_relative_eq!(y, center().latitude, epsilon = 1e-9);
    }

    #[test]
    fn full_resolution_offsets() {
        let sampling = GroundSampleEstimator::default()
            .estimate(&ilce6000(), 6000, 4000, center().latitude)
            .unwrap();
        assert!(sampling.lat_offset > 1e-4 && sampling.lat_offset < 1e-3);
        assert!(sampling.lng_offset > 1e-4 && sampling.lng_offset < 1e-3);
    }

    #[test]
    fn control_points_round_trip() {
        let rotation = RotationMatrix::from_elements([
            0.9659, -0.2588, 0.0, 0.2588, 0.9659, 0.0, 0.0, 0.0, 1.0,
        ]);
        let raster = GeoreferencedRasterBuilder::default()
            .build(image(600, 400), center(), &ilce6000(), &rotation)
            .unwrap();

        for gcp in &raster.gcps {
            let (x, y) = raster.transform.apply(gcp.col, gcp.row);
            assert_relative_eq!(x, gcp.x, epsilon = 1e-9);
            assert_relative_eq!(y, gcp.y, epsilon = 1e-9);
        }
        let nw = raster.extent[Corner::NorthWest];
        assert_eq!(raster.gcps[0].row, 0.0);
        assert_eq!(raster.gcps[0].col, 0.0);
        assert_eq!(raster.gcps[0].x, nw.longitude);
        assert_eq!(raster.gcps[0].y, nw.latitude);
    }

    #[test]
    fn identity_rotation_top_left_is_north_west() {
        let raster = GeoreferencedRasterBuilder::default()
            .build(image(600, 400), center(), &ilce6000(), &RotationMatrix::identity())
            .unwrap();
        let (x, y) = raster.transform.apply(0.0, 0.0);
        assert!(x < center().longitude);
        assert!(y > center().latitude);
        assert!(raster.transform.e < 0.0);
    }

    #[test]
    fn keeps_only_preserved_tags() {
        let raster = GeoreferencedRasterBuilder::default()
            .build(image(60, 40), center(), &ilce6000(), &RotationMatrix::identity())
            .unwrap();
        assert_eq!(raster.tags.get("Model").map(String::as_str), Some("ILCE-6000"));
        assert!(raster.tags.contains_key("DateTime"));
        assert!(!raster.tags.contains_key("GPSLatitude"));
        assert_eq!(
            raster.tags.get(ROTATION_SOURCE_TAG).map(String::as_str),
            Some("coefficients")
        );
    }

    #[test]
    fn angle_provenance_is_recorded() {
        let rotation = RotationMatrix::from_opk_degrees(0.5, -0.3, 12.0);
        let raster = GeoreferencedRasterBuilder::default()
            .with_nodata(None)
            .with_preserved_tags(["Software"])
            .build(image(60, 40), center(), &ilce6000(), &rotation)
            .unwrap();
        assert!(matches!(raster.rotation_source, RotationSource::FromAngles { .. }));
        assert!(raster.tags[ROTATION_SOURCE_TAG].starts_with("omega/phi/kappa"));
        assert!(!raster.tags.contains_key("Model"));
        assert_eq!(raster.nodata, None);
    }

    #[test]
    fn camera_profile_from_model_tag() {
        assert_eq!(
            image(4, 4).camera_profile().unwrap(),
            CameraProfile::SonyIlce6000
        );

        let unknown = image(4, 4).with_tag(MODEL_TAG, "FC6310");
        match unknown.camera_profile() {
            Err(GeoreferenceError::InvalidInput(message)) => assert!(message.contains("FC6310")),
            other => panic!("Expected invalid input, got {other:?}"),
        }

        let untagged = SourceImage::new(&[4, 4, 3], DataType::UInt8, vec![0; 48]).unwrap();
        assert!(matches!(
            untagged.camera_profile(),
            Err(GeoreferenceError::InvalidInput(_))
        ));
    }

    #[test]
    fn gps_center_needs_every_position_tag() {
        // Only the latitude is present
        assert!(matches!(
            image(4, 4).gps_center(),
            Err(GeoreferenceError::InvalidInput(_))
        ));

        let tagged = image(4, 4).with_tags([
            ("GPSLatitudeRef", "N"),
            ("GPSLongitudeRef", "W"),
            ("GPSLongitude", "4/1 0/1 29736/1000"),
            ("GPSAltitude", "120"),
        ]);
        let center = tagged.gps_center().unwrap();
        assert_relative_eq!(center.latitude, 5.35995, epsilon = 1e-12);
        assert_relative_eq!(center.longitude, -4.00826, epsilon = 1e-12);
        assert_eq!(center.altitude, 120.0);
    }

    #[test]
    fn rejects_bad_shapes_and_cameras() {
        assert!(matches!(
            SourceImage::new(&[4, 4], DataType::UInt8, vec![0; 16]),
            Err(GeoreferenceError::InvalidInput(_))
        ));
        assert!(SourceImage::new(&[4, 4, 0], DataType::UInt8, vec![]).is_err());
        assert!(SourceImage::new(&[4, 4, 3], DataType::UInt8, vec![0; 47]).is_err());

        let camera = ilce6000().with_altitude(0.0);
        let result = GeoreferencedRasterBuilder::default().build(
            image(60, 40),
            center(),
            &camera,
            &RotationMatrix::identity(),
        );
        assert!(matches!(result, Err(GeoreferenceError::InvalidInput(_))));
    }
}
