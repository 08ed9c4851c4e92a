// https://docs.ogc.org/is/19-008r4/19-008r4.html#_geotiff_tags_for_coordinate_transformations

use crate::tiff::{Endian, Ifd, TagData, TagId};
use keys::GeoKey;
use std::fmt::Display;

mod error;
mod id;
mod keys;
mod value;

pub use error::GeoTiffError;
pub use id::{
    GeoKeyId, ANGULAR_UNIT_DEGREE, MODEL_TYPE_GEOGRAPHIC, MODEL_TYPE_PROJECTED,
    RASTER_PIXEL_IS_AREA,
};
pub use keys::GeoKeyDirectory;
pub use value::GeoKeyValue;

#[derive(Clone, Debug)]
pub struct GeoTags {
    pub directory: GeoKeyDirectory,
    pub model: GeoModel,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GeoModel {
    Transformed(GeoModelTransformed),
    Scaled(GeoModelScaled),
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeoModelTransformed {
    pub transformation: [f64; 16],
    pub tiepoint: Option<[f64; 6]>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeoModelScaled {
    pub pixel_scale: [f64; 3],
    pub tiepoint: [f64; 6],
}

impl Display for GeoTags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "GeoTIFF Tags:")?;
        match &self.model {
            GeoModel::Transformed(model) => {
                writeln!(f, "  Tiepoint: {:?}", model.tiepoint)?;
                writeln!(f, "  Transformation: {:?}", model.transformation)?;
            }
            GeoModel::Scaled(model) => {
                writeln!(f, "  Tiepoint: {:?}", model.tiepoint)?;
                writeln!(f, "  Pixel Scale: {:?}", model.pixel_scale)?;
            }
        }
        write!(
            f,
            "  Directory: {{version: {}, revision: {}.{}}}",
            self.directory.version, self.directory.revision.0, self.directory.revision.1,
        )?;
        if !self.directory.keys.is_empty() {
            write!(f, "\n  Keys:")?;
            for key in self.directory.keys.iter() {
                write!(f, "\n    {key}")?;
            }
        }
        Ok(())
    }
}

impl GeoTags {
    pub fn from_tiepoint_and_scale(tiepoint: [f64; 6], pixel_scale: [f64; 3]) -> Self {
        Self {
            model: GeoModel::Scaled(GeoModelScaled {
                tiepoint,
                pixel_scale,
            }),
            directory: GeoKeyDirectory::new(),
        }
    }

    pub fn from_transformation(transformation: [f64; 16]) -> Self {
        Self {
            model: GeoModel::Transformed(GeoModelTransformed {
                tiepoint: None,
                transformation,
            }),
            directory: GeoKeyDirectory::new(),
        }
    }

    /// Declare the coordinate reference system by EPSG code.
    ///
    /// Codes in the 4000 range are treated as geographic (degrees), anything
    /// else as projected.
    pub fn with_epsg(mut self, epsg: u16) -> Self {
        self.set_key(GeoKeyId::GTRasterTypeGeoKey, GeoKeyValue::short(RASTER_PIXEL_IS_AREA));
        if (4000..5000).contains(&epsg) {
            self.set_key(GeoKeyId::GTModelTypeGeoKey, GeoKeyValue::short(MODEL_TYPE_GEOGRAPHIC));
            self.set_key(GeoKeyId::GeographicTypeGeoKey, GeoKeyValue::short(epsg));
            self.set_key(
                GeoKeyId::GeogAngularUnitsGeoKey,
                GeoKeyValue::short(ANGULAR_UNIT_DEGREE),
            );
        } else {
            self.set_key(GeoKeyId::GTModelTypeGeoKey, GeoKeyValue::short(MODEL_TYPE_PROJECTED));
            self.set_key(GeoKeyId::ProjectedCSTypeGeoKey, GeoKeyValue::short(epsg));
        }
        self
    }

    pub fn epsg(&self) -> Option<u16> {
        self.directory
            .get(GeoKeyId::ProjectedCSTypeGeoKey)
            .or_else(|| self.directory.get(GeoKeyId::GeographicTypeGeoKey))
            .and_then(|value| value.as_number())
    }

    pub fn parse(ifd: &Ifd) -> Result<Self, GeoTiffError> {
        let tiepoint = get_tag_as_array(ifd, TagId::ModelTiepoint).ok();
        let pixel_scale = get_tag_as_array(ifd, TagId::ModelPixelScale).ok();
        let transformation = get_tag_as_array(ifd, TagId::ModelTransformation).ok();
        let model = match (tiepoint, pixel_scale, transformation) {
            (Some(tiepoint), Some(pixel_scale), _) => GeoModel::Scaled(GeoModelScaled {
                tiepoint,
                pixel_scale,
            }),
            (tiepoint, _, Some(transformation)) => GeoModel::Transformed(GeoModelTransformed {
                tiepoint,
                transformation,
            }),
            _ => return Err(GeoTiffError::MissingTag(TagId::ModelPixelScale)),
        };

        let directory = GeoKeyDirectory::parse(ifd)?;

        Ok(Self { model, directory })
    }

    pub fn add_to_ifd(&self, ifd: &mut Ifd, endian: Endian) {
        match &self.model {
            GeoModel::Transformed(model) => {
                ifd.set_tag(
                    TagId::ModelTransformation,
                    TagData::Double(model.transformation.to_vec()),
                    endian,
                );
                if let Some(tiepoint) = model.tiepoint {
                    ifd.set_tag(
                        TagId::ModelTiepoint,
                        TagData::Double(tiepoint.to_vec()),
                        endian,
                    );
                }
            }
            GeoModel::Scaled(model) => {
                ifd.set_tag(
                    TagId::ModelTiepoint,
                    TagData::Double(model.tiepoint.to_vec()),
                    endian,
                );
                ifd.set_tag(
                    TagId::ModelPixelScale,
                    TagData::Double(model.pixel_scale.to_vec()),
                    endian,
                );
            }
        }
        self.directory.add_to_ifd(ifd, endian);
    }

    pub fn set_key<I: Into<u16>>(&mut self, id: I, value: GeoKeyValue) {
        let code: u16 = id.into();
        let key = GeoKey { code, value };
        let keys = &mut self.directory.keys;
        if let Some(index) = keys.iter().position(|key| key.code == code) {
            keys[index] = key;
        } else {
            keys.push(key);
        }
    }
}

fn get_tag_as_array<const N: usize>(ifd: &Ifd, id: TagId) -> Result<[f64; N], GeoTiffError> {
    ifd.get_tag_values::<f64>(id)
        .map_err(|_| GeoTiffError::MissingTag(id))?
        .try_into()
        .map_err(|_| GeoTiffError::BadTag(id))
}
