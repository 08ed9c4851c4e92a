// https://docs.ogc.org/is/19-008r4/19-008r4.html#_summary_of_geokey_ids_and_names

use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, PartialEq, Clone, Copy, IntoPrimitive, TryFromPrimitive, Eq, Hash)]
#[repr(u16)]
pub enum GeoKeyId {
    GTModelTypeGeoKey = 1024,
    GTRasterTypeGeoKey = 1025,
    GTCitationGeoKey = 1026,
    GeographicTypeGeoKey = 2048,
    GeogCitationGeoKey = 2049,
    GeogAngularUnitsGeoKey = 2054,
    ProjectedCSTypeGeoKey = 3072,
    ProjLinearUnitsGeoKey = 3076,
}

/// GTModelTypeGeoKey values
pub const MODEL_TYPE_PROJECTED: u16 = 1;
pub const MODEL_TYPE_GEOGRAPHIC: u16 = 2;

/// GTRasterTypeGeoKey values
pub const RASTER_PIXEL_IS_AREA: u16 = 1;

/// GeogAngularUnitsGeoKey value for degrees
pub const ANGULAR_UNIT_DEGREE: u16 = 9102;
