use super::{rotate_point, rotate_point_raw, GeoPoint, RotationMatrix};
use nalgebra::Vector3;
use std::ops::Index;

/// Image corner, named by the compass direction of its unrotated offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    NorthEast,
    SouthEast,
    SouthWest,
    NorthWest,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::NorthEast,
        Corner::SouthEast,
        Corner::SouthWest,
        Corner::NorthWest,
    ];

    pub const TOP_RIGHT: Corner = Corner::NorthEast;
    pub const BOTTOM_RIGHT: Corner = Corner::SouthEast;
    pub const BOTTOM_LEFT: Corner = Corner::SouthWest;
    pub const TOP_LEFT: Corner = Corner::NorthWest;

    pub fn from_pixel_corner(bottom: bool, right: bool) -> Self {
        match (bottom, right) {
            (false, true) => Corner::NorthEast,
            (true, true) => Corner::SouthEast,
            (true, false) => Corner::SouthWest,
            (false, false) => Corner::NorthWest,
        }
    }

    /// `(lat, lng)` signs of the unrotated offset
    fn signs(&self) -> (f64, f64) {
        match self {
            Corner::NorthEast => (1.0, 1.0),
            Corner::SouthEast => (-1.0, 1.0),
            Corner::SouthWest => (-1.0, -1.0),
            Corner::NorthWest => (1.0, -1.0),
        }
    }

    /// `(row, col)` of the corner in an image of `width` x `height` pixels
    pub fn pixel(&self, width: u32, height: u32) -> (f64, f64) {
        let (width, height) = (width as f64, height as f64);
        match self {
            Corner::NorthEast => (0.0, width),
            Corner::SouthEast => (height, width),
            Corner::SouthWest => (height, 0.0),
            Corner::NorthWest => (0.0, 0.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Corner::NorthEast => "NE",
            Corner::SouthEast => "SE",
            Corner::SouthWest => "SW",
            Corner::NorthWest => "NW",
        }
    }

    fn index(&self) -> usize {
        match self {
            Corner::NorthEast => 0,
            Corner::SouthEast => 1,
            Corner::SouthWest => 2,
            Corner::NorthWest => 3,
        }
    }
}

/// Orientation of the image y axis relative to latitude.
///
/// With `flip_y` unset a positive latitude offset is the top of the image.
/// Setting it negates the latitude component of every corner offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisConvention {
    pub flip_y: bool,
}

impl AxisConvention {
    pub fn flipped() -> Self {
        Self { flip_y: true }
    }

    fn offset(&self, corner: Corner, lat_offset: f64, lng_offset: f64) -> Vector3<f64> {
        let (lat_sign, lng_sign) = corner.signs();
        let lat_sign = if self.flip_y { -lat_sign } else { lat_sign };
        Vector3::new(lat_sign * lat_offset, lng_sign * lng_offset, 0.0)
    }
}

/// Ground positions of the four image corners
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedExtent {
    corners: [GeoPoint; 4],
}

impl RotatedExtent {
    pub fn corner(&self, corner: Corner) -> GeoPoint {
        self.corners[corner.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Corner, GeoPoint)> + '_ {
        Corner::ALL.into_iter().map(|c| (c, self.corner(c)))
    }

    /// `(min_lng, min_lat, max_lng, max_lat)`
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(x0, y0, x1, y1), p| {
                (
                    x0.min(p.longitude),
                    y0.min(p.latitude),
                    x1.max(p.longitude),
                    y1.max(p.latitude),
                )
            },
        )
    }
}

impl Index<Corner> for RotatedExtent {
    type Output = GeoPoint;

    fn index(&self, corner: Corner) -> &Self::Output {
        &self.corners[corner.index()]
    }
}

/// Raw vectors behind a [`RotatedExtent`], in [`Corner::ALL`] order
#[derive(Debug, Clone, PartialEq)]
pub struct ExtentDiagnostics {
    pub inputs: [Vector3<f64>; 4],
    pub outputs: [Vector3<f64>; 4],
}

pub fn rotate_extent(
    center: &GeoPoint,
    lat_offset: f64,
    lng_offset: f64,
    rotation: &RotationMatrix,
    convention: AxisConvention,
) -> RotatedExtent {
    let corners = Corner::ALL.map(|corner| {
        let offset = convention.offset(corner, lat_offset, lng_offset);
        let (latitude, longitude) = rotate_point(&offset, rotation, center);
        GeoPoint::new_2d(latitude, longitude)
    });
    RotatedExtent { corners }
}

pub fn rotate_extent_debug(
    center: &GeoPoint,
    lat_offset: f64,
    lng_offset: f64,
    rotation: &RotationMatrix,
    convention: AxisConvention,
) -> (RotatedExtent, ExtentDiagnostics) {
    let inputs = Corner::ALL.map(|corner| convention.offset(corner, lat_offset, lng_offset));
    let outputs = inputs.map(|offset| rotate_point_raw(&offset, rotation));
    let extent = rotate_extent(center, lat_offset, lng_offset, rotation, convention);
    (extent, ExtentDiagnostics { inputs, outputs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CENTER: GeoPoint = GeoPoint {
        latitude: 5.35995,
        longitude: -4.00826,
        altitude: 120.0,
    };

    #[test]
    fn identity_rotation_offsets_each_corner() {
        let (lat, lng) = (5e-4, 8e-4);
        let extent = rotate_extent(
            &CENTER,
            lat,
            lng,
            &RotationMatrix::identity(),
            AxisConvention::default(),
        );

        for (corner, point) in extent.iter() {
            let (lat_sign, lng_sign) = corner.signs();
            assert_relative_eq!(point.latitude, CENTER.latitude + lat_sign * lat, epsilon = 1e-12);
            assert_relative_eq!(point.longitude, CENTER.longitude + lng_sign * lng, epsilon = 1e-12);
        }
        assert!(extent[Corner::NorthEast].latitude > extent[Corner::SouthEast].latitude);
        assert!(extent[Corner::NorthEast].longitude > extent[Corner::NorthWest].longitude);
    }

    #[test]
    fn flip_y_mirrors_latitude() {
        let rotation = RotationMatrix::identity();
        let normal = rotate_extent(&CENTER, 5e-4, 8e-4, &rotation, AxisConvention::default());
        let flipped = rotate_extent(&CENTER, 5e-4, 8e-4, &rotation, AxisConvention::flipped());

        assert_relative_eq!(
            flipped[Corner::TOP_LEFT].latitude,
            normal[Corner::BOTTOM_LEFT].latitude,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            flipped[Corner::TOP_LEFT].longitude,
            normal[Corner::TOP_LEFT].longitude,
            epsilon = 1e-12
        );
    }

    #[test]
    fn debug_variant_matches_primary_result() {
        let rotation = RotationMatrix::from_opk_degrees(1.0, -2.0, 37.0);
        let convention = AxisConvention::default();
        let plain = rotate_extent(&CENTER, 5e-4, 8e-4, &rotation, convention);
        let (extent, diagnostics) = rotate_extent_debug(&CENTER, 5e-4, 8e-4, &rotation, convention);

        assert_eq!(plain, extent);
        assert_eq!(diagnostics.inputs[0], Vector3::new(5e-4, 8e-4, 0.0));
        for (i, corner) in Corner::ALL.iter().enumerate() {
            assert_relative_eq!(
                extent[*corner].latitude,
                CENTER.latitude + diagnostics.outputs[i].x,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn quarter_turn_rotates_corners() {
        let rotation = RotationMatrix::from_opk_degrees(0.0, 0.0, 90.0);
        let extent = rotate_extent(&CENTER, 1e-4, 1e-4, &rotation, AxisConvention::default());
        // (+lat, +lng) -> (-lng, +lat)
        let ne = extent[Corner::NorthEast];
        assert_relative_eq!(ne.latitude, CENTER.latitude - 1e-4, epsilon = 1e-12);
        assert_relative_eq!(ne.longitude, CENTER.longitude + 1e-4, epsilon = 1e-12);
    }

    #[test]
    fn pixel_corners_follow_image_axes() {
        assert_eq!(Corner::from_pixel_corner(false, false), Corner::NorthWest);
        assert_eq!(Corner::from_pixel_corner(true, true), Corner::SouthEast);
        assert_eq!(Corner::SouthWest.pixel(6000, 4000), (4000.0, 0.0));
        assert_eq!(Corner::NorthEast.pixel(6000, 4000), (0.0, 6000.0));
    }

    #[test]
    fn bounds_enclose_all_corners() {
        let extent = rotate_extent(
            &CENTER,
            5e-4,
            8e-4,
            &RotationMatrix::from_opk_degrees(0.0, 0.0, 30.0),
            AxisConvention::default(),
        );
        let (x0, y0, x1, y1) = extent.bounds();
        for (_, p) in extent.iter() {
            assert!(p.longitude >= x0 && p.longitude <= x1);
            assert!(p.latitude >= y0 && p.latitude <= y1);
        }
    }
}
