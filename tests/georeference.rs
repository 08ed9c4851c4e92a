use approx::assert_relative_eq;
use placecog::geotags::{GeoModel, GeoTags};
use placecog::raster::DataType;
use placecog::tiff::{TagId, Tiff};
use placecog::{
    AffineTransform, CameraParameters, GeoPoint, GeoreferencedRasterBuilder, RotationMatrix,
    SourceImage,
};
use std::io::Cursor;

fn center() -> GeoPoint {
    GeoPoint::new(5.35995, -4.00826, 120.0)
}

fn camera() -> CameraParameters {
    CameraParameters::from_millimeters(23.5, 15.6, 16.0, 120.0)
}

fn image(width: usize, height: usize) -> SourceImage {
    let buffer = (0..width * height * 3).map(|i| (i % 253) as u8).collect();
    SourceImage::new(&[height, width, 3], DataType::UInt8, buffer)
        .unwrap()
        .with_tag("DateTime", "2022:03:14 10:21:07")
}

#[test]
fn rotated_image_round_trips_through_a_cog() {
    let rotation = RotationMatrix::from_elements([
        0.9987, -0.0475, 0.0184, 0.0479, 0.9985, -0.0249, -0.0172, 0.0258, 0.9995,
    ]);
    let raster = GeoreferencedRasterBuilder::default()
        .build(image(300, 200), center(), &camera(), &rotation)
        .unwrap();
    let transform = raster.transform;

    let bytes = raster
        .into_encoder()
        .with_tile_size(64)
        .encode_to_vec()
        .unwrap();

    let tiff = Tiff::open(&mut Cursor::new(&bytes)).unwrap();
    let ifd0 = tiff.ifd0().unwrap();
    assert_eq!(ifd0.get_tag_value::<u32>(TagId::ImageWidth).unwrap(), 300);
    assert_eq!(ifd0.get_tag_value::<u32>(TagId::ImageHeight).unwrap(), 200);
    assert_eq!(ifd0.get_tag_values::<u16>(TagId::BitsPerSample).unwrap(), vec![8, 8, 8]);
    assert_eq!(
        ifd0.get_tag(TagId::GDALNoData).unwrap().try_to_string().as_deref(),
        Some("1")
    );
    assert_eq!(
        ifd0.get_tag(TagId::DateTime).unwrap().try_to_string().as_deref(),
        Some("2022:03:14 10:21:07")
    );

    let geo = GeoTags::parse(ifd0).unwrap();
    assert_eq!(geo.epsg(), Some(4326));
    let GeoModel::Transformed(model) = geo.model else {
        panic!("Rotated images need a model transformation");
    };
    let parsed = AffineTransform::from_model_transformation(&model.transformation);
    assert_relative_eq!(parsed.a, transform.a, max_relative = 1e-12);
    assert_relative_eq!(parsed.c, transform.c, max_relative = 1e-12);
    assert_relative_eq!(parsed.f, transform.f, max_relative = 1e-12);

    // 300x200 with 64 px tiles: 150x100, 75x50, 38x25
    assert_eq!(tiff.ifds.len(), 4);
}

#[test]
fn image_center_maps_to_gps_position() {
    let rotation = RotationMatrix::from_opk_degrees(0.0, 0.0, 20.0);
    let raster = GeoreferencedRasterBuilder::default()
        .build(image(300, 200), center(), &camera(), &rotation)
        .unwrap();
    let (x, y) = raster.transform.apply(150.0, 100.0);
    assert_relative_eq!(x, center().longitude, epsilon = 1e-9);
    assert_relative_eq!(y, center().latitude, epsilon = 1e-9);
}

#[test]
fn north_up_images_use_tiepoint_and_scale() {
    let raster = GeoreferencedRasterBuilder::default()
        .build(image(120, 80), center(), &camera(), &RotationMatrix::identity())
        .unwrap();
    let transform = raster.transform;
    assert!(transform.is_north_up());
    let bytes = raster
        .into_encoder()
        .with_tile_size(64)
        .encode_to_vec()
        .unwrap();

    let tiff = Tiff::open(&mut Cursor::new(&bytes)).unwrap();
    let geo = GeoTags::parse(tiff.ifd0().unwrap()).unwrap();
    match geo.model {
        GeoModel::Scaled(model) => {
            assert_eq!(model.tiepoint[3], transform.c);
            assert_eq!(model.tiepoint[4], transform.f);
            assert!(model.pixel_scale[1] > 0.0);
        }
        other => panic!("Expected tiepoint and scale, got {other:?}"),
    }
}
