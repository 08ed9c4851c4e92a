#[cfg(not(feature = "image"))]
compile_error!("This example requires the 'image' feature");

use placecog::cogify::{cogify_bytes, CogifySettings};
use placecog::georef::{CameraProfile, GeoPoint, RotationMatrix};
use std::collections::BTreeMap;
use std::time::Instant;

const INPUT_FILE: &str = "data/DSC00001.JPG";
const OUTPUT_COG: &str = "data/DSC00001.tif";

fn main() {
    println!("Example: placecog georeference");

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let bytes = std::fs::read(INPUT_FILE).unwrap();

    let center = GeoPoint::new(5.35995, -4.00826, 120.0);
    let camera = CameraProfile::SonyIlce6000.parameters(center.altitude);
    let rotation = RotationMatrix::from_elements([
        0.9987, -0.0475, 0.0184, 0.0479, 0.9985, -0.0249, -0.0172, 0.0258, 0.9995,
    ]);
    let mut tags = BTreeMap::new();
    tags.insert("Model".to_string(), CameraProfile::SonyIlce6000.model().to_string());

    let t0 = Instant::now();
    let cog = cogify_bytes(
        &bytes,
        tags,
        center,
        &camera,
        &rotation,
        &CogifySettings::default(),
    )
    .unwrap();
    println!(
        "Georeferenced in {:.3}ms",
        t0.elapsed().as_micros() as f64 / 1000.0
    );

    std::fs::write(OUTPUT_COG, cog).unwrap();
    println!("Saved COG to {OUTPUT_COG}");
}
