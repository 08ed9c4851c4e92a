#![cfg(all(feature = "image", feature = "async"))]
// This example requires the ['image', 'async'] features

use placecog::batch::{jobs_from_tables, run_batch, BatchConfig};
use placecog::io::{Location, RoutingStore};
use placecog::table::{LocationTable, RotationTable};
use std::sync::Arc;

const LOCATION_TABLE: &str = "data/locations.csv";
const ROTATION_TABLE: &str = "data/pko.txt";
const SOURCE_DIR: &str = "data/raw";
const OUTPUT_DIR: &str = "data/cogs";

#[tokio::main]
async fn main() {
    println!("Example: placecog batch");

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_thread_ids(true)
        .init();

    let locations = LocationTable::from_path(LOCATION_TABLE, 0).unwrap();
    let rotations = RotationTable::from_path(ROTATION_TABLE, RotationTable::DEFAULT_OFFSET).unwrap();
    let jobs = jobs_from_tables(
        &locations,
        &rotations,
        &Location::parse(SOURCE_DIR).unwrap(),
        &Location::parse(OUTPUT_DIR).unwrap(),
    );

    // S3 locations need a client, e.g. RoutingStore::new().with_s3(S3Store::from_env().await)
    let store = Arc::new(RoutingStore::new());
    let report = run_batch(store, jobs, BatchConfig::default()).await;

    println!(
        "Successfully converted {}/{} images",
        report.succeeded.len(),
        report.total()
    );
    for (id, e) in report.failed.iter() {
        println!("  {id}: {e}");
    }
}
