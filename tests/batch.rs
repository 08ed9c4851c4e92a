#![cfg(all(feature = "async", feature = "image"))]

use placecog::batch::{run_batch, BatchConfig, BatchJob};
use placecog::io::{Location, ObjectStore, RoutingStore};
use placecog::{CogifyError, GeoPoint, RotationMatrix};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::Arc;

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| image::Rgb([x as u8, y as u8, 128]));
    let mut bytes = vec![];
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Jpeg)
        .unwrap();
    bytes
}

fn job(dir: &std::path::Path, id: &str) -> BatchJob {
    BatchJob {
        id: id.to_string(),
        source: Location::local(dir.join(format!("raw/{id}.JPG"))),
        destination: Location::local(dir.join(format!("cogs/{id}.tif"))),
        center: GeoPoint::new(5.35995, -4.00826, 120.0),
        rotation: RotationMatrix::from_opk_degrees(0.2, -0.1, 33.0),
        tags: BTreeMap::new(),
    }
}

#[tokio::test]
async fn one_bad_image_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RoutingStore::new());

    let good = ["1", "2", "3"];
    for id in good {
        store
            .put(&job(dir.path(), id).source, jpeg(96, 64))
            .await
            .unwrap();
    }
    store
        .put(&job(dir.path(), "bad").source, b"truncated".to_vec())
        .await
        .unwrap();

    let mut jobs: Vec<_> = good.iter().map(|id| job(dir.path(), id)).collect();
    jobs.insert(1, job(dir.path(), "bad"));
    jobs.push(job(dir.path(), "missing"));

    let config = BatchConfig {
        workers: 2,
        ..Default::default()
    };
    let report = run_batch(store.clone(), jobs, config).await;

    assert_eq!(report.total(), 5);
    let mut succeeded = report.succeeded.clone();
    succeeded.sort();
    assert_eq!(succeeded, vec!["1", "2", "3"]);

    let mut failed: Vec<_> = report.failed.iter().map(|(id, e)| (id.as_str(), e)).collect();
    failed.sort_by_key(|(id, _)| *id);
    assert!(matches!(failed[0], ("bad", CogifyError::Decode(_))));
    assert!(matches!(failed[1], ("missing", CogifyError::Io(_))));

    for id in good {
        let cog = store.get(&job(dir.path(), id).destination).await.unwrap();
        assert!(cog.starts_with(b"II") || cog.starts_with(b"MM"));
    }
}
