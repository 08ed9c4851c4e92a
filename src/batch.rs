#![cfg(all(feature = "async", feature = "image"))]

use crate::cogify::{cogify_bytes, CogifySettings};
use crate::georef::calibration::corrected_gps_altitude;
use crate::georef::{CameraProfile, GeoPoint, RotationMatrix, MODEL_TAG};
use crate::io::{Location, ObjectStore};
use crate::table::{LocationTable, RotationTable};
use crate::{CogifyError, CogifyResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::*;

/// One photograph to georeference
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub id: String,
    pub source: Location,
    pub destination: Location,
    pub center: GeoPoint,
    pub rotation: RotationMatrix,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Concurrent jobs
    pub workers: usize,
    pub camera: CameraProfile,
    /// Apply the GPS altitude correction to each job's altitude
    pub correct_altitude: bool,
    pub settings: CogifySettings,
}

impl Default for BatchConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            workers: cpus.min(4),
            camera: CameraProfile::SonyIlce6000,
            correct_altitude: false,
            settings: CogifySettings::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, CogifyError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Jobs for every image in `locations` that also has a rotation.
///
/// Sources are `{source_dir}/{id}.JPG`, outputs `{output_dir}/{id}.tif`.
pub fn jobs_from_tables(
    locations: &LocationTable,
    rotations: &RotationTable,
    source_dir: &Location,
    output_dir: &Location,
) -> Vec<BatchJob> {
    locations
        .0
        .iter()
        .filter_map(|(id, center)| match rotations.get(id) {
            Some(rotation) => Some(BatchJob {
                id: id.to_string(),
                source: source_dir.join(&format!("{id}.JPG")),
                destination: output_dir.join(&format!("{id}.tif")),
                center: *center,
                rotation: *rotation,
                tags: BTreeMap::new(),
            }),
            None => {
                warn!("ID {id} not found in rotation table, skipping");
                None
            }
        })
        .collect()
}

/// Run `jobs` on a pool of `config.workers` tasks.
///
/// A failing job is recorded in the report and never stops the others.
pub async fn run_batch(
    store: Arc<dyn ObjectStore>,
    jobs: Vec<BatchJob>,
    config: BatchConfig,
) -> BatchReport {
    let workers = config.workers.max(1);
    let config = Arc::new(config);
    let (job_tx, job_rx) = mpsc::channel::<BatchJob>(workers * 2);
    let (result_tx, mut result_rx) = mpsc::channel(workers * 2);
    let job_rx = Arc::new(Mutex::new(job_rx));

    info!("Processing {} images with {workers} workers", jobs.len());

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            let store = store.clone();
            let config = config.clone();
            tokio::spawn(async move {
                loop {
                    let job = job_rx.lock().await.recv().await;
                    let Some(job) = job else {
                        break;
                    };
                    let id = job.id.clone();
                    let result = process_job(store.as_ref(), job, &config).await;
                    if result_tx.send((id, result)).await.is_err() {
                        break;
                    }
                }
            })
        })
        .collect();
    drop(result_tx);

    let feeder = tokio::spawn(async move {
        for job in jobs {
            if job_tx.send(job).await.is_err() {
                break;
            }
        }
    });

    let mut report = BatchReport::default();
    while let Some((id, result)) = result_rx.recv().await {
        match result {
            Ok(destination) => {
                info!("Successfully processed {id}; results: {destination}");
                report.succeeded.push(id);
            }
            Err(e) => {
                warn!("Failed to process {id}: {e:?}");
                report.failed.push((id, e));
            }
        }
    }

    for handle in handles.into_iter().chain(std::iter::once(feeder)) {
        if let Err(e) = handle.await {
            warn!("Failed to join batch worker: {e:?}");
        }
    }

    info!(
        "Successfully converted {}/{} images",
        report.succeeded.len(),
        report.total()
    );
    report
}

async fn process_job(
    store: &dyn ObjectStore,
    job: BatchJob,
    config: &BatchConfig,
) -> CogifyResult<Location> {
    info!("Processing imagery from {}", job.source);
    let bytes = store.get(&job.source).await?;

    let altitude = if config.correct_altitude {
        corrected_gps_altitude(job.center.altitude)
    } else {
        job.center.altitude
    };
    let camera = config.camera.parameters(altitude);
    let settings = config.settings.clone();
    let mut tags = job.tags;
    tags.entry(MODEL_TAG.to_string())
        .or_insert_with(|| config.camera.model().to_string());
    let center = job.center;
    let rotation = job.rotation;

    let cog = tokio::task::spawn_blocking(move || {
        cogify_bytes(&bytes, tags, center, &camera, &rotation, &settings)
    })
    .await??;

    store.put(&job.destination, cog).await?;
    Ok(job.destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    #[test]
    fn missing_rotations_are_skipped() {
        let locations = LocationTable::from_table(
            &Table::from_reader("id,X,Y,Z\n1,-4.0,5.3,120\n2,-4.1,5.4,121\n".as_bytes(), b',', 0)
                .unwrap(),
        )
        .unwrap();
        let rotations = RotationTable::from_table(
            &Table::from_reader(
                "preamble\nid,r11,r12,r13,r21,r22,r23,r31,r32,r33\n2,1,0,0,0,1,0,0,0,1\n"
                    .as_bytes(),
                b',',
                1,
            )
            .unwrap(),
        )
        .unwrap();

        let jobs = jobs_from_tables(
            &locations,
            &rotations,
            &Location::parse("s3://raw/flight").unwrap(),
            &Location::local("out"),
        );
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "2");
        assert_eq!(jobs[0].source.to_string(), "s3://raw/flight/2.JPG");
        assert_eq!(jobs[0].destination, Location::local("out/2.tif"));
        assert_eq!(jobs[0].center.latitude, 5.4);
    }

    #[test]
    fn default_pool_is_bounded() {
        let config = BatchConfig::default();
        assert!(config.workers >= 1 && config.workers <= 4);
    }
}
