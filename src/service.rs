//! # Beach Profile Service
//!
//! Runs one survey submission end to end:
//!
//! 1. **Download**: fetch the survey and wave files from the object store
//!    into a fresh temporary directory
//! 2. **Parse**: read both CSV tables and the wave-height column
//! 3. **Plan**: expand transects × wave heights (shape errors stop here,
//!    before any unit runs)
//! 4. **Render & upload**: each plot is drawn to a PNG in the temporary
//!    directory, uploaded under the output prefix, and the local copy removed
//! 5. **Clean up**: the temporary directory is deleted when the call returns,
//!    on success and on error alike
//!
//! The service owns no analysis logic; it only wires the planner to the
//! store and the renderer.

use crate::{
    config::{BatchConfig, Config, RenderConfig},
    planner::{self, BatchReport, PlotSink},
    renderer::{self, RenderError},
    storage::{ObjectStore, StorageError},
    table::{self, ProfileTable, TableError},
    ProfileError, ProfilePlot,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fs, io, path::Path};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("scratch directory: {0}")]
    Scratch(#[from] io::Error),
}

/// Result of one submission, serialized as the `data` of the CLI response.
#[derive(Clone, Debug, Serialize)]
pub struct SubmissionReport {
    pub profile_file: String,
    pub wave_data_file: String,
    pub generated_at: DateTime<Utc>,
    pub transects: usize,
    pub wave_heights: Vec<f64>,
    pub delivered: usize,
    pub failed: usize,
    pub skipped: usize,
    #[serde(flatten)]
    pub batch: BatchReport,
}

impl SubmissionReport {
    pub fn is_complete(&self) -> bool {
        self.batch.is_complete()
    }
}

/// Survey submission runner bound to one object store.
pub struct ProfileService<S> {
    store: S,
    render: RenderConfig,
    batch: BatchConfig,
    output_prefix: String,
}

impl<S: ObjectStore> ProfileService<S> {
    pub fn new(store: S, config: &Config) -> Self {
        Self {
            store,
            render: config.render.clone(),
            batch: config.batch.clone(),
            output_prefix: config.storage.output_prefix.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Analyse the survey at `profile_key` against the wave heights at
    /// `wave_key` and upload one rendered profile per unit.
    pub fn create_profiles(
        &self,
        profile_key: &str,
        wave_key: &str,
    ) -> Result<SubmissionReport, ServiceError> {
        let scratch = TempDir::new()?;

        let profile_path = scratch.path().join("profile.csv");
        let wave_path = scratch.path().join("waves.csv");
        self.store.download_file(profile_key, &profile_path)?;
        self.store.download_file(wave_key, &wave_path)?;
        info!(profile = profile_key, waves = wave_key, "downloaded survey files");

        let profile = ProfileTable::load(&profile_path)?;
        let waves = table::wave_observations(
            &ProfileTable::load(&wave_path)?,
            &self.batch.wave_height_column,
        )?;
        info!(
            columns = profile.column_count(),
            rows = profile.row_count(),
            waves = waves.len(),
            "parsed survey files"
        );

        let transects = planner::partition_transects(&profile)?.len();
        let units = planner::plan(&profile, &waves, profile_key)?;

        let mut sink = StoreSink {
            store: &self.store,
            render: &self.render,
            scratch: scratch.path(),
            prefix: &self.output_prefix,
        };
        let batch = planner::drive(
            &units,
            &profile,
            &mut sink,
            self.batch.policy,
            self.batch.parallel,
        );

        debug!(path = %scratch.path().display(), "removing scratch directory");
        Ok(SubmissionReport {
            profile_file: profile_key.to_string(),
            wave_data_file: wave_key.to_string(),
            generated_at: Utc::now(),
            transects,
            wave_heights: waves.iter().map(|w| w.height_m()).collect(),
            delivered: batch.delivered(),
            failed: batch.failed(),
            skipped: batch.skipped(),
            batch,
        })
    }
}

/// Object key for a rendered profile under `prefix`.
pub fn output_key(prefix: &str, label: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        label.to_string()
    } else {
        format!("{prefix}/{label}")
    }
}

/// Renders each plot into the scratch directory and uploads it.
struct StoreSink<'a, S> {
    store: &'a S,
    render: &'a RenderConfig,
    scratch: &'a Path,
    prefix: &'a str,
}

impl<S: ObjectStore> PlotSink for StoreSink<'_, S> {
    type Error = ServiceError;

    fn deliver(&mut self, plot: &ProfilePlot) -> Result<String, Self::Error> {
        let local = self.scratch.join(&plot.label);
        renderer::render_png(plot, self.render, &local)?;

        let key = output_key(self.prefix, &plot.label);
        let uploaded = self.store.upload_file(&local, &key)?;
        // The scratch directory goes away with the submission regardless
        if let Err(e) = fs::remove_file(&local) {
            warn!(path = %local.display(), error = %e, "could not remove rendered image");
        }
        Ok(uploaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::StorageConfig, storage::DirectoryStore, Coordinate, Transect};

    /// Moves uploaded files into the bucket instead of copying them, so the
    /// local file is already gone when the sink tries to remove it.
    struct MovingStore(DirectoryStore);

    impl ObjectStore for MovingStore {
        fn upload_file(&self, local_path: &Path, key: &str) -> Result<String, StorageError> {
            let url = self.0.upload_file(local_path, key)?;
            fs::remove_file(local_path).map_err(|source| StorageError::Io {
                key: key.to_string(),
                source,
            })?;
            Ok(url)
        }

        fn upload_bytes(&self, data: &[u8], key: &str, content_type: &str) -> Result<(), StorageError> {
            self.0.upload_bytes(data, key, content_type)
        }

        fn download_file(&self, key: &str, destination: &Path) -> Result<(), StorageError> {
            self.0.download_file(key, destination)
        }

        fn file_url(&self, key: &str) -> String {
            self.0.file_url(key)
        }

        fn list_files(&self, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
            self.0.list_files(prefix)
        }

        fn delete_file(&self, key: &str) -> Result<(), StorageError> {
            self.0.delete_file(key)
        }

        fn file_exists(&self, key: &str) -> bool {
            self.0.file_exists(key)
        }
    }

    fn plot() -> ProfilePlot {
        ProfilePlot {
            label: "profile_survey.csv_1_1.5.png".to_string(),
            transect_index: 1,
            wave_height: 1.5,
            breaking_depth: 1.5 / 0.78,
            transect: Transect {
                coordinates: vec![
                    Coordinate { x: 0.0, depth: 4.0 },
                    Coordinate { x: 10.0, depth: 1.0 },
                ],
                alongshore_distance: 50.0,
            },
            break_point: Some(Coordinate { x: 10.0, depth: 1.0 }),
        }
    }

    #[test]
    fn test_delivery_survives_missing_local_file_after_upload() {
        let root = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let storage = StorageConfig::new(root.path(), "beach", "out").unwrap();
        let store = MovingStore(DirectoryStore::new(&storage).unwrap());
        let render = RenderConfig {
            width: 200,
            height: 100,
        };

        let mut sink = StoreSink {
            store: &store,
            render: &render,
            scratch: scratch.path(),
            prefix: "out",
        };
        let location = sink.deliver(&plot()).unwrap();

        assert!(location.starts_with("file://"));
        assert!(store.file_exists("out/profile_survey.csv_1_1.5.png"));
        assert!(!scratch.path().join("profile_survey.csv_1_1.5.png").exists());
    }

    #[test]
    fn test_output_key_joins_prefix() {
        assert_eq!(
            output_key("outputs/images", "profile_a.csv_1_1.0.png"),
            "outputs/images/profile_a.csv_1_1.0.png"
        );
        assert_eq!(output_key("outputs/", "p.png"), "outputs/p.png");
        assert_eq!(output_key("", "p.png"), "p.png");
    }
}
