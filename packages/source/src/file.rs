//! Saved street-crime dumps.
//!
//! Reads a JSON file holding the same array [`crate::police_uk`] receives,
//! e.g. one written by `crime_cluster_cli fetch --output`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use crime_cluster_source_models::Incident;

use crate::progress::ProgressCallback;
use crate::record::normalize_payload;
use crate::{FetchOptions, IncidentSource, SourceError};

/// Incident source backed by a local JSON dump.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Creates a source reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path the source reads from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl IncidentSource for FileSource {
    fn id(&self) -> &'static str {
        "file"
    }

    fn name(&self) -> &'static str {
        "Saved street-crime dump"
    }

    /// Options are ignored: the dump already fixes location and month.
    async fn fetch(
        &self,
        _options: &FetchOptions,
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<Incident>, SourceError> {
        progress.set_message(format!("Reading {}", self.path.display()));
        let body = tokio::fs::read_to_string(&self.path).await?;
        let incidents = normalize_payload(&body)?;
        log::info!(
            "Loaded {} incidents from {}",
            incidents.len(),
            self.path.display()
        );
        progress.finish(format!("{} incidents", incidents.len()));
        Ok(incidents)
    }
}
