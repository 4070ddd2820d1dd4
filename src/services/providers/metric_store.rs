/// File-backed metric store
///
/// Mirrors an object-store bucket on the local filesystem: keys are
/// `/`-separated paths below a root directory. Evaluation records are JSON
/// documents directly under a prefix directory; model blobs are opaque files.
use std::path::{Component, Path, PathBuf};

use crate::{
    error::{AppError, AppResult},
    models::EvaluationRecord,
    services::providers::MetricStore,
};

#[derive(Debug, Clone)]
pub struct FsMetricStore {
    root: PathBuf,
}

impl FsMetricStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps a store key onto a path under the root, refusing to escape it
    fn resolve(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key.trim_start_matches('/'));
        let mut path = self.root.clone();

        for component in relative.components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(AppError::InvalidInput(format!(
                        "Store key '{}' escapes the store root",
                        key
                    )))
                }
            }
        }

        Ok(path)
    }

    async fn read_record(path: &Path) -> Option<EvaluationRecord> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Unreadable evaluation record");
                return None;
            }
        };

        match serde_json::from_slice::<EvaluationRecord>(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping malformed evaluation record");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl MetricStore for FsMetricStore {
    async fn latest_evaluations(
        &self,
        prefix: &str,
        max: usize,
    ) -> AppResult<Vec<EvaluationRecord>> {
        let dir = self.resolve(prefix)?;

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    prefix = %prefix,
                    path = %dir.display(),
                    error = %e,
                    "Metric store prefix unavailable; treating as empty"
                );
                return Ok(Vec::new());
            }
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(record) = Self::read_record(&path).await {
                records.push(record);
            }
        }

        records.sort_by(|a, b| {
            b.trained_at
                .cmp(&a.trained_at)
                .then_with(|| a.model_key.cmp(&b.model_key))
        });
        records.truncate(max);

        tracing::info!(
            prefix = %prefix,
            records = records.len(),
            store = self.name(),
            "Evaluation records loaded"
        );

        Ok(records)
    }

    async fn read_model(&self, model_key: &str) -> AppResult<Vec<u8>> {
        let path = self.resolve(model_key)?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                tracing::info!(model_key = %model_key, bytes = bytes.len(), "Model blob read");
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound(
                format!("Model '{}' not found in store", model_key),
            )),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    fn name(&self) -> &'static str {
        "filesystem"
    }
}
