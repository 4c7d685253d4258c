use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::RecordSource;
use crate::error::PipelineError;
use crate::models::SiteRecord;
use crate::utils::{site_info_filename, write_atomic};

/// Reads and writes validated records as `<data_dir>/<site_id>_site_info.json`
pub struct LocalFileSource {
    data_dir: PathBuf,
}

impl LocalFileSource {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn path_for(&self, site_id: &str) -> PathBuf {
        self.data_dir.join(site_info_filename(site_id))
    }

    /// Persist a validated record (pretty-printed JSON), replacing any previous one
    pub fn store(&self, site_id: &str, record: &SiteRecord) -> Result<PathBuf, PipelineError> {
        let path = self.path_for(site_id);
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| PipelineError::io(path.display().to_string(), e.into()))?;
        write_atomic(&path, json.as_bytes())?;
        tracing::info!("Saved site record to {}", path.display());
        Ok(path)
    }
}

impl RecordSource for LocalFileSource {
    fn fetch(&self, site_id: &str) -> Result<SiteRecord, PipelineError> {
        let path = self.path_for(site_id);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(PipelineError::not_found(
                    site_id,
                    format!("{} does not exist", path.display()),
                ));
            }
            Err(e) => {
                return Err(PipelineError::unavailable(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let record: SiteRecord = serde_json::from_str(&content).map_err(|e| {
            PipelineError::unavailable(format!("{} is not a flat JSON object of strings: {}", path.display(), e))
        })?;

        if let Some(stored_id) = record.site_id() {
            if stored_id != site_id {
                tracing::warn!(
                    "{} contains Site_ID {} (expected {})",
                    path.display(),
                    stored_id,
                    site_id
                );
            }
        }

        tracing::info!("Loaded site {} from {}", site_id, path.display());
        Ok(record)
    }

    fn describe(&self) -> String {
        format!("local files in {}", self.data_dir.display())
    }
}
