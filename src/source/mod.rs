mod local;
mod sheets;

pub use local::LocalFileSource;
pub use sheets::SheetsSource;

use serde::Deserialize;

use crate::config::Config;
use crate::error::PipelineError;
use crate::models::SiteRecord;

/// Where site records come from.
///
/// Implementations return `NotFound` when the identifier is absent and
/// `SourceUnavailable` when the backing store cannot be read.
pub trait RecordSource {
    fn fetch(&self, site_id: &str) -> Result<SiteRecord, PipelineError>;

    /// Short human-readable description for logs
    fn describe(&self) -> String;
}

/// Which record source to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Remote inventory spreadsheet
    Sheets,
    /// Previously validated `<site_id>_site_info.json`
    #[default]
    Local,
}

/// Construct the configured source
pub fn build(kind: SourceKind, config: &Config) -> Result<Box<dyn RecordSource>, PipelineError> {
    let source: Box<dyn RecordSource> = match kind {
        SourceKind::Sheets => Box::new(SheetsSource::new(&config.sheets)?),
        SourceKind::Local => Box::new(LocalFileSource::new(&config.data_dir)),
    };
    tracing::debug!("Using record source: {}", source.describe());
    Ok(source)
}
