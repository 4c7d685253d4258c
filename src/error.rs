use thiserror::Error;

use crate::validate::Violation;

/// Every way a single-site run can fail.
///
/// Components return this directly; `main` works in `anyhow::Result` and
/// downcasts back to pick the exit code (see [`PipelineError::exit_code`]).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("site {site_id} not found: {reason}")]
    NotFound { site_id: String, reason: String },

    #[error("record source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("site information is invalid: {0}")]
    Validation(Violation),

    #[error("mapping failed: source field {field} is missing from the record")]
    Mapping { field: String },

    #[error("template error: {0}")]
    Template(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn not_found(site_id: &str, reason: impl Into<String>) -> Self {
        Self::NotFound {
            site_id: site_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::SourceUnavailable(msg.into())
    }

    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this failure
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NotFound { .. } => 2,
            Self::SourceUnavailable(_) => 3,
            Self::Validation(_) => 4,
            Self::Mapping { .. } => 5,
            Self::Template(_) => 6,
            Self::Io { .. } => 1,
        }
    }
}

impl From<tera::Error> for PipelineError {
    fn from(err: tera::Error) -> Self {
        // tera nests the useful part (e.g. "Variable `x` not found") in the source chain
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self::Template(message)
    }
}
