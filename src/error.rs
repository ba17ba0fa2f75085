// ============================================================================
// Error Taxonomy
// ============================================================================

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WallpoolError>;

#[derive(Debug, Error)]
pub enum WallpoolError {
    /// Bad or missing query list, credentials or paths. Nothing can be fetched.
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport or API failure, isolated to one worker.
    #[error("network error: {0}")]
    Network(String),

    #[error("no photos found for query '{query}'")]
    NoResult { query: String },

    #[error("duplicate image {hash}")]
    Duplicate { hash: String },

    #[error("cannot use {}: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WallpoolError {
    pub fn persistence(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        WallpoolError::Persistence {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Outcomes a worker is expected to hit now and then; not failures.
    pub fn is_expected(&self) -> bool {
        matches!(self, WallpoolError::NoResult { .. } | WallpoolError::Duplicate { .. })
    }

    /// Errors that mean no worker in this run can succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WallpoolError::Config(_))
    }
}

impl From<reqwest::Error> for WallpoolError {
    fn from(err: reqwest::Error) -> Self {
        WallpoolError::Network(err.to_string())
    }
}
