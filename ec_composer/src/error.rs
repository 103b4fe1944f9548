// Error types.
//
// `ComposerError` covers setting up a run: reading and validating the
// configuration, building the evaluation pool. `SinkError` covers writing
// results out. Neither is raised by the search itself; "not ready" states
// there are `Option::None`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("failed to build evaluation pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize chart data: {0}")]
    Json(#[from] serde_json::Error),
}
