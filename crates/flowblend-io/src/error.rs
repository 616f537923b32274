use std::path::PathBuf;
use thiserror::Error;

use flowblend_algo::ConfigError;
use flowblend_core::NetworkError;

/// Errors raised while reading cases or writing reports.
#[derive(Error, Debug)]
pub enum CaseError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported case format for {path} (expected .json or .toml)")]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid plan config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl CaseError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CaseError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type CaseResult<T> = Result<T, CaseError>;
