//! Errors raised before any check runs.
//!
//! Probe failures are never errors: they come back as unhealthy
//! [`CheckResult`](crate::result::CheckResult)s.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The shared HTTP client could not be built
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to read config file {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to expand environment variables: {0}")]
    Expand(String),

    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format: {0} (use .yml, .yaml, or .json)")]
    UnsupportedFormat(String),

    #[error("invalid endpoint {name:?}: {reason}")]
    InvalidEndpoint { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
