//! Endpoint files in YAML or JSON.
//!
//! ```yaml
//! settings:
//!   timeout: 5s
//!   retries: 2
//!   interval: 30s
//! endpoints:
//!   - name: api
//!     url: https://api.example.com/health
//!     expected_body_contains: ok
//!     headers:
//!       Authorization: Bearer ${API_TOKEN}
//!   - type: tcp
//!     host: db.internal
//!     port: 5432
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::{Error, Result};
use crate::options::Options;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub settings: Settings,
    pub endpoints: Vec<Endpoint>,
    pub alerts: Alerts,
}

/// Run-wide settings. Unset values leave the caller's defaults alone.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
    #[serde(with = "humantime_serde")]
    pub interval: Option<Duration>,
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Alerts {
    pub slack: Option<SlackAlert>,
    pub webhook: Option<WebhookAlert>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SlackAlert {
    pub webhook_url: String,
    pub on_failure: bool,
    pub on_recovery: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebhookAlert {
    pub url: String,
    pub on_failure: bool,
    pub on_recovery: bool,
}

impl Config {
    /// Read, expand and parse a config file, then default and validate its endpoints.
    ///
    /// The format follows the extension: `.yml`, `.yaml` or `.json`.
    /// `$VAR` and `${VAR}` are replaced from the environment before parsing;
    /// an undefined variable is an error. A literal `$`, for instance in a
    /// request body, must be written as `$$`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let config = Config::parse(&raw, &extension)?;
        debug!(path = %path.display(), endpoints = config.endpoints.len(), "loaded config");
        Ok(config)
    }

    /// Parse config text in the given format (`yml`, `yaml` or `json`).
    pub fn parse(raw: &str, format: &str) -> Result<Config> {
        let expanded = shellexpand::env(raw).map_err(|err| Error::Expand(err.to_string()))?;

        let mut config: Config = match format {
            "yml" | "yaml" => serde_yaml::from_str(&expanded)?,
            "json" => serde_json::from_str(&expanded)?,
            other => return Err(Error::UnsupportedFormat(format!(".{}", other))),
        };

        for endpoint in config.endpoints.iter_mut() {
            endpoint.apply_defaults();
            endpoint.validate()?;
        }

        Ok(config)
    }

    /// Overlay the file's settings onto `options`.
    pub fn apply(&self, mut options: Options) -> Options {
        if let Some(timeout) = self.settings.timeout.filter(|timeout| !timeout.is_zero()) {
            options.timeout = timeout;
        }

        if let Some(retries) = self.settings.retries {
            options.retries = retries;
        }

        if let Some(max) = self.settings.max_concurrency {
            options = options.with_max_concurrency(max);
        }

        if let Some(webhook) = self.alerts.webhook.as_ref().filter(|webhook| !webhook.url.is_empty()) {
            options.webhook_url = Some(webhook.url.clone());
        }

        options
    }
}
