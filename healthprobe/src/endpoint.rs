//! Check targets and their pass/fail criteria.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The protocol used to probe an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    #[default]
    Http,
    Tcp,
    /// Probed as a plain TCP connect; the gRPC health protocol is not spoken.
    Grpc,
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckType::Http => write!(f, "http"),
            CheckType::Tcp => write!(f, "tcp"),
            CheckType::Grpc => write!(f, "grpc"),
        }
    }
}

/// A single health check target.
///
/// Endpoints are built by the config loader or the command line and are only
/// read afterwards. Zero values mean "not set": an `expected_status` of 0
/// accepts any status, an empty `expected_body_contains` skips the body check.
///
/// # Examples
/// ```rust
/// use healthprobe::endpoint::Endpoint;
/// use std::time::Duration;
///
/// let endpoint = Endpoint::http("https://api.example.com/health")
///     .with_method("HEAD")                                  // optional
///     .with_header("Authorization", "Bearer token")         // optional
///     .with_expected_status(204)                            // optional
///     .with_timeout(Duration::from_secs(2));                // optional
/// assert_eq!(endpoint.name, "https://api.example.com/health");
/// ```
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub check_type: CheckType,
    pub method: String,
    pub host: String,
    pub port: u16,
    pub expected_status: u16,
    pub expected_body_contains: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Endpoint {
    /// An HTTP endpoint expecting `200 OK` from a `GET`.
    pub fn http<T: AsRef<str>>(url: T) -> Endpoint {
        let mut endpoint = Endpoint {
            url: url.as_ref().to_string(),
            check_type: CheckType::Http,
            ..Default::default()
        };
        endpoint.apply_defaults();
        endpoint
    }

    /// A TCP endpoint that is healthy when `host:port` accepts a connection.
    pub fn tcp<T: AsRef<str>>(host: T, port: u16) -> Endpoint {
        let mut endpoint = Endpoint {
            host: host.as_ref().to_string(),
            port,
            check_type: CheckType::Tcp,
            ..Default::default()
        };
        endpoint.apply_defaults();
        endpoint
    }

    /// A gRPC endpoint. `host` may carry the port itself (`"svc:50051"`).
    pub fn grpc<T: AsRef<str>>(host: T) -> Endpoint {
        let mut endpoint = Endpoint {
            host: host.as_ref().to_string(),
            check_type: CheckType::Grpc,
            ..Default::default()
        };
        endpoint.apply_defaults();
        endpoint
    }

    /// Turn a bare command line argument into an endpoint.
    ///
    /// Only `http://` and `https://` URLs are accepted.
    pub fn from_url_arg(arg: &str) -> Option<Endpoint> {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            Some(Endpoint::http(arg))
        } else {
            None
        }
    }

    pub fn with_name<T: AsRef<str>>(mut self, name: T) -> Self {
        self.name = name.as_ref().to_string();
        self
    }

    pub fn with_method<T: AsRef<str>>(mut self, method: T) -> Self {
        self.method = method.as_ref().to_string();
        self
    }

    /// Add a request header. A later value for the same key replaces the earlier one.
    pub fn with_header<T: AsRef<str>>(mut self, key: T, value: T) -> Self {
        self.headers
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    pub fn with_body<T: AsRef<str>>(mut self, body: T) -> Self {
        self.body = Some(body.as_ref().to_string());
        self
    }

    /// Set the expected status code. 0 disables the status check.
    pub fn with_expected_status(mut self, status: u16) -> Self {
        self.expected_status = status;
        self
    }

    pub fn with_expected_body_contains<T: AsRef<str>>(mut self, needle: T) -> Self {
        self.expected_body_contains = needle.as_ref().to_string();
        self
    }

    /// Override the global timeout for this endpoint only.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fill in the values a config file is allowed to leave out.
    pub fn apply_defaults(&mut self) {
        if self.method.is_empty() {
            self.method = String::from("GET");
        }

        if self.expected_status == 0 && self.check_type == CheckType::Http {
            self.expected_status = 200;
        }

        if self.name.is_empty() {
            self.name = if !self.url.is_empty() {
                self.url.clone()
            } else if self.check_type == CheckType::Grpc {
                self.grpc_address()
            } else {
                format!("{}:{}", self.host, self.port)
            };
        }
    }

    /// Check the endpoint is complete enough to be probed.
    pub fn validate(&self) -> Result<()> {
        let reason = match self.check_type {
            CheckType::Http if self.url.is_empty() => Some("http endpoint requires a url"),
            CheckType::Tcp if self.host.is_empty() => Some("tcp endpoint requires a host"),
            CheckType::Tcp if self.port == 0 => Some("tcp endpoint requires a non-zero port"),
            CheckType::Grpc if self.grpc_address().is_empty() => {
                Some("grpc endpoint requires a host or url")
            }
            _ => None,
        };

        match reason {
            Some(reason) => Err(Error::InvalidEndpoint {
                name: self.name.clone(),
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// The address reported in results: the url for http, `host:port` for tcp.
    pub fn target(&self) -> String {
        match self.check_type {
            CheckType::Http => self.url.clone(),
            CheckType::Tcp => format!("{}:{}", self.host, self.port),
            CheckType::Grpc => self.grpc_address(),
        }
    }

    /// The timeout a probe of this endpoint runs under.
    pub fn effective_timeout(&self, global: Duration) -> Duration {
        self.timeout
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(global)
    }

    fn grpc_address(&self) -> String {
        if self.host.is_empty() {
            self.url.clone()
        } else if self.port != 0 {
            format!("{}:{}", self.host, self.port)
        } else {
            self.host.clone()
        }
    }
}
