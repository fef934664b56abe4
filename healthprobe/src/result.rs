use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::endpoint::{CheckType, Endpoint};

/// Largest response body kept in a result.
pub const MAX_BODY_BYTES: usize = 10 * 1024;

/// The outcome of checking one endpoint.
///
/// `error` is empty exactly when `healthy` is true. `latency` and `timestamp`
/// describe the final attempt only, and `retries` is that attempt's index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub check_type: CheckType,
    pub healthy: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub status_code: u16,
    #[serde(rename = "latency_ms", serialize_with = "as_millis")]
    pub latency: Duration,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub retries: u32,
}

impl CheckResult {
    /// Start a result for one attempt against `endpoint`, stamped now.
    pub fn begin(endpoint: &Endpoint) -> CheckResult {
        CheckResult {
            name: endpoint.name.clone(),
            url: endpoint.target(),
            check_type: endpoint.check_type,
            healthy: false,
            status_code: 0,
            latency: Duration::ZERO,
            error: String::new(),
            body: String::new(),
            timestamp: Utc::now(),
            retries: 0,
        }
    }

    pub fn succeed(mut self) -> Self {
        self.healthy = true;
        self.error.clear();
        self
    }

    pub fn fail<T: Into<String>>(mut self, error: T) -> Self {
        self.healthy = false;
        self.error = error.into();
        self
    }
}

fn is_zero(status: &u16) -> bool {
    *status == 0
}

fn as_millis<S: Serializer>(latency: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(latency.as_secs_f64() * 1000.0)
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn begin() {
        let endpoint = Endpoint::tcp("localhost", 6379).with_name("cache");
        let result = CheckResult::begin(&endpoint);
        assert_eq!(result.name, "cache");
        assert_eq!(result.url, "localhost:6379");
        assert_eq!(result.check_type, CheckType::Tcp);
        assert!(!result.healthy);
        assert_eq!(result.retries, 0);
    }

    #[test]
    fn error_is_empty_iff_healthy() {
        let endpoint = Endpoint::http("http://localhost");
        let result = CheckResult::begin(&endpoint).fail("boom");
        assert!(!result.healthy);
        assert_eq!(result.error, "boom");

        let result = result.succeed();
        assert!(result.healthy);
        assert!(result.error.is_empty());
    }

    #[test]
    fn serialize() {
        let endpoint = Endpoint::http("http://localhost/health");
        let mut result = CheckResult::begin(&endpoint).succeed();
        result.latency = Duration::from_micros(1500);
        result.status_code = 200;

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "http");
        assert_eq!(json["status_code"], 200);
        assert_eq!(json["latency_ms"], 1.5);
        assert!(json.get("error").is_none());
        assert!(json.get("body").is_none());

        let result = CheckResult::begin(&endpoint).fail("tcp connect: refused");
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("status_code").is_none());
        assert_eq!(json["error"], "tcp connect: refused");
    }
}
