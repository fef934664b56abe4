//! The single-attempt seam the retry loop and the engine are generic over.

use async_trait::async_trait;

use crate::cancel::Cancel;
use crate::endpoint::{CheckType, Endpoint};
use crate::error::Result;
use crate::http::HttpProbe;
use crate::options::Options;
use crate::result::CheckResult;
use crate::tcp;

/// Performs exactly one check attempt.
///
/// Failures are reported inside the returned result, never as a panic or error.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, endpoint: &Endpoint, cancel: &Cancel) -> CheckResult;
}

/// Picks the strategy from the endpoint's [`CheckType`].
pub struct ProtocolProber {
    http: HttpProbe,
    timeout: std::time::Duration,
}

impl ProtocolProber {
    pub fn new(options: &Options) -> Result<ProtocolProber> {
        Ok(ProtocolProber {
            http: HttpProbe::new(options)?,
            timeout: options.timeout,
        })
    }
}

#[async_trait]
impl Prober for ProtocolProber {
    async fn probe(&self, endpoint: &Endpoint, cancel: &Cancel) -> CheckResult {
        match endpoint.check_type {
            CheckType::Http => self.http.probe(endpoint, cancel).await,
            CheckType::Tcp => tcp::probe_tcp(endpoint, self.timeout, cancel).await,
            CheckType::Grpc => tcp::probe_grpc(endpoint, self.timeout, cancel).await,
        }
    }
}
