//! Dispatcher fans checks out across endpoints and collects the results in order.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::cancel::Cancel;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::options::Options;
use crate::probe::{Prober, ProtocolProber};
use crate::result::CheckResult;
use crate::retry::check_with_retry;

/// Engine runs every endpoint's retry loop concurrently.
///
/// # Examples
/// ```rust
/// use healthprobe::cancel::Cancel;
/// use healthprobe::dispatcher::Engine;
/// use healthprobe::endpoint::Endpoint;
/// use healthprobe::options::Options;
///
/// #[tokio::main]
/// async fn main() {
///     let engine = Engine::new(Options::default()).unwrap();
///     let endpoints = vec![
///         Endpoint::http("http://really.really.not.exists.host/health"),
///         Endpoint::tcp("really.really.not.exists.host", 5432),
///     ];
///
///     let results = engine.check_all(&Cancel::never(), &endpoints).await;
///     assert_eq!(results.len(), 2);
///     assert_eq!(results[1].name, "really.really.not.exists.host:5432");
/// }
/// ```
pub struct Engine<P: Prober + 'static = ProtocolProber> {
    options: Options,
    prober: Arc<P>,
    limit: Option<Arc<Semaphore>>,
}

impl Engine<ProtocolProber> {
    /// Create an engine that probes over the network.
    ///
    /// Fails only if the shared HTTP client cannot be built.
    pub fn new(options: Options) -> Result<Engine<ProtocolProber>> {
        let prober = ProtocolProber::new(&options)?;
        Ok(Engine::with_prober(options, prober))
    }
}

impl<P: Prober + 'static> Engine<P> {
    /// Create an engine around any [`Prober`].
    pub fn with_prober(options: Options, prober: P) -> Engine<P> {
        let limit = options
            .max_concurrency
            .map(|max| Arc::new(Semaphore::new(max.min(Semaphore::MAX_PERMITS))));

        Engine {
            options,
            prober: Arc::new(prober),
            limit,
        }
    }

    /// Check one endpoint with the configured retries.
    pub async fn check(&self, cancel: &Cancel, endpoint: &Endpoint) -> CheckResult {
        check_with_retry(self.prober.as_ref(), cancel, endpoint, self.options.retries).await
    }

    /// Check every endpoint concurrently.
    ///
    /// `results[i]` always belongs to `endpoints[i]`. Returns once every
    /// check has finished; one endpoint failing never affects another.
    pub async fn check_all(&self, cancel: &Cancel, endpoints: &[Endpoint]) -> Vec<CheckResult> {
        info!(endpoints = endpoints.len(), retries = self.options.retries, "checking endpoints");

        let handles: Vec<_> = endpoints
            .iter()
            .cloned()
            .map(|endpoint| {
                let prober = self.prober.clone();
                let cancel = cancel.clone();
                let limit = self.limit.clone();
                let retries = self.options.retries;

                tokio::spawn(async move {
                    let _permit = match limit {
                        Some(limit) => limit.acquire_owned().await.ok(),
                        None => None,
                    };
                    check_with_retry(prober.as_ref(), &cancel, &endpoint, retries).await
                })
            })
            .collect();

        let results: Vec<CheckResult> = join_all(handles)
            .await
            .into_iter()
            .zip(endpoints)
            .map(|(joined, endpoint)| {
                joined.unwrap_or_else(|err| {
                    error!(endpoint = %endpoint.name, error = %err, "check task failed");
                    CheckResult::begin(endpoint).fail(format!("check task failed: {}", err))
                })
            })
            .collect();

        let healthy = results.iter().filter(|result| result.healthy).count();
        info!(healthy, unhealthy = results.len() - healthy, "checks finished");

        results
    }
}
