//! TCP probe
//!
//! Also serves gRPC endpoints, which are only checked for reachability.

use tokio::net::TcpStream;
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::cancel::Cancel;
use crate::endpoint::Endpoint;
use crate::result::CheckResult;

/// Healthy when `host:port` accepts a connection within the timeout.
///
/// # Arguments
/// * `endpoint` - The endpoint to dial
/// * `timeout` - Global timeout, used unless the endpoint overrides it
/// * `cancel` - Aborts the dial when fired
pub async fn probe_tcp(endpoint: &Endpoint, timeout: Duration, cancel: &Cancel) -> CheckResult {
    connect("tcp connect", endpoint, timeout, cancel).await
}

/// Dial the gRPC address and hang up.
///
/// This does not speak the gRPC health checking protocol: an endpoint whose
/// port accepts connections is healthy even if its service reports otherwise.
pub async fn probe_grpc(endpoint: &Endpoint, timeout: Duration, cancel: &Cancel) -> CheckResult {
    connect("grpc connect", endpoint, timeout, cancel).await
}

async fn connect(kind: &str, endpoint: &Endpoint, timeout: Duration, cancel: &Cancel) -> CheckResult {
    let result = CheckResult::begin(endpoint);
    let timeout = endpoint.effective_timeout(timeout);
    let addr = result.url.clone();

    debug!(endpoint = %endpoint.name, %addr, ?timeout, "{}", kind);

    let start = Instant::now();
    let stream = cancel
        .run(tokio::time::timeout(timeout, TcpStream::connect(addr.as_str())))
        .await;
    let latency = start.elapsed();

    let mut result = match stream {
        Some(Ok(Ok(stream))) => {
            // the connection closes when the stream drops
            drop(stream);
            result.succeed()
        }
        Some(Ok(Err(err))) => result.fail(format!("{}: {}", kind, err)),
        Some(Err(_)) => result.fail(format!("{}: {}: timed out after {:?}", kind, addr, timeout)),
        None => result.fail(format!("{}: cancelled", kind)),
    };
    result.latency = latency;

    debug!(endpoint = %endpoint.name, %addr, ?latency, healthy = result.healthy, "{} finished", kind);

    result
}
