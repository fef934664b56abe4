//! HTTP probe
//!

use reqwest::redirect::Policy;
use reqwest::Method;
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::cancel::Cancel;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::options::Options;
use crate::result::{CheckResult, MAX_BODY_BYTES};

/// Sent when the endpoint does not set its own `User-Agent`.
pub const USER_AGENT: &str = concat!("healthprobe/", env!("CARGO_PKG_VERSION"));

/// Requests in one redirect chain, the original included: 9 redirects are
/// followed and the 10th fails the attempt.
pub const MAX_REDIRECTS: usize = 10;

/// HTTP probe
///
/// Holds one connection-pooling client that every concurrent check shares.
///
/// # Examples
/// ```rust
/// use healthprobe::cancel::Cancel;
/// use healthprobe::endpoint::Endpoint;
/// use healthprobe::http::HttpProbe;
/// use healthprobe::options::Options;
///
/// #[tokio::main]
/// async fn main() {
///     let probe = HttpProbe::new(&Options::default()).unwrap();
///     let endpoint = Endpoint::http("https://really.really.not.exists.host/health");
///     let result = probe.probe(&endpoint, &Cancel::never()).await;
///     assert!(!result.healthy);
/// }
/// ```
pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
    verbose: bool,
}

impl HttpProbe {
    /// Create a new HttpProbe
    ///
    /// # Arguments
    /// * `options` - Supplies the default timeout and whether bodies are always captured
    pub fn new(options: &Options) -> Result<HttpProbe> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(HttpProbe {
            client,
            timeout: options.timeout,
            verbose: options.verbose,
        })
    }

    /// Send one request to `endpoint` and judge the response.
    ///
    /// Healthy when the status matches `expected_status` (if set) and the
    /// first 10 KiB of the body contain `expected_body_contains` (if set).
    pub async fn probe(&self, endpoint: &Endpoint, cancel: &Cancel) -> CheckResult {
        let mut result = CheckResult::begin(endpoint);
        let timeout = endpoint.effective_timeout(self.timeout);

        let method = match Method::from_bytes(endpoint.method.to_uppercase().as_bytes()) {
            Ok(method) => method,
            Err(err) => return result.fail(format!("build request: {}", err)),
        };

        let mut request = self
            .client
            .request(method, &endpoint.url)
            .timeout(timeout);

        for (key, value) in endpoint.headers.iter() {
            request = request.header(key, value);
        }

        if let Some(body) = &endpoint.body {
            request = request.body(body.clone());
        }

        let request = match request.build() {
            Ok(request) => request,
            Err(err) => return result.fail(format!("build request: {}", err)),
        };

        debug!(endpoint = %endpoint.name, method = %request.method(), url = %endpoint.url, ?timeout, "http probe");

        let start = Instant::now();
        let response = cancel.run(self.client.execute(request)).await;
        result.latency = start.elapsed();

        let mut response = match response {
            Some(Ok(response)) => response,
            Some(Err(err)) => {
                debug!(endpoint = %endpoint.name, error = %err, "http probe failed");
                return result.fail(format!("request failed: {}", err));
            }
            None => return result.fail("request failed: cancelled"),
        };

        result.status_code = response.status().as_u16();

        if !endpoint.expected_body_contains.is_empty() || self.verbose {
            match cancel.run(read_body(&mut response)).await {
                Some(Ok(body)) => result.body = body,
                Some(Err(err)) => {
                    debug!(endpoint = %endpoint.name, error = %err, "failed to read response body")
                }
                None => debug!(endpoint = %endpoint.name, "body read cancelled"),
            }
        }

        let mut error = None;

        if endpoint.expected_status != 0 && result.status_code != endpoint.expected_status {
            error = Some(format!(
                "expected status {}, got {}",
                endpoint.expected_status, result.status_code
            ));
        }

        if !endpoint.expected_body_contains.is_empty()
            && !result.body.contains(&endpoint.expected_body_contains)
        {
            error = Some(format!(
                "response body does not contain '{}'",
                endpoint.expected_body_contains
            ));
        }

        debug!(
            endpoint = %endpoint.name,
            status = result.status_code,
            latency = ?result.latency,
            healthy = error.is_none(),
            "http probe finished"
        );

        match error {
            Some(error) => result.fail(error),
            None => result.succeed(),
        }
    }
}

/// Read at most [`MAX_BODY_BYTES`] of the body, dropping the rest unread.
async fn read_body(response: &mut reqwest::Response) -> reqwest::Result<String> {
    let mut body = Vec::new();

    while body.len() < MAX_BODY_BYTES {
        match response.chunk().await? {
            Some(chunk) => {
                let take = chunk.len().min(MAX_BODY_BYTES - body.len());
                body.extend_from_slice(&chunk[..take]);
            }
            None => break,
        }
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}


#[cfg(test)]
mod test {
    use ::utils;
    use super::*;

    fn probe() -> HttpProbe {
        HttpProbe::new(&Options::default()).unwrap()
    }

    fn url(port: u16, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", port, path)
    }

    mod healthy {
        use super::*;

        #[tokio::test]
        async fn status_200() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_always_200).await;

            let endpoint = Endpoint::http(url(port, "/health"));
            for _ in 0..3 {
                let result = probe().probe(&endpoint, &Cancel::never()).await;
                assert!(result.healthy, "{}", result.error);
                assert_eq!(result.status_code, 200);
                assert_eq!(result.url, endpoint.url);
                assert!(result.error.is_empty());
            }

            server.abort();
        }

        #[tokio::test]
        async fn any_status_when_unset() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_always_503).await;

            let endpoint = Endpoint::http(url(port, "/")).with_expected_status(0);
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(result.healthy);
            assert_eq!(result.status_code, 503);

            server.abort();
        }

        #[tokio::test]
        async fn body_contains() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_always_200).await;

            let endpoint = Endpoint::http(url(port, "/"))
                .with_expected_body_contains("ok");
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(result.healthy, "{}", result.error);
            assert_eq!(result.body, utils::test::HEALTHY_BODY);

            server.abort();
        }

        #[tokio::test]
        async fn follows_redirects() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_redirect).await;

            let endpoint = Endpoint::http(url(port, "/hop/5"));
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(result.healthy, "{}", result.error);
            assert_eq!(result.status_code, 200);

            // longest chain that still resolves
            let endpoint = Endpoint::http(url(port, "/hop/9"));
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(result.healthy, "{}", result.error);
            assert_eq!(result.status_code, 200);

            server.abort();
        }

        #[tokio::test]
        async fn with_method() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_echo_method).await;

            let endpoint = Endpoint::http(url(port, "/"))
                .with_method("put")
                .with_expected_body_contains("PUT");
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(result.healthy, "{}", result.error);

            server.abort();
        }

        #[tokio::test]
        async fn with_header() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_check_header).await;

            let endpoint = Endpoint::http(url(port, "/"))
                .with_header(utils::test::HEADER_NAME, utils::test::HEADER_VALUE);
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(result.healthy, "{}", result.error);

            server.abort();
        }

        #[tokio::test]
        async fn with_body() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_check_body).await;

            let endpoint = Endpoint::http(url(port, "/"))
                .with_method("POST")
                .with_body(utils::test::BODY);
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(result.healthy, "{}", result.error);

            server.abort();
        }

        #[tokio::test]
        async fn default_user_agent() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_echo_user_agent).await;

            let endpoint = Endpoint::http(url(port, "/"))
                .with_expected_body_contains(USER_AGENT);
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(result.healthy, "{}", result.error);
            assert_eq!(result.body, USER_AGENT);

            let endpoint = Endpoint::http(url(port, "/"))
                .with_header("user-agent", "custom-agent/2.0")
                .with_expected_body_contains("custom-agent/2.0");
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(result.healthy, "{}", result.error);
            assert_eq!(result.body, "custom-agent/2.0");

            server.abort();
        }
    }

    mod body_capture {
        use super::*;

        #[tokio::test]
        async fn skipped_without_check_or_verbose() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_always_503).await;

            let endpoint = Endpoint::http(url(port, "/"));
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(!result.healthy);
            assert!(result.body.is_empty());

            server.abort();
        }

        #[tokio::test]
        async fn verbose() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_always_200).await;

            let probe = HttpProbe::new(&Options::default().with_verbose(true)).unwrap();
            let endpoint = Endpoint::http(url(port, "/"));
            let result = probe.probe(&endpoint, &Cancel::never()).await;
            assert!(result.healthy);
            assert_eq!(result.body, utils::test::HEALTHY_BODY);

            server.abort();
        }

        #[tokio::test]
        async fn truncated() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_large_body).await;

            let probe = HttpProbe::new(&Options::default().with_verbose(true)).unwrap();
            let endpoint = Endpoint::http(url(port, "/"));
            let result = probe.probe(&endpoint, &Cancel::never()).await;
            assert!(result.healthy);
            assert_eq!(result.body.len(), MAX_BODY_BYTES);

            server.abort();
        }
    }

    mod un_healthy {
        use super::*;

        #[tokio::test]
        async fn unexpected_status() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_always_503).await;

            let endpoint = Endpoint::http(url(port, "/health")).with_expected_status(200);
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(!result.healthy);
            assert_eq!(result.status_code, 503);
            assert_eq!(result.error, "expected status 200, got 503");

            server.abort();
        }

        #[tokio::test]
        async fn body_mismatch() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_always_200).await;

            let endpoint = Endpoint::http(url(port, "/"))
                .with_expected_body_contains("degraded");
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(!result.healthy);
            assert_eq!(result.status_code, 200);
            assert_eq!(result.error, "response body does not contain 'degraded'");

            server.abort();
        }

        #[tokio::test]
        async fn too_many_redirects() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_redirect).await;

            let endpoint = Endpoint::http(url(port, "/loop"));
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(!result.healthy);
            assert_eq!(result.status_code, 0);
            assert!(result.error.starts_with("request failed"), "{}", result.error);

            let endpoint = Endpoint::http(url(port, "/hop/10"));
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(!result.healthy);
            assert!(result.error.starts_with("request failed"), "{}", result.error);

            server.abort();
        }

        #[tokio::test]
        async fn timeout() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_delay).await;

            let endpoint = Endpoint::http(url(port, "/"))
                .with_timeout(Duration::from_millis(300));
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(!result.healthy);
            assert_eq!(result.status_code, 0);
            assert!(result.error.starts_with("request failed"), "{}", result.error);
            assert!(result.latency < Duration::from_secs(utils::test::TIMEOUT));

            server.abort();
        }

        #[tokio::test]
        async fn connection_refused() {
            let port = utils::test::closed_port();

            let endpoint = Endpoint::http(url(port, "/"));
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(!result.healthy);
            assert_eq!(result.status_code, 0);
            assert!(result.error.starts_with("request failed"), "{}", result.error);
        }

        #[tokio::test]
        async fn cancelled_in_flight() {
            let (port, server) = utils::test::http_server(utils::test::http_handler_delay).await;

            let (canceller, cancel) = Cancel::new();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                canceller.cancel();
            });

            let endpoint = Endpoint::http(url(port, "/"));
            let result = probe().probe(&endpoint, &cancel).await;
            assert!(!result.healthy);
            assert_eq!(result.error, "request failed: cancelled");
            assert!(result.latency < Duration::from_secs(utils::test::TIMEOUT));

            server.abort();
        }

        #[tokio::test]
        async fn invalid_method() {
            let endpoint = Endpoint::http("http://127.0.0.1/").with_method("NOT A METHOD");
            let result = probe().probe(&endpoint, &Cancel::never()).await;
            assert!(!result.healthy);
            assert!(result.error.starts_with("build request"), "{}", result.error);
        }
    }
}
