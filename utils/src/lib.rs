pub mod test {
    use std::convert::Infallible;

    use futures::Future;
    use hyper::header::{LOCATION, USER_AGENT};
    use hyper::server::conn::Http;
    use hyper::service::service_fn;
    use hyper::{Body, StatusCode};
    use hyper::{Request, Response};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    pub const HEADER_NAME: &str = "X-Test-Header";
    pub const HEADER_VALUE: &str = "test-value";
    pub const BODY: &str = "ping";
    pub const HEALTHY_BODY: &str = "status: ok";
    pub const TIMEOUT: u64 = 3;

    pub async fn http_handler_always_200(
        _request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        Ok(Response::builder()
            .status(StatusCode::OK)
            .body(Body::from(HEALTHY_BODY))
            .unwrap())
    }

    pub async fn http_handler_always_503(
        _request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        Ok(Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .body(Body::from("down"))
            .unwrap())
    }

    pub async fn http_handler_delay(
        _request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        tokio::time::sleep(tokio::time::Duration::from_secs(TIMEOUT)).await;
        Ok(Response::builder()
            .status(StatusCode::OK)
            .body(Body::empty())
            .unwrap())
    }

    /// Responds with a 20 KiB body of `a`s.
    pub async fn http_handler_large_body(
        _request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        Ok(Response::new(Body::from("a".repeat(20 * 1024))))
    }

    pub async fn http_handler_echo_method(
        request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        Ok(Response::new(Body::from(request.method().to_string())))
    }

    pub async fn http_handler_echo_user_agent(
        request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        let agent = request
            .headers()
            .get(USER_AGENT)
            .map(|v| v.to_str().unwrap_or("").to_string())
            .unwrap_or_default();
        Ok(Response::new(Body::from(agent)))
    }

    pub async fn http_handler_check_header(
        request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        let mut response = Response::new(Body::empty());

        if request
            .headers()
            .get(HEADER_NAME)
            .map(|v| v.to_str().unwrap_or(""))
            .unwrap_or("")
            == HEADER_VALUE
        {
            *response.status_mut() = StatusCode::OK;
        } else {
            *response.status_mut() = StatusCode::BAD_REQUEST;
        }

        Ok(response)
    }

    pub async fn http_handler_check_body(
        request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        let mut response = Response::new(Body::empty());

        let body = hyper::body::to_bytes(request.into_body()).await.unwrap();

        if body.as_ref() == BODY.as_bytes() {
            *response.status_mut() = StatusCode::OK;
        } else {
            *response.status_mut() = StatusCode::BAD_REQUEST;
        }

        Ok(response)
    }

    /// Redirects `/hop/N` to `/hop/N-1` and answers 200 at `/hop/0`.
    /// Any other path redirects to itself forever.
    pub async fn http_handler_redirect(
        request: Request<Body>,
    ) -> Result<Response<Body>, Infallible> {
        let path = request.uri().path().to_string();
        let location = match path.strip_prefix("/hop/").map(str::parse::<u32>) {
            Some(Ok(0)) => {
                return Ok(Response::new(Body::from(HEALTHY_BODY)));
            }
            Some(Ok(n)) => format!("/hop/{}", n - 1),
            _ => path.clone(),
        };

        Ok(Response::builder()
            .status(StatusCode::FOUND)
            .header(LOCATION, location)
            .body(Body::empty())
            .unwrap())
    }

    /// Returns a port nothing is listening on.
    pub fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    /// Accepts connections and holds each one until the peer goes away.
    pub async fn tcp_server() -> (u16, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => continue,
                };
                tokio::spawn(async move {
                    let mut buf = [0; 1024];
                    let _ = socket.read(&mut buf).await;
                });
            }
        });

        (port, handle)
    }

    pub async fn http_server<F, S>(f: F) -> (u16, JoinHandle<()>)
    where
        F: FnMut(Request<Body>) -> S + Send + std::marker::Copy + 'static,
        S: Future<Output = Result<Response<Body>, Infallible>> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            loop {
                let (tcp_stream, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => continue,
                };

                tokio::spawn(async move {
                    // clients that time out hang up mid-response
                    let _ = Http::new()
                        .http1_only(true)
                        .serve_connection(tcp_stream, service_fn(f))
                        .await;
                });
            }
        });

        (port, handle)
    }
}
