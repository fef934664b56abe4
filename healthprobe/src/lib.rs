//! # Healthprobe
//! A concurrent endpoint health checker for Rust.
//!
//! # Features
//! * HTTP checks
//!     * Any method, custom headers and request body
//!     * Expected status code and body substring
//!     * Up to 9 redirects
//! * TCP reachability checks
//! * gRPC endpoints, checked by TCP connect only
//! * Retries with exponential backoff (1s, 2s, 4s, ...)
//! * Every endpoint checked at once, results returned in input order
//! * One shared cancellation handle with an optional deadline
//!
//! # Examples
//! ## Checking a set of endpoints
//! ```rust
//! use healthprobe::cancel::Cancel;
//! use healthprobe::dispatcher::Engine;
//! use healthprobe::endpoint::Endpoint;
//! use healthprobe::options::Options;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = Engine::new(Options::default().with_retries(1)).unwrap();
//!     let endpoints = vec![
//!         Endpoint::http("https://really.really.not.exists.host/health"),
//!         Endpoint::tcp("really.really.not.exists.host", 6379),
//!     ];
//!
//!     let cancel = Cancel::never().with_timeout(Duration::from_secs(30));
//!     let results = engine.check_all(&cancel, &endpoints).await;
//!     assert_eq!(results.len(), 2);
//!     assert!(results.iter().all(|result| !result.healthy));
//! }
//! ```
//!
//! ## Cancelling
//! ```rust
//! use healthprobe::cancel::Cancel;
//! use healthprobe::dispatcher::Engine;
//! use healthprobe::endpoint::Endpoint;
//! use healthprobe::options::Options;
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = Engine::new(Options::default().with_retries(10)).unwrap();
//!     let (canceller, cancel) = Cancel::new();
//!     canceller.cancel();
//!
//!     let results = engine.check_all(&cancel, &[Endpoint::tcp("127.0.0.1", 1)]).await;
//!     assert!(!results[0].healthy);
//! }
//! ```
//!

pub mod cancel;
pub mod config;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod logging;
pub mod options;
pub mod probe;
pub mod report;
pub mod result;
pub mod retry;
pub mod tcp;

pub use cancel::{Cancel, Canceller};
pub use dispatcher::Engine;
pub use endpoint::{CheckType, Endpoint};
pub use error::{Error, Result};
pub use options::Options;
pub use result::CheckResult;
