use std::time::Duration;

use tokio::sync::Semaphore;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for one checker run.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Timeout for a single probe unless the endpoint overrides it
    pub timeout: Duration,
    /// Attempts after the first; 0 means exactly one attempt
    pub retries: u32,
    /// Capture response bodies even without a body check
    pub verbose: bool,
    /// Where alerts would be delivered; carried through, never called
    pub webhook_url: Option<String>,
    /// Upper bound on endpoints checked at once; `None` checks all at once
    pub max_concurrency: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            timeout: DEFAULT_TIMEOUT,
            retries: 0,
            verbose: false,
            webhook_url: None,
            max_concurrency: None,
        }
    }
}

impl Options {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Cap concurrent checks. A cap of 0 is treated as no cap, and caps
    /// above [`Semaphore::MAX_PERMITS`] are lowered to it.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = Some(max_concurrency.min(Semaphore::MAX_PERMITS))
            .filter(|max| *max > 0);
        self
    }
}
