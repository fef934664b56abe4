//! Shared cancellation and deadline signal.
//!
//! One [`Cancel`] is cloned into every check task. It fires when its
//! [`Canceller`] is triggered or when its deadline passes, whichever comes
//! first. Probes race their network call against it and the retry loop
//! races its backoff sleep against it.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Triggers the paired [`Cancel`] handles.
#[derive(Debug)]
pub struct Canceller {
    tx: watch::Sender<bool>,
}

impl Canceller {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// A cloneable cancellation handle with an optional deadline.
///
/// # Examples
/// ```rust
/// use healthprobe::cancel::Cancel;
///
/// #[tokio::main]
/// async fn main() {
///     let (canceller, cancel) = Cancel::new();
///     assert!(!cancel.is_cancelled());
///     canceller.cancel();
///     cancel.cancelled().await;
///     assert!(cancel.is_cancelled());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Cancel {
    rx: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

impl Cancel {
    pub fn new() -> (Canceller, Cancel) {
        let (tx, rx) = watch::channel(false);
        (Canceller { tx }, Cancel { rx, deadline: None })
    }

    /// A handle that never fires unless a deadline is added.
    pub fn never() -> Cancel {
        let (_, cancel) = Cancel::new();
        cancel
    }

    /// Also fire at `deadline`. An earlier existing deadline is kept.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Resolves once the handle has fired.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let signal = async move {
            let fired = rx.wait_for(|cancelled| *cancelled).await.is_ok();
            // a dropped canceller can never fire
            if !fired {
                std::future::pending::<()>().await;
            }
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = signal => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => signal.await,
        }
    }

    /// Drive `future` unless the handle fires first.
    pub async fn run<F: Future>(&self, future: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            output = future => Some(output),
        }
    }
}
