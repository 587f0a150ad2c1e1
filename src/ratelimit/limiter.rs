//! Sliding window rate limiter.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace, warn};

use super::ledger::Ledger;
use super::window::{TimeUnit, WindowConfig};
use crate::error::{CrptError, Result};

/// A sliding-window rate limiter that suspends callers over the limit.
///
/// At most `max_permits` admissions are granted within any window-long
/// interval. Expiry is evaluated lazily against the oldest admission on
/// every attempt; there is no background timer.
///
/// This struct is thread-safe and is meant to be shared behind an `Arc`.
/// Waiters are not queued: every admission wakes all of them and they race
/// to re-check the window, so ordering among waiters is up to the scheduler.
///
/// By default [`acquire`](Self::acquire) waits indefinitely. Use
/// [`with_max_wait`](Self::with_max_wait) to bound the wait.
pub struct SlidingWindowLimiter {
    config: WindowConfig,
    /// Upper bound on a single acquire; `None` waits forever
    max_wait: Option<Duration>,
    ledger: Mutex<Ledger>,
    /// Woken on every admission
    admitted: Notify,
}

impl SlidingWindowLimiter {
    /// Create a limiter with a window of one `unit` and `max_permits` permits.
    ///
    /// Fails with [`CrptError::InvalidConfiguration`] if `max_permits <= 0`.
    pub fn new(unit: TimeUnit, max_permits: i64) -> Result<Self> {
        Ok(Self::from_config(WindowConfig::new(unit, max_permits)?))
    }

    /// Create a limiter from an already validated window configuration.
    pub fn from_config(config: WindowConfig) -> Self {
        Self {
            config,
            max_wait: None,
            ledger: Mutex::new(Ledger::new(config)),
            admitted: Notify::new(),
        }
    }

    /// Fail acquisitions with [`CrptError::WaitTimeout`] after waiting `max_wait`.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Wait until a permit is available and consume it.
    ///
    /// Dropping the returned future before it resolves consumes nothing.
    pub async fn acquire(&self) -> Result<()> {
        self.acquire_until(std::future::pending()).await
    }

    /// Wait until a permit is available and consume it, giving up with
    /// [`CrptError::Interrupted`] if `interrupt` resolves first.
    ///
    /// An interrupted caller leaves the ledger untouched.
    pub async fn acquire_until<F>(&self, interrupt: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let deadline = self.max_wait.map(|max_wait| Instant::now() + max_wait);
        tokio::pin!(interrupt);

        loop {
            // Registered before the ledger check so an admission between the
            // check and the select below still wakes us.
            let notified = self.admitted.notified();
            tokio::pin!(notified);

            let wake_at = {
                let mut ledger = self.ledger.lock();
                let now = Instant::now();
                trace!(in_use = ledger.len(), "Attempting to acquire permit");

                match ledger.try_admit(now) {
                    Ok(()) => {
                        debug!(in_use = ledger.len(), "Permit acquired");
                        drop(ledger);
                        self.admitted.notify_waiters();
                        return Ok(());
                    }
                    Err(wait) => {
                        debug!(wait_ms = wait.as_millis() as u64, "Window full, waiting");
                        now + wait
                    }
                }
            };

            let timeout = async {
                match deadline {
                    Some(deadline) => sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;
                _ = &mut interrupt => {
                    warn!("Interrupted while waiting for permit");
                    return Err(CrptError::Interrupted);
                }
                _ = timeout => {
                    // The deadline may land on the same tick a permit frees up.
                    if self.try_acquire() {
                        debug!("Permit acquired at wait deadline");
                        return Ok(());
                    }
                    let max_wait = self.max_wait.unwrap_or_default();
                    warn!(max_wait_ms = max_wait.as_millis() as u64, "Timed out waiting for permit");
                    return Err(CrptError::WaitTimeout(max_wait));
                }
                _ = sleep_until(wake_at) => {}
                _ = &mut notified => {}
            }
        }
    }

    /// Consume a permit if one is available right now.
    ///
    /// Returns `false` without waiting when the window is full.
    pub fn try_acquire(&self) -> bool {
        let admitted = self.ledger.lock().try_admit(Instant::now()).is_ok();
        if admitted {
            self.admitted.notify_waiters();
        }
        admitted
    }

    /// Number of admissions still inside the window.
    pub fn permits_in_use(&self) -> usize {
        self.ledger.lock().in_window(Instant::now())
    }

    /// Get the window configuration.
    pub fn config(&self) -> WindowConfig {
        self.config
    }

    /// Get the configured maximum wait, if any.
    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait
    }
}

impl std::fmt::Debug for SlidingWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("config", &self.config)
            .field("max_wait", &self.max_wait)
            .finish_non_exhaustive()
    }
}
