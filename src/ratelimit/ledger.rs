//! Timestamp ledger backing the sliding window.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

use super::window::WindowConfig;

/// Ordered record of admission instants, oldest first.
///
/// The ledger holds no lock of its own; [`SlidingWindowLimiter`] owns it
/// behind a mutex and is its only mutator.
///
/// [`SlidingWindowLimiter`]: super::SlidingWindowLimiter
#[derive(Debug)]
pub(crate) struct Ledger {
    config: WindowConfig,
    admissions: VecDeque<Instant>,
}

impl Ledger {
    pub(crate) fn new(config: WindowConfig) -> Self {
        Self {
            config,
            admissions: VecDeque::new(),
        }
    }

    /// Admit at `now` if the window has room, otherwise return how long
    /// until the oldest admission ages out.
    pub(crate) fn try_admit(&mut self, now: Instant) -> Result<(), Duration> {
        self.evict_expired(now);

        if let Some(wait) = self.wait_time(now) {
            return Err(wait);
        }

        self.admissions.push_back(now);
        debug_assert!(self.admissions.len() <= self.config.max_permits());
        // Never taken while the capacity check and the append share a lock.
        while self.admissions.len() > self.config.max_permits() {
            self.admissions.pop_front();
        }
        Ok(())
    }

    /// Time until a permit frees up, or `None` if one is available at `now`.
    pub(crate) fn wait_time(&self, now: Instant) -> Option<Duration> {
        if self.admissions.len() < self.config.max_permits() {
            return None;
        }

        let oldest = *self.admissions.front()?;
        let age = now.saturating_duration_since(oldest);
        let window = self.config.window();

        if age < window {
            Some(window - age)
        } else {
            None
        }
    }

    /// Number of admissions younger than the window at `now`.
    pub(crate) fn in_window(&self, now: Instant) -> usize {
        let window = self.config.window();
        self.admissions
            .iter()
            .filter(|admitted| now.saturating_duration_since(**admitted) < window)
            .count()
    }

    pub(crate) fn len(&self) -> usize {
        self.admissions.len()
    }

    fn evict_expired(&mut self, now: Instant) {
        let window = self.config.window();
        while self
            .admissions
            .front()
            .is_some_and(|oldest| now.saturating_duration_since(*oldest) >= window)
        {
            self.admissions.pop_front();
        }
    }
}
