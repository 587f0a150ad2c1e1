//! Sliding window configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CrptError, Result};

/// Time unit that sizes the sliding window. The window always spans one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeUnit {
    /// Get the duration of one unit.
    pub fn duration(&self) -> Duration {
        match self {
            TimeUnit::Millisecond => Duration::from_millis(1),
            TimeUnit::Second => Duration::from_secs(1),
            TimeUnit::Minute => Duration::from_secs(60),
            TimeUnit::Hour => Duration::from_secs(3600),
            TimeUnit::Day => Duration::from_secs(86400),
        }
    }
}

/// Immutable window size and permit ceiling of a limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowConfig {
    window: Duration,
    max_permits: usize,
}

impl WindowConfig {
    /// Create a window spanning one `unit` that admits at most `max_permits` calls.
    ///
    /// Non-positive permit counts are rejected with
    /// [`CrptError::InvalidConfiguration`].
    pub fn new(unit: TimeUnit, max_permits: i64) -> Result<Self> {
        Self::with_duration(unit.duration(), max_permits)
    }

    /// Create a window of arbitrary length.
    pub fn with_duration(window: Duration, max_permits: i64) -> Result<Self> {
        if max_permits <= 0 {
            return Err(CrptError::InvalidConfiguration(format!(
                "max permits must be positive, got {}",
                max_permits
            )));
        }
        if window.as_millis() == 0 {
            return Err(CrptError::InvalidConfiguration(
                "window must be at least one millisecond".to_string(),
            ));
        }
        let max_permits = usize::try_from(max_permits).map_err(|_| {
            CrptError::InvalidConfiguration(format!("max permits {} is too large", max_permits))
        })?;

        Ok(Self { window, max_permits })
    }

    /// Length of the sliding window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Maximum admissions inside any window.
    pub fn max_permits(&self) -> usize {
        self.max_permits
    }
}
