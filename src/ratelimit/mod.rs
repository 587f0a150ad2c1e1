//! Sliding window rate limiting.

mod ledger;
mod limiter;
mod window;

pub use limiter::SlidingWindowLimiter;
pub use window::{TimeUnit, WindowConfig};
