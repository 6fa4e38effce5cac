//! Process-wide tracing setup shared by the proposal pipeline, registration
//! scheduler, and discovery service.

use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

pub mod discv5_tracing_layer;

pub use discv5_tracing_layer::create_discv5_tracing_layer;

/// The minimum interval between log messages that would otherwise repeat on
/// every tick (e.g. "no registrations to flush").
const LOG_DEBOUNCE_INTERVAL: Duration = Duration::from_secs(30);

/// De-bounces a recurring log message so it prints at most once per
/// [`LOG_DEBOUNCE_INTERVAL`].
#[derive(Default)]
pub struct TimeLatch(Option<Instant>);

impl TimeLatch {
    /// Only returns `true` once every [`LOG_DEBOUNCE_INTERVAL`].
    pub fn elapsed(&mut self) -> bool {
        let now = Instant::now();
        let is_elapsed = self.0.is_some_and(|elapse_time| now > elapse_time);
        if is_elapsed || self.0.is_none() {
            self.0 = Some(now + LOG_DEBOUNCE_INTERVAL);
        }
        is_elapsed
    }
}

/// Installs the process-wide `tracing` subscriber, honoring `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// A tracing subscriber suitable for test usage: silent unless the
/// `test_logger` feature is enabled, in which case it prints to stderr.
pub fn create_test_tracing_subscriber() {
    if cfg!(feature = "test_logger") {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("debug"))
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_latch_fires_once_until_interval_elapses() {
        let mut latch = TimeLatch::default();
        assert!(!latch.elapsed(), "first call always arms the latch");
        assert!(!latch.elapsed(), "second call within the interval stays armed");
    }
}
