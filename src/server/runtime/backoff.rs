//! Back-off configuration for the server accept loop.

use std::time::Duration;

/// Exponential back-off applied when `accept()` fails.
///
/// The delay starts at `initial_delay`, doubles after each consecutive
/// failure, and is capped at `max_delay`. A successful accept resets it.
/// Defaults are 10 ms and 1 s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
        }
    }
}

impl BackoffConfig {
    /// Raise both delays to at least 1 ms and order them so
    /// `initial_delay <= max_delay`.
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use chunkframe::server::BackoffConfig;
    ///
    /// let normalized = BackoffConfig {
    ///     initial_delay: Duration::from_millis(5),
    ///     max_delay: Duration::ZERO,
    /// }
    /// .normalized();
    /// assert_eq!(normalized.initial_delay, Duration::from_millis(1));
    /// assert_eq!(normalized.max_delay, Duration::from_millis(5));
    /// ```
    #[must_use]
    pub fn normalized(self) -> Self {
        let a = self.initial_delay.max(Duration::from_millis(1));
        let b = self.max_delay.max(Duration::from_millis(1));
        Self {
            initial_delay: a.min(b),
            max_delay: a.max(b),
        }
    }
}
