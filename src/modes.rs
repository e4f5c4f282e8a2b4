use std::time::Duration;

use crate::constants::DEFAULT_REFRESH_INTERVAL_SECS;

/// Describes how the [`crate::Client`] keeps its feature flags up to date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollingMode {
    /// Refreshes in the background on every tick of the given interval, starting right away.
    AutoPoll(Duration),
    /// Refreshes only when [`crate::Client::refresh`] is called.
    Manual,
}

impl Default for PollingMode {
    fn default() -> Self {
        PollingMode::AutoPoll(Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS))
    }
}
