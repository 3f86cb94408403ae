//! Runtime configuration from environment variables

use std::env;
use std::time::Duration;

/// Configuration for the stake statistics engine
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Cadence of scan passes while the window is still filling
    pub poll_interval: Duration,

    /// Cadence once the window has filled past its fullness threshold;
    /// the driver widens to this once and never narrows back
    pub settled_interval: Duration,

    /// Length of the trailing sample window in seconds
    pub window_secs: i64,
}

impl StatsConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `STAKEFLOW_POLL_INTERVAL_MS` (default: 1000)
    /// - `STAKEFLOW_SETTLED_INTERVAL_MS` (default: 30000)
    /// - `STAKEFLOW_WINDOW_SECS` (default: 86400)
    pub fn from_env() -> Self {
        Self {
            poll_interval: Duration::from_millis(
                env::var("STAKEFLOW_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1_000),
            ),

            settled_interval: Duration::from_millis(
                env::var("STAKEFLOW_SETTLED_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30_000),
            ),

            window_secs: env::var("STAKEFLOW_WINDOW_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(86_400),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1_000),
            settled_interval: Duration::from_millis(30_000),
            window_secs: 86_400,
        }
    }
}
