//! Periodic scheduling of aggregation passes
//!
//! The driver itself is synchronous; this task gives it the fixed-interval
//! heartbeat the hosting application would otherwise provide, and follows
//! the driver's one-way cadence ratchet as the window fills.

use crate::ledger::LedgerReader;
use crate::stats_core::{PassOutcome, ScanDriver};
use tokio::time::interval;

/// Run aggregation passes on the driver's polling cadence.
///
/// Runs indefinitely until the owning task is cancelled. When a pass
/// widens the driver's cadence the timer is re-armed at the new interval.
pub async fn stats_scheduler_task<L: LedgerReader>(mut driver: ScanDriver<L>) {
    let mut cadence = driver.poll_interval();
    log::info!("⏰ Starting stake stats scheduler (interval: {:?})", cadence);

    let mut timer = interval(cadence);
    loop {
        timer.tick().await;

        match driver.run_pass() {
            PassOutcome::Completed { added, evicted } if added > 0 || evicted > 0 => {
                log::debug!("scan pass complete: {} added, {} evicted", added, evicted);
            }
            PassOutcome::Completed { .. } => {}
            PassOutcome::LockBusy => {
                log::debug!("scan pass skipped: locks contended");
            }
            PassOutcome::NotSynchronized => {
                log::debug!("scan pass skipped: ledger not synchronized");
            }
            PassOutcome::NoTip => {
                log::debug!("scan pass skipped: no tip");
            }
        }

        if driver.poll_interval() != cadence {
            cadence = driver.poll_interval();
            log::info!("scheduler cadence now {:?}", cadence);
            timer = interval(cadence);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatsConfig;
    use crate::ledger::MemoryLedger;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[tokio::test]
    async fn test_scheduler_runs_passes_and_survives_empty_ledger() {
        let ledger = Arc::new(Mutex::new(MemoryLedger::new()));
        let config = StatsConfig {
            poll_interval: Duration::from_millis(10),
            ..StatsConfig::default()
        };
        let driver = ScanDriver::new(ledger, &config);
        let window = driver.window();

        let task = tokio::spawn(stats_scheduler_task(driver));
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();

        // No blocks ever arrived; the scheduler must have kept polling
        // without touching the window.
        assert!(window.lock().unwrap().is_empty());
    }
}
