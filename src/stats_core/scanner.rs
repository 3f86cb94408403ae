//! Scan driver: one aggregation pass over newly produced blocks
//!
//! Each pass walks the chain backward from the current tip to the last
//! height already covered, feeds qualifying coinstake blocks into the
//! window, evicts what has aged out, and recomputes statistics when the
//! pass added anything. The pass runs synchronously under two try-locks
//! and aborts immediately if either is contended, so a busy ledger (for
//! example mid-rescan) never stalls the periodic caller.

use super::classifier::classify_coinstake;
use super::stats::WindowStats;
use super::window::{StakeSample, StakeWindow};
use crate::config::StatsConfig;
use crate::ledger::LedgerReader;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Window fullness at which the driver relaxes to the settled cadence.
const SETTLED_SAMPLE_THRESHOLD: usize = 100;

/// Outcome of a single aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Pass ran to completion.
    Completed { added: usize, evicted: usize },
    /// The ledger or window lock was contended; nothing was touched.
    LockBusy,
    /// The ledger is still syncing with the network.
    NotSynchronized,
    /// The current tip could not be resolved.
    NoTip,
}

/// Drives the periodic aggregation passes and owns the window state.
///
/// Readers (a UI property layer, tests) share the window through
/// [`ScanDriver::window`] and take the lock for the duration of each read.
pub struct ScanDriver<L: LedgerReader> {
    ledger: Arc<Mutex<L>>,
    window: Arc<Mutex<StakeWindow>>,
    window_secs: i64,
    poll_interval: Duration,
    settled_interval: Duration,
    settled: bool,
    /// Injectable clock so tests can replay fixed timelines
    now_fn: Box<dyn Fn() -> i64 + Send + Sync>,
    on_stats_change: Option<Box<dyn Fn(&WindowStats) + Send + Sync>>,
}

impl<L: LedgerReader> ScanDriver<L> {
    pub fn new(ledger: Arc<Mutex<L>>, config: &StatsConfig) -> Self {
        Self::new_with_timestamp_fn(ledger, config, Box::new(|| chrono::Utc::now().timestamp()))
    }

    pub fn new_with_timestamp_fn(
        ledger: Arc<Mutex<L>>,
        config: &StatsConfig,
        now_fn: Box<dyn Fn() -> i64 + Send + Sync>,
    ) -> Self {
        Self {
            ledger,
            window: Arc::new(Mutex::new(StakeWindow::new())),
            window_secs: config.window_secs,
            poll_interval: config.poll_interval,
            settled_interval: config.settled_interval,
            settled: false,
            now_fn,
            on_stats_change: None,
        }
    }

    /// Shared handle to the window; all reads go through its lock.
    pub fn window(&self) -> Arc<Mutex<StakeWindow>> {
        Arc::clone(&self.window)
    }

    /// Register a callback fired after each statistics recompute.
    pub fn set_stats_listener(
        &mut self,
        listener: impl Fn(&WindowStats) + Send + Sync + 'static,
    ) {
        self.on_stats_change = Some(Box::new(listener));
    }

    /// Cadence the scheduler should currently run at. Widens once the
    /// window fills; never narrows back.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run one aggregation pass.
    ///
    /// Both locks are taken upfront and try-style. This keeps the periodic
    /// caller from getting stuck when the core is holding the ledger lock
    /// for a longer time, for example during a wallet rescan.
    pub fn run_pass(&mut self) -> PassOutcome {
        let ledger = match self.ledger.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::debug!("ledger lock contended, skipping pass");
                return PassOutcome::LockBusy;
            }
        };
        let mut window = match self.window.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::debug!("window lock contended, skipping pass");
                return PassOutcome::LockBusy;
            }
        };

        if !ledger.is_synchronized() {
            return PassOutcome::NotSynchronized;
        }

        let tip = match ledger.tip_height() {
            Ok(tip) => tip,
            Err(e) => {
                log::debug!("tip unresolved, skipping pass: {}", e);
                return PassOutcome::NoTip;
            }
        };

        let now = (self.now_fn)();
        let cutoff = now - self.window_secs;

        // Walk backward from the tip to the last height already scanned,
        // stopping early once block times fall outside the window.
        let mut added = 0usize;
        let mut height = tip;
        while height > window.last_scanned_height() {
            match ledger.block_at(height) {
                Ok(block) => {
                    if block.time < cutoff {
                        break;
                    }
                    if let Some(obs) = classify_coinstake(&block, &*ledger) {
                        let stored = window.add_sample(StakeSample {
                            height,
                            block_time: obs.block_time,
                            stake_value: obs.stake_value,
                            payees: obs.payees,
                        });
                        if stored {
                            added += 1;
                        }
                    }
                }
                Err(e) => {
                    log::debug!("block {} unreadable, skipping: {}", height, e);
                }
            }
            height -= 1;
        }

        let evicted = window.evict_older_than(cutoff);

        if added > 0 && !window.is_empty() {
            if let Some(stats) = window.recompute_stats() {
                log::debug!(
                    "stats recomputed: {} samples, min {} max {} median {}",
                    stats.count,
                    stats.min,
                    stats.max,
                    stats.median
                );
                if let Some(listener) = &self.on_stats_change {
                    listener(&stats);
                }
            }
        }

        window.note_scanned_to(tip);

        if !self.settled && window.sample_count() > SETTLED_SAMPLE_THRESHOLD {
            self.settled = true;
            self.poll_interval = self.settled_interval;
            log::info!(
                "window filled ({} samples), polling relaxed to {:?}",
                window.sample_count(),
                self.settled_interval
            );
        }

        if added > 0 || evicted > 0 {
            log::debug!(
                "scan pass at tip {}: {} added, {} evicted, {} retained",
                tip,
                added,
                evicted,
                window.sample_count()
            );
        }

        PassOutcome::Completed { added, evicted }
    }
}
