//! Trailing sample window and per-address reward ledger

use super::stats::WindowStats;
use crate::ledger::Amount;
use std::collections::HashMap;

/// One qualifying block's contribution to the window.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StakeSample {
    pub height: u64,
    /// Block timestamp, seconds since epoch
    pub block_time: i64,
    /// Value of the input consumed to stake
    pub stake_value: Amount,
    /// Reward recipients other than the staker's own reclaim, in output order
    pub payees: Vec<(String, Amount)>,
}

/// The live trailing-window state: samples keyed by height, a reward ledger
/// kept in lockstep with them, and the most recently computed statistics.
///
/// Invariant: for every address, `rewards[address]` equals the sum of that
/// address's amounts across all retained samples' payees. `add_sample` and
/// `evict_older_than` each maintain it; nothing else mutates the ledger.
#[derive(Debug, Default)]
pub struct StakeWindow {
    samples: HashMap<u64, StakeSample>,
    rewards: HashMap<String, Amount>,
    oldest_height: Option<u64>,
    last_scanned_height: u64,
    stats: Option<WindowStats>,
}

impl StakeWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sample, crediting its payees in the reward ledger.
    ///
    /// A height already present is a no-op (returns false), so re-scanning
    /// a range can never double-count rewards.
    pub fn add_sample(&mut self, sample: StakeSample) -> bool {
        if self.samples.contains_key(&sample.height) {
            return false;
        }
        for (address, amount) in &sample.payees {
            *self.rewards.entry(address.clone()).or_insert(0) += amount;
        }
        self.oldest_height = Some(match self.oldest_height {
            Some(oldest) => oldest.min(sample.height),
            None => sample.height,
        });
        self.samples.insert(sample.height, sample);
        true
    }

    /// Remove every sample older than the cutoff, debiting its payees from
    /// the reward ledger (the exact inverse of `add_sample`). Returns the
    /// number of samples evicted.
    pub fn evict_older_than(&mut self, cutoff: i64) -> usize {
        let expired: Vec<u64> = self
            .samples
            .values()
            .filter(|s| s.block_time < cutoff)
            .map(|s| s.height)
            .collect();

        for height in &expired {
            if let Some(sample) = self.samples.remove(height) {
                for (address, amount) in &sample.payees {
                    if let Some(total) = self.rewards.get_mut(address) {
                        *total -= amount;
                        if *total == 0 {
                            self.rewards.remove(address);
                        }
                    }
                }
            }
        }

        self.oldest_height = self.samples.keys().min().copied();
        expired.len()
    }

    /// Recompute and cache statistics over the retained stake values.
    pub fn recompute_stats(&mut self) -> Option<WindowStats> {
        let values: Vec<Amount> = self.samples.values().map(|s| s.stake_value).collect();
        self.stats = WindowStats::compute(values);
        self.stats
    }

    /// Record that the scan has covered up to `tip`. Only ever advances.
    pub fn note_scanned_to(&mut self, tip: u64) {
        self.last_scanned_height = self.last_scanned_height.max(tip);
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Cached statistics from the last recompute, if any.
    pub fn stats(&self) -> Option<WindowStats> {
        self.stats
    }

    pub fn min_stake_value(&self) -> Amount {
        self.stats.map(|s| s.min).unwrap_or(0)
    }

    pub fn max_stake_value(&self) -> Amount {
        self.stats.map(|s| s.max).unwrap_or(0)
    }

    pub fn median_stake_value(&self) -> Amount {
        self.stats.map(|s| s.median).unwrap_or(0)
    }

    /// Cumulative reward attributed to an address over the window; 0 for
    /// addresses with no retained payouts.
    pub fn reward_total_for(&self, address: &str) -> Amount {
        self.rewards.get(address).copied().unwrap_or(0)
    }

    /// Copy of the full reward ledger, for consumers that must not hold the
    /// window lock while iterating.
    pub fn reward_ledger_snapshot(&self) -> HashMap<String, Amount> {
        self.rewards.clone()
    }

    pub fn last_scanned_height(&self) -> u64 {
        self.last_scanned_height
    }

    /// Height of the oldest retained sample, `None` while the window is empty.
    pub fn oldest_height(&self) -> Option<u64> {
        self.oldest_height
    }
}
