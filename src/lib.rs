//! StakeFlow - rolling 24-hour proof-of-stake reward statistics
//!
//! Scans a proof-of-stake chain backward from the tip, attributes coinstake
//! payouts to their recipients, and maintains a continuously-evicting
//! 24-hour window of stake samples with summary statistics (min/max/median
//! stake value, per-address cumulative rewards).
//!
//! The chain itself sits behind the [`ledger::LedgerReader`] trait; wire it
//! to a node's block store in production or to [`ledger::MemoryLedger`] in
//! tests and simulations. [`stats_core::ScanDriver`] performs the passes,
//! [`scheduler::stats_scheduler_task`] gives them a heartbeat.

pub mod config;
pub mod ledger;
pub mod scheduler;
pub mod stats_core;

pub use config::StatsConfig;
pub use ledger::{
    Amount, Block, LedgerError, LedgerReader, MemoryLedger, OutPoint, Transaction, TxOutput, COIN,
};
pub use scheduler::stats_scheduler_task;
pub use stats_core::{
    classify_coinstake, PassOutcome, ScanDriver, StakeObservation, StakeSample, StakeWindow,
    WindowStats,
};
