//! Stats Core - Rolling Stake Reward Aggregation
//!
//! This module maintains the trailing 24-hour view of proof-of-stake
//! activity: which blocks staked, how much, and who got paid.
//!
//! # Architecture
//!
//! ```text
//! LedgerReader (tip, blocks, prevout lookups)
//!     ↓
//! ScanDriver (periodic backward walk, try-lock gated)
//!     ↓
//! classify_coinstake (stake origin + reclaim/payee split)
//!     ↓
//! StakeWindow (height-keyed samples + reward ledger)
//!     ↓
//! WindowStats (count, min/max with outlier damping, median)
//! ```

pub mod classifier;
pub mod scanner;
pub mod stats;
pub mod window;

pub use classifier::{classify_coinstake, StakeObservation};
pub use scanner::{PassOutcome, ScanDriver};
pub use stats::WindowStats;
pub use window::{StakeSample, StakeWindow};
