//! Integration tests for the scan driver against an in-memory ledger
//!
//! Scenarios cover the full pass lifecycle: initial window build, repeated
//! idempotent passes, incremental scans with eviction as the clock moves,
//! reward-ledger consistency across pass sequences, and the non-blocking
//! lock contract.

use stakeflow::{
    stats_scheduler_task, Amount, Block, LedgerReader, MemoryLedger, OutPoint, PassOutcome,
    ScanDriver, StatsConfig, Transaction, TxOutput, COIN,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const T0: i64 = 1_700_000_000;
const MN_REWARD: Amount = 2 * COIN;

/// Append a coinstake block staking `stake_value` with a single masternode
/// payee `mn-<height % 10>`.
fn append_coinstake(ledger: &mut MemoryLedger, height: u64, time: i64, stake_value: Amount) {
    let staker = format!("staker-{}", height);
    let origin = OutPoint {
        txid: format!("origin-{}", height),
        vout: 0,
    };
    ledger.register_output(
        origin.clone(),
        TxOutput {
            address: staker.clone(),
            value: stake_value,
        },
    );
    ledger.push_block(Block {
        height,
        time,
        proof_of_stake: true,
        transactions: vec![
            Transaction {
                txid: format!("cb-{}", height),
                inputs: vec![],
                outputs: vec![],
                coinstake: false,
            },
            Transaction {
                txid: format!("cs-{}", height),
                inputs: vec![origin],
                outputs: vec![
                    TxOutput {
                        address: staker,
                        value: stake_value + COIN,
                    },
                    TxOutput {
                        address: format!("mn-{}", height % 10),
                        value: MN_REWARD,
                    },
                ],
                coinstake: true,
            },
        ],
    });
}

/// Driver whose clock reads from a shared atomic, so tests can move time
/// between passes.
fn driver_with_clock(
    ledger: Arc<Mutex<MemoryLedger>>,
    clock: Arc<AtomicI64>,
) -> ScanDriver<MemoryLedger> {
    ScanDriver::new_with_timestamp_fn(
        ledger,
        &StatsConfig::default(),
        Box::new(move || clock.load(Ordering::SeqCst)),
    )
}

#[test]
fn test_initial_pass_builds_full_window() {
    // 24 hourly blocks ending at T0; everything fits the 24h window.
    let mut ledger = MemoryLedger::new();
    for height in 1..=24u64 {
        let time = T0 - (24 - height) as i64 * 3_600;
        append_coinstake(&mut ledger, height, time, (height as Amount) * 10 * COIN);
    }
    let ledger = Arc::new(Mutex::new(ledger));
    let clock = Arc::new(AtomicI64::new(T0));
    let mut driver = driver_with_clock(ledger, clock);

    let outcome = driver.run_pass();
    assert_eq!(
        outcome,
        PassOutcome::Completed {
            added: 24,
            evicted: 0
        }
    );

    let window = driver.window();
    let window = window.lock().unwrap();
    assert_eq!(window.sample_count(), 24);
    assert_eq!(window.oldest_height(), Some(1));
    assert_eq!(window.last_scanned_height(), 24);

    // Stakes were 10, 20, ..., 240 coins.
    assert_eq!(window.min_stake_value(), 10 * COIN);
    assert_eq!(window.max_stake_value(), 240 * COIN);
    // Even count: entry at count/2 - 1 of the ascending order.
    assert_eq!(window.median_stake_value(), 120 * COIN);

    // 24 payouts spread over mn-0..mn-9; heights 1..=24 hit mn-4 three times.
    assert_eq!(window.reward_total_for("mn-4"), 3 * MN_REWARD);
    assert_eq!(window.reward_total_for("nobody"), 0);
}

#[test]
fn test_repeat_pass_with_no_new_blocks_is_idempotent() {
    let mut ledger = MemoryLedger::new();
    for height in 1..=12u64 {
        append_coinstake(&mut ledger, height, T0 - (12 - height) as i64 * 600, 50 * COIN);
    }
    let ledger = Arc::new(Mutex::new(ledger));
    let clock = Arc::new(AtomicI64::new(T0));
    let mut driver = driver_with_clock(ledger, clock);

    driver.run_pass();
    let window = driver.window();
    let (count, last_scanned, rewards, stats) = {
        let w = window.lock().unwrap();
        (
            w.sample_count(),
            w.last_scanned_height(),
            w.reward_ledger_snapshot(),
            w.stats(),
        )
    };

    let outcome = driver.run_pass();
    assert_eq!(
        outcome,
        PassOutcome::Completed {
            added: 0,
            evicted: 0
        }
    );

    let w = window.lock().unwrap();
    assert_eq!(w.sample_count(), count);
    assert_eq!(w.last_scanned_height(), last_scanned);
    assert_eq!(w.reward_ledger_snapshot(), rewards);
    assert_eq!(w.stats(), stats);
}

#[test]
fn test_incremental_scan_evicts_expired_samples() {
    // Hourly blocks 1..=24 ending at T0, then 12 more as time advances 12h.
    let mut seeded = MemoryLedger::new();
    for height in 1..=24u64 {
        append_coinstake(&mut seeded, height, T0 - (24 - height) as i64 * 3_600, 50 * COIN);
    }
    let ledger = Arc::new(Mutex::new(seeded));
    let clock = Arc::new(AtomicI64::new(T0));
    let mut driver = driver_with_clock(Arc::clone(&ledger), Arc::clone(&clock));

    driver.run_pass();
    assert_eq!(driver.window().lock().unwrap().sample_count(), 24);

    {
        let mut guard = ledger.lock().unwrap();
        for k in 1..=12u64 {
            append_coinstake(&mut guard, 24 + k, T0 + k as i64 * 3_600, 50 * COIN);
        }
    }
    clock.store(T0 + 12 * 3_600, Ordering::SeqCst);

    let outcome = driver.run_pass();
    // Blocks 1..=11 (times T0-23h .. T0-13h) are now older than 24h;
    // block 12 sits exactly at the cutoff and survives.
    assert_eq!(
        outcome,
        PassOutcome::Completed {
            added: 12,
            evicted: 11
        }
    );

    let window = driver.window();
    let w = window.lock().unwrap();
    assert_eq!(w.sample_count(), 25);
    assert_eq!(w.oldest_height(), Some(12));
    assert_eq!(w.last_scanned_height(), 36);

    // Evicted payouts are gone from the ledger, retained ones are not:
    // mn-1 was paid by heights 1, 11, 21, 31 and kept only 21 and 31.
    assert_eq!(w.reward_total_for("mn-1"), 2 * MN_REWARD);
}

#[test]
fn test_reward_ledger_matches_retained_payouts_across_passes() {
    let mut seeded = MemoryLedger::new();
    for height in 1..=30u64 {
        append_coinstake(&mut seeded, height, T0 - (30 - height) as i64 * 1_800, 50 * COIN);
    }
    let ledger = Arc::new(Mutex::new(seeded));
    let clock = Arc::new(AtomicI64::new(T0));
    let mut driver = driver_with_clock(Arc::clone(&ledger), Arc::clone(&clock));

    for round in 1..=4u64 {
        driver.run_pass();
        {
            let mut guard = ledger.lock().unwrap();
            let tip = guard.tip_height().unwrap();
            append_coinstake(&mut guard, tip + 1, T0 + round as i64 * 1_800, 50 * COIN);
        }
        clock.store(T0 + round as i64 * 1_800, Ordering::SeqCst);
    }
    driver.run_pass();

    // Every retained sample paid exactly one masternode reward, so the
    // ledger must sum to sample_count * MN_REWARD with nothing counted
    // twice across the overlapping passes.
    let window = driver.window();
    let w = window.lock().unwrap();
    let ledger_total: Amount = w.reward_ledger_snapshot().values().sum();
    assert_eq!(ledger_total, w.sample_count() as Amount * MN_REWARD);
}

#[test]
fn test_eviction_only_pass_leaves_stats_stale() {
    let mut seeded = MemoryLedger::new();
    for height in 1..=10u64 {
        append_coinstake(&mut seeded, height, T0 - (10 - height) as i64 * 3_600, 50 * COIN);
    }
    let ledger = Arc::new(Mutex::new(seeded));
    let clock = Arc::new(AtomicI64::new(T0));
    let mut driver = driver_with_clock(Arc::clone(&ledger), Arc::clone(&clock));

    driver.run_pass();
    let stats_before = driver.window().lock().unwrap().stats().unwrap();
    assert_eq!(stats_before.count, 10);

    // 20 hours later, no new blocks: the oldest samples age out but the
    // cached stats still describe the pre-eviction window.
    clock.store(T0 + 20 * 3_600, Ordering::SeqCst);
    let outcome = driver.run_pass();
    match outcome {
        PassOutcome::Completed { added: 0, evicted } => assert!(evicted > 0),
        other => panic!("unexpected outcome {:?}", other),
    }

    let window = driver.window();
    let w = window.lock().unwrap();
    assert!(w.sample_count() < 10);
    assert_eq!(w.stats().unwrap(), stats_before);
}

#[test]
fn test_contended_window_lock_aborts_without_blocking() {
    let mut seeded = MemoryLedger::new();
    for height in 1..=8u64 {
        append_coinstake(&mut seeded, height, T0 - (8 - height) as i64 * 600, 50 * COIN);
    }
    let ledger = Arc::new(Mutex::new(seeded));
    let clock = Arc::new(AtomicI64::new(T0));
    let mut driver = driver_with_clock(Arc::clone(&ledger), Arc::clone(&clock));

    driver.run_pass();
    let window = driver.window();
    let before = {
        let w = window.lock().unwrap();
        (
            w.sample_count(),
            w.last_scanned_height(),
            w.reward_ledger_snapshot(),
        )
    };

    // A concurrent reader holds the window lock while new blocks arrive.
    {
        let mut guard = ledger.lock().unwrap();
        append_coinstake(&mut guard, 9, T0 + 600, 50 * COIN);
    }
    clock.store(T0 + 600, Ordering::SeqCst);

    let reader_guard = window.lock().unwrap();
    // run_pass must return immediately rather than wait for the reader.
    let outcome = driver.run_pass();
    assert_eq!(outcome, PassOutcome::LockBusy);
    drop(reader_guard);

    let w = window.lock().unwrap();
    assert_eq!(w.sample_count(), before.0);
    assert_eq!(w.last_scanned_height(), before.1);
    assert_eq!(w.reward_ledger_snapshot(), before.2);
}

#[test]
fn test_contended_ledger_lock_aborts_without_blocking() {
    let ledger = Arc::new(Mutex::new(MemoryLedger::new()));
    let clock = Arc::new(AtomicI64::new(T0));
    let mut driver = driver_with_clock(Arc::clone(&ledger), clock);

    let core_guard = ledger.lock().unwrap();
    assert_eq!(driver.run_pass(), PassOutcome::LockBusy);
    drop(core_guard);
}

#[test]
fn test_reward_snapshot_is_detached_copy() {
    let mut seeded = MemoryLedger::new();
    append_coinstake(&mut seeded, 1, T0, 50 * COIN);
    let ledger = Arc::new(Mutex::new(seeded));
    let clock = Arc::new(AtomicI64::new(T0));
    let mut driver = driver_with_clock(ledger, clock);
    driver.run_pass();

    let window = driver.window();
    let mut snapshot: HashMap<String, Amount> = window.lock().unwrap().reward_ledger_snapshot();
    snapshot.insert("intruder".to_string(), COIN);

    assert_eq!(window.lock().unwrap().reward_total_for("intruder"), 0);
}

#[tokio::test]
async fn test_scheduler_populates_window_end_to_end() {
    let mut seeded = MemoryLedger::new();
    let now = chrono::Utc::now().timestamp();
    for height in 1..=6u64 {
        append_coinstake(&mut seeded, height, now - (6 - height) as i64 * 60, 50 * COIN);
    }
    let ledger = Arc::new(Mutex::new(seeded));
    let config = StatsConfig {
        poll_interval: Duration::from_millis(10),
        ..StatsConfig::default()
    };
    let driver = ScanDriver::new(ledger, &config);
    let window = driver.window();

    let task = tokio::spawn(stats_scheduler_task(driver));
    tokio::time::sleep(Duration::from_millis(100)).await;
    task.abort();

    let w = window.lock().unwrap();
    assert_eq!(w.sample_count(), 6);
    assert!(w.stats().is_some());
}
