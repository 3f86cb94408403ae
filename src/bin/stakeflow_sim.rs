//! Synthetic-chain simulation
//!
//! Seeds an in-memory ledger with 24 hours of proof-of-stake history, keeps
//! producing blocks, and runs the stats scheduler against it. Useful for
//! watching the window fill, the cadence ratchet engage, and the reward
//! ledger move without a node attached.

use {
    rand::Rng,
    stakeflow::{
        stats_scheduler_task, Amount, Block, MemoryLedger, OutPoint, ScanDriver, StatsConfig,
        Transaction, TxOutput, COIN,
    },
    std::sync::{Arc, Mutex},
    tokio::time::{sleep, Duration},
};

/// Spacing of the seeded historical blocks.
const BLOCK_SPACING_SECS: i64 = 60;

/// How often the producer appends a fresh block.
const PRODUCER_INTERVAL_SECS: u64 = 5;

fn as_coins(amount: Amount) -> f64 {
    amount as f64 / COIN as f64
}

/// Append one coinstake block: random stake from a small staker set, the
/// stake reclaimed with a small reward, and a rotating masternode payee.
fn append_block(ledger: &mut MemoryLedger, height: u64, time: i64, rng: &mut impl Rng) {
    let staker = format!("staker-{}", rng.gen_range(0..25));
    let stake_value = rng.gen_range(10..500) * COIN;

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
                        value: 2 * COIN,
                    },
                ],
                coinstake: true,
            },
        ],
    });
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = StatsConfig::from_env();
    log::info!("🚀 Starting stakeflow sim");
    log::info!("📊 Configuration:");
    log::info!("   poll interval:    {:?}", config.poll_interval);
    log::info!("   settled interval: {:?}", config.settled_interval);
    log::info!("   window:           {}s", config.window_secs);

    // Seed a day of history so the first pass has a full window to chew on.
    let now = chrono::Utc::now().timestamp();
    let seed_blocks = (config.window_secs / BLOCK_SPACING_SECS) as u64;
    let mut rng = rand::thread_rng();
    let mut seeded = MemoryLedger::new();
    for height in 1..=seed_blocks {
        let time = now - (seed_blocks - height) as i64 * BLOCK_SPACING_SECS;
        append_block(&mut seeded, height, time, &mut rng);
    }
    log::info!("seeded {} historical blocks", seed_blocks);
    let ledger = Arc::new(Mutex::new(seeded));

    let mut driver = ScanDriver::new(Arc::clone(&ledger), &config);
    driver.set_stats_listener(|stats| {
        log::info!(
            "📊 window: {} samples | stake min {:.2} max {:.2} median {:.2}",
            stats.count,
            as_coins(stats.min),
            as_coins(stats.max),
            as_coins(stats.median),
        );
    });
    let window = driver.window();

    // Block producer: keeps the tip moving while the scheduler scans.
    let producer_ledger = Arc::clone(&ledger);
    tokio::spawn(async move {
        let mut height = seed_blocks;
        loop {
            sleep(Duration::from_secs(PRODUCER_INTERVAL_SECS)).await;
            height += 1;
            let time = chrono::Utc::now().timestamp();
            let mut rng = rand::thread_rng();
            let mut guard = producer_ledger.lock().unwrap();
            append_block(&mut guard, height, time, &mut rng);
            log::debug!("produced block {}", height);
        }
    });

    tokio::spawn(stats_scheduler_task(driver));

    // Reward report loop: snapshot under the lock, log outside it.
    loop {
        sleep(Duration::from_secs(30)).await;
        let (snapshot, count) = {
            let guard = window.lock().unwrap();
            (guard.reward_ledger_snapshot(), guard.sample_count())
        };

        let mut totals: Vec<(String, Amount)> = snapshot.into_iter().collect();
        totals.sort_by(|a, b| b.1.cmp(&a.1));
        totals.truncate(5);
        let top: Vec<String> = totals
            .iter()
            .map(|(address, amount)| format!("{}: {:.2}", address, as_coins(*amount)))
            .collect();
        log::info!(
            "💰 rewards over the window ({} samples), top recipients: {}",
            count,
            serde_json::to_string(&top).unwrap_or_default()
        );
    }
}
