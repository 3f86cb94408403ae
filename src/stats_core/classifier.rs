//! Coinstake classification and reward attribution
//!
//! Decides whether a block contributes to the stake statistics window and,
//! if so, extracts the staked amount and the payout recipients.

use crate::ledger::{Amount, Block, LedgerReader};

/// Position of the coinstake transaction inside a proof-of-stake block.
const COINSTAKE_INDEX: usize = 1;

/// Reward data extracted from one qualifying coinstake block, before the
/// window assigns it a height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StakeObservation {
    /// Block timestamp, seconds since epoch
    pub block_time: i64,
    /// Value of the input consumed to produce the stake
    pub stake_value: Amount,
    /// Every output that is not the staker reclaiming their own stake,
    /// in output order
    pub payees: Vec<(String, Amount)>,
}

/// Classify a block, returning its reward data if it qualifies.
///
/// A block qualifies when it is proof-of-stake and carries a coinstake
/// transaction at the expected position. The coinstake's first input is
/// resolved through the ledger to recover the staked value and the staking
/// address; an unresolvable origin makes the block non-qualifying rather
/// than an error.
///
/// Output attribution: outputs paying the staking address are the staker
/// taking their stake back, for as long as the running reclaimed total is
/// still below the staked value. Everything else (masternode payees,
/// third-party outputs, and stake-address outputs once the stake is fully
/// reclaimed) lands in `payees`.
pub fn classify_coinstake<L: LedgerReader>(block: &Block, ledger: &L) -> Option<StakeObservation> {
    if !block.proof_of_stake {
        return None;
    }
    let tx = block.transactions.get(COINSTAKE_INDEX)?;
    if !tx.coinstake {
        return None;
    }

    let prevout = tx.inputs.first()?;
    let origin = match ledger.resolve_output(prevout) {
        Ok(output) => output,
        Err(e) => {
            log::debug!(
                "stake origin {}:{} unresolved, skipping block {}: {}",
                prevout.txid,
                prevout.vout,
                block.height,
                e
            );
            return None;
        }
    };
    let stake_value = origin.value;
    let stake_address = origin.address;

    let mut reclaimed: Amount = 0;
    let mut payees = Vec::new();
    for output in &tx.outputs {
        if output.address == stake_address && stake_value > reclaimed {
            reclaimed += output.value;
        } else {
            payees.push((output.address.clone(), output.value));
        }
    }

    Some(StakeObservation {
        block_time: block.time,
        stake_value,
        payees,
    })
}
