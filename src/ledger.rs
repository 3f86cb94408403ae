//! Chain data model and the ledger reader seam
//!
//! The statistics engine never talks to a node directly; everything it needs
//! from the chain comes through the [`LedgerReader`] trait. `MemoryLedger`
//! is the in-process implementation used by the sim binary and the tests.

use std::collections::{HashMap, HashSet};

/// Monetary amount in minimal units (satoshi-style, 1 COIN = 10^8).
pub type Amount = i64;

/// One whole coin in minimal units.
pub const COIN: Amount = 100_000_000;

/// Reference to a transaction output by originating txid and output index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct OutPoint {
    pub txid: String,
    pub vout: u32,
}

/// A spendable output: destination address and value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TxOutput {
    pub address: String,
    pub value: Amount,
}

/// Decoded transaction, reduced to what reward attribution needs.
///
/// Address encoding and script interpretation happen upstream in the node;
/// by the time a transaction reaches this layer its outputs carry plain
/// string addresses and the coinstake flag is already decided.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    pub txid: String,
    pub inputs: Vec<OutPoint>,
    pub outputs: Vec<TxOutput>,
    pub coinstake: bool,
}

/// Decoded block header plus its transactions.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub height: u64,
    /// Block timestamp, seconds since epoch.
    pub time: i64,
    pub proof_of_stake: bool,
    pub transactions: Vec<Transaction>,
}

/// Failure reported by a ledger lookup.
#[derive(Debug)]
pub enum LedgerError {
    /// The requested block or output does not exist.
    NotFound,
    /// The backing store could not serve the request right now.
    Unavailable(String),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::NotFound => write!(f, "not found"),
            LedgerError::Unavailable(reason) => write!(f, "unavailable: {}", reason),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Read access to chain state, as provided by the hosting node.
pub trait LedgerReader {
    /// Height of the current chain tip.
    fn tip_height(&self) -> Result<u64, LedgerError>;

    /// Full block at the given height.
    fn block_at(&self, height: u64) -> Result<Block, LedgerError>;

    /// Resolve an input's originating output (address and value).
    fn resolve_output(&self, outpoint: &OutPoint) -> Result<TxOutput, LedgerError>;

    /// True once the node considers itself fully synchronized with the
    /// network and out of initial block download.
    fn is_synchronized(&self) -> bool;
}

/// In-memory ledger backing the sim binary and the test suite.
///
/// Blocks are appended in height order; outputs of every stored transaction
/// become resolvable automatically. Origins that predate the stored chain
/// (e.g. the funding transaction behind a stake) are registered explicitly
/// with [`MemoryLedger::register_output`].
#[derive(Debug, Default)]
pub struct MemoryLedger {
    blocks: HashMap<u64, Block>,
    outputs: HashMap<OutPoint, TxOutput>,
    tip: Option<u64>,
    synchronized: bool,
    unreadable: HashSet<u64>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            synchronized: true,
            ..Self::default()
        }
    }

    /// Store a block and index the outputs of its transactions.
    pub fn push_block(&mut self, block: Block) {
        for tx in &block.transactions {
            for (vout, output) in tx.outputs.iter().enumerate() {
                self.outputs.insert(
                    OutPoint {
                        txid: tx.txid.clone(),
                        vout: vout as u32,
                    },
                    output.clone(),
                );
            }
        }
        self.tip = Some(self.tip.map_or(block.height, |t| t.max(block.height)));
        self.blocks.insert(block.height, block);
    }

    /// Make an out-of-chain output resolvable (stake origins, funding txs).
    pub fn register_output(&mut self, outpoint: OutPoint, output: TxOutput) {
        self.outputs.insert(outpoint, output);
    }

    pub fn set_synchronized(&mut self, synchronized: bool) {
        self.synchronized = synchronized;
    }

    /// Simulate a block that exists but cannot be read from disk.
    pub fn mark_unreadable(&mut self, height: u64) {
        self.unreadable.insert(height);
    }

    /// Drop a previously registered output so lookups against it fail.
    pub fn forget_output(&mut self, outpoint: &OutPoint) {
        self.outputs.remove(outpoint);
    }
}

impl LedgerReader for MemoryLedger {
    fn tip_height(&self) -> Result<u64, LedgerError> {
        self.tip.ok_or(LedgerError::NotFound)
    }

    fn block_at(&self, height: u64) -> Result<Block, LedgerError> {
        if self.unreadable.contains(&height) {
            return Err(LedgerError::Unavailable(format!(
                "block {} failed to deserialize",
                height
            )));
        }
        self.blocks.get(&height).cloned().ok_or(LedgerError::NotFound)
    }

    fn resolve_output(&self, outpoint: &OutPoint) -> Result<TxOutput, LedgerError> {
        self.outputs.get(outpoint).cloned().ok_or(LedgerError::NotFound)
    }

    fn is_synchronized(&self) -> bool {
        self.synchronized
    }
}
