//! Handles on submitted L1 transactions.

use alloy_primitives::TxHash;

/// Identifies a transaction submitted to an external ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHandle {
    /// The transaction hash.
    pub hash: TxHash,
    /// The sender nonce the transaction was signed with, if known.
    pub nonce: Option<u64>,
}

impl TxHandle {
    /// Instantiates a new [TxHandle].
    pub const fn new(hash: TxHash, nonce: Option<u64>) -> Self {
        Self { hash, nonce }
    }
}

impl core::fmt::Display for TxHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.nonce {
            Some(nonce) => write!(f, "{} (nonce {})", self.hash, nonce),
            None => write!(f, "{}", self.hash),
        }
    }
}

/// The observed status of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// Not yet included in a block.
    Pending,
    /// Included and executed successfully.
    Confirmed {
        /// The block the transaction was included in.
        block_number: u64,
    },
    /// Included but reverted.
    Reverted,
}
