//! Capabilities the validator core consumes.
//!
//! The core never talks to a chain directly. Every read and every transaction goes through
//! one of these traits, so that the same engine runs against live clients and test doubles.

use crate::errors::{DerivationError, LedgerError};
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use core::fmt::Display;
use kroma_protocol::{
    BlockRef, BondIntent, BondState, Challenge, DerivedOutput, OutputCommitment, TxHandle,
    TxStatus,
};

/// Read-only access to one chain.
///
/// L1 and L2 are two instances of the same capability.
#[async_trait]
pub trait ChainRefOracle: Send + Sync {
    /// The error type for the [ChainRefOracle].
    type Error: Display + Send;

    /// Returns the chain ID reported by the client.
    async fn chain_id(&self) -> Result<u64, Self::Error>;

    /// Returns the block at the given number.
    async fn block_ref_by_number(&self, number: u64) -> Result<BlockRef, Self::Error>;

    /// Returns the head block the client considers usable.
    ///
    /// For an L2 client this is the safe head.
    async fn latest_block_ref(&self) -> Result<BlockRef, Self::Error>;
}

/// Produces canonical L2 output roots from L1 data.
#[async_trait]
pub trait StateDeriver: Send + Sync {
    /// Derives the output root at the given L2 block.
    async fn derive_output_root(&self, l2_block: u64) -> Result<DerivedOutput, DerivationError>;

    /// Returns the L1 origin of the given L2 block without deriving its output.
    async fn l1_origin_of(&self, l2_block: u64) -> Result<BlockRef, DerivationError>;
}

/// Observes transactions submitted to a ledger.
#[async_trait]
pub trait TxTracker: Send + Sync {
    /// Returns the current status of a submitted transaction.
    async fn tx_status(&self, tx: &TxHandle) -> Result<TxStatus, LedgerError>;
}

/// The on-chain record of submitted output roots.
#[async_trait]
pub trait OutputLedger: TxTracker {
    /// Returns the next commitment the ledger has not yielded yet, in ledger order.
    async fn next_commitment(&self) -> Result<Option<OutputCommitment>, LedgerError>;

    /// Submits an output root for the given L2 block.
    async fn submit(&self, l2_block: u64, root: B256) -> Result<TxHandle, LedgerError>;

    /// Returns the validator expected to submit the next output.
    async fn next_proposer(&self) -> Result<Address, LedgerError>;
}

/// The on-chain dispute game.
#[async_trait]
pub trait ChallengeLedger: TxTracker {
    /// Opens a dispute against the given commitment.
    async fn challenge(&self, target: &OutputCommitment) -> Result<TxHandle, LedgerError>;

    /// Returns the dispute opened against the output at the given L2 block, if any.
    async fn challenge_status(&self, l2_block: u64) -> Result<Option<Challenge>, LedgerError>;
}

/// The on-chain stake, commission and reward state of validators.
#[async_trait]
pub trait BondLedger: TxTracker {
    /// Submits an intent signed with the given nonce.
    ///
    /// Resubmitting the same intent with the same nonce replaces rather than duplicates it.
    async fn submit_intent(&self, intent: &BondIntent, nonce: u64)
        -> Result<TxHandle, LedgerError>;

    /// Returns the next unused nonce of the signing account.
    async fn next_nonce(&self) -> Result<u64, LedgerError>;

    /// Returns the bond state of a validator.
    async fn bond_state(&self, validator: Address) -> Result<BondState, LedgerError>;
}
