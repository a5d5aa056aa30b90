//! Contains the [ConfigError] type.

use crate::ChainLayer;
use alloy_primitives::B256;
use thiserror::Error;

/// An error raised while validating a [RollupConfig].
///
/// Every variant is fatal to startup: a process must not run with an unvalidated config.
///
/// [RollupConfig]: crate::RollupConfig
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The L2 block time is zero.
    #[error("block time cannot be 0")]
    BlockTimeZero,
    /// The channel timeout is zero.
    #[error("channel timeout must be set, this should cover at least a L1 block time")]
    MissingChannelTimeout,
    /// The proposer window spans fewer than two epochs.
    #[error("proposer window size must be at least 2")]
    InvalidProposerWindowSize,
    /// The L1 genesis hash is zero.
    #[error("genesis L1 hash cannot be empty")]
    MissingGenesisL1Hash,
    /// The L2 genesis hash is zero.
    #[error("genesis L2 hash cannot be empty")]
    MissingGenesisL2Hash,
    /// The L1 and L2 genesis hashes are equal.
    #[error("L1 and L2 genesis hashes cannot be the same")]
    GenesisHashesSame,
    /// The L2 genesis timestamp is zero.
    #[error("missing L2 genesis time")]
    MissingGenesisL2Time,
    /// The genesis system config has no batcher address.
    #[error("missing genesis system config batcher address")]
    MissingBatcherAddr,
    /// The genesis system config has a zero overhead.
    #[error("missing genesis system config overhead")]
    MissingOverhead,
    /// The genesis system config has a zero scalar.
    #[error("missing genesis system config scalar")]
    MissingScalar,
    /// The genesis system config has a zero gas limit.
    #[error("missing genesis system config gas limit")]
    MissingGasLimit,
    /// The batch inbox address is zero.
    #[error("missing batch inbox address")]
    MissingBatchInboxAddress,
    /// The deposit contract address is zero.
    #[error("missing deposit contract address")]
    MissingDepositContractAddress,
    /// The L1 chain ID is not set.
    #[error("L1 chain ID must not be nil")]
    MissingL1ChainId,
    /// The L2 chain ID is not set.
    #[error("L2 chain ID must not be nil")]
    MissingL2ChainId,
    /// The L1 and L2 chain IDs are equal.
    #[error("L1 and L2 chain IDs must be different")]
    ChainIdsSame,
    /// The L1 chain ID is zero.
    #[error("L1 chain ID must be non-zero and positive")]
    L1ChainIdNotPositive,
    /// The L2 chain ID is zero.
    #[error("L2 chain ID must be non-zero and positive")]
    L2ChainIdNotPositive,
    /// The chain behind a client reports a different chain ID than the config.
    #[error("incorrect {layer} RPC chain id, expected from config {expected}, obtained from client {actual}")]
    ChainIdMismatch {
        /// The chain that was checked.
        layer: ChainLayer,
        /// The chain ID in the config.
        expected: u64,
        /// The chain ID reported by the client.
        actual: u64,
    },
    /// The block at the configured genesis height has a different hash than the config.
    #[error("incorrect {layer} genesis block hash {actual}, expected {expected}")]
    GenesisHashMismatch {
        /// The chain that was checked.
        layer: ChainLayer,
        /// The genesis hash in the config.
        expected: B256,
        /// The hash of the block the client returned.
        actual: B256,
    },
    /// The client could not answer a validation query.
    #[error("failed to query the {layer} client: {message}")]
    Oracle {
        /// The chain that was queried.
        layer: ChainLayer,
        /// The client error.
        message: String,
    },
}

impl ConfigError {
    /// Returns `true` if the error was found without talking to a chain.
    pub const fn is_structural(&self) -> bool {
        !matches!(
            self,
            Self::ChainIdMismatch { .. } | Self::GenesisHashMismatch { .. } | Self::Oracle { .. }
        )
    }
}
