//! This module contains the [SystemConfig] type.

use alloy_primitives::{Address, B256};

/// System config values the L2 genesis block starts from.
///
/// Later L2 blocks carry these values in their L1 info deposit, but the genesis block has no
/// transactions, so every field must be set here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SystemConfig {
    /// Batch sender address
    pub batcher_addr: Address,
    /// L1 fee overhead
    pub overhead: B256,
    /// L1 fee scalar
    pub scalar: B256,
    /// L2 gas limit
    pub gas_limit: u64,
}
