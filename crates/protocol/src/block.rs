//! This module contains the block reference types observed on L1 and L2.

use alloy_primitives::B256;
use kroma_genesis::BlockId;

/// A reference to a block on either chain.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Hash)]
pub struct BlockRef {
    /// The block hash
    pub hash: B256,
    /// The block number
    pub number: u64,
    /// The parent block hash
    pub parent_hash: B256,
    /// The block timestamp
    pub timestamp: u64,
}

impl BlockRef {
    /// Instantiates a new [BlockRef].
    pub const fn new(hash: B256, number: u64, parent_hash: B256, timestamp: u64) -> Self {
        Self { hash, number, parent_hash, timestamp }
    }

    /// Returns the block ID.
    pub const fn id(&self) -> BlockId {
        BlockId::new(self.hash, self.number)
    }
}

impl core::fmt::Display for BlockRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "BlockRef {{ hash: {}, number: {}, parent_hash: {}, timestamp: {} }}",
            self.hash, self.number, self.parent_hash, self.timestamp
        )
    }
}

/// The chain heads a validator cycle is evaluated against.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct ChainHeads {
    /// The latest observed L1 block.
    pub l1: BlockRef,
    /// The latest L2 block that is safe to derive against.
    pub l2_safe: BlockRef,
}

impl ChainHeads {
    /// Instantiates a new [ChainHeads].
    pub const fn new(l1: BlockRef, l2_safe: BlockRef) -> Self {
        Self { l1, l2_safe }
    }
}
