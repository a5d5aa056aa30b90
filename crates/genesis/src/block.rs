//! Block identifiers used to anchor the rollup.

use alloy_primitives::{BlockHash, BlockNumber};

/// Identifies a block by its hash and number.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct BlockId {
    /// The block hash
    pub hash: BlockHash,
    /// The block number
    pub number: BlockNumber,
}

impl BlockId {
    /// Creates a new [BlockId].
    pub const fn new(hash: BlockHash, number: BlockNumber) -> Self {
        Self { hash, number }
    }
}

impl core::fmt::Display for BlockId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{{ hash: {}, number: {} }}", self.hash, self.number)
    }
}

/// The chain a value or check refers to.
#[derive(derive_more::Display, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ChainLayer {
    /// The settlement chain.
    #[display("L1")]
    L1,
    /// The rollup chain.
    #[display("L2")]
    L2,
}
