//! Output root commitments, as submitted on L1 and as derived locally.

use crate::BlockRef;
use alloy_primitives::B256;

/// An output root submitted to the output ledger.
///
/// The ledger is append-only and ordered by `l2_block_number`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputCommitment {
    /// The L2 block the root commits to.
    pub l2_block_number: u64,
    /// The output root.
    pub root: B256,
    /// The L1 block the submission landed in.
    pub submitted_at_l1_block: u64,
}

impl OutputCommitment {
    /// Instantiates a new [OutputCommitment].
    pub const fn new(l2_block_number: u64, root: B256, submitted_at_l1_block: u64) -> Self {
        Self { l2_block_number, root, submitted_at_l1_block }
    }
}

/// The canonical output at an L2 block, as computed by a state deriver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedOutput {
    /// The L2 block the output was derived for.
    pub l2_block: BlockRef,
    /// The L1 block the L2 block was derived from.
    pub l1_origin: BlockRef,
    /// The output root.
    pub root: B256,
}

impl DerivedOutput {
    /// Returns `true` if the derived root matches `commitment`.
    pub fn agrees_with(&self, commitment: &OutputCommitment) -> bool {
        self.l2_block.number == commitment.l2_block_number && self.root == commitment.root
    }
}
