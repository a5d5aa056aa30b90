//! This module contains the [Epoch] type.

/// One L1-block-indexed unit of L2 progress.
///
/// Epochs map 1:1 onto L1 block numbers; see [WindowCalculator::epoch_for_l1_block].
///
/// [WindowCalculator::epoch_for_l1_block]: crate::WindowCalculator::epoch_for_l1_block
#[derive(
    derive_more::Display,
    derive_more::From,
    derive_more::Into,
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Epoch(pub u64);

impl Epoch {
    /// Returns the epoch `n` epochs after this one, saturating at [u64::MAX].
    pub const fn saturating_add(self, n: u64) -> Self {
        Self(self.0.saturating_add(n))
    }
}
