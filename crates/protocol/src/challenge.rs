//! This module contains the [Challenge] type.

use crate::OutputCommitment;

/// The status of an on-chain dispute.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(derive_more::Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeStatus {
    /// The dispute is still being played out.
    #[display("open")]
    Open,
    /// The challenged output was proven wrong and replaced.
    #[display("proven")]
    Proven,
    /// The challenged output was upheld.
    #[display("dismissed")]
    Dismissed,
    /// The dispute expired before resolution.
    #[display("timed_out")]
    TimedOut,
}

impl ChallengeStatus {
    /// Returns `true` once the dispute can no longer change.
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Returns the status as a static string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Proven => "proven",
            Self::Dismissed => "dismissed",
            Self::TimedOut => "timed_out",
        }
    }
}

/// A dispute against a submitted output root.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge {
    /// The disputed commitment.
    pub target: OutputCommitment,
    /// The current status.
    pub status: ChallengeStatus,
    /// The L1 block after which an open dispute times out.
    pub deadline: u64,
}
