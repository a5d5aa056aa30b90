//! States and reports of the dispute engine.

use alloy_primitives::B256;
use kroma_protocol::{OutputCommitment, TxHandle};

/// A state of the dispute engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    /// No cycle is active.
    Idle,
    /// Polling the output ledger for the next expected output.
    Watching,
    /// Deriving the canonical output root.
    Deriving,
    /// The derived root matches the ledger.
    Agree,
    /// The derived root differs from the ledger, or no output exists yet.
    Disagree,
    /// An output submission is in flight.
    Submitting,
    /// A dispute is in flight.
    Challenging,
    /// The cycle completed.
    Confirmed,
}

/// How a call to [DisputeEngine::step] ended.
///
/// [DisputeEngine::step]: crate::DisputeEngine::step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another step was already running.
    Busy,
    /// Nothing can be done until the chains advance.
    Waiting,
    /// The ledger output matches the derived output.
    Agreed,
    /// This instance's output submission was confirmed.
    Submitted,
    /// A challenge proved the ledger output wrong.
    ChallengeProven,
    /// A challenge was dismissed; the ledger output was right.
    ChallengeDismissed,
    /// A challenge expired unresolved.
    ChallengeTimedOut,
    /// The ledger output was submitted after its proposer window and was only flagged.
    LateFlagged,
    /// A transaction is in flight; the next step resumes it.
    PendingConfirmation,
    /// Action is required but this instance is not allowed to take it.
    Blocked,
}

impl CycleOutcome {
    /// Returns `true` if the cycle reached [EngineState::Confirmed].
    pub const fn is_confirmed(&self) -> bool {
        matches!(
            self,
            Self::Agreed
                | Self::Submitted
                | Self::ChallengeProven
                | Self::ChallengeDismissed
                | Self::ChallengeTimedOut
                | Self::LateFlagged
        )
    }
}

/// The result of one call to [DisputeEngine::step].
///
/// [DisputeEngine::step]: crate::DisputeEngine::step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// The L2 block the step worked on, if any.
    pub l2_block: Option<u64>,
    /// The states visited during the step, in order.
    pub path: Vec<EngineState>,
    /// How the step ended.
    pub outcome: CycleOutcome,
}

impl CycleReport {
    /// The report of a step that found the engine busy.
    pub const fn busy() -> Self {
        Self { l2_block: None, path: Vec::new(), outcome: CycleOutcome::Busy }
    }

    /// Returns `true` if the step visited `state`.
    pub fn visited(&self, state: EngineState) -> bool {
        self.path.contains(&state)
    }
}

/// The in-flight part of a cycle that survives across steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Phase {
    /// No transaction is in flight.
    #[default]
    Watching,
    /// An output submission awaits confirmation.
    Submitting {
        /// The L2 block of the output.
        l2_block: u64,
        /// The submitted root.
        root: B256,
        /// The submission transaction.
        tx: TxHandle,
    },
    /// A dispute is being played out.
    Challenging {
        /// The disputed commitment.
        target: OutputCommitment,
        /// The root this instance derived for the block.
        derived: B256,
        /// The challenge transaction, until it is confirmed.
        tx: Option<TxHandle>,
    },
}
