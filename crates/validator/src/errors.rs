//! Error types for the validator core.

use kroma_protocol::{BondIntentError, TxHandle};
use thiserror::Error;

/// An error returned by a [StateDeriver].
///
/// [StateDeriver]: crate::traits::StateDeriver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DerivationError {
    /// Not enough L1 data has been observed to derive the block yet.
    #[error("insufficient L1 data to derive L2 block {0}")]
    InsufficientData(u64),
    /// Derivation produced an inconsistent result or failed outright.
    #[error("derivation fault: {0}")]
    Fault(String),
}

impl DerivationError {
    /// Returns `true` if the derivation can be retried once more L1 data arrives.
    pub const fn is_temporary(&self) -> bool {
        matches!(self, Self::InsufficientData(_))
    }
}

/// An error returned by an external ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A network, timeout or fee market failure. Retried with backoff.
    #[error("transient ledger error: {0}")]
    Transient(String),
    /// The ledger refused the request. Never retried as-is.
    #[error("ledger rejected request: {0}")]
    Rejected(String),
}

impl LedgerError {
    /// Returns `true` if the request may succeed when retried unchanged.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// An external ledger was observed violating its own contract.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyFault {
    /// Two commitments were observed for the same L2 block.
    #[error("duplicate output commitment at L2 block {0}")]
    DuplicateCommitment(u64),
    /// A commitment does not sit on the submission interval grid.
    #[error("output commitment at L2 block {l2_block} is not aligned to interval {interval} from {start}")]
    MisalignedCommitment {
        /// The L2 block of the commitment.
        l2_block: u64,
        /// The first L2 block of the grid.
        start: u64,
        /// The submission interval.
        interval: u64,
    },
    /// A commitment was yielded after a commitment for a later L2 block.
    #[error("output commitment at L2 block {l2_block} observed after L2 block {after}")]
    OutOfOrderCommitment {
        /// The L2 block of the commitment.
        l2_block: u64,
        /// The L2 block of the previously observed commitment.
        after: u64,
    },
}

/// An error returned by the [DisputeEngine].
///
/// [DisputeEngine]: crate::DisputeEngine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A derivation error.
    #[error(transparent)]
    Derivation(#[from] DerivationError),
    /// A ledger error, after retries were exhausted.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// An external ledger violated its contract.
    #[error(transparent)]
    Consistency(#[from] ConsistencyFault),
    /// The engine was cancelled mid-cycle.
    #[error("engine cancelled")]
    Cancelled,
    /// An external call exceeded its deadline on every attempt.
    #[error("{0} timed out")]
    Timeout(&'static str),
}

impl EngineError {
    /// Returns `true` if the engine must halt rather than retry on the next step.
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Derivation(e) => !e.is_temporary(),
            Self::Consistency(_) | Self::Cancelled => true,
            Self::Ledger(_) | Self::Timeout(_) => false,
        }
    }
}

/// An error returned by the [BondManager].
///
/// [BondManager]: crate::BondManager
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    /// The intent parameters are invalid.
    #[error(transparent)]
    Invalid(#[from] BondIntentError),
    /// An intent was already confirmed under this nonce.
    #[error("an intent was already confirmed with nonce {0}")]
    AlreadyConfirmed(u64),
    /// The intent transaction was included but reverted.
    #[error("intent transaction {0} reverted")]
    Reverted(TxHandle),
    /// A ledger error, after retries were exhausted.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// The intent was cancelled before confirmation.
    #[error("intent cancelled")]
    Cancelled,
    /// The intent was not confirmed before its deadline.
    #[error("{0} timed out")]
    Timeout(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_severity() {
        assert!(!EngineError::from(DerivationError::InsufficientData(10)).is_fatal());
        assert!(EngineError::from(DerivationError::Fault("bad".into())).is_fatal());
        assert!(EngineError::from(ConsistencyFault::DuplicateCommitment(10)).is_fatal());
        assert!(!EngineError::from(LedgerError::Transient("timeout".into())).is_fatal());
        assert!(!EngineError::from(LedgerError::Rejected("revert".into())).is_fatal());
        assert!(!EngineError::Timeout("submit").is_fatal());
        assert!(EngineError::Cancelled.is_fatal());
    }
}
