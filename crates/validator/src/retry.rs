//! Deadlines, cancellation and retries around external calls.

use crate::{
    config::RetryConfig,
    errors::{DerivationError, EngineError, IntentError, LedgerError},
};
use backon::Retryable;
use std::{future::Future, time::Duration};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// The failure of a bounded external call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallError<E> {
    /// The call itself failed.
    #[error("{0}")]
    Inner(E),
    /// The call did not complete before its deadline.
    #[error("{0} timed out")]
    Timeout(&'static str),
    /// The enclosing token was cancelled.
    #[error("cancelled")]
    Cancelled,
}

impl CallError<LedgerError> {
    const fn is_retryable(&self) -> bool {
        match self {
            Self::Inner(e) => e.is_transient(),
            Self::Timeout(_) => true,
            Self::Cancelled => false,
        }
    }
}

impl From<CallError<LedgerError>> for EngineError {
    fn from(e: CallError<LedgerError>) -> Self {
        match e {
            CallError::Inner(e) => Self::Ledger(e),
            CallError::Timeout(what) => Self::Timeout(what),
            CallError::Cancelled => Self::Cancelled,
        }
    }
}

impl From<CallError<DerivationError>> for EngineError {
    fn from(e: CallError<DerivationError>) -> Self {
        match e {
            CallError::Inner(e) => Self::Derivation(e),
            CallError::Timeout(what) => Self::Timeout(what),
            CallError::Cancelled => Self::Cancelled,
        }
    }
}

impl From<CallError<LedgerError>> for IntentError {
    fn from(e: CallError<LedgerError>) -> Self {
        match e {
            CallError::Inner(e) => Self::Ledger(e),
            CallError::Timeout(what) => Self::Timeout(what),
            CallError::Cancelled => Self::Cancelled,
        }
    }
}

/// Runs `fut` until it completes, `timeout` elapses or `cancel` fires.
pub(crate) async fn with_deadline<T, E, Fut>(
    cancel: &CancellationToken,
    timeout: Duration,
    what: &'static str,
    fut: Fut,
) -> Result<T, CallError<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CallError::Cancelled),
        res = tokio::time::timeout(timeout, fut) => match res {
            Ok(res) => res.map_err(CallError::Inner),
            Err(_) => Err(CallError::Timeout(what)),
        },
    }
}

/// Runs a ledger call with a per-attempt deadline, retrying transient failures.
pub(crate) async fn retry_ledger<T, F, Fut>(
    retry: &RetryConfig,
    cancel: &CancellationToken,
    timeout: Duration,
    what: &'static str,
    mut f: F,
) -> Result<T, CallError<LedgerError>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let retrying = (move || with_deadline(cancel, timeout, what, f()))
        .retry(retry.to_backoff_builder())
        .when(|e| e.is_retryable())
        .notify(|err, dur| {
            tracing::debug!(target: "retry", error = %err, delay = ?dur, "Retrying {what}");
        });

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CallError::Cancelled),
        res = retrying => res,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_retry(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn test_transient_errors_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let res = retry_ledger(
            &fast_retry(5),
            &CancellationToken::new(),
            Duration::from_secs(1),
            "submit",
            move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(LedgerError::Transient("replacement transaction underpriced".into()))
                } else {
                    Ok(7u64)
                }
            },
        )
        .await;
        assert_eq!(res, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_rejected_errors_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let res: Result<(), _> = retry_ledger(
            &fast_retry(5),
            &CancellationToken::new(),
            Duration::from_secs(1),
            "submit",
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(LedgerError::Rejected("execution reverted".into()))
            },
        )
        .await;
        assert_eq!(res, Err(CallError::Inner(LedgerError::Rejected("execution reverted".into()))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let res: Result<(), _> = retry_ledger(
            &fast_retry(3),
            &CancellationToken::new(),
            Duration::from_secs(1),
            "submit",
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(LedgerError::Transient("connection reset".into()))
            },
        )
        .await;
        assert!(matches!(res, Err(CallError::Inner(LedgerError::Transient(_)))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_deadline_and_cancellation() {
        let cancel = CancellationToken::new();
        let res: Result<(), CallError<LedgerError>> =
            with_deadline(&cancel, Duration::from_millis(5), "slow", async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;
        assert_eq!(res, Err(CallError::Timeout("slow")));

        cancel.cancel();
        let res: Result<(), CallError<LedgerError>> =
            with_deadline(&cancel, Duration::from_secs(1), "any", async { Ok(()) }).await;
        assert_eq!(res, Err(CallError::Cancelled));
    }
}
