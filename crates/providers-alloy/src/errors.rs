//! Classification of RPC and contract errors into [LedgerError]s.

use alloy_transport::{RpcError, TransportErrorKind};
use kroma_validator::LedgerError;

/// Error message fragments of JSON-RPC error responses that succeed when retried unchanged.
const TRANSIENT_MESSAGES: &[&str] = &[
    "underpriced",
    "timeout",
    "timed out",
    "too many requests",
    "rate limit",
    "already known",
    "header not found",
];

/// Classifies a failed JSON-RPC request.
///
/// Transport failures and fee-market or rate-limit responses are transient. Every other
/// error response, including reverts, is a rejection.
pub fn classify_rpc_error(err: RpcError<TransportErrorKind>) -> LedgerError {
    match err {
        RpcError::Transport(kind) => LedgerError::Transient(kind.to_string()),
        RpcError::ErrorResp(payload) => {
            let message = payload.message.to_lowercase();
            if TRANSIENT_MESSAGES.iter().any(|m| message.contains(m)) {
                LedgerError::Transient(payload.message.to_string())
            } else {
                LedgerError::Rejected(payload.message.to_string())
            }
        }
        other => LedgerError::Rejected(other.to_string()),
    }
}

/// Classifies a failed contract call or transaction.
pub fn classify_contract_error(err: alloy_contract::Error) -> LedgerError {
    match err {
        alloy_contract::Error::TransportError(e) => classify_rpc_error(e),
        other => LedgerError::Rejected(other.to_string()),
    }
}
