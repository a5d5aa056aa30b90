//! Transaction status lookups shared by the ledgers.

use crate::{classify_rpc_error, HttpTransport};
use alloy_network::ReceiptResponse;
use alloy_provider::Provider;
use kroma_protocol::{TxHandle, TxStatus};
use kroma_validator::LedgerError;

/// Maps the receipt of `tx`, if any, to a [TxStatus].
///
/// A transaction without a receipt is pending. A receipt without a block number belongs to
/// a pending block and is pending as well.
pub(crate) async fn receipt_status<P: Provider<HttpTransport>>(
    provider: &P,
    tx: &TxHandle,
) -> Result<TxStatus, LedgerError> {
    let receipt =
        provider.get_transaction_receipt(tx.hash).await.map_err(classify_rpc_error)?;
    Ok(match receipt {
        None => TxStatus::Pending,
        Some(receipt) => match receipt.block_number() {
            None => TxStatus::Pending,
            Some(_) if !receipt.status() => TxStatus::Reverted,
            Some(block_number) => TxStatus::Confirmed { block_number },
        },
    })
}
