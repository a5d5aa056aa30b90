//! An [OutputLedger] backed by the `L2OutputOracle` and `ValidatorPool` contracts.

use crate::{
    bindings::{
        L2OutputOracle::{self, L2OutputOracleInstance, OutputSubmitted},
        ValidatorPool::{self, ValidatorPoolInstance},
    },
    chain_provider::fetch_block_ref,
    classify_contract_error, classify_rpc_error,
    receipts::receipt_status,
    HttpTransport,
};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{BlockNumberOrTag, Filter};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use kroma_protocol::{OutputCommitment, TxHandle, TxStatus};
use kroma_validator::{LedgerError, OutputLedger, TxTracker};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// The address the validator pool returns as next validator when anyone may submit.
pub const PUBLIC_ROUND_ADDRESS: Address = Address::ZERO;

/// Returns the L1 block the output at `index` was submitted in.
pub(crate) async fn output_submitted_at<P: Provider<HttpTransport>>(
    provider: &P,
    l2oo: Address,
    index: u64,
    from_block: u64,
) -> Result<u64, LedgerError> {
    let filter = Filter::new()
        .address(l2oo)
        .event_signature(OutputSubmitted::SIGNATURE_HASH)
        .topic2(B256::from(U256::from(index)))
        .from_block(from_block);
    let logs = provider.get_logs(&filter).await.map_err(classify_rpc_error)?;
    logs.iter().rev().find_map(|log| log.block_number).ok_or_else(|| {
        LedgerError::Transient(format!("OutputSubmitted log for output index {index} not found"))
    })
}

/// Returns the latest L1 block as a `(hash, number)` pair for anchoring a transaction.
pub(crate) async fn l1_anchor<P: Provider<HttpTransport>>(
    provider: &P,
) -> Result<(B256, U256), LedgerError> {
    let block = fetch_block_ref(provider, BlockNumberOrTag::Latest)
        .await
        .map_err(classify_rpc_error)?
        .ok_or_else(|| LedgerError::Transient("latest L1 block unavailable".to_string()))?;
    Ok((block.hash, U256::from(block.number)))
}

/// Narrows a contract block number.
pub(crate) fn to_block_number(value: impl TryInto<u64>, what: &str) -> Result<u64, LedgerError> {
    value.try_into().map_err(|_| LedgerError::Rejected(format!("{what} does not fit in a u64")))
}

/// Reads submitted outputs in index order and submits new ones.
///
/// The ledger keeps a cursor over output indices. Each call to
/// [OutputLedger::next_commitment] yields the output at the cursor once the contract holds
/// it, and advances the cursor.
#[derive(Debug)]
pub struct AlloyOutputLedger<P> {
    provider: P,
    l2oo: L2OutputOracleInstance<HttpTransport, P>,
    pool: ValidatorPoolInstance<HttpTransport, P>,
    identity: Address,
    cursor: AtomicU64,
    log_start_block: u64,
}

impl<P> AlloyOutputLedger<P>
where
    P: Provider<HttpTransport> + Clone,
{
    /// Creates a new [AlloyOutputLedger] submitting as `identity`.
    pub fn new(provider: P, l2oo: Address, pool: Address, identity: Address) -> Self {
        Self {
            l2oo: L2OutputOracle::new(l2oo, provider.clone()),
            pool: ValidatorPool::new(pool, provider.clone()),
            provider,
            identity,
            cursor: AtomicU64::new(0),
            log_start_block: 0,
        }
    }

    /// Sets the first output index yielded.
    pub fn with_start_index(self, index: u64) -> Self {
        self.cursor.store(index, Ordering::Release);
        self
    }

    /// Sets the first L1 block searched for submission logs.
    pub const fn with_log_start_block(mut self, block: u64) -> Self {
        self.log_start_block = block;
        self
    }

    /// Returns the output index the next commitment is read from.
    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::Acquire)
    }
}

#[async_trait]
impl<P> TxTracker for AlloyOutputLedger<P>
where
    P: Provider<HttpTransport> + Clone,
{
    async fn tx_status(&self, tx: &TxHandle) -> Result<TxStatus, LedgerError> {
        receipt_status(&self.provider, tx).await
    }
}

#[async_trait]
impl<P> OutputLedger for AlloyOutputLedger<P>
where
    P: Provider<HttpTransport> + Clone,
{
    async fn next_commitment(&self) -> Result<Option<OutputCommitment>, LedgerError> {
        let index = self.cursor();
        let next = self.l2oo.nextOutputIndex().call().await.map_err(classify_contract_error)?._0;
        if U256::from(index) >= next {
            trace!(target: "output_ledger", index, "No new output");
            return Ok(None);
        }

        let proposal = self
            .l2oo
            .getL2Output(U256::from(index))
            .call()
            .await
            .map_err(classify_contract_error)?
            ._0;
        let l2_block = to_block_number(proposal.l2BlockNumber, "L2 block number")?;
        let submitted_at =
            output_submitted_at(&self.provider, *self.l2oo.address(), index, self.log_start_block)
                .await?;
        self.cursor.store(index + 1, Ordering::Release);

        debug!(target: "output_ledger", index, l2_block, submitted_at, "Read output");
        Ok(Some(OutputCommitment::new(l2_block, proposal.outputRoot, submitted_at)))
    }

    async fn submit(&self, l2_block: u64, root: B256) -> Result<TxHandle, LedgerError> {
        let (l1_hash, l1_number) = l1_anchor(&self.provider).await?;
        let pending = self
            .l2oo
            .submitL2Output(root, U256::from(l2_block), l1_hash, l1_number)
            .send()
            .await
            .map_err(classify_contract_error)?;
        Ok(TxHandle::new(*pending.tx_hash(), None))
    }

    async fn next_proposer(&self) -> Result<Address, LedgerError> {
        let next = self.pool.nextValidator().call().await.map_err(classify_contract_error)?._0;
        if next == PUBLIC_ROUND_ADDRESS {
            return Ok(self.identity);
        }
        Ok(next)
    }
}
