//! A [ChallengeLedger] backed by the `Colosseum` contract.

use crate::{
    bindings::{
        Colosseum::{self, ColosseumInstance},
        L2OutputOracle::{self, L2OutputOracleInstance},
    },
    classify_contract_error,
    output_ledger::{l1_anchor, output_submitted_at, to_block_number},
    receipts::receipt_status,
    HttpTransport,
};
use alloy_primitives::{Address, TxHash, B256, U256};
use alloy_provider::Provider;
use async_trait::async_trait;
use kroma_protocol::{Challenge, ChallengeStatus, OutputCommitment, TxHandle, TxStatus};
use kroma_validator::{ChallengeLedger, DerivationError, LedgerError, StateDeriver, TxTracker};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};
use tracing::{debug, info};

/// A challenge this ledger created.
#[derive(Debug, Clone, Copy)]
struct Requested {
    target: OutputCommitment,
    tx: TxHash,
}

/// Maps an on-chain challenge status to a [ChallengeStatus].
///
/// `NONE` means no challenge is running. For a challenge this ledger created, that is the
/// resolved state: the output was replaced if its root changed, and upheld otherwise.
pub(crate) fn map_status(
    status: Colosseum::ChallengeStatus,
    created: bool,
    replaced: bool,
) -> Option<ChallengeStatus> {
    match status {
        Colosseum::ChallengeStatus::NONE if !created => None,
        Colosseum::ChallengeStatus::NONE if replaced => Some(ChallengeStatus::Proven),
        Colosseum::ChallengeStatus::NONE => Some(ChallengeStatus::Dismissed),
        Colosseum::ChallengeStatus::PROVEN => Some(ChallengeStatus::Proven),
        Colosseum::ChallengeStatus::CHALLENGER_TIMEOUT => Some(ChallengeStatus::TimedOut),
        _ => Some(ChallengeStatus::Open),
    }
}

/// Maps a derivation failure while building a challenge to a [LedgerError].
fn derivation_failed(err: DerivationError) -> LedgerError {
    if err.is_temporary() {
        LedgerError::Transient(err.to_string())
    } else {
        LedgerError::Rejected(err.to_string())
    }
}

/// Creates and follows challenges against outputs in the `L2OutputOracle`.
///
/// A challenge opens with two segments: the output root preceding the target, and the
/// locally derived root at the target.
#[derive(Debug)]
pub struct AlloyChallengeLedger<P, D> {
    provider: P,
    l2oo: L2OutputOracleInstance<HttpTransport, P>,
    colosseum: ColosseumInstance<HttpTransport, P>,
    deriver: D,
    challenger: Address,
    log_start_block: u64,
    requested: Mutex<HashMap<u64, Requested>>,
}

impl<P, D> AlloyChallengeLedger<P, D>
where
    P: Provider<HttpTransport> + Clone,
    D: StateDeriver,
{
    /// Creates a new [AlloyChallengeLedger] challenging as `challenger`.
    pub fn new(
        provider: P,
        l2oo: Address,
        colosseum: Address,
        deriver: D,
        challenger: Address,
    ) -> Self {
        Self {
            l2oo: L2OutputOracle::new(l2oo, provider.clone()),
            colosseum: Colosseum::new(colosseum, provider.clone()),
            provider,
            deriver,
            challenger,
            log_start_block: 0,
            requested: Mutex::new(HashMap::new()),
        }
    }

    /// Sets the first L1 block searched for submission logs.
    pub const fn with_log_start_block(mut self, block: u64) -> Self {
        self.log_start_block = block;
        self
    }

    fn requested(&self) -> MutexGuard<'_, HashMap<u64, Requested>> {
        self.requested.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn output_index(&self, l2_block: u64) -> Result<U256, LedgerError> {
        Ok(self
            .l2oo
            .getL2OutputIndexAfter(U256::from(l2_block))
            .call()
            .await
            .map_err(classify_contract_error)?
            ._0)
    }

    async fn output_root(&self, index: U256) -> Result<(B256, u64), LedgerError> {
        let proposal =
            self.l2oo.getL2Output(index).call().await.map_err(classify_contract_error)?._0;
        Ok((proposal.outputRoot, to_block_number(proposal.l2BlockNumber, "L2 block number")?))
    }

    /// Rebuilds the commitment at `index` from the contract and its logs.
    async fn commitment_at(&self, index: U256) -> Result<OutputCommitment, LedgerError> {
        let (root, l2_block) = self.output_root(index).await?;
        let index = to_block_number(index, "output index")?;
        let submitted_at =
            output_submitted_at(&self.provider, *self.l2oo.address(), index, self.log_start_block)
                .await?;
        Ok(OutputCommitment::new(l2_block, root, submitted_at))
    }
}

#[async_trait]
impl<P, D> TxTracker for AlloyChallengeLedger<P, D>
where
    P: Provider<HttpTransport> + Clone,
    D: StateDeriver,
{
    async fn tx_status(&self, tx: &TxHandle) -> Result<TxStatus, LedgerError> {
        let status = receipt_status(&self.provider, tx).await?;
        if status == TxStatus::Reverted {
            self.requested().retain(|_, r| r.tx != tx.hash);
        }
        Ok(status)
    }
}

#[async_trait]
impl<P, D> ChallengeLedger for AlloyChallengeLedger<P, D>
where
    P: Provider<HttpTransport> + Clone,
    D: StateDeriver,
{
    async fn challenge(&self, target: &OutputCommitment) -> Result<TxHandle, LedgerError> {
        let l2_block = target.l2_block_number;
        let index = self.output_index(l2_block).await?;
        if index.is_zero() {
            return Err(LedgerError::Rejected("the first output cannot be challenged".to_string()));
        }
        let (prev_root, _) = self.output_root(index - U256::from(1)).await?;
        let derived =
            self.deriver.derive_output_root(l2_block).await.map_err(derivation_failed)?;

        let (l1_hash, l1_number) = l1_anchor(&self.provider).await?;
        let pending = self
            .colosseum
            .createChallenge(index, l1_hash, l1_number, vec![prev_root, derived.root])
            .send()
            .await
            .map_err(classify_contract_error)?;
        let tx = *pending.tx_hash();
        self.requested().insert(l2_block, Requested { target: *target, tx });

        info!(target: "challenge_ledger", l2_block, %index, %tx, "Challenge created");
        Ok(TxHandle::new(tx, None))
    }

    async fn challenge_status(&self, l2_block: u64) -> Result<Option<Challenge>, LedgerError> {
        let index = self.output_index(l2_block).await?;
        let status = self
            .colosseum
            .getStatus(index, self.challenger)
            .call()
            .await
            .map_err(classify_contract_error)?
            ._0;
        let requested = self.requested().get(&l2_block).copied();

        let unset = matches!(status, Colosseum::ChallengeStatus::NONE);
        let replaced = match requested {
            Some(r) if unset => self.output_root(index).await?.0 != r.target.root,
            _ => false,
        };
        let Some(mapped) = map_status(status, requested.is_some(), replaced) else {
            return Ok(None);
        };

        let target = match requested {
            Some(r) => r.target,
            None => self.commitment_at(index).await?,
        };
        let deadline = if unset {
            0
        } else {
            self.colosseum
                .getChallenge(index, self.challenger)
                .call()
                .await
                .map_err(classify_contract_error)?
                ._0
                .timeoutAt
        };
        if mapped.is_terminal() {
            self.requested().remove(&l2_block);
        }

        debug!(target: "challenge_ledger", l2_block, %index, status = %mapped, deadline, "Challenge status");
        Ok(Some(Challenge { target, status: mapped, deadline }))
    }
}
