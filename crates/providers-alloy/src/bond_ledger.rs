//! A [BondLedger] backed by the `ValidatorPool`, `ValidatorManager` and `AssetManager`
//! contracts.

use crate::{
    bindings::{
        AssetManager::{self, AssetManagerInstance},
        GovernanceToken::{self, GovernanceTokenInstance},
        ValidatorManager::{self, ValidatorManagerInstance},
        ValidatorPool::{self, ValidatorPoolInstance},
    },
    classify_contract_error, classify_rpc_error,
    receipts::receipt_status,
    HttpTransport,
};
use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use async_trait::async_trait;
use kroma_protocol::{BondIntent, BondState, TxHandle, TxStatus};
use kroma_validator::{BondLedger, LedgerError, TxTracker};
use tracing::debug;

/// The contract addresses the [AlloyBondLedger] submits intents to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondContracts {
    /// The `ValidatorPool` contract.
    pub validator_pool: Address,
    /// The `ValidatorManager` contract.
    pub validator_manager: Address,
    /// The `AssetManager` contract.
    pub asset_manager: Address,
    /// The governance token approved for the asset manager.
    pub governance_token: Address,
}

/// Converts basis points to the integer percentage the contracts store.
pub(crate) fn bps_to_percent(bps: u16) -> Result<u8, LedgerError> {
    if bps % 100 != 0 || bps > kroma_protocol::MAX_BPS {
        return Err(LedgerError::Rejected(format!(
            "commission of {bps} bps is not a whole percentage"
        )));
    }
    Ok((bps / 100) as u8)
}

/// Narrows an amount to the `uint128` the asset manager takes.
pub(crate) fn to_u128(amount: U256) -> Result<u128, LedgerError> {
    u128::try_from(amount)
        .map_err(|_| LedgerError::Rejected(format!("amount {amount} does not fit in a uint128")))
}

/// Submits bond intents as transactions signed by `sender`.
///
/// The provider must carry a wallet for `sender`. Each intent is sent with the nonce it was
/// given, so a resubmission replaces the previous attempt.
#[derive(Debug)]
pub struct AlloyBondLedger<P> {
    provider: P,
    sender: Address,
    pool: ValidatorPoolInstance<HttpTransport, P>,
    manager: ValidatorManagerInstance<HttpTransport, P>,
    assets: AssetManagerInstance<HttpTransport, P>,
    token: GovernanceTokenInstance<HttpTransport, P>,
}

impl<P> AlloyBondLedger<P>
where
    P: Provider<HttpTransport> + Clone,
{
    /// Creates a new [AlloyBondLedger].
    pub fn new(provider: P, contracts: BondContracts, sender: Address) -> Self {
        Self {
            pool: ValidatorPool::new(contracts.validator_pool, provider.clone()),
            manager: ValidatorManager::new(contracts.validator_manager, provider.clone()),
            assets: AssetManager::new(contracts.asset_manager, provider.clone()),
            token: GovernanceToken::new(contracts.governance_token, provider.clone()),
            provider,
            sender,
        }
    }
}

#[async_trait]
impl<P> TxTracker for AlloyBondLedger<P>
where
    P: Provider<HttpTransport> + Clone,
{
    async fn tx_status(&self, tx: &TxHandle) -> Result<TxStatus, LedgerError> {
        receipt_status(&self.provider, tx).await
    }
}

#[async_trait]
impl<P> BondLedger for AlloyBondLedger<P>
where
    P: Provider<HttpTransport> + Clone,
{
    async fn submit_intent(
        &self,
        intent: &BondIntent,
        nonce: u64,
    ) -> Result<TxHandle, LedgerError> {
        let sent = match *intent {
            BondIntent::Deposit { amount } => {
                self.pool.deposit().value(amount).nonce(nonce).send().await
            }
            BondIntent::Withdraw { amount } => {
                self.pool.withdraw(amount).nonce(nonce).send().await
            }
            BondIntent::Unbond => self.pool.unbond().nonce(nonce).send().await,
            BondIntent::Approve { amount } => {
                self.token.approve(*self.assets.address(), amount).nonce(nonce).send().await
            }
            BondIntent::Delegate { amount } => {
                self.assets.delegate(self.sender, to_u128(amount)?).nonce(nonce).send().await
            }
            BondIntent::InitUndelegate { amount } => {
                self.assets.initUndelegate(self.sender, to_u128(amount)?).nonce(nonce).send().await
            }
            BondIntent::FinalizeUndelegate => {
                self.assets.finalizeUndelegate(self.sender).nonce(nonce).send().await
            }
            BondIntent::InitClaimReward { amount } => {
                self.assets.initClaimValidatorReward(to_u128(amount)?).nonce(nonce).send().await
            }
            BondIntent::FinalizeClaimReward => {
                self.assets.finalizeClaimValidatorReward().nonce(nonce).send().await
            }
            BondIntent::Register { amount, commission_rate_bps, commission_max_change_bps } => {
                self.manager
                    .registerValidator(
                        to_u128(amount)?,
                        bps_to_percent(commission_rate_bps)?,
                        bps_to_percent(commission_max_change_bps)?,
                    )
                    .nonce(nonce)
                    .send()
                    .await
            }
            BondIntent::TryUnjail => self.manager.tryUnjail().nonce(nonce).send().await,
            BondIntent::ChangeCommissionRate { new_rate_bps } => {
                self.manager
                    .changeCommissionRate(bps_to_percent(new_rate_bps)?)
                    .nonce(nonce)
                    .send()
                    .await
            }
        };
        let pending = sent.map_err(classify_contract_error)?;
        let tx = TxHandle::new(*pending.tx_hash(), Some(nonce));
        debug!(target: "bond_ledger", %intent, %tx, "Intent sent");
        Ok(tx)
    }

    async fn next_nonce(&self) -> Result<u64, LedgerError> {
        self.provider
            .get_transaction_count(self.sender)
            .pending()
            .await
            .map_err(classify_rpc_error)
    }

    async fn bond_state(&self, validator: Address) -> Result<BondState, LedgerError> {
        let balance =
            self.pool.balanceOf(validator).call().await.map_err(classify_contract_error)?._0;
        let delegated = self
            .assets
            .totalKroAssets(validator)
            .call()
            .await
            .map_err(classify_contract_error)?
            ._0;
        let commission_rate = self
            .manager
            .getCommissionRate(validator)
            .call()
            .await
            .map_err(classify_contract_error)?
            ._0;
        let commission_max_change = self
            .manager
            .getCommissionMaxChangeRate(validator)
            .call()
            .await
            .map_err(classify_contract_error)?
            ._0;
        let jailed =
            self.manager.inJail(validator).call().await.map_err(classify_contract_error)?._0;

        Ok(BondState {
            balance,
            delegated: U256::from(delegated),
            commission_rate_bps: u16::from(commission_rate) * 100,
            commission_max_change_bps: u16::from(commission_max_change) * 100,
            jailed,
        })
    }
}
