//! The bond intent layer.

use crate::{
    config::RetryConfig,
    errors::{IntentError, LedgerError},
    retry::{retry_ledger, with_deadline, CallError},
    traits::BondLedger,
};
use alloy_primitives::{Address, U256};
use kroma_protocol::{BondIntent, BondState, TxHandle, TxStatus};
use std::{collections::BTreeSet, future::Future, sync::Mutex, time::Duration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// A confirmed bond intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentReceipt {
    /// The confirmed intent.
    pub intent: BondIntent,
    /// The transaction that carried it.
    pub tx: TxHandle,
    /// The L1 block it was included in.
    pub block_number: u64,
}

/// Issues [BondIntent]s against a [BondLedger] and tracks them to confirmation.
///
/// The manager never assumes success: an intent is done only once the ledger reports its
/// transaction confirmed. A nonce that reached a block is never reused.
#[derive(Debug)]
pub struct BondManager<B> {
    ledger: B,
    retry: RetryConfig,
    call_timeout: Duration,
    poll_interval: Duration,
    confirm_timeout: Duration,
    cancel: CancellationToken,
    used_nonces: Mutex<BTreeSet<u64>>,
}

impl<B: BondLedger> BondManager<B> {
    /// Creates a new [BondManager].
    pub fn new(ledger: B, retry: RetryConfig, call_timeout: Duration) -> Self {
        Self {
            ledger,
            retry,
            call_timeout,
            poll_interval: Duration::from_secs(2),
            confirm_timeout: Duration::from_secs(300),
            cancel: CancellationToken::new(),
            used_nonces: Mutex::new(BTreeSet::new()),
        }
    }

    /// Sets how often a pending intent is polled.
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets how long an intent may stay unconfirmed.
    pub const fn with_confirm_timeout(mut self, confirm_timeout: Duration) -> Self {
        self.confirm_timeout = confirm_timeout;
        self
    }

    /// Sets the token that cancels in-flight intents.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the underlying ledger.
    pub const fn ledger(&self) -> &B {
        &self.ledger
    }

    /// Reads the bond state of `validator` from the ledger.
    pub async fn refresh(&self, validator: Address) -> Result<BondState, IntentError> {
        let state = self.ledger_call("bond_state", || self.ledger.bond_state(validator)).await?;
        debug!(target: "bond", %validator, jailed = state.jailed, balance = %state.balance, "Bond state refreshed");
        Ok(state)
    }

    /// Deposits `amount` into the validator pool.
    pub async fn deposit(&self, amount: U256) -> Result<IntentReceipt, IntentError> {
        self.execute(BondIntent::Deposit { amount }).await
    }

    /// Withdraws `amount` from the validator pool.
    pub async fn withdraw(&self, amount: U256) -> Result<IntentReceipt, IntentError> {
        self.execute(BondIntent::Withdraw { amount }).await
    }

    /// Unbonds the oldest finalized bond.
    pub async fn unbond(&self) -> Result<IntentReceipt, IntentError> {
        self.execute(BondIntent::Unbond).await
    }

    /// Approves the asset manager to move `amount` governance tokens.
    pub async fn approve(&self, amount: U256) -> Result<IntentReceipt, IntentError> {
        self.execute(BondIntent::Approve { amount }).await
    }

    /// Delegates `amount` governance tokens.
    pub async fn delegate(&self, amount: U256) -> Result<IntentReceipt, IntentError> {
        self.execute(BondIntent::Delegate { amount }).await
    }

    /// Starts undelegating `amount` governance tokens.
    pub async fn init_undelegate(&self, amount: U256) -> Result<IntentReceipt, IntentError> {
        self.execute(BondIntent::InitUndelegate { amount }).await
    }

    /// Completes a pending undelegation.
    pub async fn finalize_undelegate(&self) -> Result<IntentReceipt, IntentError> {
        self.execute(BondIntent::FinalizeUndelegate).await
    }

    /// Starts claiming `amount` of validator rewards.
    pub async fn init_claim_reward(&self, amount: U256) -> Result<IntentReceipt, IntentError> {
        self.execute(BondIntent::InitClaimReward { amount }).await
    }

    /// Completes a pending reward claim.
    pub async fn finalize_claim_reward(&self) -> Result<IntentReceipt, IntentError> {
        self.execute(BondIntent::FinalizeClaimReward).await
    }

    /// Registers as a validator.
    pub async fn register(
        &self,
        amount: U256,
        commission_rate_bps: u16,
        commission_max_change_bps: u16,
    ) -> Result<IntentReceipt, IntentError> {
        self.execute(BondIntent::Register { amount, commission_rate_bps, commission_max_change_bps })
            .await
    }

    /// Asks to be released from jail.
    pub async fn try_unjail(&self) -> Result<IntentReceipt, IntentError> {
        self.execute(BondIntent::TryUnjail).await
    }

    /// Changes the commission rate.
    pub async fn change_commission_rate(
        &self,
        new_rate_bps: u16,
    ) -> Result<IntentReceipt, IntentError> {
        self.execute(BondIntent::ChangeCommissionRate { new_rate_bps }).await
    }

    /// Validates `intent`, reserves the next nonce and tracks the intent to confirmation.
    pub async fn execute(&self, intent: BondIntent) -> Result<IntentReceipt, IntentError> {
        intent.validate()?;
        let nonce = self.ledger_call("next_nonce", || self.ledger.next_nonce()).await?;
        self.execute_with_nonce(intent, nonce).await
    }

    /// Submits `intent` signed with `nonce` and tracks it to confirmation.
    ///
    /// Transient failures are retried with the same nonce, so a retry replaces rather than
    /// duplicates the intent. A nonce that already reached a block is refused.
    pub async fn execute_with_nonce(
        &self,
        intent: BondIntent,
        nonce: u64,
    ) -> Result<IntentReceipt, IntentError> {
        intent.validate()?;
        if self.nonce_used(nonce) {
            return Err(IntentError::AlreadyConfirmed(nonce));
        }

        let res = self.submit_and_confirm(intent, nonce).await;
        match &res {
            Ok(receipt) => {
                crate::inc!(INTENTS, &[intent.name(), "confirmed"]);
                info!(target: "bond", %intent, tx = %receipt.tx, l1_block = receipt.block_number, "Intent confirmed");
            }
            Err(e) => {
                crate::inc!(INTENTS, &[intent.name(), "failed"]);
                error!(target: "bond", %intent, nonce, error = %e, "Intent failed");
            }
        }
        res
    }

    async fn submit_and_confirm(
        &self,
        intent: BondIntent,
        nonce: u64,
    ) -> Result<IntentReceipt, IntentError> {
        let tx = self
            .ledger_call("submit_intent", || self.ledger.submit_intent(&intent, nonce))
            .await?;
        info!(target: "bond", %intent, nonce, %tx, "Intent submitted");

        let confirmation = self.wait_confirmed(intent, nonce, tx);
        match with_deadline(&self.cancel, self.confirm_timeout, "intent confirmation", confirmation)
            .await
        {
            Ok(receipt) => Ok(receipt),
            Err(CallError::Inner(e)) => Err(e),
            Err(CallError::Timeout(what)) => Err(IntentError::Timeout(what)),
            Err(CallError::Cancelled) => Err(IntentError::Cancelled),
        }
    }

    async fn wait_confirmed(
        &self,
        intent: BondIntent,
        nonce: u64,
        tx: TxHandle,
    ) -> Result<IntentReceipt, IntentError> {
        loop {
            match self.ledger_call("tx_status", || self.ledger.tx_status(&tx)).await? {
                TxStatus::Pending => {
                    debug!(target: "bond", %tx, "Intent pending");
                    tokio::time::sleep(self.poll_interval).await;
                }
                TxStatus::Confirmed { block_number } => {
                    self.mark_used(nonce);
                    return Ok(IntentReceipt { intent, tx, block_number });
                }
                TxStatus::Reverted => {
                    self.mark_used(nonce);
                    return Err(IntentError::Reverted(tx));
                }
            }
        }
    }

    fn nonce_used(&self, nonce: u64) -> bool {
        self.used_nonces.lock().unwrap_or_else(|e| e.into_inner()).contains(&nonce)
    }

    fn mark_used(&self, nonce: u64) {
        self.used_nonces.lock().unwrap_or_else(|e| e.into_inner()).insert(nonce);
    }

    async fn ledger_call<T, F, Fut>(&self, what: &'static str, f: F) -> Result<T, IntentError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        retry_ledger(&self.retry, &self.cancel, self.call_timeout, what, f).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestBondLedger;
    use kroma_protocol::BondIntentError;

    fn manager(ledger: TestBondLedger) -> BondManager<TestBondLedger> {
        let retry = RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        BondManager::new(ledger, retry, Duration::from_secs(1))
            .with_poll_interval(Duration::from_millis(1))
            .with_confirm_timeout(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_deposit_confirmed() {
        let ledger = TestBondLedger::default();
        let bonds = manager(ledger.clone());
        let receipt = bonds.deposit(U256::from(100)).await.unwrap();
        assert_eq!(receipt.intent, BondIntent::Deposit { amount: U256::from(100) });
        assert_eq!(receipt.tx.nonce, Some(0));
        assert_eq!(ledger.intents(), vec![(BondIntent::Deposit { amount: U256::from(100) }, 0)]);
    }

    #[tokio::test]
    async fn test_invalid_intents_never_submitted() {
        let ledger = TestBondLedger::default();
        let bonds = manager(ledger.clone());
        assert_eq!(
            bonds.delegate(U256::ZERO).await,
            Err(IntentError::Invalid(BondIntentError::ZeroAmount))
        );
        assert_eq!(
            bonds.register(U256::from(1), 10_001, 0).await,
            Err(IntentError::Invalid(BondIntentError::CommissionRateOutOfRange(10_001)))
        );
        assert_eq!(
            bonds.change_commission_rate(20_000).await,
            Err(IntentError::Invalid(BondIntentError::CommissionRateOutOfRange(20_000)))
        );
        assert!(ledger.intents().is_empty());
    }

    #[tokio::test]
    async fn test_transient_failure_retried_with_same_nonce() {
        let ledger = TestBondLedger::default();
        ledger.push_submit_error(LedgerError::Transient("transaction underpriced".into()));
        let bonds = manager(ledger.clone());
        let receipt = bonds.try_unjail().await.unwrap();
        assert_eq!(receipt.tx.nonce, Some(0));
        assert_eq!(ledger.intents(), vec![(BondIntent::TryUnjail, 0)]);
    }

    #[tokio::test]
    async fn test_rejected_intent_surfaces() {
        let ledger = TestBondLedger::default();
        ledger.push_submit_error(LedgerError::Rejected("execution reverted".into()));
        let bonds = manager(ledger.clone());
        assert_eq!(
            bonds.unbond().await,
            Err(IntentError::Ledger(LedgerError::Rejected("execution reverted".into())))
        );
        assert!(ledger.intents().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_nonce_not_resubmitted() {
        let ledger = TestBondLedger::default();
        let bonds = manager(ledger.clone());
        bonds.execute_with_nonce(BondIntent::FinalizeUndelegate, 4).await.unwrap();
        assert_eq!(
            bonds.execute_with_nonce(BondIntent::FinalizeUndelegate, 4).await,
            Err(IntentError::AlreadyConfirmed(4))
        );
        assert_eq!(ledger.intents().len(), 1);

        // The next intent picks up the next nonce from the ledger.
        let receipt = bonds.finalize_claim_reward().await.unwrap();
        assert_eq!(receipt.tx.nonce, Some(5));
    }

    #[tokio::test]
    async fn test_reverted_intent() {
        let ledger = TestBondLedger::default();
        ledger.set_initial_tx_status(TxStatus::Reverted);
        let bonds = manager(ledger.clone());
        let err = bonds.withdraw(U256::from(1)).await.unwrap_err();
        assert!(matches!(err, IntentError::Reverted(_)));
    }

    #[tokio::test]
    async fn test_pending_intent_times_out() {
        let ledger = TestBondLedger::default();
        ledger.set_initial_tx_status(TxStatus::Pending);
        let bonds = manager(ledger.clone());
        assert_eq!(
            bonds.approve(U256::from(1)).await,
            Err(IntentError::Timeout("intent confirmation"))
        );
    }

    #[tokio::test]
    async fn test_cancelled_intent_leaves_no_local_state() {
        let ledger = TestBondLedger::default();
        ledger.set_initial_tx_status(TxStatus::Pending);
        let cancel = CancellationToken::new();
        let bonds = manager(ledger.clone()).with_cancel(cancel.clone());

        let pending = bonds.init_undelegate(U256::from(3));
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        };
        let (res, _) = tokio::join!(pending, canceller);
        assert_eq!(res, Err(IntentError::Cancelled));
        assert!(!bonds.nonce_used(0));
    }

    #[tokio::test]
    async fn test_refresh_reads_through() {
        let ledger = TestBondLedger::default();
        let validator = Address::repeat_byte(0x11);
        let state = BondState { balance: U256::from(10), jailed: true, ..Default::default() };
        ledger.set_bond_state(validator, state);
        let bonds = manager(ledger);
        assert_eq!(bonds.refresh(validator).await, Ok(state));
    }
}
