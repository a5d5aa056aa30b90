//! Test utilities for the ledger traits.

use crate::{
    errors::LedgerError,
    traits::{BondLedger, ChallengeLedger, OutputLedger, TxTracker},
};
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use kroma_protocol::{
    BondIntent, BondState, Challenge, ChallengeStatus, OutputCommitment, TxHandle, TxStatus,
};
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

/// Issues transaction handles and tracks their status.
#[derive(Debug)]
struct TxBook {
    issued: u64,
    initial: TxStatus,
    statuses: HashMap<B256, TxStatus>,
    status_errors: VecDeque<LedgerError>,
}

impl Default for TxBook {
    fn default() -> Self {
        Self {
            issued: 0,
            initial: TxStatus::Confirmed { block_number: 1 },
            statuses: HashMap::new(),
            status_errors: VecDeque::new(),
        }
    }
}

impl TxBook {
    fn issue(&mut self, nonce: Option<u64>) -> TxHandle {
        self.issued += 1;
        let hash = B256::left_padding_from(&self.issued.to_be_bytes());
        self.statuses.insert(hash, self.initial);
        TxHandle::new(hash, nonce)
    }

    fn status(&mut self, tx: &TxHandle) -> Result<TxStatus, LedgerError> {
        if let Some(err) = self.status_errors.pop_front() {
            return Err(err);
        }
        self.statuses
            .get(&tx.hash)
            .copied()
            .ok_or_else(|| LedgerError::Rejected(format!("unknown transaction {}", tx.hash)))
    }
}

macro_rules! tx_book_methods {
    () => {
        /// Sets the status new transactions start with.
        pub fn set_initial_tx_status(&self, status: TxStatus) {
            self.with(|s| s.txs.initial = status);
        }

        /// Sets the status of every transaction issued so far.
        pub fn set_all_tx_status(&self, status: TxStatus) {
            self.with(|s| s.txs.statuses.values_mut().for_each(|v| *v = status));
        }

        /// Queues an error for the next status query.
        pub fn push_status_error(&self, err: LedgerError) {
            self.with(|s| s.txs.status_errors.push_back(err));
        }
    };
}

#[derive(Debug, Default)]
struct OutputState {
    pending: VecDeque<OutputCommitment>,
    proposer: Address,
    submissions: Vec<(u64, B256)>,
    submit_errors: VecDeque<LedgerError>,
    txs: TxBook,
}

/// A mock output ledger for testing.
#[derive(Debug, Clone, Default)]
pub struct TestOutputLedger {
    state: Arc<Mutex<OutputState>>,
}

impl TestOutputLedger {
    /// Creates a new [TestOutputLedger] expecting `proposer` to propose next.
    pub fn new(proposer: Address) -> Self {
        let ledger = Self::default();
        ledger.set_next_proposer(proposer);
        ledger
    }

    fn with<T>(&self, f: impl FnOnce(&mut OutputState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// Appends a commitment for the engine to observe.
    pub fn push_commitment(&self, commitment: OutputCommitment) {
        self.with(|s| s.pending.push_back(commitment));
    }

    /// Sets the expected next proposer.
    pub fn set_next_proposer(&self, proposer: Address) {
        self.with(|s| s.proposer = proposer);
    }

    /// Queues an error for the next submission.
    pub fn push_submit_error(&self, err: LedgerError) {
        self.with(|s| s.submit_errors.push_back(err));
    }

    /// Returns every submission that reached the ledger.
    pub fn submissions(&self) -> Vec<(u64, B256)> {
        self.with(|s| s.submissions.clone())
    }

    tx_book_methods!();
}

#[async_trait]
impl TxTracker for TestOutputLedger {
    async fn tx_status(&self, tx: &TxHandle) -> Result<TxStatus, LedgerError> {
        self.with(|s| s.txs.status(tx))
    }
}

#[async_trait]
impl OutputLedger for TestOutputLedger {
    async fn next_commitment(&self) -> Result<Option<OutputCommitment>, LedgerError> {
        Ok(self.with(|s| s.pending.pop_front()))
    }

    async fn submit(&self, l2_block: u64, root: B256) -> Result<TxHandle, LedgerError> {
        self.with(|s| {
            if let Some(err) = s.submit_errors.pop_front() {
                return Err(err);
            }
            s.submissions.push((l2_block, root));
            Ok(s.txs.issue(None))
        })
    }

    async fn next_proposer(&self) -> Result<Address, LedgerError> {
        Ok(self.with(|s| s.proposer))
    }
}

#[derive(Debug, Default)]
struct ChallengeState {
    challenges: HashMap<u64, Challenge>,
    requests: Vec<OutputCommitment>,
    challenge_errors: VecDeque<LedgerError>,
    deadline_offset: u64,
    txs: TxBook,
}

/// A mock dispute contract for testing.
///
/// A challenge request opens a dispute immediately unless its transaction reverts; tests
/// resolve it with [TestChallengeLedger::resolve].
#[derive(Debug, Clone, Default)]
pub struct TestChallengeLedger {
    state: Arc<Mutex<ChallengeState>>,
}

impl TestChallengeLedger {
    fn with<T>(&self, f: impl FnOnce(&mut ChallengeState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// Sets the status of the dispute at `l2_block`.
    pub fn resolve(&self, l2_block: u64, status: ChallengeStatus) {
        self.with(|s| {
            if let Some(challenge) = s.challenges.get_mut(&l2_block) {
                challenge.status = status;
            }
        });
    }

    /// Inserts a dispute opened by someone else.
    pub fn insert_challenge(&self, challenge: Challenge) {
        self.with(|s| {
            s.challenges.insert(challenge.target.l2_block_number, challenge);
        });
    }

    /// Queues an error for the next challenge request.
    pub fn push_challenge_error(&self, err: LedgerError) {
        self.with(|s| s.challenge_errors.push_back(err));
    }

    /// Returns every challenge request that reached the ledger.
    pub fn requests(&self) -> Vec<OutputCommitment> {
        self.with(|s| s.requests.clone())
    }

    tx_book_methods!();
}

#[async_trait]
impl TxTracker for TestChallengeLedger {
    async fn tx_status(&self, tx: &TxHandle) -> Result<TxStatus, LedgerError> {
        self.with(|s| s.txs.status(tx))
    }
}

#[async_trait]
impl ChallengeLedger for TestChallengeLedger {
    async fn challenge(&self, target: &OutputCommitment) -> Result<TxHandle, LedgerError> {
        self.with(|s| {
            if let Some(err) = s.challenge_errors.pop_front() {
                return Err(err);
            }
            s.requests.push(*target);
            if !matches!(s.txs.initial, TxStatus::Reverted) {
                let deadline = target.submitted_at_l1_block + s.deadline_offset;
                s.challenges.entry(target.l2_block_number).or_insert(Challenge {
                    target: *target,
                    status: ChallengeStatus::Open,
                    deadline,
                });
            }
            Ok(s.txs.issue(None))
        })
    }

    async fn challenge_status(&self, l2_block: u64) -> Result<Option<Challenge>, LedgerError> {
        Ok(self.with(|s| s.challenges.get(&l2_block).copied()))
    }
}

#[derive(Debug, Default)]
struct BondLedgerState {
    states: HashMap<Address, BondState>,
    nonce: u64,
    intents: Vec<(BondIntent, u64)>,
    submit_errors: VecDeque<LedgerError>,
    txs: TxBook,
}

/// A mock bond ledger for testing.
#[derive(Debug, Clone, Default)]
pub struct TestBondLedger {
    state: Arc<Mutex<BondLedgerState>>,
}

impl TestBondLedger {
    fn with<T>(&self, f: impl FnOnce(&mut BondLedgerState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// Sets the bond state of a validator.
    pub fn set_bond_state(&self, validator: Address, state: BondState) {
        self.with(|s| {
            s.states.insert(validator, state);
        });
    }

    /// Queues an error for the next intent submission.
    pub fn push_submit_error(&self, err: LedgerError) {
        self.with(|s| s.submit_errors.push_back(err));
    }

    /// Returns every intent that reached the ledger with its nonce.
    pub fn intents(&self) -> Vec<(BondIntent, u64)> {
        self.with(|s| s.intents.clone())
    }

    tx_book_methods!();
}

#[async_trait]
impl TxTracker for TestBondLedger {
    async fn tx_status(&self, tx: &TxHandle) -> Result<TxStatus, LedgerError> {
        self.with(|s| {
            let status = s.txs.status(tx)?;
            if matches!(status, TxStatus::Confirmed { .. }) {
                if let Some(nonce) = tx.nonce {
                    s.nonce = s.nonce.max(nonce + 1);
                }
            }
            Ok(status)
        })
    }
}

#[async_trait]
impl BondLedger for TestBondLedger {
    async fn submit_intent(
        &self,
        intent: &BondIntent,
        nonce: u64,
    ) -> Result<TxHandle, LedgerError> {
        self.with(|s| {
            if let Some(err) = s.submit_errors.pop_front() {
                return Err(err);
            }
            s.intents.push((*intent, nonce));
            Ok(s.txs.issue(Some(nonce)))
        })
    }

    async fn next_nonce(&self) -> Result<u64, LedgerError> {
        Ok(self.with(|s| s.nonce))
    }

    async fn bond_state(&self, validator: Address) -> Result<BondState, LedgerError> {
        Ok(self.with(|s| s.states.get(&validator).copied().unwrap_or_default()))
    }
}
