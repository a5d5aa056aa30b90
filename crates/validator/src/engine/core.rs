//! The dispute engine.

use crate::{
    config::EngineConfig,
    engine::{state::Phase, CycleOutcome, CycleReport, EngineState},
    errors::{ConsistencyFault, DerivationError, EngineError, LedgerError},
    retry::{retry_ledger, with_deadline, CallError},
    traits::{BondLedger, ChallengeLedger, OutputLedger, StateDeriver},
};
use alloy_primitives::{Address, B256};
use kroma_genesis::RollupConfig;
use kroma_protocol::{
    ChainHeads, ChallengeStatus, DerivedOutput, OutputCommitment, SubmissionTiming, TxStatus,
    WindowCalculator,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    future::Future,
    sync::Arc,
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Cycle state guarded by the engine gate.
#[derive(Debug)]
struct Cycle {
    /// The L2 block of the next output to process.
    expected: u64,
    /// The in-flight transaction, if any.
    phase: Phase,
    /// Commitments observed ahead of `expected`.
    buffer: BTreeMap<u64, OutputCommitment>,
    /// The L2 block of the last commitment yielded by the ledger.
    last_seen: Option<u64>,
    /// L2 blocks with a submission or challenge broadcast by this instance and not reverted.
    handled: BTreeSet<u64>,
    /// Roots the ledger is expected to hold after this instance's own actions.
    settled: BTreeMap<u64, B256>,
}

impl Cycle {
    fn ingest(&mut self, c: OutputCommitment, cfg: &EngineConfig) -> Result<(), ConsistencyFault> {
        let l2_block = c.l2_block_number;
        if l2_block < cfg.start_l2_block {
            debug!(target: "engine", l2_block, "Ignoring output before the start block");
            return Ok(());
        }
        if !cfg.is_output_block(l2_block) {
            return Err(ConsistencyFault::MisalignedCommitment {
                l2_block,
                start: cfg.start_l2_block,
                interval: cfg.submission_interval,
            });
        }
        if l2_block < self.expected || self.buffer.contains_key(&l2_block) {
            if self.settled.get(&l2_block) == Some(&c.root) {
                debug!(target: "engine", l2_block, "Ledger reflects a settled output");
                return Ok(());
            }
            return Err(ConsistencyFault::DuplicateCommitment(l2_block));
        }
        if let Some(after) = self.last_seen.filter(|after| l2_block < *after) {
            return Err(ConsistencyFault::OutOfOrderCommitment { l2_block, after });
        }
        self.last_seen = Some(l2_block);
        self.buffer.insert(l2_block, c);
        Ok(())
    }

    /// Closes the cycle for `l2_block` and moves on to the next output.
    fn finish(&mut self, l2_block: u64, interval: u64) {
        self.buffer.remove(&l2_block);
        self.expected = l2_block + interval;
        self.phase = Phase::Watching;
    }
}

const fn report(l2_block: u64, path: Vec<EngineState>, outcome: CycleOutcome) -> CycleReport {
    CycleReport { l2_block: Some(l2_block), path, outcome }
}

/// Reconciles on-chain output commitments against locally derived outputs.
///
/// At most one cycle runs at a time. A cycle that submitted or challenged an output spans
/// several calls to [DisputeEngine::step] and is resumed without reissuing its transaction.
#[derive(Debug)]
pub struct DisputeEngine<D, O, C, B> {
    cfg: Arc<RollupConfig>,
    engine_cfg: EngineConfig,
    window: WindowCalculator,
    identity: Address,
    deriver: D,
    outputs: O,
    challenges: C,
    bonds: B,
    cancel: CancellationToken,
    cycle: Mutex<Cycle>,
}

impl<D, O, C, B> DisputeEngine<D, O, C, B>
where
    D: StateDeriver,
    O: OutputLedger,
    C: ChallengeLedger,
    B: BondLedger,
{
    /// Creates a new [DisputeEngine] acting as `identity`.
    pub fn new(
        cfg: Arc<RollupConfig>,
        mut engine_cfg: EngineConfig,
        identity: Address,
        deriver: D,
        outputs: O,
        challenges: C,
        bonds: B,
    ) -> Self {
        engine_cfg.submission_interval = engine_cfg.submission_interval.max(1);
        let window = WindowCalculator::new(&cfg);
        let cycle = Cycle {
            expected: engine_cfg.start_l2_block,
            phase: Phase::Watching,
            buffer: BTreeMap::new(),
            last_seen: None,
            handled: BTreeSet::new(),
            settled: BTreeMap::new(),
        };
        Self {
            cfg,
            engine_cfg,
            window,
            identity,
            deriver,
            outputs,
            challenges,
            bonds,
            cancel: CancellationToken::new(),
            cycle: Mutex::new(cycle),
        }
    }

    /// Returns the rollup config the engine runs against.
    pub fn rollup_config(&self) -> &RollupConfig {
        &self.cfg
    }

    /// Returns a token that cancels every in-flight and future call of the engine.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns the L2 block of the next output the engine will process.
    pub async fn expected_l2_block(&self) -> u64 {
        self.cycle.lock().await.expected
    }

    /// Returns the L2 blocks this instance has submitted or challenged.
    pub async fn handled_blocks(&self) -> Vec<u64> {
        self.cycle.lock().await.handled.iter().copied().collect()
    }

    /// Advances the current cycle as far as possible against `heads`.
    ///
    /// Returns [CycleReport::busy] if another step holds the gate.
    pub async fn step(&self, heads: ChainHeads) -> Result<CycleReport, EngineError> {
        let Ok(mut cycle) = self.cycle.try_lock() else {
            debug!(target: "engine", "Cycle already in progress");
            return Ok(CycleReport::busy());
        };
        if self.cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        match cycle.phase {
            Phase::Submitting { .. } => {
                return self.poll_submission(&mut cycle, vec![EngineState::Submitting]).await
            }
            Phase::Challenging { .. } => {
                return self.poll_challenge(&mut cycle, vec![EngineState::Challenging]).await
            }
            Phase::Watching => {}
        }

        let path = vec![EngineState::Idle, EngineState::Watching];
        self.pull_commitments(&mut cycle).await?;

        let l2_block = cycle.expected;
        crate::set!(EXPECTED_L2_BLOCK, l2_block as i64);
        if l2_block > heads.l2_safe.number {
            debug!(target: "engine", l2_block, safe_head = heads.l2_safe.number, "Output block not yet safe");
            return Ok(report(l2_block, path, CycleOutcome::Waiting));
        }

        match cycle.buffer.get(&l2_block).copied() {
            Some(commitment) => self.reconcile(&mut cycle, commitment, path).await,
            None => self.propose(&mut cycle, path).await,
        }
    }

    /// Drains the ledger of new commitments into the cycle buffer.
    async fn pull_commitments(&self, cycle: &mut Cycle) -> Result<(), EngineError> {
        loop {
            let next = self
                .ledger_call("next_commitment", || self.outputs.next_commitment())
                .await?;
            let Some(commitment) = next else { return Ok(()) };
            if let Err(fault) = cycle.ingest(commitment, &self.engine_cfg) {
                crate::inc!(CONSISTENCY_FAULTS, &[fault_label(&fault)]);
                error!(target: "engine", %fault, "Output ledger violated its contract");
                return Err(fault.into());
            }
        }
    }

    /// Compares a ledger commitment with the derived output, challenging it if wrong.
    async fn reconcile(
        &self,
        cycle: &mut Cycle,
        commitment: OutputCommitment,
        mut path: Vec<EngineState>,
    ) -> Result<CycleReport, EngineError> {
        let l2_block = commitment.l2_block_number;
        let interval = self.engine_cfg.submission_interval;

        let Some(origin) =
            self.derivation("l1_origin_of", self.deriver.l1_origin_of(l2_block)).await?
        else {
            return Ok(report(l2_block, path, CycleOutcome::Waiting));
        };
        let origin_epoch = self.window.epoch_for_l1_block(origin.number);
        let submitted = self.window.epoch_for_l1_block(commitment.submitted_at_l1_block);
        match self.window.classify_submission(origin_epoch, submitted) {
            SubmissionTiming::OnTime => {}
            timing => {
                warn!(
                    target: "engine",
                    l2_block,
                    origin = %origin_epoch,
                    submitted = %submitted,
                    ?timing,
                    "Output submitted outside its proposer window, flagging without dispute"
                );
                crate::inc!(LATE_OUTPUTS);
                cycle.finish(l2_block, interval);
                path.push(EngineState::Confirmed);
                return Ok(report(l2_block, path, CycleOutcome::LateFlagged));
            }
        }

        path.push(EngineState::Deriving);
        let Some(derived) = self.derive(l2_block).await? else {
            return Ok(report(l2_block, path, CycleOutcome::Waiting));
        };

        if derived.agrees_with(&commitment) {
            info!(target: "engine", l2_block, root = %commitment.root, "Output root agrees");
            path.extend([EngineState::Agree, EngineState::Confirmed]);
            cycle.finish(l2_block, interval);
            return Ok(report(l2_block, path, CycleOutcome::Agreed));
        }

        path.push(EngineState::Disagree);
        error!(
            target: "engine",
            l2_block,
            on_chain = %commitment.root,
            derived = %derived.root,
            "Output root mismatch"
        );
        if !self.engine_cfg.challenger_enabled {
            warn!(target: "engine", l2_block, "Challenger disabled, cannot dispute invalid output");
            return Ok(report(l2_block, path, CycleOutcome::Blocked));
        }

        let tx = if cycle.handled.contains(&l2_block) {
            // Already broadcast; follow the dispute on chain.
            let existing = self
                .ledger_call("challenge_status", || self.challenges.challenge_status(l2_block))
                .await?;
            if existing.is_none() {
                warn!(target: "engine", l2_block, "Challenge broadcast but not yet visible");
                return Ok(report(l2_block, path, CycleOutcome::PendingConfirmation));
            }
            None
        } else {
            let tx = self
                .ledger_call("challenge", || self.challenges.challenge(&commitment))
                .await?;
            cycle.handled.insert(l2_block);
            crate::inc!(CHALLENGES_CREATED);
            info!(target: "engine", l2_block, %tx, "Challenge submitted");
            Some(tx)
        };

        cycle.phase = Phase::Challenging { target: commitment, derived: derived.root, tx };
        path.push(EngineState::Challenging);
        self.poll_challenge(cycle, path).await
    }

    /// Submits the derived output when no commitment exists and this instance must propose.
    async fn propose(
        &self,
        cycle: &mut Cycle,
        mut path: Vec<EngineState>,
    ) -> Result<CycleReport, EngineError> {
        let l2_block = cycle.expected;
        if let Some((next, _)) = cycle.buffer.first_key_value() {
            warn!(target: "engine", l2_block, next, "Gap in output ledger, waiting for the expected output");
        }
        if !self.engine_cfg.proposer_enabled {
            return Ok(report(l2_block, path, CycleOutcome::Waiting));
        }
        let proposer =
            self.ledger_call("next_proposer", || self.outputs.next_proposer()).await?;
        if proposer != self.identity {
            debug!(target: "engine", l2_block, %proposer, "Not the expected proposer");
            return Ok(report(l2_block, path, CycleOutcome::Waiting));
        }
        if cycle.handled.contains(&l2_block) {
            debug!(target: "engine", l2_block, "Output already submitted, waiting for the ledger");
            return Ok(report(l2_block, path, CycleOutcome::Waiting));
        }

        path.push(EngineState::Deriving);
        let Some(derived) = self.derive(l2_block).await? else {
            return Ok(report(l2_block, path, CycleOutcome::Waiting));
        };
        path.push(EngineState::Disagree);

        let identity = self.identity;
        let bond = self.ledger_call("bond_state", || self.bonds.bond_state(identity)).await?;
        if bond.jailed {
            warn!(target: "engine", l2_block, validator = %identity, "Validator is jailed, run tryUnjail before proposing");
            return Ok(report(l2_block, path, CycleOutcome::Blocked));
        }

        let root = derived.root;
        let tx = self.ledger_call("submit", || self.outputs.submit(l2_block, root)).await?;
        cycle.handled.insert(l2_block);
        info!(target: "engine", l2_block, %root, %tx, "Output submitted");

        cycle.phase = Phase::Submitting { l2_block, root, tx };
        path.push(EngineState::Submitting);
        self.poll_submission(cycle, path).await
    }

    async fn poll_submission(
        &self,
        cycle: &mut Cycle,
        mut path: Vec<EngineState>,
    ) -> Result<CycleReport, EngineError> {
        let Phase::Submitting { l2_block, root, tx } = cycle.phase else {
            return Ok(report(cycle.expected, path, CycleOutcome::Waiting));
        };
        match self.ledger_call("tx_status", || self.outputs.tx_status(&tx)).await? {
            TxStatus::Pending => Ok(report(l2_block, path, CycleOutcome::PendingConfirmation)),
            TxStatus::Confirmed { block_number } => {
                info!(target: "engine", l2_block, l1_block = block_number, "Output submission confirmed");
                crate::inc!(OUTPUTS_SUBMITTED);
                cycle.settled.insert(l2_block, root);
                cycle.finish(l2_block, self.engine_cfg.submission_interval);
                path.push(EngineState::Confirmed);
                Ok(report(l2_block, path, CycleOutcome::Submitted))
            }
            TxStatus::Reverted => {
                error!(target: "engine", l2_block, %tx, "Output submission reverted");
                cycle.handled.remove(&l2_block);
                cycle.phase = Phase::Watching;
                Err(LedgerError::Rejected(format!("output submission {tx} reverted")).into())
            }
        }
    }

    async fn poll_challenge(
        &self,
        cycle: &mut Cycle,
        mut path: Vec<EngineState>,
    ) -> Result<CycleReport, EngineError> {
        let Phase::Challenging { target, derived, tx } = cycle.phase else {
            return Ok(report(cycle.expected, path, CycleOutcome::Waiting));
        };
        let l2_block = target.l2_block_number;

        let mut reverted = false;
        if let Some(tx) = tx {
            match self.ledger_call("tx_status", || self.challenges.tx_status(&tx)).await? {
                TxStatus::Pending => {
                    return Ok(report(l2_block, path, CycleOutcome::PendingConfirmation))
                }
                TxStatus::Confirmed { block_number } => {
                    debug!(target: "engine", l2_block, l1_block = block_number, "Challenge transaction confirmed");
                }
                TxStatus::Reverted => {
                    warn!(target: "engine", l2_block, %tx, "Challenge transaction reverted");
                    reverted = true;
                }
            }
            cycle.phase = Phase::Challenging { target, derived, tx: None };
        }

        let status = self
            .ledger_call("challenge_status", || self.challenges.challenge_status(l2_block))
            .await?;
        let Some(challenge) = status else {
            if reverted {
                cycle.handled.remove(&l2_block);
                cycle.phase = Phase::Watching;
                return Err(
                    LedgerError::Rejected(format!("challenge of L2 block {l2_block} reverted"))
                        .into(),
                );
            }
            return Ok(report(l2_block, path, CycleOutcome::PendingConfirmation));
        };

        let outcome = match challenge.status {
            ChallengeStatus::Open => {
                debug!(target: "engine", l2_block, deadline = challenge.deadline, "Challenge in progress");
                return Ok(report(l2_block, path, CycleOutcome::PendingConfirmation));
            }
            ChallengeStatus::Proven => {
                info!(target: "engine", l2_block, "Challenge proven, invalid output replaced");
                cycle.settled.insert(l2_block, derived);
                CycleOutcome::ChallengeProven
            }
            ChallengeStatus::Dismissed => {
                error!(
                    target: "engine",
                    l2_block,
                    on_chain = %target.root,
                    derived = %derived,
                    "Challenge dismissed, local derivation disagrees with the resolved output"
                );
                CycleOutcome::ChallengeDismissed
            }
            ChallengeStatus::TimedOut => {
                error!(target: "engine", l2_block, deadline = challenge.deadline, "Challenge timed out unresolved");
                CycleOutcome::ChallengeTimedOut
            }
        };
        crate::inc!(CHALLENGE_OUTCOMES, &[challenge.status.as_str()]);
        cycle.finish(l2_block, self.engine_cfg.submission_interval);
        path.push(EngineState::Confirmed);
        Ok(report(l2_block, path, outcome))
    }

    /// Derives and sanity checks the output at `l2_block`.
    ///
    /// Returns `None` if more L1 data is needed.
    async fn derive(&self, l2_block: u64) -> Result<Option<DerivedOutput>, EngineError> {
        let Some(derived) =
            self.derivation("derive_output_root", self.deriver.derive_output_root(l2_block)).await?
        else {
            return Ok(None);
        };
        if derived.l2_block.number != l2_block {
            return Err(DerivationError::Fault(format!(
                "requested L2 block {l2_block}, derived L2 block {}",
                derived.l2_block.number
            ))
            .into());
        }
        if !self.window.is_within_drift(derived.l2_block.timestamp, derived.l1_origin.timestamp) {
            return Err(DerivationError::Fault(format!(
                "L2 block {l2_block} at time {} exceeds proposer drift from L1 origin {} at time {}",
                derived.l2_block.timestamp, derived.l1_origin.number, derived.l1_origin.timestamp
            ))
            .into());
        }
        Ok(Some(derived))
    }

    /// Runs a derivation call, mapping missing L1 data to `None`.
    async fn derivation<T, Fut>(
        &self,
        what: &'static str,
        fut: Fut,
    ) -> Result<Option<T>, EngineError>
    where
        Fut: Future<Output = Result<T, DerivationError>>,
    {
        match with_deadline(&self.cancel, self.engine_cfg.call_timeout, what, fut).await {
            Ok(value) => Ok(Some(value)),
            Err(CallError::Inner(e)) if e.is_temporary() => {
                debug!(target: "engine", error = %e, "Waiting for more L1 data");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn ledger_call<T, F, Fut>(&self, what: &'static str, f: F) -> Result<T, EngineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerError>>,
    {
        retry_ledger(&self.engine_cfg.retry, &self.cancel, self.engine_cfg.call_timeout, what, f)
            .await
            .map_err(Into::into)
    }
}

#[cfg_attr(not(feature = "metrics"), allow(dead_code))]
const fn fault_label(fault: &ConsistencyFault) -> &'static str {
    match fault {
        ConsistencyFault::DuplicateCommitment(_) => "duplicate",
        ConsistencyFault::MisalignedCommitment { .. } => "misaligned",
        ConsistencyFault::OutOfOrderCommitment { .. } => "out_of_order",
    }
}
