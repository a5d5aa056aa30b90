//! The validator service: chain watchers driving the dispute engine.

use crate::{
    engine::DisputeEngine,
    errors::EngineError,
    traits::{BondLedger, ChainRefOracle, ChallengeLedger, OutputLedger, StateDeriver},
};
use kroma_genesis::{ChainLayer, RollupConfig};
use kroma_protocol::{BlockRef, ChainHeads};
use std::{sync::Arc, time::Duration};
use tokio::{
    select,
    sync::watch,
    time::{interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The default L1 polling interval, one L1 slot.
pub const DEFAULT_L1_POLL_INTERVAL: Duration = Duration::from_secs(12);

/// Polling cadences of the chain watchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// How often the L1 head is polled.
    pub l1_poll_interval: Duration,
    /// How often the L2 safe head is polled.
    pub l2_poll_interval: Duration,
}

impl PollConfig {
    /// Polls L1 every `l1_poll_interval` and L2 once per L2 block.
    pub fn new(cfg: &RollupConfig, l1_poll_interval: Duration) -> Self {
        Self { l1_poll_interval, l2_poll_interval: Duration::from_secs(cfg.block_time.max(1)) }
    }
}

/// Runs the L1 and L2 watchers and steps the [DisputeEngine] on every head change.
#[derive(Debug)]
pub struct ValidatorService<D, O, C, B, L1, L2> {
    version: String,
    cfg: Arc<RollupConfig>,
    engine: Arc<DisputeEngine<D, O, C, B>>,
    l1_oracle: Arc<L1>,
    l2_oracle: Arc<L2>,
    poll: PollConfig,
    cancel: CancellationToken,
}

impl<D, O, C, B, L1, L2> ValidatorService<D, O, C, B, L1, L2>
where
    D: StateDeriver + 'static,
    O: OutputLedger + 'static,
    C: ChallengeLedger + 'static,
    B: BondLedger + 'static,
    L1: ChainRefOracle + 'static,
    L2: ChainRefOracle + 'static,
{
    /// Creates a new [ValidatorService].
    ///
    /// The service shares the engine's cancellation token, so cancelling either stops both.
    pub fn new(
        version: impl Into<String>,
        cfg: Arc<RollupConfig>,
        engine: Arc<DisputeEngine<D, O, C, B>>,
        l1_oracle: L1,
        l2_oracle: L2,
        poll: PollConfig,
    ) -> Self {
        let cancel = engine.cancel_token();
        Self {
            version: version.into(),
            cfg,
            engine,
            l1_oracle: Arc::new(l1_oracle),
            l2_oracle: Arc::new(l2_oracle),
            poll,
            cancel,
        }
    }

    /// Returns the token that stops the service.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns the engine driven by the service.
    pub const fn engine(&self) -> &Arc<DisputeEngine<D, O, C, B>> {
        &self.engine
    }

    /// Runs until cancelled or until the engine reports a fatal error.
    ///
    /// Cancellation is a clean shutdown and returns `Ok(())`.
    pub async fn run(&self) -> Result<(), EngineError> {
        info!(target: "validator", version = %self.version, "Starting validator");
        self.cfg.log_description(None);

        let (l1_tx, mut l1_rx) = watch::channel(None);
        let (l2_tx, mut l2_rx) = watch::channel(None);
        let l1_task = tokio::spawn(watch_head(
            Arc::clone(&self.l1_oracle),
            ChainLayer::L1,
            self.poll.l1_poll_interval,
            l1_tx,
            self.cancel.clone(),
        ));
        let l2_task = tokio::spawn(watch_head(
            Arc::clone(&self.l2_oracle),
            ChainLayer::L2,
            self.poll.l2_poll_interval,
            l2_tx,
            self.cancel.clone(),
        ));

        let res = self.drive(&mut l1_rx, &mut l2_rx).await;
        self.cancel.cancel();
        let _ = tokio::join!(l1_task, l2_task);
        match &res {
            Ok(()) => info!(target: "validator", "Validator stopped"),
            Err(e) => error!(target: "validator", error = %e, "Validator halted"),
        }
        res
    }

    async fn drive(
        &self,
        l1_rx: &mut watch::Receiver<Option<BlockRef>>,
        l2_rx: &mut watch::Receiver<Option<BlockRef>>,
    ) -> Result<(), EngineError> {
        loop {
            select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(()),
                res = l1_rx.changed() => if res.is_err() { return Ok(()) },
                res = l2_rx.changed() => if res.is_err() { return Ok(()) },
            }
            let l1 = *l1_rx.borrow_and_update();
            let l2_safe = *l2_rx.borrow_and_update();
            let (Some(l1), Some(l2_safe)) = (l1, l2_safe) else { continue };
            self.step_until_idle(ChainHeads::new(l1, l2_safe)).await?;
        }
    }

    /// Steps the engine until a step leaves the cycle unfinished.
    async fn step_until_idle(&self, heads: ChainHeads) -> Result<(), EngineError> {
        loop {
            match self.engine.step(heads).await {
                Ok(report) if report.outcome.is_confirmed() => {
                    info!(target: "validator", l2_block = ?report.l2_block, outcome = ?report.outcome, "Cycle confirmed");
                }
                Ok(report) => {
                    debug!(target: "validator", l2_block = ?report.l2_block, outcome = ?report.outcome, "Cycle step");
                    return Ok(());
                }
                Err(_) if self.cancel.is_cancelled() => return Ok(()),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(target: "validator", error = %e, "Cycle step failed, retrying on the next head");
                    return Ok(());
                }
            }
        }
    }
}

/// Polls the head of one chain and publishes changes on `tx`.
async fn watch_head<O: ChainRefOracle>(
    oracle: Arc<O>,
    layer: ChainLayer,
    every: Duration,
    tx: watch::Sender<Option<BlockRef>>,
    cancel: CancellationToken,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        select! {
            _ = cancel.cancelled() => {
                debug!(target: "watcher", %layer, "Received shutdown signal, exiting watcher");
                return;
            }
            _ = ticker.tick() => {}
        }
        match oracle.latest_block_ref().await {
            Ok(head) => {
                crate::set!(CHAIN_HEADS, head.number as i64, &[layer_label(layer)]);
                let changed = tx.send_if_modified(|current| {
                    if *current == Some(head) {
                        return false;
                    }
                    *current = Some(head);
                    true
                });
                if changed {
                    debug!(target: "watcher", %layer, number = head.number, hash = %head.hash, "New head");
                }
            }
            Err(e) => warn!(target: "watcher", %layer, error = %e, "Failed to fetch head"),
        }
        if tx.is_closed() {
            return;
        }
    }
}

#[cfg_attr(not(feature = "metrics"), allow(dead_code))]
const fn layer_label(layer: ChainLayer) -> &'static str {
    match layer {
        ChainLayer::L1 => "l1",
        ChainLayer::L2 => "l2_safe",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{EngineConfig, RetryConfig},
        engine::EngineState,
        errors::DerivationError,
        test_utils::{
            derived_output, valid_rollup_config, TestBondLedger, TestChainOracle,
            TestChallengeLedger, TestOutputLedger, TestStateDeriver,
        },
    };
    use alloy_primitives::{Address, B256};
    use kroma_protocol::OutputCommitment;

    type TestEngine =
        DisputeEngine<TestStateDeriver, TestOutputLedger, TestChallengeLedger, TestBondLedger>;
    type TestService = ValidatorService<
        TestStateDeriver,
        TestOutputLedger,
        TestChallengeLedger,
        TestBondLedger,
        TestChainOracle,
        TestChainOracle,
    >;

    const POLL: PollConfig = PollConfig {
        l1_poll_interval: Duration::from_millis(5),
        l2_poll_interval: Duration::from_millis(5),
    };

    fn block(number: u64) -> BlockRef {
        BlockRef::new(B256::with_last_byte(number as u8), number, B256::ZERO, number * 2)
    }

    fn service(
        deriver: TestStateDeriver,
        outputs: TestOutputLedger,
    ) -> (TestService, TestChainOracle, TestChainOracle) {
        let cfg = Arc::new(valid_rollup_config());
        let engine_cfg = EngineConfig {
            submission_interval: 10,
            start_l2_block: 10,
            call_timeout: Duration::from_secs(1),
            retry: RetryConfig {
                max_attempts: 1,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
            },
            ..Default::default()
        };
        let engine: Arc<TestEngine> = Arc::new(DisputeEngine::new(
            Arc::clone(&cfg),
            engine_cfg,
            Address::repeat_byte(0xaa),
            deriver,
            outputs,
            TestChallengeLedger::default(),
            TestBondLedger::default(),
        ));
        let l1 = TestChainOracle::new(1);
        let l2 = TestChainOracle::new(255);
        let svc = ValidatorService::new("v0.1.0", cfg, engine, l1.clone(), l2.clone(), POLL);
        (svc, l1, l2)
    }

    #[test]
    fn test_poll_config_follows_block_time() {
        let cfg = valid_rollup_config();
        let poll = PollConfig::new(&cfg, DEFAULT_L1_POLL_INTERVAL);
        assert_eq!(poll.l2_poll_interval, Duration::from_secs(cfg.block_time));
        assert_eq!(poll.l1_poll_interval, DEFAULT_L1_POLL_INTERVAL);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let (svc, _l1, _l2) = service(TestStateDeriver::default(), TestOutputLedger::default());
        let cancel = svc.cancel_token();
        let handle = tokio::spawn(async move { svc.run().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        let res = tokio::time::timeout(Duration::from_secs(1), handle).await;
        assert!(matches!(res, Ok(Ok(Ok(())))));
    }

    #[tokio::test]
    async fn test_run_drives_engine_on_new_heads() {
        let deriver = TestStateDeriver::default();
        let root = B256::repeat_byte(0x11);
        deriver.set_output(derived_output(10, root, 100));
        deriver.set_output(derived_output(20, B256::repeat_byte(0x22), 101));
        let outputs = TestOutputLedger::default();
        outputs.push_commitment(OutputCommitment::new(10, root, 101));
        outputs.push_commitment(OutputCommitment::new(20, B256::repeat_byte(0x22), 102));

        let (svc, l1, l2) = service(deriver, outputs);
        l1.set_head(block(110));
        l2.set_head(block(25));
        let svc = Arc::new(svc);
        let runner = Arc::clone(&svc);
        let handle = tokio::spawn(async move { runner.run().await });

        let engine = Arc::clone(svc.engine());
        let reached = tokio::time::timeout(Duration::from_secs(2), async move {
            while engine.expected_l2_block().await != 30 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(reached.is_ok());

        svc.cancel_token().cancel();
        assert!(matches!(handle.await, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_run_waits_for_both_heads() {
        let deriver = TestStateDeriver::default();
        deriver.set_output(derived_output(10, B256::repeat_byte(0x11), 100));
        let outputs = TestOutputLedger::default();
        outputs.push_commitment(OutputCommitment::new(10, B256::repeat_byte(0x11), 101));

        let (svc, l1, _l2) = service(deriver.clone(), outputs);
        l1.set_head(block(110));
        let svc = Arc::new(svc);
        let runner = Arc::clone(&svc);
        let handle = tokio::spawn(async move { runner.run().await });

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(deriver.derive_calls().is_empty());
        assert_eq!(svc.engine().expected_l2_block().await, 10);

        svc.cancel_token().cancel();
        assert!(matches!(handle.await, Ok(Ok(()))));
    }

    #[tokio::test]
    async fn test_run_halts_on_fatal_error() {
        let deriver = TestStateDeriver::default();
        deriver.set_error(10, DerivationError::Fault("corrupt batch".to_string()));
        let outputs = TestOutputLedger::default();
        outputs.push_commitment(OutputCommitment::new(10, B256::repeat_byte(0x11), 101));

        let (svc, l1, l2) = service(deriver, outputs);
        l1.set_head(block(110));
        l2.set_head(block(25));
        let res = tokio::time::timeout(Duration::from_secs(2), svc.run()).await;
        assert!(matches!(res, Ok(Err(EngineError::Derivation(DerivationError::Fault(_))))));
        assert!(svc.cancel_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_step_until_idle_drains_ready_outputs() {
        let deriver = TestStateDeriver::default();
        let outputs = TestOutputLedger::default();
        for (n, origin) in [(10, 100), (20, 101), (30, 102)] {
            let root = B256::with_last_byte(n as u8);
            deriver.set_output(derived_output(n, root, origin));
            outputs.push_commitment(OutputCommitment::new(n, root, origin + 1));
        }
        let (svc, _l1, _l2) = service(deriver, outputs);
        let heads = ChainHeads::new(block(110), block(35));
        svc.step_until_idle(heads).await.unwrap();
        assert_eq!(svc.engine().expected_l2_block().await, 40);

        let report = svc.engine().step(heads).await.unwrap();
        assert_eq!(report.path, vec![EngineState::Idle, EngineState::Watching]);
    }
}
