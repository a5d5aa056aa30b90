//! Runtime configuration and network validation of the rollup config.

use crate::traits::ChainRefOracle;
use backon::ExponentialBuilder;
use kroma_genesis::{BlockId, ChainLayer, ConfigError, RollupConfig};
use std::time::Duration;
use tracing::{debug, info};

/// Default number of retries for a transient failure.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Default upper bound on the delay between retries.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Retry policy for transient RPC and ledger failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_attempts: u32,
    /// Initial delay for exponential backoff.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryConfig {
    /// Creates a `backon` [`ExponentialBuilder`] from this configuration.
    pub fn to_backoff_builder(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts as usize)
            .with_jitter()
    }
}

/// Runtime knobs of the [DisputeEngine].
///
/// [DisputeEngine]: crate::DisputeEngine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of L2 blocks between two outputs.
    pub submission_interval: u64,
    /// The L2 block of the first output the engine processes.
    pub start_l2_block: u64,
    /// Whether this instance submits outputs when it is the expected proposer.
    pub proposer_enabled: bool,
    /// Whether this instance challenges wrong outputs.
    pub challenger_enabled: bool,
    /// Deadline of a single external call.
    pub call_timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            submission_interval: 1800,
            start_l2_block: 0,
            proposer_enabled: true,
            challenger_enabled: true,
            call_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Returns `true` if an output is due at `l2_block`.
    pub const fn is_output_block(&self, l2_block: u64) -> bool {
        l2_block >= self.start_l2_block
            && (self.submission_interval == 0
                || (l2_block - self.start_l2_block) % self.submission_interval == 0)
    }
}

/// Validates the config against the L1 chain behind `oracle`.
///
/// The structural check runs first; no request is made if it fails.
pub async fn validate_l1_config<O: ChainRefOracle>(
    cfg: &RollupConfig,
    oracle: &O,
) -> Result<(), ConfigError> {
    cfg.check()?;
    check_chain_id(oracle, ChainLayer::L1, cfg.l1_chain_id).await?;
    check_genesis_hash(oracle, ChainLayer::L1, cfg.genesis.l1).await
}

/// Validates the config against the L2 chain behind `oracle`.
///
/// The structural check runs first; no request is made if it fails.
pub async fn validate_l2_config<O: ChainRefOracle>(
    cfg: &RollupConfig,
    oracle: &O,
) -> Result<(), ConfigError> {
    cfg.check()?;
    check_chain_id(oracle, ChainLayer::L2, cfg.l2_chain_id).await?;
    check_genesis_hash(oracle, ChainLayer::L2, cfg.genesis.l2).await
}

/// Validates the config against both chains concurrently.
///
/// Both checks always run to completion. An L1 failure is reported ahead of an L2 failure.
pub async fn validate_config<L1, L2>(
    cfg: &RollupConfig,
    l1: &L1,
    l2: &L2,
) -> Result<(), ConfigError>
where
    L1: ChainRefOracle,
    L2: ChainRefOracle,
{
    cfg.check()?;
    let (l1_res, l2_res) = tokio::join!(validate_l1_config(cfg, l1), validate_l2_config(cfg, l2));
    l1_res?;
    l2_res?;
    info!(target: "rollup_config", "Rollup config validated against L1 and L2");
    Ok(())
}

async fn check_chain_id<O: ChainRefOracle>(
    oracle: &O,
    layer: ChainLayer,
    expected: Option<u64>,
) -> Result<(), ConfigError> {
    let expected = expected.ok_or(match layer {
        ChainLayer::L1 => ConfigError::MissingL1ChainId,
        ChainLayer::L2 => ConfigError::MissingL2ChainId,
    })?;
    let actual = oracle
        .chain_id()
        .await
        .map_err(|e| ConfigError::Oracle { layer, message: e.to_string() })?;
    if actual != expected {
        return Err(ConfigError::ChainIdMismatch { layer, expected, actual });
    }
    debug!(target: "rollup_config", %layer, chain_id = actual, "Chain ID matches");
    Ok(())
}

async fn check_genesis_hash<O: ChainRefOracle>(
    oracle: &O,
    layer: ChainLayer,
    anchor: BlockId,
) -> Result<(), ConfigError> {
    let block = oracle
        .block_ref_by_number(anchor.number)
        .await
        .map_err(|e| ConfigError::Oracle { layer, message: e.to_string() })?;
    if block.hash != anchor.hash {
        return Err(ConfigError::GenesisHashMismatch {
            layer,
            expected: anchor.hash,
            actual: block.hash,
        });
    }
    debug!(target: "rollup_config", %layer, number = anchor.number, hash = %anchor.hash, "Genesis block matches");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{valid_rollup_config, TestChainOracle};
    use alloy_primitives::B256;
    use kroma_protocol::BlockRef;

    fn oracles() -> (RollupConfig, TestChainOracle, TestChainOracle) {
        let cfg = valid_rollup_config();
        let l1 = TestChainOracle::new(1);
        l1.insert_block(BlockRef::new(cfg.genesis.l1.hash, cfg.genesis.l1.number, B256::ZERO, 10));
        let l2 = TestChainOracle::new(255);
        l2.insert_block(BlockRef::new(
            cfg.genesis.l2.hash,
            cfg.genesis.l2.number,
            B256::ZERO,
            cfg.genesis.l2_time,
        ));
        (cfg, l1, l2)
    }

    #[tokio::test]
    async fn test_validate_ok() {
        let (cfg, l1, l2) = oracles();
        assert_eq!(validate_l1_config(&cfg, &l1).await, Ok(()));
        assert_eq!(validate_l2_config(&cfg, &l2).await, Ok(()));
        assert_eq!(validate_config(&cfg, &l1, &l2).await, Ok(()));
    }

    #[tokio::test]
    async fn test_l1_chain_id_mismatch() {
        let (cfg, _, _) = oracles();
        let l1 = TestChainOracle::new(5);
        l1.insert_block(BlockRef::new(cfg.genesis.l1.hash, cfg.genesis.l1.number, B256::ZERO, 10));
        assert_eq!(
            validate_l1_config(&cfg, &l1).await,
            Err(ConfigError::ChainIdMismatch { layer: ChainLayer::L1, expected: 1, actual: 5 })
        );
    }

    #[tokio::test]
    async fn test_l2_genesis_hash_mismatch() {
        let (cfg, _, _) = oracles();
        let l2 = TestChainOracle::new(255);
        let wrong = B256::repeat_byte(0xee);
        l2.insert_block(BlockRef::new(wrong, cfg.genesis.l2.number, B256::ZERO, 0));
        assert_eq!(
            validate_l2_config(&cfg, &l2).await,
            Err(ConfigError::GenesisHashMismatch {
                layer: ChainLayer::L2,
                expected: cfg.genesis.l2.hash,
                actual: wrong,
            })
        );
    }

    #[tokio::test]
    async fn test_checks_are_independent() {
        let (cfg, _, _) = oracles();
        // Right chain ID, wrong genesis.
        let l1 = TestChainOracle::new(1);
        l1.insert_block(BlockRef::new(B256::repeat_byte(0xee), cfg.genesis.l1.number, B256::ZERO, 0));
        assert!(matches!(
            validate_l1_config(&cfg, &l1).await,
            Err(ConfigError::GenesisHashMismatch { layer: ChainLayer::L1, .. })
        ));

        // Wrong chain ID, right genesis.
        let l1 = TestChainOracle::new(2);
        l1.insert_block(BlockRef::new(cfg.genesis.l1.hash, cfg.genesis.l1.number, B256::ZERO, 0));
        assert!(matches!(
            validate_l1_config(&cfg, &l1).await,
            Err(ConfigError::ChainIdMismatch { layer: ChainLayer::L1, .. })
        ));
    }

    #[tokio::test]
    async fn test_structural_check_runs_first() {
        let (mut cfg, l1, _) = oracles();
        cfg.l2_chain_id = Some(1);
        assert_eq!(validate_l1_config(&cfg, &l1).await, Err(ConfigError::ChainIdsSame));
        assert_eq!(l1.request_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_genesis_block_is_oracle_error() {
        let cfg = valid_rollup_config();
        let l1 = TestChainOracle::new(1);
        assert!(matches!(
            validate_l1_config(&cfg, &l1).await,
            Err(ConfigError::Oracle { layer: ChainLayer::L1, .. })
        ));
    }

    #[tokio::test]
    async fn test_l1_failure_reported_first() {
        let (cfg, _, _) = oracles();
        let l1 = TestChainOracle::new(5);
        let l2 = TestChainOracle::new(7);
        let err = validate_config(&cfg, &l1, &l2).await.unwrap_err();
        assert_eq!(err, ConfigError::ChainIdMismatch { layer: ChainLayer::L1, expected: 1, actual: 5 });
        // The L2 check still ran.
        assert_eq!(l2.request_count(), 1);
    }

    #[test]
    fn test_output_block_grid() {
        let cfg = EngineConfig { submission_interval: 10, start_l2_block: 100, ..Default::default() };
        assert!(cfg.is_output_block(100));
        assert!(cfg.is_output_block(130));
        assert!(!cfg.is_output_block(131));
        assert!(!cfg.is_output_block(90));
    }
}
