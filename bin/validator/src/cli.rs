//! This module contains all CLI-specific code.

use alloy_primitives::{Address, U256};
use alloy_signer_local::PrivateKeySigner;
use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, Subcommand};
use kroma_genesis::RollupConfig;
use kroma_protocol::{percent_to_bps, BondIntent, BondIntentError};
use kroma_providers_alloy::{derive_signer, BondContracts};
use kroma_validator::{EngineConfig, RetryConfig};
use reqwest::Url;
use std::{path::PathBuf, time::Duration};

/// The validator binary CLI application arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "kroma-validator",
    version = crate::VERSION,
    about = "L2 Output Submitter and Challenger Service",
    long_about = "Service for generating and submitting L2 output checkpoints to the \
                  L2OutputOracle contract as an L2 Output Submitter, detecting and correcting \
                  invalid L2 outputs as a Challenger to ensure the integrity of the L2 state."
)]
pub(crate) struct Cli {
    /// Verbosity level (0-4)
    #[arg(long, short, help = "Verbosity level (0 [error] - 4 [trace]) - Default: 2 [error,warn,info]", action = ArgAction::Count, global = true)]
    pub(crate) v: u8,

    /// The L1 execution RPC URL.
    #[arg(long, env = "VALIDATOR_L1_ETH_RPC", global = true)]
    pub(crate) l1_rpc: Option<Url>,
    /// The L2 execution RPC URL.
    #[arg(long, env = "VALIDATOR_L2_ETH_RPC")]
    pub(crate) l2_rpc: Option<Url>,
    /// The rollup node RPC URL.
    #[arg(long, env = "VALIDATOR_ROLLUP_RPC")]
    pub(crate) rollup_rpc: Option<Url>,
    /// Path to the rollup config JSON.
    #[arg(long, env = "VALIDATOR_ROLLUP_CONFIG")]
    pub(crate) rollup_config: Option<PathBuf>,

    /// Address of the L2OutputOracle contract.
    #[arg(long, env = "VALIDATOR_L2OO_ADDRESS")]
    pub(crate) l2oo_address: Option<Address>,
    /// Address of the Colosseum contract.
    #[arg(long, env = "VALIDATOR_COLOSSEUM_ADDRESS")]
    pub(crate) colosseum_address: Option<Address>,
    /// Address of the ValidatorPool contract.
    #[arg(long, env = "VALIDATOR_VALPOOL_ADDRESS", global = true)]
    pub(crate) valpool_address: Option<Address>,
    /// Address of the ValidatorManager contract.
    #[arg(long, env = "VALIDATOR_VALMGR_ADDRESS", global = true)]
    pub(crate) valmgr_address: Option<Address>,
    /// Address of the AssetManager contract.
    #[arg(long, env = "VALIDATOR_ASSETMGR_ADDRESS", global = true)]
    pub(crate) assetmgr_address: Option<Address>,
    /// Address of the governance token.
    #[arg(long, env = "VALIDATOR_GOV_TOKEN_ADDRESS", global = true)]
    pub(crate) gov_token_address: Option<Address>,

    /// Hex-encoded private key of the validator account.
    #[arg(long, env = "VALIDATOR_PRIVATE_KEY", global = true, conflicts_with = "mnemonic")]
    pub(crate) private_key: Option<String>,
    /// Mnemonic the validator key is derived from.
    #[arg(long, env = "VALIDATOR_MNEMONIC", global = true, requires = "hd_path")]
    pub(crate) mnemonic: Option<String>,
    /// HD derivation path of the validator key.
    #[arg(long, env = "VALIDATOR_HD_PATH", global = true)]
    pub(crate) hd_path: Option<String>,

    /// Whether to submit outputs when this validator is the next proposer.
    #[arg(long, env = "VALIDATOR_OUTPUT_SUBMITTER_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub(crate) output_submitter_enabled: bool,
    /// Whether to challenge outputs that disagree with local derivation.
    #[arg(long, env = "VALIDATOR_CHALLENGER_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub(crate) challenger_enabled: bool,
    /// First L2 block to validate. Defaults to the next output block of the L2OutputOracle.
    #[arg(long, env = "VALIDATOR_START_L2_BLOCK")]
    pub(crate) start_l2_block: Option<u64>,
    /// First L1 block searched for output submission logs.
    #[arg(long, env = "VALIDATOR_LOG_START_BLOCK", default_value_t = 0)]
    pub(crate) log_start_block: u64,
    /// Seconds between two L1 head polls.
    #[arg(long, env = "VALIDATOR_L1_POLL_INTERVAL", default_value_t = 12)]
    pub(crate) l1_poll_interval: u64,
    /// Deadline of one external call, in seconds.
    #[arg(long, env = "VALIDATOR_CALL_TIMEOUT", default_value_t = 30)]
    pub(crate) call_timeout: u64,
    /// Maximum number of retries of a transient failure.
    #[arg(long, env = "VALIDATOR_MAX_RETRIES", default_value_t = 5)]
    pub(crate) max_retries: u32,

    /// Address the metrics server binds to, e.g. `0.0.0.0:7300`.
    #[arg(long, env = "VALIDATOR_METRICS_ADDR")]
    pub(crate) metrics_addr: Option<String>,

    /// Bond command to run instead of the service.
    #[command(subcommand)]
    pub(crate) command: Option<Command>,
}

/// Returns the value of a flag the current command requires.
fn required<T: Clone>(value: &Option<T>, flag: &str) -> Result<T> {
    value.clone().ok_or_else(|| anyhow!("--{flag} is required"))
}

impl Cli {
    /// Returns the L1 RPC URL.
    pub(crate) fn l1_rpc(&self) -> Result<Url> {
        required(&self.l1_rpc, "l1-rpc")
    }

    /// Returns the L2 RPC URL.
    pub(crate) fn l2_rpc(&self) -> Result<Url> {
        required(&self.l2_rpc, "l2-rpc")
    }

    /// Returns the rollup node RPC URL.
    pub(crate) fn rollup_rpc(&self) -> Result<Url> {
        required(&self.rollup_rpc, "rollup-rpc")
    }

    /// Returns the L2OutputOracle address.
    pub(crate) fn l2oo_address(&self) -> Result<Address> {
        required(&self.l2oo_address, "l2oo-address")
    }

    /// Returns the Colosseum address.
    pub(crate) fn colosseum_address(&self) -> Result<Address> {
        required(&self.colosseum_address, "colosseum-address")
    }

    /// Reads the rollup config from disk.
    pub(crate) fn rollup_config(&self) -> Result<RollupConfig> {
        let path = required(&self.rollup_config, "rollup-config")?;
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
        serde_json::from_str(&raw).map_err(|e| anyhow!("invalid rollup config: {e}"))
    }

    /// Returns the bond contract addresses.
    pub(crate) fn bond_contracts(&self) -> Result<BondContracts> {
        Ok(BondContracts {
            validator_pool: required(&self.valpool_address, "valpool-address")?,
            validator_manager: required(&self.valmgr_address, "valmgr-address")?,
            asset_manager: required(&self.assetmgr_address, "assetmgr-address")?,
            governance_token: required(&self.gov_token_address, "gov-token-address")?,
        })
    }

    /// Builds the validator signer from a private key or a mnemonic and path.
    pub(crate) fn signer(&self) -> Result<PrivateKeySigner> {
        if let Some(key) = &self.private_key {
            return key.parse().map_err(|e| anyhow!("invalid private key: {e}"));
        }
        let mnemonic = required(&self.mnemonic, "mnemonic")?;
        let path = required(&self.hd_path, "hd-path")?;
        derive_signer(&mnemonic, &path).map_err(|e| anyhow!("failed to derive signer: {e}"))
    }

    /// Returns the retry policy.
    pub(crate) fn retry_config(&self) -> RetryConfig {
        RetryConfig { max_attempts: self.max_retries, ..Default::default() }
    }

    /// Returns the call deadline.
    pub(crate) const fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout)
    }

    /// Returns the engine knobs, starting at `start_l2_block`.
    pub(crate) fn engine_config(&self, submission_interval: u64, start_l2_block: u64) -> EngineConfig {
        EngineConfig {
            submission_interval,
            start_l2_block,
            proposer_enabled: self.output_submitter_enabled,
            challenger_enabled: self.challenger_enabled,
            call_timeout: self.call_timeout(),
            retry: self.retry_config(),
        }
    }
}

/// Bond commands against the validator contracts.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
#[command(rename_all = "camelCase")]
pub(crate) enum Command {
    /// Deposit ETH into ValidatorPool to be used as bond
    Deposit {
        /// Amount to deposit into ValidatorPool (in wei)
        #[arg(long)]
        amount: U256,
    },
    /// Withdraw ETH from ValidatorPool
    Withdraw {
        /// Amount to withdraw from ValidatorPool (in wei)
        #[arg(long)]
        amount: U256,
    },
    /// Attempt to unbond in ValidatorPool
    Unbond,
    /// Approve the AssetManager to spend governance tokens
    Approve {
        /// Amount to approve the AssetManager to spend (in wei)
        #[arg(long)]
        amount: U256,
    },
    /// Attempt to self-delegate governance tokens
    Delegate {
        /// Amount to self-delegate (in wei)
        #[arg(long)]
        amount: U256,
    },
    /// Initiate an undelegation of governance tokens
    InitUndelegate {
        /// Amount to undelegate (in wei)
        #[arg(long)]
        amount: U256,
    },
    /// Finalize an undelegation of KROs
    FinalizeUndelegate,
    /// Initiate a claim of validator rewards
    InitClaimValidatorReward {
        /// The amount of rewards to claim (in wei)
        #[arg(long)]
        amount: U256,
    },
    /// Finalize a claim of validator rewards
    FinalizeClaimValidatorReward,
    /// Register the validator to ValidatorManager
    RegisterValidator {
        /// The amount of assets to self-delegate (in wei)
        #[arg(long)]
        amount: U256,
        /// The commission rate the validator sets (in percentage). Maximum 100.
        #[arg(long = "commissionRate")]
        commission_rate: u64,
        /// The maximum changeable commission rate change (in percentage). Maximum 100.
        #[arg(long = "commissionMaxChangeRate")]
        commission_max_change_rate: u64,
    },
    /// Attempt to unjail the validator
    TryUnjail,
    /// Change the commission rate of the validator
    ChangeCommissionRate {
        /// The new commission rate the validator sets (in percentage). Maximum 100.
        #[arg(long = "commissionRate")]
        commission_rate: u64,
    },
}

impl Command {
    /// Converts the command into the [BondIntent] it issues.
    pub(crate) fn to_intent(&self) -> Result<BondIntent, BondIntentError> {
        Ok(match *self {
            Self::Deposit { amount } => BondIntent::Deposit { amount },
            Self::Withdraw { amount } => BondIntent::Withdraw { amount },
            Self::Unbond => BondIntent::Unbond,
            Self::Approve { amount } => BondIntent::Approve { amount },
            Self::Delegate { amount } => BondIntent::Delegate { amount },
            Self::InitUndelegate { amount } => BondIntent::InitUndelegate { amount },
            Self::FinalizeUndelegate => BondIntent::FinalizeUndelegate,
            Self::InitClaimValidatorReward { amount } => BondIntent::InitClaimReward { amount },
            Self::FinalizeClaimValidatorReward => BondIntent::FinalizeClaimReward,
            Self::RegisterValidator { amount, commission_rate, commission_max_change_rate } => {
                BondIntent::Register {
                    amount,
                    commission_rate_bps: percent_to_bps(commission_rate)?,
                    commission_max_change_bps: percent_to_bps(commission_max_change_rate)?,
                }
            }
            Self::TryUnjail => BondIntent::TryUnjail,
            Self::ChangeCommissionRate { commission_rate } => {
                BondIntent::ChangeCommissionRate { new_rate_bps: percent_to_bps(commission_rate)? }
            }
        })
    }
}
