#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(any(test, feature = "test-utils")), warn(unused_crate_dependencies))]

mod macros;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod config;
pub use config::{
    validate_config, validate_l1_config, validate_l2_config, EngineConfig, RetryConfig,
};

pub mod errors;
pub use errors::{
    ConsistencyFault, DerivationError, EngineError, IntentError, LedgerError,
};

pub mod traits;
pub use traits::{
    BondLedger, ChainRefOracle, ChallengeLedger, OutputLedger, StateDeriver, TxTracker,
};

mod retry;

mod engine;
pub use engine::{CycleOutcome, CycleReport, DisputeEngine, EngineState};

mod bond;
pub use bond::{BondManager, IntentReceipt};

mod service;
pub use service::{PollConfig, ValidatorService, DEFAULT_L1_POLL_INTERVAL};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
