//! Test utilities for `kroma-validator`.
//!
//! In-memory doubles for every capability. Each double is cheaply cloneable and clones share
//! state, so a test can hand one clone to the code under test and inspect the other.

mod chain;
pub use chain::{TestChainOracle, TestOracleError};

mod deriver;
pub use deriver::{derived_output, TestStateDeriver};

mod ledgers;
pub use ledgers::{TestBondLedger, TestChallengeLedger, TestOutputLedger};

pub use kroma_genesis::test_utils::valid_rollup_config;
