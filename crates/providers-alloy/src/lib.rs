#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

/// The HTTP transport every provider in this crate is built on.
pub type HttpTransport = alloy_transport_http::Http<reqwest::Client>;

pub mod bindings;

mod errors;
pub use errors::{classify_contract_error, classify_rpc_error};

mod receipts;

mod chain_provider;
pub use chain_provider::{AlloyChainProvider, AlloyChainProviderError};

mod rollup_node;
pub use rollup_node::RollupNodeDeriver;

mod output_ledger;
pub use output_ledger::{AlloyOutputLedger, PUBLIC_ROUND_ADDRESS};

mod challenge_ledger;
pub use challenge_ledger::AlloyChallengeLedger;

mod bond_ledger;
pub use bond_ledger::{AlloyBondLedger, BondContracts};

pub mod signer;
pub use signer::{derive_signer, DEFAULT_TEST_MNEMONIC};
