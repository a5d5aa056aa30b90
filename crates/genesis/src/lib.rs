#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod block;
pub use block::{BlockId, ChainLayer};

mod system;
pub use system::SystemConfig;

mod genesis;
pub use genesis::Genesis;

mod errors;
pub use errors::ConfigError;

mod rollup;
pub use rollup::RollupConfig;

mod describe;
pub use describe::l1_network_name;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
