//! This module contains the [RollupConfig] type.

use crate::{ConfigError, Genesis};
use alloy_primitives::{Address, B256};

/// The Rollup configuration.
///
/// Constructed once at startup and shared read-only afterwards. Nothing may consume a config
/// that has not passed [RollupConfig::check].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollupConfig {
    /// The genesis state of the rollup.
    pub genesis: Genesis,
    /// The block time of the L2, in seconds.
    pub block_time: u64,
    /// Proposer batches may not be more than `max_proposer_drift` seconds after the L1
    /// timestamp of the end of the proposing window.
    pub max_proposer_drift: u64,
    /// Number of epochs in one proposing window.
    pub proposer_window_size: u64,
    /// Number of L1 blocks between when a channel can be opened and when it must be closed.
    pub channel_timeout: u64,
    /// The L1 chain ID.
    #[cfg_attr(feature = "serde", serde(default))]
    pub l1_chain_id: Option<u64>,
    /// The L2 chain ID.
    #[cfg_attr(feature = "serde", serde(default))]
    pub l2_chain_id: Option<u64>,
    /// `batch_inbox_address` is the L1 address that batches are sent to.
    pub batch_inbox_address: Address,
    /// `deposit_contract_address` is the L1 address that deposits are sent to.
    pub deposit_contract_address: Address,
    /// `l1_system_config_address` is the L1 address that the system config is stored at.
    #[cfg_attr(feature = "serde", serde(default))]
    pub l1_system_config_address: Address,
}

impl RollupConfig {
    /// Checks the configuration for structural soundness without touching any chain.
    ///
    /// Invariants are visited in a fixed order and the first violation is returned.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.block_time == 0 {
            return Err(ConfigError::BlockTimeZero);
        }
        if self.channel_timeout == 0 {
            return Err(ConfigError::MissingChannelTimeout);
        }
        if self.proposer_window_size < 2 {
            return Err(ConfigError::InvalidProposerWindowSize);
        }
        if self.genesis.l1.hash == B256::ZERO {
            return Err(ConfigError::MissingGenesisL1Hash);
        }
        if self.genesis.l2.hash == B256::ZERO {
            return Err(ConfigError::MissingGenesisL2Hash);
        }
        if self.genesis.l2.hash == self.genesis.l1.hash {
            return Err(ConfigError::GenesisHashesSame);
        }
        if self.genesis.l2_time == 0 {
            return Err(ConfigError::MissingGenesisL2Time);
        }

        let sys = &self.genesis.system_config;
        if sys.batcher_addr == Address::ZERO {
            return Err(ConfigError::MissingBatcherAddr);
        }
        if sys.overhead == B256::ZERO {
            return Err(ConfigError::MissingOverhead);
        }
        if sys.scalar == B256::ZERO {
            return Err(ConfigError::MissingScalar);
        }
        if sys.gas_limit == 0 {
            return Err(ConfigError::MissingGasLimit);
        }

        if self.batch_inbox_address == Address::ZERO {
            return Err(ConfigError::MissingBatchInboxAddress);
        }
        if self.deposit_contract_address == Address::ZERO {
            return Err(ConfigError::MissingDepositContractAddress);
        }

        let l1 = self.l1_chain_id.ok_or(ConfigError::MissingL1ChainId)?;
        let l2 = self.l2_chain_id.ok_or(ConfigError::MissingL2ChainId)?;
        if l1 == l2 {
            return Err(ConfigError::ChainIdsSame);
        }
        if l1 == 0 {
            return Err(ConfigError::L1ChainIdNotPositive);
        }
        if l2 == 0 {
            return Err(ConfigError::L2ChainIdNotPositive);
        }
        Ok(())
    }

    /// Returns the chain ID L1 transactions must be signed for.
    ///
    /// `None` only for a config that has not passed [RollupConfig::check].
    pub const fn l1_signer_chain_id(&self) -> Option<u64> {
        self.l1_chain_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::valid_rollup_config;
    use alloy_primitives::{address, b256};

    fn check_with(f: impl FnOnce(&mut RollupConfig)) -> Result<(), ConfigError> {
        let mut cfg = valid_rollup_config();
        f(&mut cfg);
        cfg.check()
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(valid_rollup_config().check(), Ok(()));
    }

    #[test]
    fn test_block_time_zero() {
        assert_eq!(check_with(|c| c.block_time = 0), Err(ConfigError::BlockTimeZero));
    }

    #[test]
    fn test_missing_channel_timeout() {
        assert_eq!(check_with(|c| c.channel_timeout = 0), Err(ConfigError::MissingChannelTimeout));
    }

    #[test]
    fn test_proposer_window_too_small() {
        assert_eq!(
            check_with(|c| c.proposer_window_size = 1),
            Err(ConfigError::InvalidProposerWindowSize)
        );
        assert_eq!(
            check_with(|c| c.proposer_window_size = 0),
            Err(ConfigError::InvalidProposerWindowSize)
        );
        assert_eq!(check_with(|c| c.proposer_window_size = 2), Ok(()));
    }

    #[test]
    fn test_missing_genesis_hashes() {
        assert_eq!(
            check_with(|c| c.genesis.l1.hash = B256::ZERO),
            Err(ConfigError::MissingGenesisL1Hash)
        );
        assert_eq!(
            check_with(|c| c.genesis.l2.hash = B256::ZERO),
            Err(ConfigError::MissingGenesisL2Hash)
        );
    }

    #[test]
    fn test_genesis_hashes_same() {
        assert_eq!(
            check_with(|c| c.genesis.l2.hash = c.genesis.l1.hash),
            Err(ConfigError::GenesisHashesSame)
        );
    }

    #[test]
    fn test_missing_genesis_l2_time() {
        assert_eq!(check_with(|c| c.genesis.l2_time = 0), Err(ConfigError::MissingGenesisL2Time));
    }

    #[test]
    fn test_missing_system_config_fields() {
        assert_eq!(
            check_with(|c| c.genesis.system_config.batcher_addr = Address::ZERO),
            Err(ConfigError::MissingBatcherAddr)
        );
        assert_eq!(
            check_with(|c| c.genesis.system_config.overhead = B256::ZERO),
            Err(ConfigError::MissingOverhead)
        );
        assert_eq!(
            check_with(|c| c.genesis.system_config.scalar = B256::ZERO),
            Err(ConfigError::MissingScalar)
        );
        assert_eq!(
            check_with(|c| c.genesis.system_config.gas_limit = 0),
            Err(ConfigError::MissingGasLimit)
        );
    }

    #[test]
    fn test_missing_contract_addresses() {
        assert_eq!(
            check_with(|c| c.batch_inbox_address = Address::ZERO),
            Err(ConfigError::MissingBatchInboxAddress)
        );
        assert_eq!(
            check_with(|c| c.deposit_contract_address = Address::ZERO),
            Err(ConfigError::MissingDepositContractAddress)
        );
    }

    #[test]
    fn test_chain_ids() {
        assert_eq!(check_with(|c| c.l1_chain_id = None), Err(ConfigError::MissingL1ChainId));
        assert_eq!(check_with(|c| c.l2_chain_id = None), Err(ConfigError::MissingL2ChainId));
        assert_eq!(check_with(|c| c.l1_chain_id = Some(0)), Err(ConfigError::L1ChainIdNotPositive));
        assert_eq!(check_with(|c| c.l2_chain_id = Some(0)), Err(ConfigError::L2ChainIdNotPositive));
    }

    #[test]
    fn test_chain_ids_same() {
        let res = check_with(|c| {
            c.l1_chain_id = Some(1);
            c.l2_chain_id = Some(1);
        });
        assert_eq!(res, Err(ConfigError::ChainIdsSame));
    }

    #[test]
    fn test_first_violation_wins() {
        let res = check_with(|c| {
            c.block_time = 0;
            c.l2_chain_id = None;
        });
        assert_eq!(res, Err(ConfigError::BlockTimeZero));
    }

    #[test]
    fn test_signer_chain_id() {
        assert_eq!(valid_rollup_config().l1_signer_chain_id(), Some(1));
    }

    #[test]
    #[cfg(feature = "serde")]
    fn test_deserialize_rollup_config() {
        let raw = r#"{
            "genesis": {
                "l1": {
                    "hash": "0x438335a20d98863a4c0c97999eb2481921ccd28553eac6f913af7c12aec04108",
                    "number": 17422590
                },
                "l2": {
                    "hash": "0xdbf6a80fef073de06add9b0d14026d6e5a86c85f6d102c36d3d8e9cf89c2afd3",
                    "number": 105235063
                },
                "l2_time": 1686068903,
                "system_config": {
                    "batcherAddr": "0x6887246668a3b87f54deb3b94ba47a6f63f32985",
                    "overhead": "0x00000000000000000000000000000000000000000000000000000000000000bc",
                    "scalar": "0x00000000000000000000000000000000000000000000000000000000000a6fe0",
                    "gasLimit": 30000000
                }
            },
            "block_time": 2,
            "max_proposer_drift": 600,
            "proposer_window_size": 3600,
            "channel_timeout": 300,
            "l1_chain_id": 1,
            "l2_chain_id": 255,
            "batch_inbox_address": "0xff00000000000000000000000000000000000255",
            "deposit_contract_address": "0x31f648572b67e60ec6eb8e197e1848cc5f5558de",
            "l1_system_config_address": "0x3971eb866aa9b2b8afa8ef9f4e3b8ef4d15e59de"
        }"#;

        let cfg: RollupConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.block_time, 2);
        assert_eq!(cfg.proposer_window_size, 3600);
        assert_eq!(cfg.l2_chain_id, Some(255));
        assert_eq!(cfg.genesis.l1.number, 17422590);
        assert_eq!(
            cfg.genesis.l2.hash,
            b256!("dbf6a80fef073de06add9b0d14026d6e5a86c85f6d102c36d3d8e9cf89c2afd3")
        );
        assert_eq!(
            cfg.genesis.system_config.batcher_addr,
            address!("6887246668a3b87f54deb3b94ba47a6f63f32985")
        );
        assert_eq!(cfg.genesis.system_config.gas_limit, 30_000_000);
        assert_eq!(cfg.check(), Ok(()));
    }

    #[test]
    #[cfg(feature = "serde")]
    fn test_missing_chain_id_deserializes_as_none() {
        let mut value = serde_json::to_value(valid_rollup_config()).unwrap();
        value.as_object_mut().unwrap().remove("l2_chain_id");
        let cfg: RollupConfig = serde_json::from_value(value).unwrap();
        assert_eq!(cfg.l2_chain_id, None);
        assert_eq!(cfg.check(), Err(ConfigError::MissingL2ChainId));
    }
}
