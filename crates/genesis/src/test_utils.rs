//! Test utilities for the genesis crate.

use crate::{BlockId, Genesis, RollupConfig, SystemConfig};
use alloy_primitives::{Address, B256};

/// Returns a [RollupConfig] that passes [RollupConfig::check].
///
/// L1 genesis is block 100 on chain 1; L2 genesis is block 0 on chain 255 at time 1000.
pub fn valid_rollup_config() -> RollupConfig {
    RollupConfig {
        genesis: Genesis {
            l1: BlockId::new(B256::repeat_byte(0x01), 100),
            l2: BlockId::new(B256::repeat_byte(0x02), 0),
            l2_time: 1000,
            system_config: SystemConfig {
                batcher_addr: Address::repeat_byte(0x03),
                overhead: B256::with_last_byte(0xbc),
                scalar: B256::with_last_byte(0x01),
                gas_limit: 30_000_000,
            },
        },
        block_time: 2,
        max_proposer_drift: 600,
        proposer_window_size: 4,
        channel_timeout: 10,
        l1_chain_id: Some(1),
        l2_chain_id: Some(255),
        batch_inbox_address: Address::repeat_byte(0x04),
        deposit_contract_address: Address::repeat_byte(0x05),
        l1_system_config_address: Address::repeat_byte(0x06),
    }
}
