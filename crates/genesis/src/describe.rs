//! Human readable summaries of a [RollupConfig].

use crate::RollupConfig;
use chrono::DateTime;
use std::{collections::HashMap, fmt::Write};

/// Returns the well known name of an L1 chain, if any.
pub const fn l1_network_name(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("mainnet"),
        5 => Some("goerli"),
        17000 => Some("holesky"),
        11155111 => Some("sepolia"),
        _ => None,
    }
}

fn format_unix_date(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .map(|t| t.format("%a %b %e %H:%M:%S UTC %Y").to_string())
        .unwrap_or_else(|| "invalid time".to_string())
}

fn chain_id_string(id: Option<u64>) -> String {
    id.map_or_else(|| "<nil>".to_string(), |id| id.to_string())
}

impl RollupConfig {
    fn network_names(&self, l2_chains: Option<&HashMap<u64, String>>) -> (String, String) {
        let l2 = self
            .l2_chain_id
            .and_then(|id| l2_chains.and_then(|names| names.get(&id)))
            .cloned()
            .unwrap_or_else(|| "unknown L2".to_string());
        let l1 = self
            .l1_chain_id
            .and_then(l1_network_name)
            .unwrap_or("unknown L1")
            .to_string();
        (l1, l2)
    }

    /// Renders a multi-line summary of the rollup.
    ///
    /// `l2_chains` maps L2 chain IDs to display names. An absent table, or one without this
    /// rollup's ID, yields `unknown L2`.
    pub fn description(&self, l2_chains: Option<&HashMap<u64, String>>) -> String {
        let (l1_name, l2_name) = self.network_names(l2_chains);
        let mut out = String::new();
        let _ = writeln!(out, "L2 Chain ID: {} ({})", chain_id_string(self.l2_chain_id), l2_name);
        let _ = writeln!(out, "L1 Chain ID: {} ({})", chain_id_string(self.l1_chain_id), l1_name);
        let _ = writeln!(
            out,
            "Starting point: L2 starting time: {} ~ {}",
            self.genesis.l2_time,
            format_unix_date(self.genesis.l2_time)
        );
        let _ = writeln!(out, "  L2 block: {} {}", self.genesis.l2.hash, self.genesis.l2.number);
        let _ = writeln!(out, "  L1 block: {} {}", self.genesis.l1.hash, self.genesis.l1.number);
        out
    }

    /// Emits the same summary as [RollupConfig::description] as one structured log event.
    pub fn log_description(&self, l2_chains: Option<&HashMap<u64, String>>) {
        let (l1_name, l2_name) = self.network_names(l2_chains);
        tracing::info!(
            target: "rollup_config",
            l2_chain_id = %chain_id_string(self.l2_chain_id),
            l2_network = %l2_name,
            l1_chain_id = %chain_id_string(self.l1_chain_id),
            l1_network = %l1_name,
            l2_start_time = self.genesis.l2_time,
            l2_block_hash = %self.genesis.l2.hash,
            l2_block_number = self.genesis.l2.number,
            l1_block_hash = %self.genesis.l1.hash,
            l1_block_number = self.genesis.l1.number,
            "Rollup Config"
        );
    }
}
