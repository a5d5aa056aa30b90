//! L1 provider construction and start point resolution.

use alloy_network::EthereumWallet;
use alloy_primitives::{Address, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use anyhow::{anyhow, Result};
use kroma_providers_alloy::{bindings::L2OutputOracle, HttpTransport};
use reqwest::Url;
use tracing::info;

/// Builds an L1 provider that fills nonces and fees and signs with `signer`.
pub(crate) fn wallet_provider(
    url: Url,
    signer: PrivateKeySigner,
) -> impl Provider<HttpTransport> + Clone + 'static {
    ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(EthereumWallet::from(signer))
        .on_http(url)
}

/// Where the validator starts reading the output oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StartPoint {
    /// Number of L2 blocks between two outputs.
    pub(crate) interval: u64,
    /// The first L2 block validated.
    pub(crate) l2_block: u64,
    /// The output index of `l2_block`.
    pub(crate) index: u64,
}

/// Rounds `block` up onto the output grid starting at `starting`.
pub(crate) const fn align_up(block: u64, starting: u64, interval: u64) -> u64 {
    if block <= starting || interval == 0 {
        return starting;
    }
    let offset = block - starting;
    starting + offset.div_ceil(interval) * interval
}

fn narrow(value: U256, what: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{what} {value} does not fit in a u64"))
}

/// Resolves the start point from the `L2OutputOracle` at `l2oo`.
///
/// Without a requested block the validator starts at the next output the oracle expects.
pub(crate) async fn resolve_start<P: Provider<HttpTransport> + Clone>(
    provider: &P,
    l2oo: Address,
    requested: Option<u64>,
) -> Result<StartPoint> {
    let oracle = L2OutputOracle::new(l2oo, provider.clone());
    let interval = narrow(oracle.SUBMISSION_INTERVAL().call().await?._0, "submission interval")?;
    let next_block = narrow(oracle.nextBlockNumber().call().await?._0, "next block number")?;
    let next_index = narrow(oracle.nextOutputIndex().call().await?._0, "next output index")?;

    let start = match requested {
        None => StartPoint { interval, l2_block: next_block, index: next_index },
        Some(block) => {
            let starting =
                narrow(oracle.startingBlockNumber().call().await?._0, "starting block number")?;
            let l2_block = align_up(block, starting, interval);
            let index = if l2_block >= next_block {
                next_index + (l2_block - next_block) / interval.max(1)
            } else {
                narrow(
                    oracle.getL2OutputIndexAfter(U256::from(l2_block)).call().await?._0,
                    "output index",
                )?
            };
            StartPoint { interval, l2_block, index }
        }
    };
    info!(target: "kroma_validator", interval, l2_block = start.l2_block, index = start.index, "Resolved start point");
    Ok(start)
}
