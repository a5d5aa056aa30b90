//! Wiring of the validator service.

use crate::{
    cli::Cli,
    metrics,
    provider::{resolve_start, wallet_provider},
};
use alloy_provider::Provider;
use alloy_rpc_types_eth::BlockNumberOrTag;
use anyhow::{anyhow, ensure, Result};
use kroma_providers_alloy::{
    AlloyBondLedger, AlloyChainProvider, AlloyChallengeLedger, AlloyOutputLedger, RollupNodeDeriver,
};
use kroma_validator::{validate_config, DisputeEngine, PollConfig, ValidatorService};
use std::{sync::Arc, time::Duration};
use tracing::{error, info};

/// Validates the rollup config against both chains, then runs the validator until it is
/// interrupted or hits a fatal error.
pub(crate) async fn run(cli: &Cli) -> Result<()> {
    let cfg = Arc::new(cli.rollup_config()?);
    let l1_url = cli.l1_rpc()?;
    let l1 = AlloyChainProvider::new_http(l1_url.clone());
    let l2 = AlloyChainProvider::new_http(cli.l2_rpc()?).with_head_tag(BlockNumberOrTag::Safe);
    validate_config(&cfg, &l1, &l2).await?;

    let signer = cli.signer()?;
    let identity = signer.address();
    let provider = wallet_provider(l1_url, signer);
    if let Some(expected) = cfg.l1_signer_chain_id() {
        let actual = provider.get_chain_id().await?;
        ensure!(actual == expected, "signing provider is on chain {actual}, expected {expected}");
    }
    let l2oo = cli.l2oo_address()?;
    let contracts = cli.bond_contracts()?;
    let start = resolve_start(&provider, l2oo, cli.start_l2_block).await?;

    let deriver = RollupNodeDeriver::new_http(cli.rollup_rpc()?, l1.clone());
    let outputs =
        AlloyOutputLedger::new(provider.clone(), l2oo, contracts.validator_pool, identity)
            .with_start_index(start.index)
            .with_log_start_block(cli.log_start_block);
    let challenges = AlloyChallengeLedger::new(
        provider.clone(),
        l2oo,
        cli.colosseum_address()?,
        deriver.clone(),
        identity,
    )
    .with_log_start_block(cli.log_start_block);
    let bonds = AlloyBondLedger::new(provider, contracts, identity);

    let engine = Arc::new(DisputeEngine::new(
        cfg.clone(),
        cli.engine_config(start.interval, start.l2_block),
        identity,
        deriver,
        outputs,
        challenges,
        bonds,
    ));
    let poll = PollConfig::new(&cfg, Duration::from_secs(cli.l1_poll_interval));
    let service = ValidatorService::new(crate::VERSION, cfg, engine, l1, l2, poll);

    let cancel = service.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(target: "kroma_validator", "Received interrupt, shutting down");
            cancel.cancel();
        }
    });

    info!(target: "kroma_validator", validator = %identity, "Starting validator");
    match &cli.metrics_addr {
        Some(addr) => tokio::select! {
            res = metrics::serve_metrics(addr) => {
                error!(target: "kroma_validator", "Metrics server stopped: {:?}", res);
                res.and(Err(anyhow!("metrics server stopped")))
            }
            res = service.run() => Ok(res?),
        },
        None => Ok(service.run().await?),
    }
}
