//! Bond commands.

use crate::{
    cli::{Cli, Command},
    provider::wallet_provider,
};
use anyhow::Result;
use kroma_providers_alloy::AlloyBondLedger;
use kroma_validator::BondManager;
use tracing::info;

/// Issues the intent of `command` and waits for its confirmation.
pub(crate) async fn run(cli: &Cli, command: &Command) -> Result<()> {
    let intent = command.to_intent()?;
    let signer = cli.signer()?;
    let sender = signer.address();
    let provider = wallet_provider(cli.l1_rpc()?, signer);
    let ledger = AlloyBondLedger::new(provider, cli.bond_contracts()?, sender);
    let manager = BondManager::new(ledger, cli.retry_config(), cli.call_timeout());

    info!(target: "bond", %intent, validator = %sender, "Submitting intent");
    let receipt = manager.execute(intent).await?;
    info!(target: "bond", tx = %receipt.tx, block = receipt.block_number, "Intent confirmed");

    let state = manager.refresh(sender).await?;
    info!(
        target: "bond",
        balance = %state.balance,
        delegated = %state.delegated,
        commission_rate_bps = state.commission_rate_bps,
        jailed = state.jailed,
        "Bond state"
    );
    Ok(())
}
