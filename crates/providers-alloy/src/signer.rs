//! HD key derivation for validator accounts.

use alloy_signer_local::{
    coins_bip39::English, LocalSignerError, MnemonicBuilder, PrivateKeySigner,
};

/// The mnemonic of the well-known development accounts.
///
/// Never use this outside of a local devnet.
pub const DEFAULT_TEST_MNEMONIC: &str =
    "test test test test test test test test test test test junk";

/// Derivation path of the contract deployer.
pub const DEPLOYER_PATH: &str = "m/44'/60'/0'/0/1";
/// Derivation path of the L1 clique signer.
pub const CLIQUE_SIGNER_PATH: &str = "m/44'/60'/0'/0/2";
/// Derivation path of the trusted validator.
pub const TRUSTED_VALIDATOR_PATH: &str = "m/44'/60'/0'/0/3";
/// Derivation path of the challenger.
pub const CHALLENGER_PATH: &str = "m/44'/60'/0'/0/4";
/// Derivation path of the batcher.
pub const BATCHER_PATH: &str = "m/44'/60'/0'/0/5";
/// Derivation path of the proposer's p2p key.
pub const PROPOSER_P2P_PATH: &str = "m/44'/60'/0'/0/6";
/// Derivation path of the system config owner.
pub const SYS_CFG_OWNER_PATH: &str = "m/44'/60'/0'/0/10";

/// Derives the signer at `path` from `mnemonic`.
///
/// Derivation is pure: nothing is cached and the same inputs always yield the same key.
pub fn derive_signer(mnemonic: &str, path: &str) -> Result<PrivateKeySigner, LocalSignerError> {
    MnemonicBuilder::<English>::default().phrase(mnemonic).derivation_path(path)?.build()
}
