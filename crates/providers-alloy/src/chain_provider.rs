//! A [ChainRefOracle] over Ethereum JSON-RPC using an alloy provider as the backend.

use crate::HttpTransport;
use alloy_primitives::{B256, U64};
use alloy_provider::{Provider, ReqwestProvider};
use alloy_rpc_types_eth::BlockNumberOrTag;
use alloy_transport::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use kroma_protocol::BlockRef;
use kroma_validator::ChainRefOracle;
use serde::Deserialize;

/// The header fields of an `eth_getBlockByNumber` response the validator reads.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcHeader {
    hash: B256,
    number: U64,
    parent_hash: B256,
    timestamp: U64,
}

impl From<RpcHeader> for BlockRef {
    fn from(h: RpcHeader) -> Self {
        Self::new(h.hash, h.number.to::<u64>(), h.parent_hash, h.timestamp.to::<u64>())
    }
}

/// Fetches the block at `tag` without its transactions.
pub(crate) async fn fetch_block_ref<P: Provider<HttpTransport>>(
    provider: &P,
    tag: BlockNumberOrTag,
) -> Result<Option<BlockRef>, RpcError<TransportErrorKind>> {
    let header: Option<RpcHeader> =
        provider.raw_request("eth_getBlockByNumber".into(), (tag, false)).await?;
    Ok(header.map(Into::into))
}

/// An error for the [AlloyChainProvider].
#[derive(Debug, thiserror::Error)]
pub enum AlloyChainProviderError {
    /// The RPC request failed.
    #[error("RPC request failed: {0}")]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// The block does not exist.
    #[error("Block {0} not found")]
    BlockNotFound(BlockNumberOrTag),
}

/// The [AlloyChainProvider] reads chain IDs and block references from one chain.
///
/// The head it reports is the `latest` block by default. An L2 instance should report the
/// safe head instead, see [AlloyChainProvider::with_head_tag].
#[derive(Debug, Clone)]
pub struct AlloyChainProvider {
    /// The inner Ethereum JSON-RPC provider.
    inner: ReqwestProvider,
    /// The block tag resolved as the head.
    head_tag: BlockNumberOrTag,
}

impl AlloyChainProvider {
    /// Creates a new [AlloyChainProvider] with the given alloy provider.
    pub const fn new(inner: ReqwestProvider) -> Self {
        Self { inner, head_tag: BlockNumberOrTag::Latest }
    }

    /// Creates a new [AlloyChainProvider] from the provided [reqwest::Url].
    pub fn new_http(url: reqwest::Url) -> Self {
        Self::new(ReqwestProvider::new_http(url))
    }

    /// Sets the block tag resolved as the head.
    pub const fn with_head_tag(mut self, head_tag: BlockNumberOrTag) -> Self {
        self.head_tag = head_tag;
        self
    }

    /// Returns the inner provider.
    pub const fn inner(&self) -> &ReqwestProvider {
        &self.inner
    }

    async fn block_ref(&self, tag: BlockNumberOrTag) -> Result<BlockRef, AlloyChainProviderError> {
        fetch_block_ref(&self.inner, tag).await?.ok_or(AlloyChainProviderError::BlockNotFound(tag))
    }
}

#[async_trait]
impl ChainRefOracle for AlloyChainProvider {
    type Error = AlloyChainProviderError;

    async fn chain_id(&self) -> Result<u64, Self::Error> {
        Ok(self.inner.get_chain_id().await?)
    }

    async fn block_ref_by_number(&self, number: u64) -> Result<BlockRef, Self::Error> {
        self.block_ref(BlockNumberOrTag::Number(number)).await
    }

    async fn latest_block_ref(&self) -> Result<BlockRef, Self::Error> {
        self.block_ref(self.head_tag).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_header_to_block_ref() {
        let raw = r#"{
            "hash": "0x0101010101010101010101010101010101010101010101010101010101010101",
            "number": "0x64",
            "parentHash": "0x0202020202020202020202020202020202020202020202020202020202020202",
            "timestamp": "0x6553f100",
            "miner": "0x0000000000000000000000000000000000000000",
            "transactions": []
        }"#;
        let header: RpcHeader = serde_json::from_str(raw).unwrap();
        let block = BlockRef::from(header);
        assert_eq!(block.hash, B256::repeat_byte(1));
        assert_eq!(block.number, 100);
        assert_eq!(block.parent_hash, B256::repeat_byte(2));
        assert_eq!(block.timestamp, 0x6553f100);
    }

    #[test]
    fn test_missing_block_is_none() {
        let header: Option<RpcHeader> = serde_json::from_str("null").unwrap();
        assert!(header.is_none());
    }
}
