//! A [StateDeriver] backed by a rollup node.

use crate::AlloyChainProvider;
use alloy_primitives::{B256, U64};
use alloy_provider::{Provider, ReqwestProvider};
use alloy_transport::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use kroma_protocol::{BlockRef, DerivedOutput};
use kroma_validator::{ChainRefOracle, DerivationError, StateDeriver};
use serde::Deserialize;
use tracing::{debug, warn};

/// The ID of a block, as reported by the rollup node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub(crate) struct NodeBlockId {
    hash: B256,
    number: u64,
}

/// An L2 block reference, as reported by the rollup node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NodeL2BlockRef {
    hash: B256,
    number: u64,
    parent_hash: B256,
    timestamp: u64,
    #[serde(rename = "l1origin")]
    l1_origin: NodeBlockId,
}

impl From<NodeL2BlockRef> for BlockRef {
    fn from(r: NodeL2BlockRef) -> Self {
        Self::new(r.hash, r.number, r.parent_hash, r.timestamp)
    }
}

/// The response of `optimism_outputAtBlock`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OutputResponse {
    output_root: B256,
    block_ref: NodeL2BlockRef,
}

/// The part of `optimism_syncStatus` the deriver reads.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct SyncStatus {
    safe_l2: NodeL2BlockRef,
}

/// Derives output roots by asking a rollup node that runs the derivation pipeline.
///
/// Blocks above the node's safe head, and an unreachable node, are reported as
/// [DerivationError::InsufficientData]. A response that contradicts itself or the L1 chain
/// is a [DerivationError::Fault].
#[derive(Debug, Clone)]
pub struct RollupNodeDeriver {
    /// The rollup node RPC.
    node: ReqwestProvider,
    /// The L1 chain the node derives from.
    l1: AlloyChainProvider,
}

impl RollupNodeDeriver {
    /// Creates a new [RollupNodeDeriver].
    pub const fn new(node: ReqwestProvider, l1: AlloyChainProvider) -> Self {
        Self { node, l1 }
    }

    /// Creates a new [RollupNodeDeriver] from the provided [reqwest::Url].
    pub fn new_http(url: reqwest::Url, l1: AlloyChainProvider) -> Self {
        Self::new(ReqwestProvider::new_http(url), l1)
    }

    async fn safe_l2_block(&self, l2_block: u64) -> Result<u64, DerivationError> {
        let status: SyncStatus = self
            .node
            .raw_request("optimism_syncStatus".into(), ())
            .await
            .map_err(|e| unavailable("optimism_syncStatus", l2_block, e))?;
        Ok(status.safe_l2.number)
    }

    async fn output_at(&self, l2_block: u64) -> Result<OutputResponse, DerivationError> {
        let safe = self.safe_l2_block(l2_block).await?;
        if l2_block > safe {
            debug!(target: "rollup_node", l2_block, safe, "L2 block not yet safe");
            return Err(DerivationError::InsufficientData(l2_block));
        }
        let output: OutputResponse = self
            .node
            .raw_request("optimism_outputAtBlock".into(), [U64::from(l2_block)])
            .await
            .map_err(|e| unavailable("optimism_outputAtBlock", l2_block, e))?;
        if output.block_ref.number != l2_block {
            return Err(DerivationError::Fault(format!(
                "rollup node returned L2 block {} for L2 block {l2_block}",
                output.block_ref.number
            )));
        }
        Ok(output)
    }

    async fn origin_of(&self, block: &NodeL2BlockRef) -> Result<BlockRef, DerivationError> {
        let origin = block.l1_origin;
        let l1_block = self.l1.block_ref_by_number(origin.number).await.map_err(|e| {
            warn!(target: "rollup_node", number = origin.number, error = %e, "Failed to fetch L1 origin");
            DerivationError::InsufficientData(block.number)
        })?;
        if l1_block.hash != origin.hash {
            // The origin was reorged out; the node will rederive.
            warn!(target: "rollup_node", l2_block = block.number, expected = %origin.hash, actual = %l1_block.hash, "L1 origin not canonical");
            return Err(DerivationError::InsufficientData(block.number));
        }
        Ok(l1_block)
    }
}

/// Maps a failed node request for `l2_block` to a [DerivationError].
fn unavailable(method: &str, l2_block: u64, e: RpcError<TransportErrorKind>) -> DerivationError {
    warn!(target: "rollup_node", method, error = %e, "Rollup node request failed");
    match e {
        RpcError::ErrorResp(payload) => {
            DerivationError::Fault(format!("{method} rejected: {}", payload.message))
        }
        RpcError::DeserError { err, .. } => {
            DerivationError::Fault(format!("{method} returned a malformed response: {err}"))
        }
        _ => DerivationError::InsufficientData(l2_block),
    }
}

#[async_trait]
impl StateDeriver for RollupNodeDeriver {
    async fn derive_output_root(&self, l2_block: u64) -> Result<DerivedOutput, DerivationError> {
        let output = self.output_at(l2_block).await?;
        let l1_origin = self.origin_of(&output.block_ref).await?;
        Ok(DerivedOutput { l2_block: output.block_ref.into(), l1_origin, root: output.output_root })
    }

    async fn l1_origin_of(&self, l2_block: u64) -> Result<BlockRef, DerivationError> {
        let output = self.output_at(l2_block).await?;
        self.origin_of(&output.block_ref).await
    }
}
