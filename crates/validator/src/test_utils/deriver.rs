//! Test utilities for the [StateDeriver] trait.

use crate::{errors::DerivationError, traits::StateDeriver};
use alloy_primitives::B256;
use async_trait::async_trait;
use kroma_protocol::{BlockRef, DerivedOutput};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// Builds a [DerivedOutput] for `l2_block` with root `root` and L1 origin `l1_origin`.
///
/// The L2 block is timestamped at its L1 origin, two seconds per L1 block.
pub fn derived_output(l2_block: u64, root: B256, l1_origin: u64) -> DerivedOutput {
    let origin_time = l1_origin * 2;
    DerivedOutput {
        l2_block: BlockRef::new(B256::with_last_byte(0xb2), l2_block, B256::ZERO, origin_time),
        l1_origin: BlockRef::new(B256::with_last_byte(0xb1), l1_origin, B256::ZERO, origin_time),
        root,
    }
}

#[derive(Debug, Default)]
struct DeriverState {
    outputs: HashMap<u64, Result<DerivedOutput, DerivationError>>,
    derive_calls: Vec<u64>,
}

/// A mock state deriver for testing.
///
/// Blocks without a configured output report [DerivationError::InsufficientData].
#[derive(Debug, Clone, Default)]
pub struct TestStateDeriver {
    state: Arc<Mutex<DeriverState>>,
}

impl TestStateDeriver {
    fn with<T>(&self, f: impl FnOnce(&mut DeriverState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// Sets the output derived for its L2 block.
    pub fn set_output(&self, output: DerivedOutput) {
        self.with(|s| {
            s.outputs.insert(output.l2_block.number, Ok(output));
        });
    }

    /// Makes derivation of `l2_block` fail with `err`.
    pub fn set_error(&self, l2_block: u64, err: DerivationError) {
        self.with(|s| {
            s.outputs.insert(l2_block, Err(err));
        });
    }

    /// Returns the L2 blocks derivation was requested for, in order.
    pub fn derive_calls(&self) -> Vec<u64> {
        self.with(|s| s.derive_calls.clone())
    }
}

#[async_trait]
impl StateDeriver for TestStateDeriver {
    async fn derive_output_root(&self, l2_block: u64) -> Result<DerivedOutput, DerivationError> {
        self.with(|s| {
            s.derive_calls.push(l2_block);
            s.outputs
                .get(&l2_block)
                .cloned()
                .unwrap_or(Err(DerivationError::InsufficientData(l2_block)))
        })
    }

    async fn l1_origin_of(&self, l2_block: u64) -> Result<BlockRef, DerivationError> {
        self.with(|s| match s.outputs.get(&l2_block) {
            Some(Ok(output)) => Ok(output.l1_origin),
            Some(Err(e)) => Err(e.clone()),
            None => Err(DerivationError::InsufficientData(l2_block)),
        })
    }
}
