//! Test utilities for the [ChainRefOracle] trait.

use crate::traits::ChainRefOracle;
use async_trait::async_trait;
use kroma_protocol::BlockRef;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use thiserror::Error;

#[derive(Debug, Default)]
struct ChainState {
    chain_id: u64,
    blocks: HashMap<u64, BlockRef>,
    head: Option<BlockRef>,
    requests: usize,
}

/// A mock chain oracle for testing.
#[derive(Debug, Clone, Default)]
pub struct TestChainOracle {
    state: Arc<Mutex<ChainState>>,
}

/// An error for the [TestChainOracle].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TestOracleError {
    /// The block was not found.
    #[error("block {0} not found")]
    BlockNotFound(u64),
    /// No head has been set.
    #[error("no head block")]
    NoHead,
}

impl TestChainOracle {
    /// Creates a new [TestChainOracle] reporting `chain_id`.
    pub fn new(chain_id: u64) -> Self {
        Self { state: Arc::new(Mutex::new(ChainState { chain_id, ..Default::default() })) }
    }

    fn with<T>(&self, f: impl FnOnce(&mut ChainState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// Inserts a block.
    pub fn insert_block(&self, block: BlockRef) {
        self.with(|s| {
            s.blocks.insert(block.number, block);
        });
    }

    /// Sets the head block, inserting it as well.
    pub fn set_head(&self, block: BlockRef) {
        self.with(|s| {
            s.blocks.insert(block.number, block);
            s.head = Some(block);
        });
    }

    /// Returns the number of requests served.
    pub fn request_count(&self) -> usize {
        self.with(|s| s.requests)
    }
}

#[async_trait]
impl ChainRefOracle for TestChainOracle {
    type Error = TestOracleError;

    async fn chain_id(&self) -> Result<u64, Self::Error> {
        Ok(self.with(|s| {
            s.requests += 1;
            s.chain_id
        }))
    }

    async fn block_ref_by_number(&self, number: u64) -> Result<BlockRef, Self::Error> {
        self.with(|s| {
            s.requests += 1;
            s.blocks.get(&number).copied().ok_or(TestOracleError::BlockNotFound(number))
        })
    }

    async fn latest_block_ref(&self) -> Result<BlockRef, Self::Error> {
        self.with(|s| {
            s.requests += 1;
            s.head.ok_or(TestOracleError::NoHead)
        })
    }
}
