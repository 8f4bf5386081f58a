//! Thread-safe handle to a ledger
//!
//! The block tree and the pending pool sit behind separate locks. Adding a
//! block holds the tree's write lock for the whole check-and-insert, so two
//! racing blocks can never both be judged against a stale best height. Pool
//! entries are dropped afterwards, once the tree lock has been released.

use crate::blockchain::{Block, BlockTree, Sha256Hash, UtxoSnapshot};
use crate::config::{LedgerConfig, CUT_OFF_AGE};
use crate::error::ChainError;
use crate::mempool::TransactionPool;
use crate::transaction::Transaction;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::debug;

struct SharedInner {
    tree: RwLock<BlockTree>,
    pool: Mutex<TransactionPool>,
}

/// Cloneable handle; every clone refers to the same ledger.
#[derive(Clone)]
pub struct SharedBlockchain {
    inner: Arc<SharedInner>,
}

impl SharedBlockchain {
    pub fn new(genesis: Block) -> Self {
        Self::with_cut_off_age(genesis, CUT_OFF_AGE)
    }

    pub fn with_config(genesis: Block, config: &LedgerConfig) -> Self {
        Self::with_cut_off_age(genesis, config.cut_off_age)
    }

    fn with_cut_off_age(genesis: Block, cut_off_age: u64) -> Self {
        SharedBlockchain {
            inner: Arc::new(SharedInner {
                tree: RwLock::new(BlockTree::new(genesis, cut_off_age)),
                pool: Mutex::new(TransactionPool::new()),
            }),
        }
    }

    pub fn best_block(&self) -> Block {
        self.inner.tree.read().best_block().clone()
    }

    pub fn best_snapshot(&self) -> UtxoSnapshot {
        self.inner.tree.read().best_snapshot()
    }

    pub fn max_height(&self) -> u64 {
        self.inner.tree.read().max_height()
    }

    pub fn len(&self) -> usize {
        self.inner.tree.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.tree.read().is_empty()
    }

    pub fn contains_block(&self, hash: &Sha256Hash) -> bool {
        self.inner.tree.read().contains_block(hash)
    }

    pub fn height_of(&self, hash: &Sha256Hash) -> Option<u64> {
        self.inner.tree.read().height_of(hash)
    }

    pub fn add_block(&self, block: Block) -> bool {
        match self.try_add_block(block) {
            Ok(_) => true,
            Err(e) => {
                debug!(reason = %e, "block rejected");
                false
            }
        }
    }

    pub fn try_add_block(&self, block: Block) -> Result<Sha256Hash, ChainError> {
        let included = block.clone();
        let hash = self.inner.tree.write().insert(block)?;
        self.inner.pool.lock().remove_block_transactions(&included);
        Ok(hash)
    }

    pub fn submit_transaction(&self, tx: Transaction) {
        self.inner.pool.lock().add_transaction(tx);
    }

    pub fn pending_len(&self) -> usize {
        self.inner.pool.lock().len()
    }

    pub fn is_pending(&self, hash: &Sha256Hash) -> bool {
        self.inner.pool.lock().contains(hash)
    }

    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.inner.pool.lock().transactions()
    }
}
