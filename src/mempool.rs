//! Pending transactions that no accepted block has included yet

use crate::blockchain::{Block, Sha256Hash};
use crate::transaction::Transaction;
use std::collections::HashMap;
use tracing::debug;

/// Transactions submitted to the ledger, indexed by their hash.
///
/// Nothing is validated on the way in; a transaction is only checked once a
/// block that includes it is offered to the ledger.
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    transactions: HashMap<Sha256Hash, Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `tx`, replacing any pooled transaction with the same hash.
    pub fn add_transaction(&mut self, tx: Transaction) {
        let hash = tx.hash();
        if self.transactions.insert(hash, tx).is_none() {
            debug!(tx = %hex::encode(hash), pending = self.transactions.len(), "transaction pooled");
        }
    }

    pub fn remove_transaction(&mut self, hash: &Sha256Hash) -> Option<Transaction> {
        self.transactions.remove(hash)
    }

    /// Drops every transaction that `block` includes, coinbase included.
    pub fn remove_block_transactions(&mut self, block: &Block) {
        for tx in block.all_transactions() {
            self.remove_transaction(&tx.hash());
        }
    }

    pub fn get(&self, hash: &Sha256Hash) -> Option<&Transaction> {
        self.transactions.get(hash)
    }

    pub fn contains(&self, hash: &Sha256Hash) -> bool {
        self.transactions.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.transactions.values().cloned().collect()
    }
}
