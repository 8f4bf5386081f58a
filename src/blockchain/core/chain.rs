use crate::config::{LedgerConfig, CUT_OFF_AGE};
use crate::crypto::Identity;
use crate::error::ChainError;
use crate::mempool::TransactionPool;
use crate::transaction::{apply_all, Transaction};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::{debug, info};

use super::state::UtxoSnapshot;

pub type Sha256Hash = [u8; 32];

/// Value paid by the coinbase of a block built with [`Block::new`].
pub const COINBASE_REWARD: i64 = 25;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// `None` only for the genesis block.
    pub prev_block_hash: Option<Sha256Hash>,
    pub coinbase: Transaction,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// A block on top of `prev_block_hash` whose coinbase pays
    /// [`COINBASE_REWARD`] to `recipient`. Only a genesis coinbase reaches a snapshot.
    pub fn new(prev_block_hash: Option<Sha256Hash>, recipient: Identity) -> Self {
        // Coinbases on different parents must not collide in the UTXO set.
        let nonce = prev_block_hash
            .map(|hash| {
                let mut prefix = [0u8; 8];
                prefix.copy_from_slice(&hash[..8]);
                u64::from_le_bytes(prefix)
            })
            .unwrap_or(0);
        Self::with_coinbase(
            prev_block_hash,
            Transaction::coinbase_with_nonce(COINBASE_REWARD, recipient, nonce),
        )
    }

    pub fn genesis(coinbase: Transaction) -> Self {
        Self::with_coinbase(None, coinbase)
    }

    pub fn with_coinbase(prev_block_hash: Option<Sha256Hash>, coinbase: Transaction) -> Self {
        Block {
            prev_block_hash,
            coinbase,
            transactions: Vec::new(),
        }
    }

    pub fn add_transaction(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    pub fn prev_block_hash(&self) -> Option<&Sha256Hash> {
        self.prev_block_hash.as_ref()
    }

    pub fn coinbase(&self) -> &Transaction {
        &self.coinbase
    }

    /// The block's transactions in order, coinbase excluded.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The coinbase followed by every other transaction.
    pub fn all_transactions(&self) -> impl Iterator<Item = &Transaction> {
        std::iter::once(&self.coinbase).chain(self.transactions.iter())
    }

    pub fn hash(&self) -> Sha256Hash {
        let mut hasher = Sha256::new();
        match &self.prev_block_hash {
            Some(prev) => {
                hasher.update([1u8]);
                hasher.update(prev);
            }
            None => hasher.update([0u8]),
        }
        hasher.update(self.coinbase.hash());
        hasher.update((self.transactions.len() as u64).to_le_bytes());
        for tx in &self.transactions {
            hasher.update(tx.hash());
        }
        hasher.finalize().into()
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.hash())
    }
}

/// Position of a node in the block tree's arena.
pub type NodeId = usize;

/// An accepted block together with the unspent outputs valid after it.
#[derive(Debug, Clone)]
struct BlockNode {
    block: Block,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    snapshot: UtxoSnapshot,
    // Genesis is 1.
    height: u64,
}

/// Tree of accepted blocks rooted at genesis.
///
/// Nodes live in an arena and refer to their parent and children by index, so
/// a node can be navigated both ways without shared ownership. Every node
/// keeps its own snapshot. The tree tracks the highest node, keeping the first
/// one seen when heights tie, and refuses to grow forks that have fallen
/// `cut_off_age` or more blocks behind it.
#[derive(Debug, Clone)]
pub struct BlockTree {
    nodes: Vec<BlockNode>,
    index: HashMap<Sha256Hash, NodeId>,
    best: NodeId,
    cut_off_age: u64,
}

impl BlockTree {
    /// Roots a tree at `genesis`. Only the genesis coinbase is credited; the
    /// genesis block is trusted and nothing else in it is applied.
    pub fn new(genesis: Block, cut_off_age: u64) -> Self {
        let mut snapshot = UtxoSnapshot::new();
        snapshot.credit_outputs(genesis.coinbase());

        let genesis_hash = genesis.hash();
        info!(hash = %hex::encode(genesis_hash), utxos = snapshot.len(), "genesis block loaded");

        let mut index = HashMap::new();
        index.insert(genesis_hash, 0);
        BlockTree {
            nodes: vec![BlockNode {
                block: genesis,
                parent: None,
                children: Vec::new(),
                snapshot,
                height: 1,
            }],
            index,
            best: 0,
            cut_off_age,
        }
    }

    /// Validates `block` against its parent's snapshot and links it into the tree.
    ///
    /// On any error the tree is left untouched.
    pub fn insert(&mut self, block: Block) -> Result<Sha256Hash, ChainError> {
        let parent_hash = *block.prev_block_hash().ok_or(ChainError::MissingParent)?;

        let block_hash = block.hash();
        if self.index.contains_key(&block_hash) {
            return Err(ChainError::BlockAlreadyExists);
        }

        let parent_id = *self
            .index
            .get(&parent_hash)
            .ok_or_else(|| ChainError::UnknownParent(hex::encode(parent_hash)))?;
        let parent = &self.nodes[parent_id];

        // Only the genesis coinbase is ever credited.
        let mut snapshot = parent.snapshot.clone();
        apply_all(block.transactions(), &mut snapshot)?;

        let height = parent.height + 1;
        let max_height = self.max_height();
        if height.saturating_add(self.cut_off_age) <= max_height {
            return Err(ChainError::StaleFork {
                height,
                max_height,
                cut_off_age: self.cut_off_age,
            });
        }

        let id = self.nodes.len();
        self.nodes.push(BlockNode {
            block,
            parent: Some(parent_id),
            children: Vec::new(),
            snapshot,
            height,
        });
        self.nodes[parent_id].children.push(id);
        self.index.insert(block_hash, id);
        info!(hash = %hex::encode(block_hash), height, "block accepted");

        if height > max_height {
            self.best = id;
            info!(hash = %hex::encode(block_hash), height, "best tip advanced");
        }
        Ok(block_hash)
    }

    pub fn best_block(&self) -> &Block {
        &self.nodes[self.best].block
    }

    pub fn best_hash(&self) -> Sha256Hash {
        self.best_block().hash()
    }

    /// A copy of the best tip's snapshot; changing it has no effect on the tree.
    pub fn best_snapshot(&self) -> UtxoSnapshot {
        self.nodes[self.best].snapshot.clone()
    }

    pub fn max_height(&self) -> u64 {
        self.nodes[self.best].height
    }

    pub fn cut_off_age(&self) -> u64 {
        self.cut_off_age
    }

    pub fn genesis_hash(&self) -> Sha256Hash {
        self.nodes[0].block.hash()
    }

    pub fn contains_block(&self, hash: &Sha256Hash) -> bool {
        self.index.contains_key(hash)
    }

    pub fn block(&self, hash: &Sha256Hash) -> Option<&Block> {
        self.node(hash).map(|node| &node.block)
    }

    pub fn height_of(&self, hash: &Sha256Hash) -> Option<u64> {
        self.node(hash).map(|node| node.height)
    }

    pub fn snapshot_at(&self, hash: &Sha256Hash) -> Option<UtxoSnapshot> {
        self.node(hash).map(|node| node.snapshot.clone())
    }

    pub fn parent_of(&self, hash: &Sha256Hash) -> Option<Sha256Hash> {
        self.node(hash)
            .and_then(|node| node.parent)
            .map(|parent| self.nodes[parent].block.hash())
    }

    pub fn children_of(&self, hash: &Sha256Hash) -> Vec<Sha256Hash> {
        self.node(hash)
            .map(|node| {
                node.children
                    .iter()
                    .map(|child| self.nodes[*child].block.hash())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of accepted blocks, genesis included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, hash: &Sha256Hash) -> Option<&BlockNode> {
        self.index.get(hash).map(|id| &self.nodes[*id])
    }
}

/// The ledger: a block tree plus the pool of transactions still waiting for a block.
#[derive(Debug, Clone)]
pub struct Blockchain {
    tree: BlockTree,
    pool: TransactionPool,
}

impl Blockchain {
    /// Create a new `Blockchain` rooted at `genesis` with the default cut-off age.
    pub fn new(genesis: Block) -> Self {
        Self::with_cut_off_age(genesis, CUT_OFF_AGE)
    }

    pub fn with_config(genesis: Block, config: &LedgerConfig) -> Self {
        Self::with_cut_off_age(genesis, config.cut_off_age)
    }

    fn with_cut_off_age(genesis: Block, cut_off_age: u64) -> Self {
        Blockchain {
            tree: BlockTree::new(genesis, cut_off_age),
            pool: TransactionPool::new(),
        }
    }

    /// The block at the greatest height.
    pub fn best_block(&self) -> &Block {
        self.tree.best_block()
    }

    /// A copy of the unspent outputs at the best block.
    pub fn best_snapshot(&self) -> UtxoSnapshot {
        self.tree.best_snapshot()
    }

    /// Offers `block` to the ledger. Returns whether it was accepted; a
    /// rejected block leaves the ledger unchanged.
    pub fn add_block(&mut self, block: Block) -> bool {
        match self.try_add_block(block) {
            Ok(_) => true,
            Err(e) => {
                debug!(reason = %e, "block rejected");
                false
            }
        }
    }

    /// Like [`Blockchain::add_block`], but reports why a block was refused.
    pub fn try_add_block(&mut self, block: Block) -> Result<Sha256Hash, ChainError> {
        let hash = self.tree.insert(block)?;
        if let Some(block) = self.tree.block(&hash) {
            self.pool.remove_block_transactions(block);
        }
        Ok(hash)
    }

    /// Adds `tx` to the pending pool without validating it.
    pub fn submit_transaction(&mut self, tx: Transaction) {
        self.pool.add_transaction(tx);
    }

    pub fn add_transaction(&mut self, tx: Transaction) {
        self.submit_transaction(tx);
    }

    pub fn transaction_pool(&self) -> &TransactionPool {
        &self.pool
    }

    pub fn tree(&self) -> &BlockTree {
        &self.tree
    }

    pub fn max_height(&self) -> u64 {
        self.tree.max_height()
    }

    pub fn height_of(&self, hash: &Sha256Hash) -> Option<u64> {
        self.tree.height_of(hash)
    }

    pub fn contains_block(&self, hash: &Sha256Hash) -> bool {
        self.tree.contains_block(hash)
    }

    pub fn block(&self, hash: &Sha256Hash) -> Option<&Block> {
        self.tree.block(hash)
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
