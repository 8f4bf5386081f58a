use crate::transaction::{Transaction, TxOutput};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::chain::Sha256Hash;

/// Reference to one output: the hash of the transaction that produced it and
/// the output's position in that transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Utxo {
    pub tx_hash: Sha256Hash,
    pub index: u32,
}

impl Utxo {
    pub fn new(tx_hash: Sha256Hash, index: u32) -> Self {
        Utxo { tx_hash, index }
    }
}

impl fmt::Display for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(self.tx_hash), self.index)
    }
}

/// The unspent outputs valid at one block.
///
/// Every block node owns its own snapshot; `clone` is a deep copy, so a child
/// can be derived from its parent without the two ever sharing state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoSnapshot {
    utxo_set: HashMap<Utxo, TxOutput>,
}

impl UtxoSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, utxo: &Utxo) -> bool {
        self.utxo_set.contains_key(utxo)
    }

    pub fn get(&self, utxo: &Utxo) -> Option<&TxOutput> {
        self.utxo_set.get(utxo)
    }

    pub fn insert(&mut self, utxo: Utxo, output: TxOutput) {
        self.utxo_set.insert(utxo, output);
    }

    pub fn remove(&mut self, utxo: &Utxo) -> Option<TxOutput> {
        self.utxo_set.remove(utxo)
    }

    pub fn len(&self) -> usize {
        self.utxo_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxo_set.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Utxo, &TxOutput)> {
        self.utxo_set.iter()
    }

    /// Sum of every unspent output paid to `identity`.
    pub fn balance_of(&self, identity: &[u8]) -> i128 {
        self.utxo_set
            .values()
            .filter(|output| output.recipient == identity)
            .map(|output| output.value as i128)
            .sum()
    }

    /// Unspent outputs paid to `identity`, ordered by reference.
    pub fn outputs_for(&self, identity: &[u8]) -> Vec<(Utxo, TxOutput)> {
        let mut owned: Vec<(Utxo, TxOutput)> = self
            .utxo_set
            .iter()
            .filter(|(_, output)| output.recipient == identity)
            .map(|(utxo, output)| (*utxo, output.clone()))
            .collect();
        owned.sort_by(|a, b| a.0.cmp(&b.0));
        owned
    }

    /// Adds every output of `tx` without checking its inputs. Used for coinbases.
    pub fn credit_outputs(&mut self, tx: &Transaction) {
        let tx_hash = tx.hash();
        for (index, output) in tx.outputs.iter().enumerate() {
            self.insert(Utxo::new(tx_hash, index as u32), output.clone());
        }
    }

    /// Removes the outputs `tx` consumes and adds the ones it produces.
    /// The caller is responsible for having validated `tx` against this snapshot.
    pub fn apply_transaction(&mut self, tx: &Transaction) {
        for input in &tx.inputs {
            self.remove(&Utxo::new(input.prev_tx_hash, input.output_index));
        }
        self.credit_outputs(tx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(tag: u8) -> Vec<u8> {
        vec![tag; 33]
    }

    #[test]
    fn test_credit_outputs_keys_by_tx_hash_and_index() {
        let mut tx = Transaction::coinbase(100, identity(1));
        tx.add_output(identity(2), 5);
        let mut snapshot = UtxoSnapshot::new();
        snapshot.credit_outputs(&tx);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get(&Utxo::new(tx.hash(), 0)).unwrap().value, 100);
        assert_eq!(snapshot.get(&Utxo::new(tx.hash(), 1)).unwrap().value, 5);
        assert!(!snapshot.contains(&Utxo::new(tx.hash(), 2)));
    }

    #[test]
    fn test_apply_transaction_consumes_inputs() {
        let coinbase = Transaction::coinbase(100, identity(1));
        let mut snapshot = UtxoSnapshot::new();
        snapshot.credit_outputs(&coinbase);

        let mut spend = Transaction::new();
        spend.add_input(coinbase.hash(), 0);
        spend.add_output(identity(2), 60);
        spend.add_output(identity(1), 40);
        snapshot.apply_transaction(&spend);

        assert!(!snapshot.contains(&Utxo::new(coinbase.hash(), 0)));
        assert_eq!(snapshot.balance_of(&identity(2)), 60);
        assert_eq!(snapshot.balance_of(&identity(1)), 40);
        assert_eq!(snapshot.outputs_for(&identity(1)).len(), 1);
    }

    #[test]
    fn test_clone_is_independent() {
        let coinbase = Transaction::coinbase(100, identity(1));
        let mut parent = UtxoSnapshot::new();
        parent.credit_outputs(&coinbase);

        let mut child = parent.clone();
        child.remove(&Utxo::new(coinbase.hash(), 0));

        assert!(child.is_empty());
        assert_eq!(parent.len(), 1);
    }

    #[test]
    fn test_utxo_display() {
        let utxo = Utxo::new([0xab; 32], 3);
        assert_eq!(utxo.to_string(), format!("{}:3", "ab".repeat(32)));
    }
}
