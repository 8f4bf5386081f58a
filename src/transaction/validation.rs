/// Validation logic for transactions separated from type definitions
use crate::blockchain::{Utxo, UtxoSnapshot};
use crate::error::ChainError;
use crate::transaction::types::Transaction;
use std::collections::HashSet;
use tracing::trace;

impl Transaction {
    /// Validate this transaction against an unspent-output snapshot.
    ///
    /// Each input must reference an output present in `snapshot`, must not be
    /// claimed twice within this transaction, and must carry a signature by
    /// the output's recipient. Outputs must be non-negative and may not sum to
    /// more than the inputs; any difference is an implicit fee.
    pub fn validate(&self, snapshot: &UtxoSnapshot) -> Result<(), ChainError> {
        let mut claimed = HashSet::new();
        let mut input_sum: i128 = 0;

        for (index, input) in self.inputs.iter().enumerate() {
            let utxo = Utxo::new(input.prev_tx_hash, input.output_index);
            let output = snapshot
                .get(&utxo)
                .ok_or_else(|| ChainError::UtxoNotFound(utxo.to_string()))?;

            if !claimed.insert(utxo) {
                return Err(ChainError::DoubleSpend(format!(
                    "Input {} claims {} a second time",
                    index, utxo
                )));
            }

            let signature = input.signature.as_ref().ok_or_else(|| {
                ChainError::InvalidSignature(format!("Input {} is not signed", index))
            })?;
            crate::crypto::verify_signature(
                &output.recipient,
                &self.signable_message(index),
                signature,
            )
            .map_err(|e| ChainError::InvalidSignature(format!("Input {}: {}", index, e)))?;

            input_sum += output.value as i128;
        }

        let mut output_sum: i128 = 0;
        for (index, output) in self.outputs.iter().enumerate() {
            if output.value < 0 {
                return Err(ChainError::NegativeOutput {
                    index,
                    value: output.value,
                });
            }
            output_sum += output.value as i128;
        }

        if input_sum < output_sum {
            return Err(ChainError::InsufficientInputValue {
                inputs: input_sum,
                outputs: output_sum,
            });
        }
        Ok(())
    }
}

/// Whether `tx` is valid against `snapshot`.
pub fn is_valid(tx: &Transaction, snapshot: &UtxoSnapshot) -> bool {
    match tx.validate(snapshot) {
        Ok(()) => true,
        Err(e) => {
            trace!(tx = %tx.hash_str(), reason = %e, "transaction rejected");
            false
        }
    }
}

/// Applies the valid transactions of `txs` to `snapshot`, in order, and returns them.
///
/// Each transaction is checked against the snapshot as left by the ones
/// accepted before it, so a transaction spending an output created earlier in
/// the same batch is accepted. Invalid transactions are skipped with no effect.
pub fn apply_batch(txs: &[Transaction], snapshot: &mut UtxoSnapshot) -> Vec<Transaction> {
    let mut accepted = Vec::with_capacity(txs.len());
    for tx in txs {
        if is_valid(tx, snapshot) {
            snapshot.apply_transaction(tx);
            accepted.push(tx.clone());
        }
    }
    accepted
}

/// Applies every transaction of `txs` to `snapshot`, or none of them.
///
/// Stops at the first invalid transaction and returns its reason; `snapshot`
/// is then left exactly as it was.
pub fn apply_all(txs: &[Transaction], snapshot: &mut UtxoSnapshot) -> Result<(), ChainError> {
    let mut scratch = snapshot.clone();
    for (position, tx) in txs.iter().enumerate() {
        tx.validate(&scratch).map_err(|e| {
            ChainError::InvalidTransaction(format!(
                "Transaction {} ({}) rejected: {}",
                position,
                tx.hash_str(),
                e
            ))
        })?;
        scratch.apply_transaction(tx);
    }
    *snapshot = scratch;
    Ok(())
}

/// Handles transactions against a private copy of an unspent-output snapshot.
///
/// The snapshot given to `new` is copied, so the caller's value never changes;
/// `handle_txs` advances only the handler's own copy.
#[derive(Debug, Clone)]
pub struct TxHandler {
    snapshot: UtxoSnapshot,
}

impl TxHandler {
    pub fn new(snapshot: &UtxoSnapshot) -> Self {
        TxHandler {
            snapshot: snapshot.clone(),
        }
    }

    pub fn is_valid_tx(&self, tx: &Transaction) -> bool {
        is_valid(tx, &self.snapshot)
    }

    /// Accepts a mutually valid subset of `possible_txs`, in order, and updates
    /// the handler's snapshot with it.
    pub fn handle_txs(&mut self, possible_txs: &[Transaction]) -> Vec<Transaction> {
        apply_batch(possible_txs, &mut self.snapshot)
    }

    pub fn snapshot(&self) -> &UtxoSnapshot {
        &self.snapshot
    }
}
