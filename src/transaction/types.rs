/// Transaction types for BranchLedger
use crate::blockchain::Sha256Hash;
use crate::crypto::{Identity, KeyPair};
use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A claim on one unspent output, plus the signature authorizing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub prev_tx_hash: Sha256Hash,
    pub output_index: u32,
    pub signature: Option<Vec<u8>>,
}

impl TxInput {
    pub fn new(prev_tx_hash: Sha256Hash, output_index: u32) -> Self {
        TxInput {
            prev_tx_hash,
            output_index,
            signature: None,
        }
    }
}

/// Value paid to a recipient identity.
///
/// Values are signed so that a negative output can be expressed and then
/// refused by validation instead of silently wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub recipient: Identity,
    pub value: i64,
}

impl TxOutput {
    pub fn new(recipient: Identity, value: i64) -> Self {
        TxOutput { recipient, value }
    }
}

/// An ordered list of inputs spending earlier outputs and an ordered list of new outputs.
/// A transaction without inputs is a coinbase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// Distinguishes otherwise identical coinbases.
    #[serde(default)]
    pub nonce: u64,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// A coinbase paying `value` to `recipient`.
    pub fn coinbase(value: i64, recipient: Identity) -> Self {
        Self::coinbase_with_nonce(value, recipient, 0)
    }

    pub fn coinbase_with_nonce(value: i64, recipient: Identity, nonce: u64) -> Self {
        Transaction {
            inputs: Vec::new(),
            outputs: vec![TxOutput::new(recipient, value)],
            nonce,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    pub fn add_input(&mut self, prev_tx_hash: Sha256Hash, output_index: u32) {
        self.inputs.push(TxInput::new(prev_tx_hash, output_index));
    }

    pub fn add_output(&mut self, recipient: Identity, value: i64) {
        self.outputs.push(TxOutput::new(recipient, value));
    }

    /// Attaches a signature to the input at `index`.
    pub fn sign_input(&mut self, index: usize, signature: Vec<u8>) -> Result<(), ChainError> {
        let input = self.inputs.get_mut(index).ok_or_else(|| {
            ChainError::InvalidTransaction(format!("No input at index {}", index))
        })?;
        input.signature = Some(signature);
        Ok(())
    }

    /// Signs the input at `index` with `keypair` over `signable_message(index)`.
    pub fn sign_input_with(&mut self, index: usize, keypair: &KeyPair) -> Result<(), ChainError> {
        let message = self.signable_message(index);
        let signature = keypair.sign(&message)?;
        self.sign_input(index, signature.to_vec())
    }

    /// Bytes the signature of input `index` must cover.
    ///
    /// Every signature field is left out, so inputs can be signed in any order,
    /// and the input index is mixed in so one signature cannot authorize a
    /// different input of the same transaction.
    pub fn signable_message(&self, index: usize) -> Vec<u8> {
        let mut message = Vec::new();
        message.extend_from_slice(&(index as u64).to_le_bytes());
        self.write_body(&mut message, false);
        message
    }

    /// Calculate the hash of this transaction, signatures included.
    pub fn hash(&self) -> Sha256Hash {
        let mut body = Vec::new();
        self.write_body(&mut body, true);
        Sha256::digest(&body).into()
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.hash())
    }

    pub fn total_output_value(&self) -> i128 {
        self.outputs.iter().map(|output| output.value as i128).sum()
    }

    fn write_body(&self, buf: &mut Vec<u8>, with_signatures: bool) {
        buf.extend_from_slice(&self.nonce.to_le_bytes());
        buf.extend_from_slice(&(self.inputs.len() as u64).to_le_bytes());
        for input in &self.inputs {
            buf.extend_from_slice(&input.prev_tx_hash);
            buf.extend_from_slice(&input.output_index.to_le_bytes());
            if with_signatures {
                match &input.signature {
                    Some(signature) => {
                        buf.push(1);
                        write_bytes(buf, signature);
                    }
                    None => buf.push(0),
                }
            }
        }
        buf.extend_from_slice(&(self.outputs.len() as u64).to_le_bytes());
        for output in &self.outputs {
            write_bytes(buf, &output.recipient);
            buf.extend_from_slice(&output.value.to_le_bytes());
        }
    }
}

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    buf.extend_from_slice(bytes);
}
