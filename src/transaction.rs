//! Transaction module split into types and validation for better modularity

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{apply_all, apply_batch, is_valid, TxHandler};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{Utxo, UtxoSnapshot};
    use crate::crypto::KeyPair;
    use crate::error::ChainError;

    /// A snapshot holding one coinbase output of `value` owned by `owner`.
    fn funded_snapshot(owner: &KeyPair, value: i64) -> (UtxoSnapshot, Transaction) {
        let coinbase = Transaction::coinbase(value, owner.identity());
        let mut snapshot = UtxoSnapshot::new();
        snapshot.credit_outputs(&coinbase);
        (snapshot, coinbase)
    }

    fn spend(
        owner: &KeyPair,
        inputs: &[(crate::blockchain::Sha256Hash, u32)],
        outputs: &[(&KeyPair, i64)],
    ) -> Transaction {
        let mut tx = Transaction::new();
        for (hash, index) in inputs {
            tx.add_input(*hash, *index);
        }
        for (recipient, value) in outputs {
            tx.add_output(recipient.identity(), *value);
        }
        for index in 0..inputs.len() {
            tx.sign_input_with(index, owner).unwrap();
        }
        tx
    }

    #[test]
    fn test_split_with_fee_is_valid() {
        let alice = KeyPair::generate().unwrap();
        let bob = KeyPair::generate().unwrap();
        let (snapshot, coinbase) = funded_snapshot(&alice, 100);

        let tx = spend(&alice, &[(coinbase.hash(), 0)], &[(&bob, 40), (&alice, 50)]);
        assert!(tx.validate(&snapshot).is_ok());
        assert!(is_valid(&tx, &snapshot));
    }

    #[test]
    fn test_outputs_exceeding_inputs_rejected() {
        let alice = KeyPair::generate().unwrap();
        let bob = KeyPair::generate().unwrap();
        let (snapshot, coinbase) = funded_snapshot(&alice, 100);

        let tx = spend(&alice, &[(coinbase.hash(), 0)], &[(&bob, 60), (&alice, 50)]);
        assert_eq!(
            tx.validate(&snapshot),
            Err(ChainError::InsufficientInputValue {
                inputs: 100,
                outputs: 110
            })
        );
    }

    #[test]
    fn test_unknown_utxo_rejected() {
        let alice = KeyPair::generate().unwrap();
        let (snapshot, _) = funded_snapshot(&alice, 100);

        let tx = spend(&alice, &[([7u8; 32], 0)], &[(&alice, 1)]);
        assert!(matches!(
            tx.validate(&snapshot),
            Err(ChainError::UtxoNotFound(_))
        ));
    }

    #[test]
    fn test_same_utxo_twice_in_one_transaction_rejected() {
        let alice = KeyPair::generate().unwrap();
        let (snapshot, coinbase) = funded_snapshot(&alice, 100);

        let tx = spend(
            &alice,
            &[(coinbase.hash(), 0), (coinbase.hash(), 0)],
            &[(&alice, 150)],
        );
        assert!(matches!(
            tx.validate(&snapshot),
            Err(ChainError::DoubleSpend(_))
        ));
    }

    #[test]
    fn test_signature_by_non_owner_rejected() {
        let alice = KeyPair::generate().unwrap();
        let mallory = KeyPair::generate().unwrap();
        let (snapshot, coinbase) = funded_snapshot(&alice, 100);

        let tx = spend(&mallory, &[(coinbase.hash(), 0)], &[(&mallory, 100)]);
        assert!(matches!(
            tx.validate(&snapshot),
            Err(ChainError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_unsigned_input_rejected() {
        let alice = KeyPair::generate().unwrap();
        let (snapshot, coinbase) = funded_snapshot(&alice, 100);

        let mut tx = Transaction::new();
        tx.add_input(coinbase.hash(), 0);
        tx.add_output(alice.identity(), 10);
        assert!(matches!(
            tx.validate(&snapshot),
            Err(ChainError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_signature_bound_to_input_index() {
        let alice = KeyPair::generate().unwrap();
        let coinbase_a = Transaction::coinbase_with_nonce(30, alice.identity(), 1);
        let coinbase_b = Transaction::coinbase_with_nonce(30, alice.identity(), 2);
        let mut snapshot = UtxoSnapshot::new();
        snapshot.credit_outputs(&coinbase_a);
        snapshot.credit_outputs(&coinbase_b);

        let mut tx = Transaction::new();
        tx.add_input(coinbase_a.hash(), 0);
        tx.add_input(coinbase_b.hash(), 0);
        tx.add_output(alice.identity(), 60);
        tx.sign_input_with(0, &alice).unwrap();
        let reused = tx.inputs[0].signature.clone().unwrap();
        tx.sign_input(1, reused).unwrap();

        assert!(!is_valid(&tx, &snapshot));
        tx.sign_input_with(1, &alice).unwrap();
        assert!(is_valid(&tx, &snapshot));
    }

    #[test]
    fn test_negative_output_rejected() {
        let alice = KeyPair::generate().unwrap();
        let bob = KeyPair::generate().unwrap();
        let (snapshot, coinbase) = funded_snapshot(&alice, 100);

        let tx = spend(&alice, &[(coinbase.hash(), 0)], &[(&bob, 120), (&alice, -30)]);
        assert_eq!(
            tx.validate(&snapshot),
            Err(ChainError::NegativeOutput {
                index: 1,
                value: -30
            })
        );
    }

    #[test]
    fn test_validation_does_not_mutate_snapshot() {
        let alice = KeyPair::generate().unwrap();
        let (snapshot, coinbase) = funded_snapshot(&alice, 100);
        let before = snapshot.clone();

        let tx = spend(&alice, &[(coinbase.hash(), 0)], &[(&alice, 100)]);
        assert!(is_valid(&tx, &snapshot));
        assert_eq!(snapshot, before);
    }

    #[test]
    fn test_apply_batch_accepts_dependent_transaction_in_order() {
        let alice = KeyPair::generate().unwrap();
        let bob = KeyPair::generate().unwrap();
        let (mut snapshot, coinbase) = funded_snapshot(&alice, 100);

        let first = spend(&alice, &[(coinbase.hash(), 0)], &[(&bob, 100)]);
        let second = spend(&bob, &[(first.hash(), 0)], &[(&alice, 90)]);

        let accepted = apply_batch(&[first.clone(), second.clone()], &mut snapshot);
        assert_eq!(accepted, vec![first, second.clone()]);
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains(&Utxo::new(second.hash(), 0)));
    }

    #[test]
    fn test_apply_batch_never_reorders() {
        let alice = KeyPair::generate().unwrap();
        let bob = KeyPair::generate().unwrap();
        let (mut snapshot, coinbase) = funded_snapshot(&alice, 100);

        let first = spend(&alice, &[(coinbase.hash(), 0)], &[(&bob, 100)]);
        let second = spend(&bob, &[(first.hash(), 0)], &[(&alice, 90)]);

        let accepted = apply_batch(&[second, first.clone()], &mut snapshot);
        assert_eq!(accepted, vec![first.clone()]);
        assert!(snapshot.contains(&Utxo::new(first.hash(), 0)));
    }

    #[test]
    fn test_apply_batch_skips_conflicting_spend() {
        let alice = KeyPair::generate().unwrap();
        let bob = KeyPair::generate().unwrap();
        let carol = KeyPair::generate().unwrap();
        let (mut snapshot, coinbase) = funded_snapshot(&alice, 100);

        let to_bob = spend(&alice, &[(coinbase.hash(), 0)], &[(&bob, 100)]);
        let to_carol = spend(&alice, &[(coinbase.hash(), 0)], &[(&carol, 100)]);

        let accepted = apply_batch(&[to_bob.clone(), to_carol], &mut snapshot);
        assert_eq!(accepted, vec![to_bob]);
        assert_eq!(snapshot.balance_of(&bob.identity()), 100);
        assert_eq!(snapshot.balance_of(&carol.identity()), 0);
    }

    #[test]
    fn test_apply_all_is_all_or_nothing() {
        let alice = KeyPair::generate().unwrap();
        let bob = KeyPair::generate().unwrap();
        let carol = KeyPair::generate().unwrap();
        let (mut snapshot, coinbase) = funded_snapshot(&alice, 100);
        let before = snapshot.clone();

        let to_bob = spend(&alice, &[(coinbase.hash(), 0)], &[(&bob, 100)]);
        let to_carol = spend(&alice, &[(coinbase.hash(), 0)], &[(&carol, 100)]);

        let result = apply_all(&[to_bob.clone(), to_carol], &mut snapshot);
        assert!(matches!(result, Err(ChainError::InvalidTransaction(_))));
        assert_eq!(snapshot, before);

        apply_all(&[to_bob], &mut snapshot).unwrap();
        assert_eq!(snapshot.balance_of(&bob.identity()), 100);
    }

    #[test]
    fn test_tx_handler_keeps_callers_snapshot() {
        let alice = KeyPair::generate().unwrap();
        let bob = KeyPair::generate().unwrap();
        let (snapshot, coinbase) = funded_snapshot(&alice, 100);

        let mut handler = TxHandler::new(&snapshot);
        let tx = spend(&alice, &[(coinbase.hash(), 0)], &[(&bob, 100)]);
        assert!(handler.is_valid_tx(&tx));
        assert_eq!(handler.handle_txs(&[tx.clone(), tx.clone()]), vec![tx.clone()]);

        assert!(!handler.is_valid_tx(&tx));
        assert!(snapshot.contains(&Utxo::new(coinbase.hash(), 0)));
        assert_eq!(handler.snapshot().balance_of(&bob.identity()), 100);
    }

    #[test]
    fn test_hash_covers_signatures_but_signable_message_does_not() {
        let alice = KeyPair::generate().unwrap();
        let mut tx = Transaction::new();
        tx.add_input([1u8; 32], 0);
        tx.add_output(alice.identity(), 5);

        let unsigned_hash = tx.hash();
        let message = tx.signable_message(0);
        tx.sign_input_with(0, &alice).unwrap();

        assert_ne!(tx.hash(), unsigned_hash);
        assert_eq!(tx.signable_message(0), message);
        assert_ne!(tx.signable_message(1), message);
    }

    #[test]
    fn test_sign_input_out_of_range() {
        let mut tx = Transaction::new();
        assert!(tx.sign_input(0, vec![0u8; 64]).is_err());
    }

    #[test]
    fn test_coinbase_nonce_changes_hash() {
        let alice = KeyPair::generate().unwrap();
        let a = Transaction::coinbase_with_nonce(25, alice.identity(), 1);
        let b = Transaction::coinbase_with_nonce(25, alice.identity(), 2);
        assert!(a.is_coinbase());
        assert_ne!(a.hash(), b.hash());
    }
}
