pub mod error;
pub mod pool;

pub use error::MempoolError;
pub use pool::{Mempool, MempoolEvent, RemovalReason, UnspentView};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use kronos_core::types::{OutputId, PrivacyTier, TxId};
    use kronos_core::{Transaction, TxInput, TxOutput};

    use super::*;

    struct FakeUtxos(HashSet<OutputId>);

    impl UnspentView for FakeUtxos {
        fn contains(&self, output_id: &OutputId) -> bool {
            self.0.contains(output_id)
        }
    }

    fn output_id(tag: u8, index: u32) -> OutputId {
        OutputId {
            tx_id: TxId::from_bytes([tag; 32]),
            index,
        }
    }

    fn participant(tag: u8) -> kronos_core::types::ParticipantId {
        kronos_core::types::ParticipantId::from_bytes([tag; 32])
    }

    fn sample_tx(tag: u8, spends: OutputId, fee: u128) -> Transaction {
        Transaction {
            tx_id: TxId::from_bytes([tag; 32]),
            inputs: vec![TxInput {
                output_id: spends,
                signature: kronos_core::types::SphincsSignature(vec![0u8; 8]),
            }],
            outputs: vec![TxOutput {
                owner: participant(tag),
                amount: 100,
                tier: PrivacyTier::T0,
            }],
            timestamp: 0,
            fee,
            authorizer: Some(kronos_core::types::SphincsPublicKey(vec![0u8; 8])),
        }
    }

    #[test]
    fn admits_transaction_with_existing_input() {
        let spent = output_id(9, 0);
        let utxos = FakeUtxos(HashSet::from([spent.clone()]));
        let mut pool = Mempool::new(1 << 20);
        let events = pool.insert(sample_tx(1, spent, 10), &utxos, 0).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn rejects_transaction_with_missing_input() {
        let utxos = FakeUtxos(HashSet::new());
        let mut pool = Mempool::new(1 << 20);
        let err = pool
            .insert(sample_tx(1, output_id(9, 0), 10), &utxos, 0)
            .unwrap_err();
        assert!(matches!(err, MempoolError::FeeTooLow));
    }

    #[test]
    fn higher_fee_conflict_evicts_lower_fee_entry() {
        let spent = output_id(9, 0);
        let utxos = FakeUtxos(HashSet::from([spent.clone()]));
        let mut pool = Mempool::new(1 << 20);
        pool.insert(sample_tx(1, spent.clone(), 10), &utxos, 0).unwrap();
        let events = pool.insert(sample_tx(2, spent, 50), &utxos, 1).unwrap();
        assert!(events
            .iter()
            .any(|e| matches!(e, MempoolEvent::Removed(_, RemovalReason::Conflict))));
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&TxId::from_bytes([2; 32])));
    }

    #[test]
    fn lower_fee_conflict_is_rejected() {
        let spent = output_id(9, 0);
        let utxos = FakeUtxos(HashSet::from([spent.clone()]));
        let mut pool = Mempool::new(1 << 20);
        pool.insert(sample_tx(1, spent.clone(), 50), &utxos, 0).unwrap();
        let err = pool.insert(sample_tx(2, spent, 10), &utxos, 1).unwrap_err();
        assert!(matches!(err, MempoolError::FeeTooLow));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn expiry_removes_stale_entries() {
        let spent = output_id(9, 0);
        let utxos = FakeUtxos(HashSet::from([spent.clone()]));
        let mut pool = Mempool::new(1 << 20);
        pool.insert(sample_tx(1, spent, 10), &utxos, 0).unwrap();
        let events = pool.expire(24 * 3600 + 1);
        assert_eq!(events.len(), 1);
        assert!(pool.is_empty());
    }

    #[test]
    fn priority_orders_by_fee_per_byte_descending() {
        let low = output_id(9, 0);
        let high = output_id(10, 0);
        let utxos = FakeUtxos(HashSet::from([low.clone(), high.clone()]));
        let mut pool = Mempool::new(1 << 20);
        pool.insert(sample_tx(1, low, 5), &utxos, 0).unwrap();
        pool.insert(sample_tx(2, high, 500), &utxos, 0).unwrap();
        let ordered: Vec<_> = pool.by_priority().map(|tx| tx.tx_id.clone()).collect();
        assert_eq!(ordered[0], TxId::from_bytes([2; 32]));
    }
}
