use kronos_core::constants::DAG_MAX_PARENTS;
use kronos_core::types::{BlockId, SphincsSignature, Timestamp, Window};
use kronos_core::Block;
use kronos_crypto::{block_id_from_body, merkle_root, KeyPair};
use kronos_mempool::Mempool;
use kronos_temporal::vdf;

/// Select up to `DAG_MAX_PARENTS` current tips to reference as parents,
/// preferring the caller's supplied order (typically heaviest-first).
pub fn select_parents(tips: &[BlockId]) -> Vec<BlockId> {
    tips.iter().take(DAG_MAX_PARENTS).cloned().collect()
}

/// Pull transactions from the mempool in priority order, bounded by
/// `max_bytes` of combined serialized body size.
pub fn collect_transactions(
    mempool: &Mempool,
    max_bytes: usize,
) -> Vec<kronos_core::Transaction> {
    let mut selected = Vec::new();
    let mut used = 0usize;
    for tx in mempool.by_priority() {
        let size = tx.body_bytes().len();
        if used + size > max_bytes {
            continue;
        }
        used += size;
        selected.push(tx.clone());
    }
    selected
}

/// Assemble, embed proofs for, and sign a new block for the elected
/// producer's slot. The caller is responsible for having already
/// confirmed this producer won the lottery for `window`.
#[allow(clippy::too_many_arguments)]
pub fn produce_block(
    keypair: &KeyPair,
    parents: Vec<BlockId>,
    window: Window,
    vrf_seed: &[u8],
    vdf_seed: &[u8],
    vdf_iterations: u64,
    transactions: Vec<kronos_core::Transaction>,
    timestamp_secs: Timestamp,
    timestamp_nanos: u32,
) -> Block {
    let (vrf_output, vrf_proof) = keypair.vrf_eval(vrf_seed);
    let vdf_proof = vdf::prove(vdf_seed, vdf_iterations);
    let vdf_proof_bytes = bincode::serialize(&vdf_proof).expect("vdf proof serialization is infallible");

    let tx_leaves: Vec<[u8; 32]> = transactions.iter().map(|t| *t.tx_id.as_bytes()).collect();
    let tx_root = merkle_root(&tx_leaves);

    let mut block = Block {
        block_id: BlockId::from_bytes([0u8; 32]),
        parents,
        producer: keypair.participant_id.clone(),
        producer_key: keypair.public_key.clone(),
        window,
        vrf_output,
        vrf_proof,
        tx_root,
        transactions,
        vdf_output: vdf_proof.output,
        vdf_proof: vdf_proof_bytes,
        timestamp_secs,
        timestamp_nanos,
        signature: SphincsSignature(vec![]),
    };

    let body_bytes = block.body_bytes();
    block.block_id = block_id_from_body(&body_bytes);
    block.signature = keypair.sign(&body_bytes);
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_parents_caps_at_dag_max() {
        let tips: Vec<BlockId> = (0..20).map(|i| BlockId::from_bytes([i as u8; 32])).collect();
        assert_eq!(select_parents(&tips).len(), DAG_MAX_PARENTS);
    }

    #[test]
    fn produced_block_has_consistent_id_and_signature() {
        let kp = KeyPair::generate();
        let block = produce_block(
            &kp,
            vec![BlockId::from_bytes([1u8; 32])],
            5,
            b"vrf-seed",
            b"vdf-seed",
            200,
            vec![],
            100,
            0,
        );
        let recomputed_id = block_id_from_body(&block.body_bytes());
        assert_eq!(block.block_id, recomputed_id);
        assert!(kronos_crypto::verify_signature(&block.producer_key, &block.body_bytes(), &block.signature).is_ok());
    }
}
