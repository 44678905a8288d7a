use kronos_core::block::Block;
use kronos_core::constants::{DAG_MAX_PARENTS, DAG_MIN_PARENTS};
use kronos_core::error::KronosError;
use kronos_core::types::{BlockId, SphincsPublicKey, Timestamp};
use kronos_crypto::{block_id_from_body, verify_signature, vrf_verify};
use kronos_temporal::{clock, vdf};

/// Validate a block's structure and cryptography before it is admitted as a
/// DAG vertex. Checks, in order:
///
/// 1. Parent count bounds (skipped for genesis).
/// 2. Every claimed parent is already known (caller supplies the lookup).
/// 3. `block_id` integrity: recomputed from the body and compared.
/// 4. Producer signature over the body.
/// 5. Timestamp within clock tolerance of `now`.
/// 6. VRF output/proof validity against the producer's public key and the
///    window seed supplied by the caller.
/// 7. Sequential delay-function proof validity.
///
/// Balance, double-spend, and reputation/leader-eligibility checks are not
/// performed here; they belong to kronos-state and kronos-consensus, which
/// have the state needed to evaluate them.
pub fn validate_block<F>(
    block: &Block,
    vrf_seed: &[u8],
    vdf_seed: &[u8],
    now: Timestamp,
    parent_exists: F,
) -> Result<(), KronosError>
where
    F: Fn(&BlockId) -> bool,
{
    let is_genesis = block.parents.is_empty();

    if !is_genesis {
        if block.parents.len() < DAG_MIN_PARENTS {
            return Err(KronosError::TooFewParents {
                min: DAG_MIN_PARENTS,
                got: block.parents.len(),
            });
        }
        if block.parents.len() > DAG_MAX_PARENTS {
            return Err(KronosError::TooManyParents {
                max: DAG_MAX_PARENTS,
                got: block.parents.len(),
            });
        }
        for parent_id in &block.parents {
            if !parent_exists(parent_id) {
                return Err(KronosError::UnknownParent(parent_id.to_hex()));
            }
        }
    }

    let body_bytes = block.body_bytes();

    let expected_id = block_id_from_body(&body_bytes);
    if expected_id != block.block_id {
        return Err(KronosError::BadEncoding(
            "block_id does not match recomputed body hash".into(),
        ));
    }

    verify_signature(&block.producer_key, &body_bytes, &block.signature)
        .map_err(|_| KronosError::BadSignature)?;

    clock::check_tolerance(block.timestamp_secs, now).map_err(|_| KronosError::ClockSkew)?;

    if !is_genesis {
        vrf_verify(
            &block.producer_key,
            vrf_seed,
            &block.vrf_output,
            &block.vrf_proof,
        )
        .map_err(|_| KronosError::ProofInvalid)?;

        let vdf_proof = bincode::deserialize::<vdf::VdfProof>(&block.vdf_proof)
            .map_err(|e| KronosError::Serialization(e.to_string()))?;
        if vdf_proof.output != block.vdf_output {
            return Err(KronosError::ProofInvalid);
        }
        vdf::verify(vdf_seed, &vdf_proof).map_err(|_| KronosError::ProofInvalid)?;
    }

    Ok(())
}

/// Verify only the producer's signature over a block body, used when a
/// caller already trusts the block's structural shape (e.g. re-validating
/// a cached vertex after a key rotation).
pub fn validate_signature_only(
    block: &Block,
    public_key: &SphincsPublicKey,
) -> Result<(), KronosError> {
    let body_bytes = block.body_bytes();
    verify_signature(public_key, &body_bytes, &block.signature).map_err(|_| KronosError::BadSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kronos_core::types::{VrfOutput, VrfProof};
    use kronos_crypto::KeyPair;

    fn make_genesis(kp: &KeyPair) -> Block {
        let mut block = Block {
            block_id: BlockId::from_bytes([0u8; 32]),
            parents: vec![],
            producer: kp.participant_id.clone(),
            producer_key: kp.public_key.clone(),
            window: 0,
            vrf_output: VrfOutput([0u8; 32]),
            vrf_proof: VrfProof(kronos_core::types::SphincsSignature(vec![])),
            tx_root: [0u8; 32],
            transactions: vec![],
            vdf_output: [0u8; 32],
            vdf_proof: vec![],
            timestamp_secs: 0,
            timestamp_nanos: 0,
            signature: kronos_core::types::SphincsSignature(vec![]),
        };
        let body_bytes = block.body_bytes();
        block.block_id = block_id_from_body(&body_bytes);
        block.signature = kp.sign(&body_bytes);
        block
    }

    #[test]
    fn valid_genesis_passes() {
        let kp = KeyPair::generate();
        let block = make_genesis(&kp);
        assert!(validate_block(&block, b"seed", b"seed", 0, |_| false).is_ok());
    }

    #[test]
    fn tampered_id_fails() {
        let kp = KeyPair::generate();
        let mut block = make_genesis(&kp);
        block.block_id = BlockId::from_bytes([9u8; 32]);
        assert!(validate_block(&block, b"seed", b"seed", 0, |_| false).is_err());
    }

    #[test]
    fn missing_parent_fails() {
        let kp = KeyPair::generate();
        let mut block = make_genesis(&kp);
        block.parents = vec![BlockId::from_bytes([1u8; 32])];
        let body_bytes = block.body_bytes();
        block.block_id = block_id_from_body(&body_bytes);
        block.signature = kp.sign(&body_bytes);
        let result = validate_block(&block, b"seed", b"seed", 0, |_| false);
        assert!(matches!(result, Err(KronosError::UnknownParent(_))));
    }

    #[test]
    fn timestamp_within_tolerance_passes() {
        use kronos_core::constants::CLOCK_TOLERANCE_SECONDS;
        let kp = KeyPair::generate();
        let block = make_genesis(&kp);
        let now = CLOCK_TOLERANCE_SECONDS;
        assert!(validate_block(&block, b"seed", b"seed", now, |_| false).is_ok());
    }

    #[test]
    fn timestamp_beyond_tolerance_is_rejected_as_clock_skew() {
        use kronos_core::constants::CLOCK_TOLERANCE_SECONDS;
        let kp = KeyPair::generate();
        let block = make_genesis(&kp);
        let now = CLOCK_TOLERANCE_SECONDS + 1;
        let result = validate_block(&block, b"seed", b"seed", now, |_| false);
        assert!(matches!(result, Err(KronosError::ClockSkew)));
    }
}
