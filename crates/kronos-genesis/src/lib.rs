//! Builds and applies the Kronos genesis block to a fresh [`StateDb`].
//!
//! There is no pre-allocation: genesis mints nothing. The genesis block
//! anchors window 0 to [`kronos_core::constants::GENESIS_TIMESTAMP`] and
//! gives every subsequent block a DAG root to reference as an ancestor.
//! The entire 1,260,000,000 base-unit supply enters circulation solely
//! through the halving issuance schedule in `kronos-consensus`, starting
//! from the first block produced after genesis.

pub mod params;

pub use params::GenesisParams;

use kronos_core::checkpoint::Checkpoint;
use kronos_core::constants::GENESIS_TIMESTAMP;
use kronos_core::error::KronosError;
use kronos_core::types::{BlockId, VrfOutput, VrfProof};
use kronos_core::Block;
use kronos_consensus::verify_issuance_invariant;
use kronos_crypto::{block_id_from_body, merkle_root, KeyPair};
use kronos_state::StateEngine;
use tracing::info;

/// Construct the genesis block. It has no parents, no transactions, and a
/// window of 0. Its VRF and delay-function fields are left at their zero
/// value since [`kronos_dag::validation::validate_block`] does not verify
/// either for a block with no parents — the block's only cryptographic
/// claim is the producer's signature over the rest of the body.
pub fn build_genesis_block(keypair: &KeyPair, params: &GenesisParams) -> Block {
    let mut block = Block {
        block_id: BlockId::from_bytes([0u8; 32]),
        parents: vec![],
        producer: keypair.participant_id.clone(),
        producer_key: keypair.public_key.clone(),
        window: 0,
        vrf_output: VrfOutput([0u8; 32]),
        vrf_proof: VrfProof(kronos_core::types::SphincsSignature(vec![])),
        tx_root: merkle_root(&[]),
        transactions: vec![],
        vdf_output: [0u8; 32],
        vdf_proof: vec![],
        timestamp_secs: GENESIS_TIMESTAMP,
        timestamp_nanos: 0,
        signature: kronos_core::types::SphincsSignature(vec![]),
    };
    let _ = &params.network_name;

    let body_bytes = block.body_bytes();
    block.block_id = block_id_from_body(&body_bytes);
    block.signature = keypair.sign(&body_bytes);
    block
}

/// Apply genesis to `engine`'s (empty) backing store: accept the genesis
/// block and emit its window-0 checkpoint.
///
/// # Panics
/// Does not panic, but returns [`KronosError::AlreadyKnown`] if genesis has
/// already been applied to this store — callers should treat that as "not
/// a fresh database" rather than retry.
pub fn apply_genesis(
    engine: &StateEngine,
    keypair: &KeyPair,
    params: &GenesisParams,
) -> Result<(Block, Checkpoint), KronosError> {
    info!(network = %params.network_name, "applying genesis state");

    verify_issuance_invariant(0, 0)?;

    let block = build_genesis_block(keypair, params);
    engine.accept_block(block.clone(), GENESIS_TIMESTAMP, &params.vrf_seed, &params.vdf_seed)?;

    let checkpoint = engine.build_checkpoint(0, 0)?;
    engine.db().flush()?;

    info!(block_id = %block.block_id, "genesis block accepted and window 0 checkpointed");
    Ok((block, checkpoint))
}
