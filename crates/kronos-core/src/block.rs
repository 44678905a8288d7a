use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;
use crate::types::{
    BlockId, ParticipantId, SphincsPublicKey, SphincsSignature, Timestamp, VrfOutput, VrfProof,
    Window,
};

// ── Block ────────────────────────────────────────────────────────────────────

/// A DAG vertex: a bundle of transactions proposed by a single elected
/// producer, referencing between `DAG_MIN_PARENTS` and `DAG_MAX_PARENTS`
/// prior blocks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub block_id: BlockId,

    /// Parent block references (1–8; exactly 0 for genesis only).
    pub parents: Vec<BlockId>,

    /// The producer elected for this block's slot.
    pub producer: ParticipantId,
    pub producer_key: SphincsPublicKey,

    /// The finality-interval window this block was produced in.
    pub window: Window,

    /// VRF output/proof establishing the producer's lottery win for this slot.
    pub vrf_output: VrfOutput,
    pub vrf_proof: VrfProof,

    /// Root hash over the canonical ordering of `transactions`.
    pub tx_root: [u8; 32],
    pub transactions: Vec<Transaction>,

    /// The sequential delay-function output covering the interval since the
    /// producer's previous accepted block, and its proof.
    pub vdf_output: [u8; 32],
    pub vdf_proof: Vec<u8>,

    /// UTC timestamp the producer attached to the block.
    pub timestamp_secs: Timestamp,
    pub timestamp_nanos: u32,

    /// Producer's signature over every other field (via `body_bytes`).
    pub signature: SphincsSignature,
}

/// The body fields hashed to produce `block_id` and signed by the producer.
#[derive(Serialize)]
pub struct BlockBody<'a> {
    pub parents: &'a Vec<BlockId>,
    pub producer: &'a ParticipantId,
    pub producer_key: &'a SphincsPublicKey,
    pub window: Window,
    pub vrf_output: &'a VrfOutput,
    pub vrf_proof: &'a VrfProof,
    pub tx_root: [u8; 32],
    pub transactions: &'a Vec<Transaction>,
    pub vdf_output: [u8; 32],
    pub vdf_proof: &'a Vec<u8>,
    pub timestamp_secs: Timestamp,
    pub timestamp_nanos: u32,
}

impl Block {
    pub fn body(&self) -> BlockBody<'_> {
        BlockBody {
            parents: &self.parents,
            producer: &self.producer,
            producer_key: &self.producer_key,
            window: self.window,
            vrf_output: &self.vrf_output,
            vrf_proof: &self.vrf_proof,
            tx_root: self.tx_root,
            transactions: &self.transactions,
            vdf_output: self.vdf_output,
            vdf_proof: &self.vdf_proof,
            timestamp_secs: self.timestamp_secs,
            timestamp_nanos: self.timestamp_nanos,
        }
    }

    pub fn body_bytes(&self) -> Vec<u8> {
        bincode::serialize(&self.body()).expect("body serialization is infallible")
    }

    pub fn is_genesis(&self) -> bool {
        self.parents.is_empty()
    }
}
