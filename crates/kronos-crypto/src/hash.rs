use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Digest, Sha3_256, Shake256,
};

use kronos_core::types::{BlockId, CheckpointHash, ParticipantId, TxId};

/// Compute SHA3-256 of arbitrary bytes.
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute BLAKE3 of arbitrary bytes. Used for internal, non-consensus ids
/// (e.g. peer-local cache keys) where the faster hash is not part of any
/// consensus-critical digest.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Squeeze `out_len` bytes of SHAKE256 output from `data`.
pub fn shake256(data: &[u8], out_len: usize) -> Vec<u8> {
    let mut hasher = Shake256::default();
    hasher.update(data);
    let mut reader = hasher.finalize_xof();
    let mut out = vec![0u8; out_len];
    reader.read(&mut out);
    out
}

/// Derive a ParticipantId from a public key's bytes via SHA3-256.
pub fn participant_id_from_pubkey(pubkey_bytes: &[u8]) -> ParticipantId {
    ParticipantId::from_bytes(sha3_256(pubkey_bytes))
}

/// Derive a TxId from the canonical transaction body bytes via SHA3-256.
pub fn tx_id_from_body(body_bytes: &[u8]) -> TxId {
    TxId::from_bytes(sha3_256(body_bytes))
}

/// Derive a BlockId from the canonical block body bytes via SHA3-256.
pub fn block_id_from_body(body_bytes: &[u8]) -> BlockId {
    BlockId::from_bytes(sha3_256(body_bytes))
}

/// Derive a CheckpointHash from the canonical checkpoint body bytes via
/// SHA3-256.
pub fn checkpoint_hash_from_body(body_bytes: &[u8]) -> CheckpointHash {
    CheckpointHash(sha3_256(body_bytes))
}
