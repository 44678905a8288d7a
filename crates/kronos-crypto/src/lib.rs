pub mod commitment;
pub mod hash;
pub mod keypair;
pub mod merkle;
pub mod sphincs;
pub mod vrf;

pub use commitment::{commit, commit_verify};
pub use hash::{
    blake3_hash, block_id_from_body, checkpoint_hash_from_body, sha3_256, shake256, tx_id_from_body,
};
pub use keypair::KeyPair;
pub use merkle::merkle_root;
pub use sphincs::{verify_signature, KronosSigner};
pub use vrf::{vrf_eval, vrf_output_to_unit_interval, vrf_verify};
