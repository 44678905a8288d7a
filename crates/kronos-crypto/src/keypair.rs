use kronos_core::types::{ParticipantId, SphincsPublicKey};
use pqcrypto_sphincsplus::sphincsshake128fsimple as sphincs_impl;
use pqcrypto_traits::sign::{PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::hash::participant_id_from_pubkey;

/// A participant keypair: SPHINCS+ public + secret keys with derived
/// ParticipantId.
///
/// The secret key is held in a `Vec<u8>` that is explicitly zeroized on
/// drop; callers needing a scoped zeroizing view should wrap it themselves.
#[derive(Serialize, Deserialize)]
pub struct KeyPair {
    pub participant_id: ParticipantId,
    pub public_key: SphincsPublicKey,
    secret_key: Vec<u8>,
}

impl KeyPair {
    /// Generate a fresh SPHINCS+ keypair.
    pub fn generate() -> Self {
        let (pk, sk) = sphincs_impl::keypair();
        let pk_bytes = pk.as_bytes().to_vec();
        let participant_id = participant_id_from_pubkey(&pk_bytes);
        Self {
            participant_id,
            public_key: SphincsPublicKey(pk_bytes),
            secret_key: sk.as_bytes().to_vec(),
        }
    }

    /// Sign `message` using this keypair's secret key.
    pub fn sign(&self, message: &[u8]) -> kronos_core::types::SphincsSignature {
        let sk = Zeroizing::new(self.secret_key.clone());
        crate::sphincs::sign(&sk, message).expect("sign with valid secret key is infallible")
    }

    /// Evaluate the VRF for `input` using this keypair's secret key.
    pub fn vrf_eval(
        &self,
        input: &[u8],
    ) -> (kronos_core::types::VrfOutput, kronos_core::types::VrfProof) {
        crate::vrf::vrf_eval(&self.secret_key, input)
            .expect("vrf eval with valid secret key is infallible")
    }

    /// Return a read-only view of the secret key bytes.
    pub fn secret_key_bytes(&self) -> &[u8] {
        &self.secret_key
    }

    /// Restore a KeyPair from raw bytes (e.g. loaded from a wallet file).
    pub fn from_raw(pk_bytes: Vec<u8>, sk_bytes: Vec<u8>) -> Self {
        let participant_id = participant_id_from_pubkey(&pk_bytes);
        Self {
            participant_id,
            public_key: SphincsPublicKey(pk_bytes),
            secret_key: sk_bytes,
        }
    }
}

impl Drop for KeyPair {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.secret_key.zeroize();
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ participant_id: {:?} }}", self.participant_id)
    }
}
