use kronos_core::types::{SphincsPublicKey, SphincsSignature};
use pqcrypto_sphincsplus::sphincsshake128fsimple as sphincs;
use pqcrypto_traits::sign::{DetachedSignature, PublicKey, SecretKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid public key length: expected {expected}, got {got}")]
    InvalidPublicKeyLength { expected: usize, got: usize },
}

/// Sign `message` with a SPHINCS+ (shake-128f-simple) secret key.
/// Returns a detached signature.
pub fn sign(secret_key_bytes: &[u8], message: &[u8]) -> Result<SphincsSignature, SignatureError> {
    let sk = sphincs::SecretKey::from_bytes(secret_key_bytes)
        .map_err(|_| SignatureError::InvalidSignature)?;
    let sig = sphincs::detached_sign(message, &sk);
    Ok(SphincsSignature(sig.as_bytes().to_vec()))
}

/// Verify a detached SPHINCS+ signature.
pub fn verify_signature(
    public_key: &SphincsPublicKey,
    message: &[u8],
    signature: &SphincsSignature,
) -> Result<(), SignatureError> {
    let pk = sphincs::PublicKey::from_bytes(&public_key.0).map_err(|_| {
        SignatureError::InvalidPublicKeyLength {
            expected: sphincs::public_key_bytes(),
            got: public_key.0.len(),
        }
    })?;
    let sig = sphincs::DetachedSignature::from_bytes(&signature.0)
        .map_err(|_| SignatureError::InvalidSignature)?;
    sphincs::verify_detached_signature(&sig, message, &pk)
        .map_err(|_| SignatureError::InvalidSignature)
}

/// Stateless signer helper used by transaction and block builders.
pub struct KronosSigner {
    pub public_key: SphincsPublicKey,
    secret_key_bytes: zeroize::Zeroizing<Vec<u8>>,
}

impl KronosSigner {
    pub fn from_secret_key_bytes(sk_bytes: Vec<u8>, pk_bytes: Vec<u8>) -> Self {
        Self {
            public_key: SphincsPublicKey(pk_bytes),
            secret_key_bytes: zeroize::Zeroizing::new(sk_bytes),
        }
    }

    pub fn sign(&self, message: &[u8]) -> Result<SphincsSignature, SignatureError> {
        sign(&self.secret_key_bytes, message)
    }

    pub fn verify(&self, message: &[u8], sig: &SphincsSignature) -> Result<(), SignatureError> {
        verify_signature(&self.public_key, message, sig)
    }
}
