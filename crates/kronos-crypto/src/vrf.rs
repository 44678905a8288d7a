use kronos_core::types::{SphincsPublicKey, VrfOutput, VrfProof};

use crate::hash::shake256;
use crate::sphincs::{self, SignatureError};

/// Evaluate the VRF for `input` under a participant's SPHINCS+ secret key.
///
/// `output = SHAKE256(prf_key ‖ input)`, where `prf_key` is the secret key
/// bytes acting as a pseudorandom seed. `proof` is a SPHINCS+ signature over
/// `input ‖ output`, letting any holder of the public key confirm the output
/// was derived honestly without needing the secret key itself.
pub fn vrf_eval(
    secret_key_bytes: &[u8],
    input: &[u8],
) -> Result<(VrfOutput, VrfProof), SignatureError> {
    let mut seed = secret_key_bytes.to_vec();
    seed.extend_from_slice(input);
    let digest = shake256(&seed, 32);
    let mut output = [0u8; 32];
    output.copy_from_slice(&digest);

    let mut message = input.to_vec();
    message.extend_from_slice(&output);
    let signature = sphincs::sign(secret_key_bytes, &message)?;

    Ok((VrfOutput(output), VrfProof(signature)))
}

/// Verify a VRF output/proof pair against the claimed public key and input.
pub fn vrf_verify(
    public_key: &SphincsPublicKey,
    input: &[u8],
    output: &VrfOutput,
    proof: &VrfProof,
) -> Result<(), SignatureError> {
    let mut message = input.to_vec();
    message.extend_from_slice(&output.0);
    sphincs::verify_signature(public_key, &message, &proof.0)
}

/// Map a VRF output to a uniform `[0, 1)` float for lottery comparisons.
pub fn vrf_output_to_unit_interval(output: &VrfOutput) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&output.0[..8]);
    let v = u64::from_be_bytes(buf);
    (v as f64) / (u64::MAX as f64 + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pqcrypto_sphincsplus::sphincsshake128fsimple as sphincs_impl;
    use pqcrypto_traits::sign::{PublicKey, SecretKey};

    #[test]
    fn vrf_round_trip() {
        let (pk, sk) = sphincs_impl::keypair();
        let pk_bytes = SphincsPublicKey(pk.as_bytes().to_vec());
        let input = b"window:12345";

        let (output, proof) = vrf_eval(sk.as_bytes(), input).unwrap();
        assert!(vrf_verify(&pk_bytes, input, &output, &proof).is_ok());
    }

    #[test]
    fn unit_interval_in_range() {
        let output = VrfOutput([0xffu8; 32]);
        let v = vrf_output_to_unit_interval(&output);
        assert!(v >= 0.0 && v < 1.0);
    }
}
