use crate::hash::sha3_256;

/// Commit to `data` with a random 32-byte blinding factor, for schemes that
/// need to publish a binding, hiding commitment ahead of a later reveal
/// (e.g. reputation bond attestations).
pub fn commit(data: &[u8], blinding: &[u8; 32]) -> [u8; 32] {
    let mut buf = Vec::with_capacity(data.len() + 32);
    buf.extend_from_slice(blinding);
    buf.extend_from_slice(data);
    sha3_256(&buf)
}

/// Verify that `commitment` was produced by `commit(data, blinding)`.
pub fn commit_verify(commitment: &[u8; 32], data: &[u8], blinding: &[u8; 32]) -> bool {
    &commit(data, blinding) == commitment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_round_trip() {
        let blinding = [7u8; 32];
        let data = b"reveal me later";
        let c = commit(data, &blinding);
        assert!(commit_verify(&c, data, &blinding));
        assert!(!commit_verify(&c, b"wrong data", &blinding));
    }
}
