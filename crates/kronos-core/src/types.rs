use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount in base units (one base unit ≈ one second of verified temporal
/// presence, asymptotically). u128 comfortably covers the full issuance cap
/// of 1_260_000_000 base units with room for fee accumulation.
pub type Amount = u128;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// A one-second UTC tick used for leader selection.
pub type Slot = u64;

/// An index into the sequence of finality-interval boundaries.
pub type Window = u64;

// ── ParticipantId ────────────────────────────────────────────────────────────

/// 32-byte participant identifier: hash of the participant's public
/// verification key. Created at first registration; never destroyed.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub [u8; 32]);

impl ParticipantId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Base-58 encoded string representation.
    pub fn to_b58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn from_b58(s: &str) -> Result<Self, bs58::decode::Error> {
        let bytes = bs58::decode(s).into_vec()?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes[..32]);
        Ok(Self(arr))
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_b58())
    }
}

impl fmt::Debug for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantId({})", &self.to_b58()[..8])
    }
}

// ── TxId / OutputId / BlockId ────────────────────────────────────────────────

/// 32-byte transaction identifier: SHA3-256 of the canonical serialized
/// transaction body (all fields except the input signatures).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes[..32]);
        Ok(Self(arr))
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({}…)", &self.to_hex()[..16])
    }
}

/// Identifies a single transaction output: the transaction that created it
/// plus the output's index within that transaction's output list.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Debug)]
pub struct OutputId {
    pub tx_id: TxId,
    pub index: u32,
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.index)
    }
}

/// 32-byte block identifier: SHA3-256 of the canonical serialized block
/// header (all fields except the producer signature).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub [u8; 32]);

impl BlockId {
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes[..32]);
        Ok(Self(arr))
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({}…)", &self.to_hex()[..16])
    }
}

// ── Checkpoint identifiers ───────────────────────────────────────────────────

/// Hash of a finality checkpoint record.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Debug)]
pub struct CheckpointHash(pub [u8; 32]);

impl CheckpointHash {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

// ── Key material ─────────────────────────────────────────────────────────────

/// SPHINCS+ public verification key (variable length per parameter set;
/// the 128-bit fast "simple" parameter set is the protocol default).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SphincsPublicKey(pub Vec<u8>);

impl fmt::Debug for SphincsPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SphincsPublicKey({}b)", self.0.len())
    }
}

/// SPHINCS+ signature.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SphincsSignature(pub Vec<u8>);

impl fmt::Debug for SphincsSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SphincsSignature({}b)", self.0.len())
    }
}

/// A verifiable-random-function output (SHAKE256-derived, 32 bytes).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfOutput(pub [u8; 32]);

impl fmt::Debug for VrfOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VrfOutput({}…)", &hex::encode(self.0)[..12])
    }
}

/// A verifiable-random-function proof: a signature over `input ‖ output`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VrfProof(pub SphincsSignature);

impl fmt::Debug for VrfProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VrfProof({:?})", self.0)
    }
}

// ── Privacy tiers ────────────────────────────────────────────────────────────

/// Privacy tier tag carried by each transaction output.
///
/// Only T0 semantics are implemented; T1–T3 are reserved slots in the
/// transaction format (amount hiding, ring signatures — out of scope).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Debug)]
#[repr(u8)]
pub enum PrivacyTier {
    T0 = 0,
    T1 = 1,
    T2 = 2,
    T3 = 3,
}

/// A participant's tier classification, determining lottery weight.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum ParticipantTier {
    /// Full node with delay-function capability. Produces blocks.
    Tier1,
    /// Light node or authorized community bot. Submits light heartbeats.
    Tier2,
    /// End-user attestation, accepted only via a Tier-2 aggregator.
    Tier3,
}

impl ParticipantTier {
    /// Lottery weight per the participation-tier table: 0.70 / 0.20 / 0.10.
    pub fn lottery_weight(self) -> f64 {
        match self {
            ParticipantTier::Tier1 => 0.70,
            ParticipantTier::Tier2 => 0.20,
            ParticipantTier::Tier3 => 0.10,
        }
    }
}
