use serde::{Deserialize, Serialize};

use crate::types::{ParticipantId, ParticipantTier, SphincsSignature, Timestamp, Window};

/// A per-window attestation of participant presence. Tier-1 (full node)
/// attestations carry a delay-function proof; Tier-2/3 attestations carry a
/// verified wall-clock timestamp instead, since they lack delay-function
/// capability.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum HeartbeatAttestation {
    /// Bincode-serialized `kronos_temporal::vdf::VdfProof` for the window.
    DelayProof(Vec<u8>),
    /// A wall-clock timestamp the participant attests to, within tolerance
    /// of the window boundary.
    Timestamp(Timestamp),
}

/// A single finality-window presence attestation. Ephemeral beyond two
/// windows — the reputation engine and consensus worker do not retain
/// heartbeats past that point, only their effect on uptime/integrity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Heartbeat {
    pub participant: ParticipantId,
    pub window: Window,
    pub attestation: HeartbeatAttestation,
    pub source_tier: ParticipantTier,
    pub signature: SphincsSignature,
}

/// The body fields hashed/signed for a heartbeat. Excludes the signature.
#[derive(Serialize)]
pub struct HeartbeatBody<'a> {
    pub participant: &'a ParticipantId,
    pub window: Window,
    pub attestation: &'a HeartbeatAttestation,
    pub source_tier: ParticipantTier,
}

impl Heartbeat {
    pub fn body(&self) -> HeartbeatBody<'_> {
        HeartbeatBody {
            participant: &self.participant,
            window: self.window,
            attestation: &self.attestation,
            source_tier: self.source_tier,
        }
    }

    pub fn body_bytes(&self) -> Vec<u8> {
        bincode::serialize(&self.body()).expect("heartbeat body serialization is infallible")
    }
}
