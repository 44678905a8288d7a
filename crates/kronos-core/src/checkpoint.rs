use serde::{Deserialize, Serialize};

use crate::types::{CheckpointHash, Timestamp, Window};

/// A finality checkpoint: the immutable summary emitted once per finality
/// window, anchoring the DAG's state at that UTC boundary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    pub window: Window,
    pub boundary: Timestamp,

    /// Merkle root over the set of accepted blocks whose timestamps fall
    /// in this window's closed interval.
    pub block_root: [u8; 32],

    /// Count of valid heartbeat attestations aggregated for this window,
    /// used as the fork-choice weight when two checkpoints compete for the
    /// same boundary.
    pub heartbeat_count: u64,

    /// Cumulative delay-function work (sum of VDF iteration counts across
    /// blocks) observed in this window.
    pub vdf_work: u64,

    pub previous_checkpoint: Option<CheckpointHash>,

    pub checkpoint_hash: CheckpointHash,
}

/// The fields hashed to produce `checkpoint_hash`.
#[derive(Serialize)]
pub struct CheckpointBody<'a> {
    pub window: Window,
    pub boundary: Timestamp,
    pub block_root: [u8; 32],
    pub heartbeat_count: u64,
    pub vdf_work: u64,
    pub previous_checkpoint: &'a Option<CheckpointHash>,
}

impl Checkpoint {
    pub fn body(&self) -> CheckpointBody<'_> {
        CheckpointBody {
            window: self.window,
            boundary: self.boundary,
            block_root: self.block_root,
            heartbeat_count: self.heartbeat_count,
            vdf_work: self.vdf_work,
            previous_checkpoint: &self.previous_checkpoint,
        }
    }

    pub fn body_bytes(&self) -> Vec<u8> {
        bincode::serialize(&self.body()).expect("checkpoint body serialization is infallible")
    }
}
