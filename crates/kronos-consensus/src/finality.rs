use kronos_core::checkpoint::Checkpoint;
use kronos_core::constants::{
    HARD_FINALITY_CHECKPOINTS, MEDIUM_FINALITY_CHECKPOINTS, SOFT_FINALITY_CHECKPOINTS,
};
use kronos_core::types::{CheckpointHash, Window};
use kronos_crypto::checkpoint_hash_from_body;
use tracing::info;

/// How many passed checkpoints stand between "accepted into the DAG" and
/// the finality tier a block's window has reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FinalityTier {
    Pending,
    Soft,
    Medium,
    Hard,
}

/// Classify a window's finality tier given the current (highest accepted)
/// window.
pub fn finality_tier(window: Window, current_window: Window) -> FinalityTier {
    let passed = current_window.saturating_sub(window);
    if passed >= HARD_FINALITY_CHECKPOINTS as u64 {
        FinalityTier::Hard
    } else if passed >= MEDIUM_FINALITY_CHECKPOINTS as u64 {
        FinalityTier::Medium
    } else if passed >= SOFT_FINALITY_CHECKPOINTS as u64 {
        FinalityTier::Soft
    } else {
        FinalityTier::Pending
    }
}

/// Build and hash the checkpoint for a just-closed window.
pub fn emit_checkpoint(
    window: Window,
    boundary: i64,
    block_root: [u8; 32],
    heartbeat_count: u64,
    vdf_work: u64,
    previous_checkpoint: Option<CheckpointHash>,
) -> Checkpoint {
    let mut checkpoint = Checkpoint {
        window,
        boundary,
        block_root,
        heartbeat_count,
        vdf_work,
        previous_checkpoint,
        checkpoint_hash: CheckpointHash([0u8; 32]),
    };
    checkpoint.checkpoint_hash = checkpoint_hash_from_body(&checkpoint.body_bytes());
    info!(window, heartbeat_count, "emitted finality checkpoint");
    checkpoint
}

/// Resolve a fork between two checkpoints competing for the same UTC
/// boundary (e.g. after a network partition re-merges): the one with
/// strictly more valid heartbeats wins, ties broken by lexicographically
/// smaller hash.
pub fn choose_fork<'a>(a: &'a Checkpoint, b: &'a Checkpoint) -> &'a Checkpoint {
    if a.heartbeat_count != b.heartbeat_count {
        if a.heartbeat_count > b.heartbeat_count {
            a
        } else {
            b
        }
    } else if a.checkpoint_hash.0 <= b.checkpoint_hash.0 {
        a
    } else {
        b
    }
}

/// Whether a reorg touching `reorg_window` is permitted given the current
/// window: reorgs may only occur above the latest hard-finalized
/// checkpoint.
pub fn reorg_allowed(reorg_window: Window, current_window: Window) -> bool {
    finality_tier(reorg_window, current_window) != FinalityTier::Hard
}
