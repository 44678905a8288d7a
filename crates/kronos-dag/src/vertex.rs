use kronos_core::block::Block;
use kronos_core::types::{BlockId, Timestamp};
use serde::{Deserialize, Serialize};

/// Local acceptance status of a vertex, independent of its PHANTOM
/// blue/red classification (which lives in [`crate::ordering`]).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum VertexStatus {
    /// Received and structurally valid, awaiting ordering / finality.
    Pending,
    /// Structurally valid but one or more parents are still unknown.
    Orphan,
    /// Rejected by structural or cryptographic validation.
    Rejected { reason: String },
}

/// A vertex in the block-DAG: one [`Block`] plus locally-tracked metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vertex {
    pub block: Block,

    /// When this vertex was first seen by the local node (UTC Unix seconds).
    pub received_at: Timestamp,

    pub status: VertexStatus,

    /// Ids of vertices that reference this one as a parent.
    pub children: Vec<BlockId>,
}

impl Vertex {
    pub fn new(block: Block, received_at: Timestamp) -> Self {
        Self {
            block,
            received_at,
            status: VertexStatus::Pending,
            children: Vec::new(),
        }
    }

    pub fn block_id(&self) -> &BlockId {
        &self.block.block_id
    }

    pub fn parents(&self) -> &Vec<BlockId> {
        &self.block.parents
    }

    pub fn is_genesis(&self) -> bool {
        self.block.is_genesis()
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.status, VertexStatus::Rejected { .. })
    }
}
