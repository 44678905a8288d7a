use serde::{Deserialize, Serialize};

use kronos_core::checkpoint::Checkpoint;
use kronos_core::heartbeat::Heartbeat;
use kronos_core::types::BlockId;
use kronos_core::{Block, Transaction};

/// Messages exchanged between Kronos nodes over the gossip network.
///
/// Logically mirrors the protocol's wire message set (hello, block,
/// transaction, heartbeat, checkpoint, request/response, disconnect);
/// libp2p gossipsub supplies the length-prefixed framing and per-message
/// authentication that a hand-rolled socket layer would otherwise need to
/// provide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum P2pMessage {
    /// Sent once after a new connection is established: protocol version
    /// and the advertised tip set, so peers can decide whether to sync.
    Hello {
        protocol_version: String,
        tips: Vec<BlockId>,
    },

    /// A newly produced or relayed block.
    Block(Box<Block>),

    /// A mempool-bound transaction, gossiped ahead of block inclusion.
    Transaction(Box<Transaction>),

    /// A per-window presence attestation.
    Heartbeat(Box<Heartbeat>),

    /// A finality checkpoint, gossiped once a window closes.
    Checkpoint(Box<Checkpoint>),

    /// Request a specific block by id (used to resolve orphans and during
    /// sync).
    RequestBlock { block_id: BlockId },

    /// Response to [`P2pMessage::RequestBlock`]; `None` if the responder
    /// does not have the block.
    BlockResponse { block: Option<Box<Block>> },

    /// Graceful disconnect notice, sent before closing a connection during
    /// shutdown.
    Disconnect { reason: String },
}

impl P2pMessage {
    /// Serialize to bytes for gossipsub propagation.
    pub fn to_bytes(&self) -> Vec<u8> {
        bincode::serialize(self).expect("P2pMessage serialization is infallible")
    }

    /// Deserialize from gossipsub bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
