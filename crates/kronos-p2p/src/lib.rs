//! libp2p networking layer for Kronos nodes.
//!
//! GossipSub broadcasts new blocks, transactions, heartbeats, and
//! checkpoints to all connected peers. Kademlia DHT handles peer
//! discovery and bootstrap. Identify and Ping maintain connection
//! metadata and liveness. A lightweight connection-admission layer
//! enforces per-IP/subnet caps and a minimum outbound-peer floor on top
//! of what libp2p provides natively.

pub mod config;
pub mod message;
pub mod network;

pub use config::P2pConfig;
pub use message::P2pMessage;
pub use network::{P2pHandle, P2pNetwork};
