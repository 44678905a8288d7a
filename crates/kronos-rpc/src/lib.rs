//! JSON-RPC 2.0 server for Kronos nodes.
//!
//! Namespace: "kronos"
//! Methods:
//!   kronos_getAccount             — aggregate UTXO balance for a participant
//!   kronos_getBalance             — balance in base units
//!   kronos_sendTransaction        — submit a signed transaction (hex bincode)
//!   kronos_getTransaction         — look up a transaction's embedding vertex
//!   kronos_getDagTips             — current DAG tip block ids
//!   kronos_getGenesisInfo         — protocol constants
//!   kronos_getNetworkInfo         — this node's P2P identity
//!   kronos_getChainStats          — aggregate chain statistics
//!   kronos_getRecentTransactions  — most recent transactions, newest first
//!   kronos_getVersion             — node/protocol/API version info
//!   kronos_getReputationScore     — a participant's composite reputation
//!   kronos_getFinalityCheckpoint  — the checkpoint for a given window
//!   kronos_getCurrentWindow       — the current finality window and boundary
//!   kronos_addPeer                — dial an additional peer (CLI `peer add`)

pub mod api;
pub mod server;
pub mod types;

pub use server::RpcServer;
pub use server::RpcServerState;
pub use types::{
    RpcAccount, RpcChainStats, RpcCheckpoint, RpcCurrentWindow, RpcGenesisInfo, RpcNetworkInfo,
    RpcRecentTx, RpcReputationScore, RpcVersionInfo,
};
