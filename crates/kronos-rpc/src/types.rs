use serde::{Deserialize, Serialize};

/// P2P network identity returned by `kronos_getNetworkInfo`. The
/// `peer_multiaddr` field is the full libp2p multiaddress (including
/// `/p2p/<PeerId>`) that other nodes should pass as a bootstrap peer to
/// connect to this node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcNetworkInfo {
    pub peer_multiaddr: String,
}

/// Aggregate UTXO view for a participant, returned by `kronos_getAccount`.
/// The protocol has no account balances in storage — this is computed by
/// summing every currently-unspent output owned by the participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcAccount {
    pub participant_id: String,
    /// Sum of unspent output amounts, in base units (u128 as string).
    pub balance_base_units: String,
    pub output_count: u64,
}

/// Protocol constants returned by `kronos_getGenesisInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcGenesisInfo {
    pub network: String,
    pub genesis_timestamp: i64,
    pub finality_interval_seconds: i64,
    pub total_supply_base_units: String,
    pub initial_block_reward: String,
    pub halving_interval_blocks: u64,
    pub dag_max_parents: usize,
    pub phantom_k: usize,
}

impl RpcGenesisInfo {
    pub fn current(network: &str) -> Self {
        use kronos_core::constants::*;
        Self {
            network: network.to_string(),
            genesis_timestamp: GENESIS_TIMESTAMP,
            finality_interval_seconds: FINALITY_INTERVAL_SECONDS,
            total_supply_base_units: TOTAL_SUPPLY_BASE_UNITS.to_string(),
            initial_block_reward: INITIAL_BLOCK_REWARD.to_string(),
            halving_interval_blocks: HALVING_INTERVAL_BLOCKS,
            dag_max_parents: DAG_MAX_PARENTS,
            phantom_k: PHANTOM_K,
        }
    }
}

/// Aggregate chain statistics returned by `kronos_getChainStats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcChainStats {
    pub total_vertices: u64,
    pub dag_tip_count: u64,
    pub heaviest_blue_score: u64,
    pub total_supply_base_units: String,
}

/// Node / protocol version information returned by `kronos_getVersion`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcVersionInfo {
    pub node_version: String,
    pub protocol_version: String,
    pub api_version: String,
}

/// A lightweight recent-transaction summary returned by
/// `kronos_getRecentTransactions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRecentTx {
    pub tx_id: String,
    pub block_id: String,
    pub timestamp: i64,
    pub input_count: usize,
    pub output_count: usize,
    pub fee_base_units: String,
}

/// A participant's composite reputation, returned by
/// `kronos_getReputationScore`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcReputationScore {
    pub participant_id: String,
    pub composite_score: f64,
    pub uptime_seconds: u64,
    pub integrity: f64,
    pub stored_blocks: u64,
    pub geography: f64,
    pub quarantined: bool,
}

/// A finality checkpoint, returned by `kronos_getFinalityCheckpoint`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcCheckpoint {
    pub window: u64,
    pub boundary: i64,
    pub block_root: String,
    pub heartbeat_count: u64,
    pub vdf_work: u64,
    pub previous_checkpoint: Option<String>,
    pub checkpoint_hash: String,
}

/// The current finality window, returned by `kronos_getCurrentWindow`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcCurrentWindow {
    pub window: u64,
    pub boundary: i64,
    pub seconds_to_next_boundary: i64,
}
