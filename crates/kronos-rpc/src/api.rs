use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{
    RpcAccount, RpcChainStats, RpcCheckpoint, RpcCurrentWindow, RpcGenesisInfo, RpcNetworkInfo,
    RpcRecentTx, RpcReputationScore, RpcVersionInfo,
};

/// Kronos JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "kronos_" via `namespace = "kronos"`.
#[rpc(server, namespace = "kronos")]
pub trait KronosApi {
    /// Get the aggregate UTXO balance for a base-58 participant id.
    #[method(name = "getAccount")]
    async fn get_account(&self, participant_id: String) -> RpcResult<Option<RpcAccount>>;

    /// Get balance in base units by base-58 participant id.
    #[method(name = "getBalance")]
    async fn get_balance(&self, participant_id: String) -> RpcResult<String>;

    /// Submit a signed transaction. `tx_hex` is hex-encoded bincode(Transaction).
    /// Returns the TxId hex on success.
    #[method(name = "sendTransaction")]
    async fn send_transaction(&self, tx_hex: String) -> RpcResult<String>;

    /// Get a transaction by its TxId hex. Returns hex-encoded
    /// bincode(Transaction) or null if not found.
    #[method(name = "getTransaction")]
    async fn get_transaction(&self, tx_id: String) -> RpcResult<Option<String>>;

    /// Return the current DAG tip block ids (as hex strings).
    #[method(name = "getDagTips")]
    async fn get_dag_tips(&self) -> RpcResult<Vec<String>>;

    /// Return genesis/protocol constants.
    #[method(name = "getGenesisInfo")]
    async fn get_genesis_info(&self) -> RpcResult<RpcGenesisInfo>;

    /// Return the node's P2P identity (peer multiaddress). Other nodes
    /// pass this as a bootstrap peer to connect.
    #[method(name = "getNetworkInfo")]
    async fn get_network_info(&self) -> RpcResult<RpcNetworkInfo>;

    /// Return aggregate on-chain statistics.
    #[method(name = "getChainStats")]
    async fn get_chain_stats(&self) -> RpcResult<RpcChainStats>;

    /// Return the most recent `limit` transactions (max 200), newest first.
    #[method(name = "getRecentTransactions")]
    async fn get_recent_transactions(&self, limit: u32) -> RpcResult<Vec<RpcRecentTx>>;

    /// Return node and protocol version information.
    #[method(name = "getVersion")]
    async fn get_version(&self) -> RpcResult<RpcVersionInfo>;

    /// Return a participant's composite reputation score.
    #[method(name = "getReputationScore")]
    async fn get_reputation_score(&self, participant_id: String) -> RpcResult<Option<RpcReputationScore>>;

    /// Return the finality checkpoint for `window`, if one has been emitted.
    #[method(name = "getFinalityCheckpoint")]
    async fn get_finality_checkpoint(&self, window: u64) -> RpcResult<Option<RpcCheckpoint>>;

    /// Return the current finality window and its UTC boundary.
    #[method(name = "getCurrentWindow")]
    async fn get_current_window(&self) -> RpcResult<RpcCurrentWindow>;

    /// Dial an additional peer by multiaddress. Used by the `peer add` CLI
    /// subcommand; not part of the core read/submit surface.
    #[method(name = "addPeer")]
    async fn add_peer(&self, multiaddr: String) -> RpcResult<()>;
}
