use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use kronos_core::transaction::Transaction;
use kronos_core::types::{ParticipantId, TxId};
use kronos_state::StateEngine;
use kronos_temporal::clock;

use crate::api::KronosApiServer;
use crate::types::{
    RpcAccount, RpcChainStats, RpcCheckpoint, RpcCurrentWindow, RpcGenesisInfo, RpcNetworkInfo,
    RpcRecentTx, RpcReputationScore, RpcVersionInfo,
};

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub engine: Arc<StateEngine>,
    pub network_name: String,
    /// Optional sender to forward incoming transactions to the consensus
    /// worker's mempool ingestion queue.
    pub tx_sender: Option<tokio::sync::mpsc::Sender<Transaction>>,
    /// Full libp2p multiaddress of this node (e.g. `/ip4/127.0.0.1/tcp/7777/p2p/<PeerId>`).
    /// Used by peers to bootstrap; returned by `kronos_getNetworkInfo`.
    pub peer_multiaddr: Option<String>,
    /// Sender to forward manual dial requests to the P2P network task, used
    /// by `kronos_addPeer`.
    pub dial_sender: Option<tokio::sync::mpsc::Sender<String>>,
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr` with permissive CORS headers. Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let cors = CorsLayer::new()
            .allow_methods(Any)
            .allow_origin(Any)
            .allow_headers(Any);

        let server = Server::builder()
            .set_http_middleware(tower::ServiceBuilder::new().layer(cors))
            .build(addr)
            .await?;

        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }
}

#[async_trait]
impl KronosApiServer for RpcServer {
    async fn get_account(&self, participant_id: String) -> RpcResult<Option<RpcAccount>> {
        let id = ParticipantId::from_b58(&participant_id)
            .map_err(|e| rpc_err(-32602, format!("invalid participant id: {e}")))?;

        let outputs = self
            .state
            .engine
            .db()
            .iter_outputs()
            .map_err(|e| rpc_err(-32603, e.to_string()))?;

        let mut balance: u128 = 0;
        let mut output_count = 0u64;
        for (_, output) in &outputs {
            if output.owner == id {
                balance = balance.saturating_add(output.amount);
                output_count += 1;
            }
        }

        if output_count == 0 {
            return Ok(None);
        }

        Ok(Some(RpcAccount {
            participant_id: id.to_b58(),
            balance_base_units: balance.to_string(),
            output_count,
        }))
    }

    async fn get_balance(&self, participant_id: String) -> RpcResult<String> {
        let id = ParticipantId::from_b58(&participant_id)
            .map_err(|e| rpc_err(-32602, format!("invalid participant id: {e}")))?;

        let outputs = self
            .state
            .engine
            .db()
            .iter_outputs()
            .map_err(|e| rpc_err(-32603, e.to_string()))?;

        let balance: u128 = outputs
            .iter()
            .filter(|(_, output)| output.owner == id)
            .map(|(_, output)| output.amount)
            .sum();

        Ok(balance.to_string())
    }

    async fn send_transaction(&self, tx_hex: String) -> RpcResult<String> {
        let tx_bytes =
            hex::decode(&tx_hex).map_err(|e| rpc_err(-32602, format!("invalid hex: {e}")))?;

        let tx: Transaction = bincode::deserialize(&tx_bytes)
            .map_err(|e| rpc_err(-32602, format!("invalid transaction encoding: {e}")))?;

        let tx_id = tx.tx_id.to_hex();

        if let Some(sender) = &self.state.tx_sender {
            sender
                .send(tx)
                .await
                .map_err(|_| rpc_err(-32603, "transaction queue full"))?;
        } else {
            warn!("RPC: sendTransaction called but no mempool pipeline configured");
            return Err(rpc_err(-32603, "node transaction pipeline not connected").into());
        }

        Ok(tx_id)
    }

    async fn get_transaction(&self, tx_id: String) -> RpcResult<Option<String>> {
        let id = TxId::from_hex(&tx_id).map_err(|e| rpc_err(-32602, format!("invalid tx id: {e}")))?;

        let vertex_ids = self
            .state
            .engine
            .db()
            .all_vertex_ids()
            .map_err(|e| rpc_err(-32603, e.to_string()))?;

        for block_id in vertex_ids {
            let Some(vertex) = self
                .state
                .engine
                .db()
                .get_vertex(&block_id)
                .map_err(|e| rpc_err(-32603, e.to_string()))?
            else {
                continue;
            };
            if let Some(tx) = vertex.block.transactions.iter().find(|t| t.tx_id == id) {
                let bytes = bincode::serialize(tx).map_err(|e| rpc_err(-32603, e.to_string()))?;
                return Ok(Some(hex::encode(bytes)));
            }
        }

        Ok(None)
    }

    async fn get_dag_tips(&self) -> RpcResult<Vec<String>> {
        let tips = self
            .state
            .engine
            .heaviest_tips()
            .map_err(|e| rpc_err(-32603, e.to_string()))?;

        Ok(tips.into_iter().map(|t| t.to_hex()).collect())
    }

    async fn get_genesis_info(&self) -> RpcResult<RpcGenesisInfo> {
        Ok(RpcGenesisInfo::current(&self.state.network_name))
    }

    async fn get_network_info(&self) -> RpcResult<RpcNetworkInfo> {
        Ok(RpcNetworkInfo {
            peer_multiaddr: self.state.peer_multiaddr.clone().unwrap_or_default(),
        })
    }

    async fn get_chain_stats(&self) -> RpcResult<RpcChainStats> {
        let db = self.state.engine.db();
        let total_vertices = db.count_vertices();

        let tips = self
            .state
            .engine
            .heaviest_tips()
            .map_err(|e| rpc_err(-32603, e.to_string()))?;
        let dag_tip_count = tips.len() as u64;

        let heaviest_blue_score = tips
            .first()
            .and_then(|id| self.state.engine.blue_score(id))
            .unwrap_or(0);

        let total_supply_base_units: u128 = db
            .iter_outputs()
            .map_err(|e| rpc_err(-32603, e.to_string()))?
            .iter()
            .map(|(_, output)| output.amount)
            .sum();

        Ok(RpcChainStats {
            total_vertices,
            dag_tip_count,
            heaviest_blue_score,
            total_supply_base_units: total_supply_base_units.to_string(),
        })
    }

    async fn get_recent_transactions(&self, limit: u32) -> RpcResult<Vec<RpcRecentTx>> {
        let limit = limit.min(200) as usize;
        let db = self.state.engine.db();

        let mut entries: Vec<RpcRecentTx> = Vec::new();
        for block_id in db.all_vertex_ids().map_err(|e| rpc_err(-32603, e.to_string()))? {
            let Some(vertex) = db.get_vertex(&block_id).map_err(|e| rpc_err(-32603, e.to_string()))? else {
                continue;
            };
            for tx in &vertex.block.transactions {
                entries.push(RpcRecentTx {
                    tx_id: tx.tx_id.to_hex(),
                    block_id: block_id.to_hex(),
                    timestamp: tx.timestamp,
                    input_count: tx.inputs.len(),
                    output_count: tx.outputs.len(),
                    fee_base_units: tx.fee.to_string(),
                });
            }
        }

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn get_version(&self) -> RpcResult<RpcVersionInfo> {
        Ok(RpcVersionInfo {
            node_version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: "1".to_string(),
            api_version: "1".to_string(),
        })
    }

    async fn get_reputation_score(
        &self,
        participant_id: String,
    ) -> RpcResult<Option<RpcReputationScore>> {
        let id = ParticipantId::from_b58(&participant_id)
            .map_err(|e| rpc_err(-32602, format!("invalid participant id: {e}")))?;

        let db = self.state.engine.db();
        let record = db
            .get_reputation(&id)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;

        let Some(record) = record else { return Ok(None) };

        let total_blocks = db.count_vertices();
        let now = clock::current_timestamp();

        Ok(Some(RpcReputationScore {
            participant_id: id.to_b58(),
            composite_score: record.composite_score(now, total_blocks),
            uptime_seconds: record.uptime_seconds,
            integrity: record.integrity,
            stored_blocks: record.stored_blocks,
            geography: record.geography,
            quarantined: record.is_quarantined(now),
        }))
    }

    async fn get_finality_checkpoint(&self, window: u64) -> RpcResult<Option<RpcCheckpoint>> {
        let checkpoint = self
            .state
            .engine
            .db()
            .get_checkpoint(window)
            .map_err(|e| rpc_err(-32603, e.to_string()))?;

        Ok(checkpoint.map(|cp| RpcCheckpoint {
            window: cp.window,
            boundary: cp.boundary,
            block_root: hex::encode(cp.block_root),
            heartbeat_count: cp.heartbeat_count,
            vdf_work: cp.vdf_work,
            previous_checkpoint: cp.previous_checkpoint.map(|h| h.to_hex()),
            checkpoint_hash: cp.checkpoint_hash.to_hex(),
        }))
    }

    async fn get_current_window(&self) -> RpcResult<RpcCurrentWindow> {
        let now = clock::current_timestamp();
        let window = clock::window_of(now);
        Ok(RpcCurrentWindow {
            window,
            boundary: clock::boundary_of(window),
            seconds_to_next_boundary: clock::seconds_to_next_boundary(now),
        })
    }

    async fn add_peer(&self, multiaddr: String) -> RpcResult<()> {
        let Some(sender) = &self.state.dial_sender else {
            return Err(rpc_err(-32603, "node P2P network not connected").into());
        };
        sender
            .send(multiaddr)
            .await
            .map_err(|_| rpc_err(-32603, "dial queue full"))?;
        Ok(())
    }
}
