//! kronos-node — the Kronos full-node binary.
//!
//! Startup sequence:
//!   1. Load (or generate) this node's identity keypair and the network's
//!      genesis bundle
//!   2. Open the state database and apply genesis if it is fresh
//!   3. Start the P2P network (libp2p GossipSub + Kademlia + Identify + Ping)
//!   4. Start the JSON-RPC 2.0 server
//!   5. Run the consensus worker: one-second slot ticks drive the leader
//!      lottery, block production, inbound block/transaction/heartbeat
//!      ingestion, and UTC-boundary checkpoint emission
//!
//! Exit codes: 0 success, 1 configuration error, 2 network unreachable at
//! startup, 3 unrecoverable state corruption.

mod config;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error, info, warn};

use kronos_consensus::{
    choose_fork, collect_transactions, effective_weight, produce_block, select_parents, slot_seed,
    wins_lottery, ParticipantStateMachine,
};
use kronos_core::constants::{
    CLOCK_TOLERANCE_SECONDS, DAG_MAX_PARENTS, FINALITY_INTERVAL_SECONDS, PHANTOM_K,
    VDF_ITERATIONS_DEFAULT,
};
use kronos_core::error::KronosError;
use kronos_core::types::{ParticipantId, ParticipantTier, Timestamp, Window};
use kronos_core::{Heartbeat, HeartbeatAttestation};
use kronos_crypto::KeyPair;
use kronos_genesis::{apply_genesis, GenesisParams};
use kronos_mempool::Mempool;
use kronos_p2p::{P2pConfig, P2pMessage, P2pNetwork};
use kronos_reputation::{EventKind, RegistrationLog, ReputationRecord};
use kronos_rpc::{RpcServer, RpcServerState};
use kronos_state::{StateDb, StateEngine};
use kronos_temporal::clock;

use config::NodeConfig;

#[derive(Parser, Debug)]
#[command(name = "kronos-node", version, about = "Kronos full node")]
struct Args {
    /// Directory for the sled database, node identity, and genesis bundle.
    #[arg(long, default_value = "~/.kronos/data")]
    data_dir: PathBuf,

    /// P2P listen multiaddress.
    #[arg(long, default_value = "/ip4/0.0.0.0/tcp/7777")]
    p2p_listen: String,

    /// JSON-RPC bind address.
    #[arg(long, default_value = "127.0.0.1:8645")]
    rpc_addr: String,

    /// Bootstrap peer multiaddress, may be repeated.
    #[arg(long)]
    bootstrap: Vec<String>,

    /// Path to a shared genesis bundle (network parameters + producer
    /// keypair). Generated at `<data-dir>/genesis.bin` on first run if
    /// omitted and absent; every node that should share this network's
    /// genesis block must be started against the same file.
    #[arg(long)]
    genesis_file: Option<PathBuf>,

    #[arg(long, default_value_t = FINALITY_INTERVAL_SECONDS)]
    finality_interval_seconds: i64,

    #[arg(long, default_value_t = CLOCK_TOLERANCE_SECONDS)]
    clock_tolerance_seconds: i64,

    #[arg(long, default_value_t = DAG_MAX_PARENTS)]
    max_parents: usize,

    #[arg(long, default_value_t = PHANTOM_K)]
    phantom_k: usize,

    #[arg(long, default_value_t = 64 * 1024 * 1024)]
    mempool_bytes_max: usize,

    #[arg(long, default_value_t = 2 * 1024 * 1024)]
    block_bytes_max: usize,

    #[arg(long, default_value_t = VDF_ITERATIONS_DEFAULT)]
    vdf_iterations: u64,

    #[arg(long, default_value_t = kronos_core::constants::PEER_RECV_BPS_DEFAULT)]
    peer_recv_bps: u64,

    #[arg(long, default_value_t = kronos_core::constants::PEER_SEND_BPS_DEFAULT)]
    peer_send_bps: u64,

    #[arg(long, default_value_t = kronos_core::constants::MIN_OUTBOUND_PEERS_DEFAULT)]
    min_outbound_peers: usize,

    #[arg(long, default_value_t = kronos_core::constants::INBOUND_RATIO_MAX_DEFAULT)]
    inbound_ratio_max: f64,
}

/// Everything needed to reproduce this network's genesis block, bundled
/// together so a freshly joining node can be handed one file rather than
/// regenerating an unseeded SPHINCS+ keypair that would mint a different
/// genesis block id.
#[derive(serde::Serialize, serde::Deserialize)]
struct GenesisBundle {
    params: GenesisParams,
    producer: KeyPair,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter("warn,kronos_node=info")
        .init();

    let args = Args::parse();
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start async runtime");
            return ExitCode::from(1);
        }
    };

    rt.block_on(run(args))
}

async fn run(args: Args) -> ExitCode {
    let config = match NodeConfig::from_args(&args) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "configuration error");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        error!(error = %e, dir = %config.data_dir.display(), "failed to create data directory");
        return ExitCode::from(1);
    }

    let identity = match load_or_init_identity(&config.identity_file) {
        Ok(kp) => kp,
        Err(e) => {
            error!(error = %e, "failed to load or create node identity");
            return ExitCode::from(1);
        }
    };
    info!(participant = %identity.participant_id, "node identity loaded");

    let bundle = match load_or_init_genesis_bundle(&config.genesis_file) {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, "failed to load or create genesis bundle");
            return ExitCode::from(1);
        }
    };

    let db = match StateDb::open(config.data_dir.join("state")) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!(error = %e, "failed to open state database");
            return ExitCode::from(3);
        }
    };

    let engine = match StateEngine::open(db) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            error!(error = %e, "failed to rebuild DAG ordering from storage");
            return ExitCode::from(3);
        }
    };

    if engine.heaviest_tips().map(|t| t.is_empty()).unwrap_or(true) {
        match apply_genesis(&engine, &bundle.producer, &bundle.params) {
            Ok((block, _checkpoint)) => info!(block_id = %block.block_id, "genesis applied"),
            Err(KronosError::AlreadyKnown) => {}
            Err(e) => {
                error!(error = %e, "failed to apply genesis");
                return ExitCode::from(3);
            }
        }
    }

    let p2p_config = P2pConfig {
        listen_addr: config.p2p_listen.clone(),
        bootstrap_peers: config.bootstrap.clone(),
        peer_recv_bps: config.peer_recv_bps,
        peer_send_bps: config.peer_send_bps,
        min_outbound_peers: config.min_outbound_peers,
        inbound_ratio_max: config.inbound_ratio_max,
        ..P2pConfig::default()
    };

    let (network, mut p2p) = match P2pNetwork::new(&p2p_config) {
        Ok(pair) => pair,
        Err(e) => {
            error!(error = %e, "failed to start P2P network");
            return ExitCode::from(2);
        }
    };
    let peer_multiaddr = format!("{}/p2p/{}", config.p2p_listen, p2p.local_peer_id);
    info!(addr = %peer_multiaddr, "P2P identity");
    tokio::spawn(network.run());

    let (tx_sender, mut tx_receiver) = tokio::sync::mpsc::channel(256);
    let rpc_state = Arc::new(RpcServerState {
        engine: engine.clone(),
        network_name: bundle.params.network_name.clone(),
        tx_sender: Some(tx_sender),
        peer_multiaddr: Some(peer_multiaddr),
        dial_sender: Some(p2p.dial_tx.clone()),
    });
    let rpc_addr = config.rpc_addr;
    let rpc_server = RpcServer::new(rpc_state);
    let rpc_handle = match rpc_server.start(rpc_addr).await {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, addr = %rpc_addr, "failed to start RPC server");
            return ExitCode::from(2);
        }
    };
    info!(addr = %rpc_addr, "RPC server listening");

    let mut mempool = Mempool::new(config.mempool_bytes_max);
    let vrf_seed = bundle.params.vrf_seed.clone();
    let vdf_seed = bundle.params.vdf_seed.clone();

    let now0 = clock::current_timestamp();
    if engine.db().get_reputation(&identity.participant_id).ok().flatten().is_none() {
        let record = ReputationRecord::new(identity.participant_id.clone(), now0);
        if let Err(e) = engine.db().put_reputation(&record) {
            warn!(error = %e, "failed to persist initial reputation record");
        }
    }

    let mut registration_log = RegistrationLog::new();
    let mut state_machines: HashMap<ParticipantId, ParticipantStateMachine> = HashMap::new();
    let mut heartbeat_counts: HashMap<Window, u64> = HashMap::new();
    let mut seen_this_window: HashSet<ParticipantId> = HashSet::new();
    let mut last_window = clock::current_window();
    let mut last_own_heartbeat_window: Option<Window> = None;

    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }

            _ = ticker.tick() => {
                let now = clock::current_timestamp();
                let window = clock::window_of(now);

                if window != last_window {
                    let hb_count = heartbeat_counts.remove(&last_window).unwrap_or(0);
                    match engine.build_checkpoint(last_window, hb_count) {
                        Ok(cp) => {
                            let _ = p2p.outbound_tx.send(P2pMessage::Checkpoint(Box::new(cp))).await;
                            info!(window = last_window, heartbeats = hb_count, "checkpoint emitted");
                        }
                        Err(e) => warn!(error = %e, window = last_window, "failed to build checkpoint"),
                    }

                    let height = engine.db().count_vertices().saturating_sub(1);
                    let cumulative_issued = sum_coinbase_outputs(&engine);
                    if let Err(e) = kronos_consensus::verify_issuance_invariant(cumulative_issued, height) {
                        error!(error = %e, height, cumulative_issued, "issuance invariant violated");
                    }

                    if let Ok(records) = engine.db().iter_reputation() {
                        for mut record in records {
                            let expired = record.quarantine_until.is_some();
                            record.maybe_expire_quarantine(now);
                            if expired && record.quarantine_until.is_none() {
                                if let Err(e) = engine.db().put_reputation(&record) {
                                    warn!(error = %e, participant = %record.participant, "failed to persist quarantine expiry");
                                }
                            }
                            let sm = state_machines.entry(record.participant.clone()).or_default();
                            sm.advance(&record, now, seen_this_window.contains(&record.participant));
                        }
                    }
                    seen_this_window.clear();
                    last_window = window;
                }

                mempool.expire(now);
                bump_own_uptime(&engine, &identity, now);

                if last_own_heartbeat_window != Some(window) {
                    last_own_heartbeat_window = Some(window);
                    let heartbeat = sign_heartbeat(&identity, window, now);
                    *heartbeat_counts.entry(window).or_insert(0) += 1;
                    seen_this_window.insert(identity.participant_id.clone());
                    let _ = p2p.outbound_tx.send(P2pMessage::Heartbeat(Box::new(heartbeat))).await;
                }

                let (my_weight, total_weight) =
                    slot_weights(&engine, &identity.participant_id, window, now, &registration_log);

                let previous_checkpoint_hash = engine
                    .db()
                    .latest_checkpoint()
                    .ok()
                    .flatten()
                    .map(|cp| cp.checkpoint_hash.0)
                    .unwrap_or([0u8; 32]);
                let seed = slot_seed(&previous_checkpoint_hash, now as u64);
                let (vrf_output, _vrf_proof) = identity.vrf_eval(&seed);

                if wins_lottery(&vrf_output, my_weight, total_weight) {
                    match engine.heaviest_tips() {
                        Ok(tips) if !tips.is_empty() => {
                            let parents = select_parents(&tips);
                            let pooled = collect_transactions(&mempool, config.block_bytes_max);
                            let height = engine.db().count_vertices().saturating_sub(1);
                            let mut transactions = vec![mint_coinbase(&identity, height, &pooled, now)];
                            transactions.extend(pooled);
                            let block = produce_block(
                                &identity,
                                parents,
                                window,
                                &vrf_seed,
                                &vdf_seed,
                                config.vdf_iterations,
                                transactions,
                                now,
                                0,
                            );
                            match engine.accept_block(block.clone(), now, &vrf_seed, &vdf_seed) {
                                Ok(outcome) => {
                                    for tx_id in &outcome.included_tx_ids {
                                        mempool.remove_included(tx_id);
                                    }
                                    let _ = engine.apply_reputation_event(&identity.participant_id, EventKind::BlockProduced, now);
                                    info!(block_id = %block.block_id, window, "produced block");
                                    let _ = p2p.outbound_tx.send(P2pMessage::Block(Box::new(block))).await;
                                }
                                Err(e) => warn!(error = %e, "locally produced block was rejected"),
                            }
                        }
                        Ok(_) => debug!("no tips available yet, skipping slot"),
                        Err(e) => warn!(error = %e, "failed to read heaviest tips"),
                    }
                }
            }

            Some(tx) = tx_receiver.recv() => {
                match mempool.insert(tx.clone(), engine.db().as_ref(), clock::current_timestamp()) {
                    Ok(_) => {
                        let _ = p2p.outbound_tx.send(P2pMessage::Transaction(Box::new(tx))).await;
                    }
                    Err(e) => debug!(error = ?e, "rejected RPC-submitted transaction"),
                }
            }

            Some(msg) = p2p.inbound_rx.recv() => {
                handle_inbound(
                    msg,
                    &engine,
                    &mut mempool,
                    &vrf_seed,
                    &vdf_seed,
                    &mut heartbeat_counts,
                    &mut seen_this_window,
                    &mut registration_log,
                );
            }
        }
    }

    info!("flushing state and shutting down");
    let _ = rpc_handle.stop();
    if let Err(e) = engine.db().flush() {
        error!(error = %e, "failed to flush state database on shutdown");
        return ExitCode::from(3);
    }

    ExitCode::SUCCESS
}

/// Build this slot's coinbase transaction: the halving-schedule block
/// reward at `height`, plus every pooled transaction's fee, paid to the
/// producer. Mirrors `kronos_state::engine`'s coinbase handling (empty
/// inputs, no authorizer) — the only kind of transaction the UTXO
/// application path admits without a prior spend to validate against.
fn mint_coinbase(
    identity: &KeyPair,
    height: u64,
    pooled: &[kronos_core::Transaction],
    now: Timestamp,
) -> kronos_core::Transaction {
    let fees: kronos_core::types::Amount = pooled.iter().map(|t| t.fee).sum();
    let reward = kronos_consensus::block_reward(height).saturating_add(fees);
    let mut coinbase = kronos_core::Transaction {
        tx_id: kronos_core::types::TxId::from_bytes([0u8; 32]),
        inputs: vec![],
        outputs: vec![kronos_core::TxOutput {
            owner: identity.participant_id.clone(),
            amount: reward,
            tier: kronos_core::types::PrivacyTier::T0,
        }],
        timestamp: now,
        fee: 0,
        authorizer: None,
    };
    coinbase.tx_id = kronos_crypto::tx_id_from_body(&coinbase.body_bytes());
    coinbase
}

/// Sum of every coinbase output ever accepted, for the issuance
/// invariant. O(chain size); acceptable at one evaluation per finality
/// window.
fn sum_coinbase_outputs(engine: &StateEngine) -> kronos_core::types::Amount {
    let mut total: kronos_core::types::Amount = 0;
    if let Ok(ids) = engine.db().all_vertex_ids() {
        for id in ids {
            if let Ok(Some(vertex)) = engine.db().get_vertex(&id) {
                for tx in &vertex.block.transactions {
                    if tx.is_coinbase() {
                        total = total.saturating_add(tx.outputs.iter().map(|o| o.amount).sum());
                    }
                }
            }
        }
    }
    total
}

fn bump_own_uptime(engine: &StateEngine, identity: &KeyPair, now: Timestamp) {
    let mut record = engine
        .db()
        .get_reputation(&identity.participant_id)
        .ok()
        .flatten()
        .unwrap_or_else(|| ReputationRecord::new(identity.participant_id.clone(), now));
    record.record_uptime(1);
    if let Err(e) = engine.db().put_reputation(&record) {
        warn!(error = %e, "failed to persist uptime");
    }
}

/// This node's effective lottery weight for `window`, alongside the sum
/// across every participant with a reputation record. Every Tier-1 full
/// node re-derives both from the same committed reputation state, so
/// honest nodes agree on who is eligible to win without coordination.
fn slot_weights(
    engine: &StateEngine,
    self_id: &ParticipantId,
    window: Window,
    now: Timestamp,
    registration_log: &RegistrationLog,
) -> (f64, f64) {
    let total_blocks = engine.db().count_vertices();
    let records = engine.db().iter_reputation().unwrap_or_default();
    let mut total_weight = 0.0f64;
    let mut my_weight = 0.0f64;
    for record in &records {
        let score = record.composite_score(now, total_blocks);
        let safeguard = if registration_log.influx_detected(window, record.first_seen, now) {
            registration_log.safeguard_multiplier()
        } else {
            1.0
        };
        let weight = effective_weight(score, ParticipantTier::Tier1, safeguard);
        total_weight += weight;
        if &record.participant == self_id {
            my_weight = weight;
        }
    }
    (my_weight, total_weight)
}

fn sign_heartbeat(keypair: &KeyPair, window: Window, now: Timestamp) -> Heartbeat {
    let mut heartbeat = Heartbeat {
        participant: keypair.participant_id.clone(),
        window,
        attestation: HeartbeatAttestation::Timestamp(now),
        source_tier: ParticipantTier::Tier1,
        signature: kronos_core::types::SphincsSignature(vec![]),
    };
    let body_bytes = heartbeat.body_bytes();
    heartbeat.signature = keypair.sign(&body_bytes);
    heartbeat
}

#[allow(clippy::too_many_arguments)]
fn handle_inbound(
    msg: P2pMessage,
    engine: &Arc<StateEngine>,
    mempool: &mut Mempool,
    vrf_seed: &[u8],
    vdf_seed: &[u8],
    heartbeat_counts: &mut HashMap<Window, u64>,
    seen_this_window: &mut HashSet<ParticipantId>,
    registration_log: &mut RegistrationLog,
) {
    let now = clock::current_timestamp();
    match msg {
        P2pMessage::Block(block) => {
            let window = block.window;
            match engine.accept_block(*block.clone(), now, vrf_seed, vdf_seed) {
                Ok(outcome) => {
                    for tx_id in &outcome.included_tx_ids {
                        mempool.remove_included(tx_id);
                    }
                    if let Some(equivocator) = outcome.equivocation {
                        warn!(participant = %equivocator, window, "equivocation detected");
                        let _ = engine.apply_equivocation(&equivocator, now);
                    } else {
                        let _ = engine.apply_reputation_event(&block.producer, EventKind::BlockValidated, now);
                    }
                }
                Err(KronosError::AlreadyKnown) => {}
                Err(KronosError::OrphanBlock) => debug!(block_id = %block.block_id, "queued inbound block as orphan"),
                Err(e) => {
                    warn!(error = %e, block_id = %block.block_id, "rejected inbound block");
                    let _ = engine.apply_reputation_event(&block.producer, EventKind::InvalidBlock, now);
                }
            }
        }
        P2pMessage::Transaction(tx) => {
            if let Err(e) = mempool.insert(*tx, engine.db().as_ref(), now) {
                debug!(error = ?e, "rejected gossiped transaction");
            }
        }
        P2pMessage::Heartbeat(heartbeat) => {
            // Heartbeats are signed, but verifying that signature requires
            // the participant's declared public key, which this node has
            // no registry for yet (only block producers carry their key
            // alongside their signature). Presence is still recorded;
            // tightening this is a follow-up once registration carries a
            // public key.
            *heartbeat_counts.entry(heartbeat.window).or_insert(0) += 1;
            seen_this_window.insert(heartbeat.participant.clone());
            registration_log.record(heartbeat.window);
            if let Ok(Some(mut record)) = engine.db().get_reputation(&heartbeat.participant) {
                record.record_uptime(1);
                let _ = engine.db().put_reputation(&record);
            }
        }
        P2pMessage::Checkpoint(checkpoint) => match engine.db().get_checkpoint(checkpoint.window) {
            Ok(Some(existing)) => {
                let winner = choose_fork(&existing, &checkpoint);
                if winner.checkpoint_hash != existing.checkpoint_hash {
                    let _ = engine.db().put_checkpoint(&checkpoint);
                }
            }
            Ok(None) => {
                let _ = engine.db().put_checkpoint(&checkpoint);
            }
            Err(e) => warn!(error = %e, "failed to read local checkpoint for comparison"),
        },
        P2pMessage::RequestBlock { block_id } => {
            debug!(%block_id, "block sync requests are not yet served over gossip");
        }
        P2pMessage::BlockResponse { .. } | P2pMessage::Hello | P2pMessage::Disconnect { .. } => {
            debug!("received protocol message with no handler in this orchestration loop");
        }
    }
}

fn load_or_init_identity(path: &PathBuf) -> anyhow::Result<KeyPair> {
    if path.exists() {
        let bytes = std::fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    } else {
        let keypair = KeyPair::generate();
        std::fs::write(path, bincode::serialize(&keypair)?)?;
        Ok(keypair)
    }
}

fn load_or_init_genesis_bundle(path: &PathBuf) -> anyhow::Result<GenesisBundle> {
    if path.exists() {
        let bytes = std::fs::read(path)?;
        Ok(bincode::deserialize(&bytes)?)
    } else {
        warn!(path = %path.display(), "no genesis bundle found, minting a fresh one — share this file with every node joining this network");
        let bundle = GenesisBundle {
            params: GenesisParams::default_network(),
            producer: KeyPair::generate(),
        };
        std::fs::write(path, bincode::serialize(&bundle)?)?;
        Ok(bundle)
    }
}
