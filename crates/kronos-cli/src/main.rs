//! kronos-cli
//!
//! Minimal operator front-end for a Kronos node: start/stop the node
//! process, query its status, and add a bootstrap peer — all via the
//! node's JSON-RPC endpoint (`reqwest`-based, no business logic lives
//! here).
//!
//! Usage:
//!   kronos-cli start  [--data-dir <path>] [--p2p-listen <addr>] [--rpc-addr <addr>] [--bootstrap <addr>]...
//!   kronos-cli stop    [--data-dir <path>] [--rpc <url>]
//!   kronos-cli status  [--rpc <url>]
//!   kronos-cli peer add <addr> [--rpc <url>]
//!
//! Exit codes: 0 success, 1 configuration error, 2 network unreachable at
//! startup, 3 unrecoverable state corruption.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

mod rpc_client;
use rpc_client::NodeRpcClient;

#[derive(Parser, Debug)]
#[command(name = "kronos-cli", version, about = "Kronos node operator CLI")]
struct Args {
    /// Node RPC endpoint.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8645")]
    rpc: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Launch a kronos-node process and wait for its RPC endpoint to come up.
    Start {
        /// Directory for the node's sled database and pid file.
        #[arg(long, default_value = "~/.kronos/data")]
        data_dir: PathBuf,
        /// P2P listen multiaddress passed through to the node.
        #[arg(long, default_value = "/ip4/0.0.0.0/tcp/7777")]
        p2p_listen: String,
        /// RPC bind address passed through to the node.
        #[arg(long, default_value = "127.0.0.1:8645")]
        rpc_addr: String,
        /// Bootstrap peer multiaddress, may be repeated.
        #[arg(long)]
        bootstrap: Vec<String>,
        /// Seconds to wait for the RPC endpoint to become reachable.
        #[arg(long, default_value_t = 15)]
        startup_timeout: u64,
    },

    /// Signal a running node process (located via its pid file) to shut down.
    Stop {
        /// Directory containing the node's pid file.
        #[arg(long, default_value = "~/.kronos/data")]
        data_dir: PathBuf,
    },

    /// Print node and chain status.
    Status,

    /// Peer management.
    Peer {
        #[command(subcommand)]
        action: PeerAction,
    },
}

#[derive(Subcommand, Debug)]
enum PeerAction {
    /// Dial an additional peer by multiaddress.
    Add {
        /// Peer multiaddress (e.g. "/ip4/1.2.3.4/tcp/7777/p2p/<PeerId>").
        addr: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter("warn,kronos_cli=info").init();

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
    match args.command {
        Command::Start { data_dir, p2p_listen, rpc_addr, bootstrap, startup_timeout } => {
            cmd_start(&data_dir, &p2p_listen, &rpc_addr, &bootstrap, startup_timeout).await
        }
        Command::Stop { data_dir } => cmd_stop(&data_dir),
        Command::Status => cmd_status(&args.rpc).await,
        Command::Peer { action: PeerAction::Add { addr } } => cmd_peer_add(&args.rpc, &addr).await,
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

async fn cmd_start(
    data_dir: &PathBuf,
    p2p_listen: &str,
    rpc_addr: &str,
    bootstrap: &[String],
    startup_timeout: u64,
) -> ExitCode {
    let data_dir = expand_tilde(data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        error!(error = %e, dir = %data_dir.display(), "failed to create data directory");
        return ExitCode::from(1);
    }

    let mut cmd = std::process::Command::new("kronos-node");
    cmd.arg("--data-dir").arg(&data_dir);
    cmd.arg("--p2p-listen").arg(p2p_listen);
    cmd.arg("--rpc-addr").arg(rpc_addr);
    for peer in bootstrap {
        cmd.arg("--bootstrap").arg(peer);
    }

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            error!(error = %e, "failed to spawn kronos-node — is it on PATH?");
            return ExitCode::from(1);
        }
    };

    let pid_path = data_dir.join("kronos-node.pid");
    if let Err(e) = std::fs::write(&pid_path, child.id().to_string()) {
        warn!(error = %e, "failed to write pid file; `stop` will not be able to find this process");
    }

    let rpc_url = format!("http://{rpc_addr}");
    let client = NodeRpcClient::new(&rpc_url);
    let deadline = std::time::Instant::now() + Duration::from_secs(startup_timeout);
    loop {
        if client.ping().await.is_ok() {
            info!(pid = child.id(), rpc = %rpc_url, "node started");
            println!("Node started (pid {}), RPC reachable at {}", child.id(), rpc_url);
            return ExitCode::SUCCESS;
        }
        if std::time::Instant::now() >= deadline {
            error!(rpc = %rpc_url, "node did not become reachable within the startup timeout");
            return ExitCode::from(2);
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

fn cmd_stop(data_dir: &PathBuf) -> ExitCode {
    let data_dir = expand_tilde(data_dir);
    let pid_path = data_dir.join("kronos-node.pid");

    let pid = match std::fs::read_to_string(&pid_path) {
        Ok(s) => match s.trim().parse::<u32>() {
            Ok(pid) => pid,
            Err(e) => {
                error!(error = %e, path = %pid_path.display(), "pid file is corrupt");
                return ExitCode::from(3);
            }
        },
        Err(e) => {
            error!(error = %e, path = %pid_path.display(), "no pid file found — is the node running?");
            return ExitCode::from(1);
        }
    };

    match std::process::Command::new("kill").arg("-TERM").arg(pid.to_string()).status() {
        Ok(status) if status.success() => {
            let _ = std::fs::remove_file(&pid_path);
            println!("Sent shutdown signal to pid {pid}");
            ExitCode::SUCCESS
        }
        Ok(status) => {
            error!(?status, pid, "kill command reported failure");
            ExitCode::from(1)
        }
        Err(e) => {
            error!(error = %e, "failed to invoke kill");
            ExitCode::from(1)
        }
    }
}

async fn cmd_status(rpc: &str) -> ExitCode {
    let client = NodeRpcClient::new(rpc);

    let version = match client.get_version().await {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, rpc, "node unreachable");
            return ExitCode::from(2);
        }
    };

    let stats = match client.get_chain_stats().await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to fetch chain stats");
            return ExitCode::from(2);
        }
    };

    let window = match client.get_current_window().await {
        Ok(w) => w,
        Err(e) => {
            error!(error = %e, "failed to fetch current window");
            return ExitCode::from(2);
        }
    };

    let latest_checkpoint = client
        .get_finality_checkpoint(window.window.saturating_sub(1))
        .await
        .ok()
        .flatten();

    println!("Node version:     {}", version.node_version);
    println!("Protocol version: {}", version.protocol_version);
    println!("DAG vertices:     {}", stats.total_vertices);
    println!("DAG tips:         {}", stats.dag_tip_count);
    println!("Heaviest blue score: {}", stats.heaviest_blue_score);
    println!("Current window:   {} (boundary {})", window.window, window.boundary);

    match latest_checkpoint {
        Some(cp) => println!(
            "Status: synced (last finality checkpoint: window {}, {} heartbeats)",
            cp.window, cp.heartbeat_count
        ),
        None => println!("Status: stalled (no finality checkpoint observed yet)"),
    }

    ExitCode::SUCCESS
}

async fn cmd_peer_add(rpc: &str, addr: &str) -> ExitCode {
    let client = NodeRpcClient::new(rpc);
    match client.add_peer(addr).await {
        Ok(()) => {
            println!("Dialing {addr}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, rpc, "failed to reach node");
            ExitCode::from(2)
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn expand_tilde(path: &PathBuf) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.clone()
}
