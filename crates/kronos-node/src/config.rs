//! Startup configuration, derived from [`crate::Args`].
//!
//! Most of the consensus-critical parameters the spec lists as
//! "recognized options" — the finality interval, clock tolerance, DAG
//! parent bounds, and the PHANTOM anticone parameter — are compiled into
//! [`kronos_core::constants`] rather than threaded through the runtime,
//! since every participant must agree on them bit-for-bit to stay on the
//! same chain. `NodeConfig::from_args` still accepts them as flags, for
//! an operator to record their expectation explicitly, and refuses to
//! start if the flag disagrees with what the binary was built with —
//! catching a misconfigured deployment at startup instead of a silent
//! fork down the line.

use std::net::SocketAddr;
use std::path::PathBuf;

use kronos_core::constants::{CLOCK_TOLERANCE_SECONDS, DAG_MAX_PARENTS, FINALITY_INTERVAL_SECONDS, PHANTOM_K};
use kronos_core::error::KronosError;

use crate::Args;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub data_dir: PathBuf,
    pub p2p_listen: String,
    pub rpc_addr: SocketAddr,
    pub bootstrap: Vec<String>,
    pub genesis_file: PathBuf,
    pub identity_file: PathBuf,
    pub mempool_bytes_max: usize,
    pub block_bytes_max: usize,
    pub vdf_iterations: u64,
    pub peer_recv_bps: u64,
    pub peer_send_bps: u64,
    pub min_outbound_peers: usize,
    pub inbound_ratio_max: f64,
}

impl NodeConfig {
    pub fn from_args(args: &Args) -> Result<Self, KronosError> {
        if args.finality_interval_seconds != FINALITY_INTERVAL_SECONDS {
            return Err(KronosError::OutOfRange(format!(
                "--finality-interval-seconds {} does not match the compiled protocol value {}",
                args.finality_interval_seconds, FINALITY_INTERVAL_SECONDS
            )));
        }
        if args.clock_tolerance_seconds != CLOCK_TOLERANCE_SECONDS {
            return Err(KronosError::OutOfRange(format!(
                "--clock-tolerance-seconds {} does not match the compiled protocol value {}",
                args.clock_tolerance_seconds, CLOCK_TOLERANCE_SECONDS
            )));
        }
        if args.max_parents != DAG_MAX_PARENTS {
            return Err(KronosError::OutOfRange(format!(
                "--max-parents {} does not match the compiled protocol value {}",
                args.max_parents, DAG_MAX_PARENTS
            )));
        }
        if args.phantom_k != PHANTOM_K {
            return Err(KronosError::OutOfRange(format!(
                "--phantom-k {} does not match the compiled protocol value {}",
                args.phantom_k, PHANTOM_K
            )));
        }
        if args.inbound_ratio_max <= 0.0 || args.inbound_ratio_max > 1.0 {
            return Err(KronosError::OutOfRange(format!(
                "--inbound-ratio-max must be in (0, 1], got {}",
                args.inbound_ratio_max
            )));
        }

        let rpc_addr: SocketAddr = args
            .rpc_addr
            .parse()
            .map_err(|e| KronosError::OutOfRange(format!("invalid --rpc-addr {:?}: {e}", args.rpc_addr)))?;

        let data_dir = expand_tilde(&args.data_dir);
        let genesis_file = args
            .genesis_file
            .clone()
            .unwrap_or_else(|| data_dir.join("genesis.bin"));
        let identity_file = data_dir.join("identity.bin");

        Ok(Self {
            data_dir,
            p2p_listen: args.p2p_listen.clone(),
            rpc_addr,
            bootstrap: args.bootstrap.clone(),
            genesis_file,
            identity_file,
            mempool_bytes_max: args.mempool_bytes_max,
            block_bytes_max: args.block_bytes_max,
            vdf_iterations: args.vdf_iterations,
            peer_recv_bps: args.peer_recv_bps,
            peer_send_bps: args.peer_send_bps,
            min_outbound_peers: args.min_outbound_peers,
            inbound_ratio_max: args.inbound_ratio_max,
        })
    }
}

fn expand_tilde(path: &PathBuf) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn default_args_validate() {
        let args = Args::parse_from(["kronos-node"]);
        assert!(NodeConfig::from_args(&args).is_ok());
    }

    #[test]
    fn pinned_mismatch_is_rejected() {
        let mut args = Args::parse_from(["kronos-node"]);
        args.phantom_k = 3;
        assert!(matches!(
            NodeConfig::from_args(&args),
            Err(KronosError::OutOfRange(_))
        ));
    }
}
