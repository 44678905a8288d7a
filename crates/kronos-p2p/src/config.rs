use kronos_core::constants::{
    INBOUND_RATIO_MAX_DEFAULT, MAX_CONNECTIONS_PER_IP, MAX_CONNECTIONS_PER_SUBNET24,
    MIN_OUTBOUND_PEERS_DEFAULT, PEER_RECV_BPS_DEFAULT, PEER_RPC_TIMEOUT_SECONDS,
    PEER_SEND_BPS_DEFAULT, SHUTDOWN_GRACE_SECONDS,
};

/// Configuration for the Kronos P2P network.
#[derive(Debug, Clone)]
pub struct P2pConfig {
    /// Local listen address (e.g. "/ip4/0.0.0.0/tcp/7777").
    pub listen_addr: String,
    /// Bootstrap peer multiaddresses.
    pub bootstrap_peers: Vec<String>,
    /// Protocol version string advertised to peers.
    pub protocol_version: String,
    /// GossipSub topic name for broadcasting blocks, transactions,
    /// heartbeats, and checkpoints.
    pub gossip_topic: String,

    /// Per-peer inbound byte-rate cap.
    pub peer_recv_bps: u64,
    /// Per-peer outbound byte-rate cap.
    pub peer_send_bps: u64,
    /// Minimum outbound connections this node tries to maintain, to resist
    /// eclipse attacks relying on an all-inbound peer set.
    pub min_outbound_peers: usize,
    /// Maximum fraction of the connection set that may be inbound.
    pub inbound_ratio_max: f64,
    /// Maximum simultaneous connections from a single IP address.
    pub max_connections_per_ip: usize,
    /// Maximum simultaneous connections from a single /24 subnet.
    pub max_connections_per_subnet24: usize,
    /// Timeout for a request/response round-trip with a peer.
    pub rpc_timeout_secs: u64,
    /// Grace period given to in-flight peer work during shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for P2pConfig {
    fn default() -> Self {
        Self {
            listen_addr: "/ip4/0.0.0.0/tcp/7777".into(),
            bootstrap_peers: Vec::new(),
            protocol_version: "/kronos/1.0.0".into(),
            gossip_topic: "kronos-blocks".into(),
            peer_recv_bps: PEER_RECV_BPS_DEFAULT,
            peer_send_bps: PEER_SEND_BPS_DEFAULT,
            min_outbound_peers: MIN_OUTBOUND_PEERS_DEFAULT,
            inbound_ratio_max: INBOUND_RATIO_MAX_DEFAULT,
            max_connections_per_ip: MAX_CONNECTIONS_PER_IP,
            max_connections_per_subnet24: MAX_CONNECTIONS_PER_SUBNET24,
            rpc_timeout_secs: PEER_RPC_TIMEOUT_SECONDS,
            shutdown_grace_secs: SHUTDOWN_GRACE_SECONDS,
        }
    }
}
