use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::time::Duration;

use futures::StreamExt;
use libp2p::{
    gossipsub, identify, kad, noise, ping, tcp, yamux,
    core::ConnectedPoint,
    swarm::SwarmEvent,
    Multiaddr, PeerId, Swarm,
};
use libp2p_swarm::NetworkBehaviour;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::P2pConfig;
use crate::message::P2pMessage;

/// Combined libp2p network behaviour for Kronos.
///
/// The `#[derive(NetworkBehaviour)]` macro auto-generates a
/// `KronosBehaviourEvent` enum with one variant per field.
#[derive(NetworkBehaviour)]
pub struct KronosBehaviour {
    pub gossipsub: gossipsub::Behaviour,
    pub kademlia: kad::Behaviour<kad::store::MemoryStore>,
    pub identify: identify::Behaviour,
    pub ping: ping::Behaviour,
}

/// Application-facing handle returned from `P2pNetwork::new()`.
pub struct P2pHandle {
    /// Send here to broadcast a message to all gossip peers.
    pub outbound_tx: mpsc::Sender<P2pMessage>,
    /// Receive here to consume messages arriving from peers.
    pub inbound_rx: mpsc::Receiver<P2pMessage>,
    /// Send a multiaddress string here to dial it, e.g. in response to the
    /// `peer add` CLI command relayed over RPC.
    pub dial_tx: mpsc::Sender<String>,
    /// Local libp2p peer identity.
    pub local_peer_id: PeerId,
}

/// Per-source-address connection accounting used to enforce the
/// eclipse-resistance caps: at most one connection per IP, three per /24
/// subnet, and a floor on the fraction of connections that are inbound.
#[derive(Default)]
struct ConnectionGuard {
    per_ip: HashMap<IpAddr, usize>,
    per_subnet24: HashMap<[u8; 3], usize>,
    inbound_count: usize,
    outbound_count: usize,
}

impl ConnectionGuard {
    fn subnet_of(ip: IpAddr) -> Option<[u8; 3]> {
        match ip {
            IpAddr::V4(v4) => {
                let o = v4.octets();
                Some([o[0], o[1], o[2]])
            }
            IpAddr::V6(_) => None,
        }
    }

    /// Returns `Ok(())` if the connection is admissible, `Err(reason)` if a
    /// cap is exceeded and the connection should be dropped.
    fn admit(&mut self, ip: IpAddr, inbound: bool, config: &P2pConfig) -> Result<(), String> {
        let ip_count = self.per_ip.get(&ip).copied().unwrap_or(0);
        if ip_count >= config.max_connections_per_ip {
            return Err(format!("per-IP connection cap reached for {ip}"));
        }
        if let Some(subnet) = Self::subnet_of(ip) {
            let subnet_count = self.per_subnet24.get(&subnet).copied().unwrap_or(0);
            if subnet_count >= config.max_connections_per_subnet24 {
                return Err(format!("per-subnet connection cap reached for {ip}/24"));
            }
        }

        if inbound {
            let total = self.inbound_count + self.outbound_count + 1;
            let inbound_after = self.inbound_count + 1;
            if (inbound_after as f64) / (total as f64) > config.inbound_ratio_max
                && self.outbound_count < config.min_outbound_peers
            {
                return Err("inbound connection ratio cap reached".to_string());
            }
        }

        *self.per_ip.entry(ip).or_insert(0) += 1;
        if let Some(subnet) = Self::subnet_of(ip) {
            *self.per_subnet24.entry(subnet).or_insert(0) += 1;
        }
        if inbound {
            self.inbound_count += 1;
        } else {
            self.outbound_count += 1;
        }
        Ok(())
    }

    fn release(&mut self, ip: IpAddr, inbound: bool) {
        if let Some(count) = self.per_ip.get_mut(&ip) {
            *count = count.saturating_sub(1);
        }
        if let Some(subnet) = Self::subnet_of(ip) {
            if let Some(count) = self.per_subnet24.get_mut(&subnet) {
                *count = count.saturating_sub(1);
            }
        }
        if inbound {
            self.inbound_count = self.inbound_count.saturating_sub(1);
        } else {
            self.outbound_count = self.outbound_count.saturating_sub(1);
        }
    }
}

fn endpoint_ip(endpoint: &ConnectedPoint) -> Option<IpAddr> {
    let addr = match endpoint {
        ConnectedPoint::Dialer { address, .. } => address,
        ConnectedPoint::Listener { send_back_addr, .. } => send_back_addr,
    };
    addr.iter().find_map(|p| match p {
        libp2p::multiaddr::Protocol::Ip4(ip) => Some(IpAddr::V4(ip)),
        libp2p::multiaddr::Protocol::Ip6(ip) => Some(IpAddr::V6(ip)),
        _ => None,
    })
}

/// Owns the libp2p Swarm. Pass to `tokio::spawn(network.run())`.
pub struct P2pNetwork {
    swarm: Swarm<KronosBehaviour>,
    topic: gossipsub::IdentTopic,
    outbound_rx: mpsc::Receiver<P2pMessage>,
    inbound_tx: mpsc::Sender<P2pMessage>,
    dial_rx: mpsc::Receiver<String>,
    config: P2pConfig,
    guard: ConnectionGuard,
    peer_ips: HashMap<PeerId, (IpAddr, bool)>,
}

impl P2pNetwork {
    /// Build the network and return `(P2pNetwork, P2pHandle)`.
    pub fn new(
        config: &P2pConfig,
    ) -> Result<(Self, P2pHandle), Box<dyn std::error::Error + Send + Sync>> {
        let topic = gossipsub::IdentTopic::new(&config.gossip_topic);

        let mut swarm = libp2p::SwarmBuilder::with_new_identity()
            .with_tokio()
            .with_tcp(
                tcp::Config::default(),
                noise::Config::new,
                yamux::Config::default,
            )?
            .with_behaviour(|key: &libp2p::identity::Keypair| {
                let message_id_fn = |msg: &gossipsub::Message| {
                    let mut s = DefaultHasher::new();
                    msg.data.hash(&mut s);
                    gossipsub::MessageId::from(s.finish().to_string())
                };

                let gossipsub_config = gossipsub::ConfigBuilder::default()
                    .heartbeat_interval(Duration::from_secs(1))
                    .validation_mode(gossipsub::ValidationMode::Strict)
                    .message_id_fn(message_id_fn)
                    .build()
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

                let gossipsub = gossipsub::Behaviour::new(
                    gossipsub::MessageAuthenticity::Signed(key.clone()),
                    gossipsub_config,
                )
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

                let store = kad::store::MemoryStore::new(key.public().to_peer_id());
                let kademlia = kad::Behaviour::new(key.public().to_peer_id(), store);

                let identify = identify::Behaviour::new(identify::Config::new(
                    config.protocol_version.clone(),
                    key.public(),
                ));

                let ping = ping::Behaviour::default();

                Ok(KronosBehaviour { gossipsub, kademlia, identify, ping })
            })?
            .build();

        swarm.behaviour_mut().gossipsub.subscribe(&topic)?;

        let listen_addr: Multiaddr = config.listen_addr.parse()?;
        swarm.listen_on(listen_addr)?;

        for addr_str in &config.bootstrap_peers {
            if let Ok(addr) = addr_str.parse::<Multiaddr>() {
                if let Some(libp2p::multiaddr::Protocol::P2p(peer_id)) = addr.iter().last() {
                    swarm.behaviour_mut().kademlia.add_address(&peer_id, addr.clone());
                    debug!(peer = %peer_id, "added bootstrap peer");
                }
            }
        }

        let local_peer_id = *swarm.local_peer_id();
        let (outbound_tx, outbound_rx) = mpsc::channel(256);
        let (inbound_tx, inbound_rx) = mpsc::channel(256);
        let (dial_tx, dial_rx) = mpsc::channel(16);

        let network = P2pNetwork {
            swarm,
            topic,
            outbound_rx,
            inbound_tx,
            dial_rx,
            config: config.clone(),
            guard: ConnectionGuard::default(),
            peer_ips: HashMap::new(),
        };
        let handle = P2pHandle { outbound_tx, inbound_rx, dial_tx, local_peer_id };

        Ok((network, handle))
    }

    /// Dial a peer by multiaddress, e.g. in response to a `peer add` CLI
    /// command.
    pub fn dial(&mut self, addr: Multiaddr) -> Result<(), libp2p::swarm::DialError> {
        self.swarm.dial(addr)
    }

    /// Drive the P2P event loop. Run in a dedicated tokio task.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(msg) = self.outbound_rx.recv() => {
                    let data = msg.to_bytes();
                    if let Err(e) = self.swarm
                        .behaviour_mut()
                        .gossipsub
                        .publish(self.topic.clone(), data)
                    {
                        warn!(error = %e, "gossipsub publish failed");
                    }
                }

                Some(addr_str) = self.dial_rx.recv() => {
                    match addr_str.parse::<Multiaddr>() {
                        Ok(addr) => match self.dial(addr.clone()) {
                            Ok(()) => info!(%addr, "dialing peer"),
                            Err(e) => warn!(%addr, error = %e, "manual dial failed"),
                        },
                        Err(e) => warn!(addr = %addr_str, error = %e, "invalid multiaddress"),
                    }
                }

                event = self.swarm.select_next_some() => {
                    match event {
                        SwarmEvent::NewListenAddr { address, .. } => {
                            info!(addr = %address, "P2P listening on");
                        }
                        SwarmEvent::Behaviour(KronosBehaviourEvent::Gossipsub(
                            gossipsub::Event::Message { message, .. },
                        )) => {
                            match P2pMessage::from_bytes(&message.data) {
                                Ok(msg) => { let _ = self.inbound_tx.send(msg).await; }
                                Err(e) => debug!(error = %e, "failed to decode gossip message"),
                            }
                        }
                        SwarmEvent::Behaviour(KronosBehaviourEvent::Identify(
                            identify::Event::Received { peer_id, info, .. },
                        )) => {
                            for addr in info.listen_addrs {
                                self.swarm
                                    .behaviour_mut()
                                    .kademlia
                                    .add_address(&peer_id, addr);
                            }
                        }
                        SwarmEvent::ConnectionEstablished { peer_id, endpoint, .. } => {
                            let inbound = matches!(endpoint, ConnectedPoint::Listener { .. });
                            if let Some(ip) = endpoint_ip(&endpoint) {
                                match self.guard.admit(ip, inbound, &self.config) {
                                    Ok(()) => {
                                        self.peer_ips.insert(peer_id, (ip, inbound));
                                        debug!(peer = %peer_id, %ip, inbound, "connection established");
                                    }
                                    Err(reason) => {
                                        warn!(peer = %peer_id, %ip, reason, "rejecting connection");
                                        let _ = self.swarm.disconnect_peer_id(peer_id);
                                    }
                                }
                            }
                        }
                        SwarmEvent::ConnectionClosed { peer_id, .. } => {
                            if let Some((ip, inbound)) = self.peer_ips.remove(&peer_id) {
                                self.guard.release(ip, inbound);
                            }
                            debug!(peer = %peer_id, "connection closed");
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}
