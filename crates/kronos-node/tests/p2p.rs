//! P2P integration test for kronos-node.
//!
//! Starts two node processes sharing one genesis bundle:
//!   Node A — bootstrap node (no peers)
//!   Node B — joins by dialing node A
//!
//! Once the GossipSub mesh has formed, node A spends one of its own
//! coinbase outputs to a fresh recipient. Node B never talks to the RPC
//! that submitted the transaction — it only learns about it (and the
//! block that created the spent output) via gossip — so observing the
//! recipient's balance on node B is a direct test of block and
//! transaction propagation.
//!
//! Run with:
//!   cargo test -p kronos-node --test p2p

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use kronos_core::transaction::{Transaction, TxInput, TxOutput};
use kronos_core::types::{OutputId, PrivacyTier, TxId};
use kronos_crypto::KeyPair;
use kronos_genesis::GenesisParams;

#[derive(serde::Serialize, serde::Deserialize)]
struct GenesisBundle {
    params: GenesisParams,
    producer: KeyPair,
}

// ── Node lifecycle ────────────────────────────────────────────────────────────

struct NodeGuard {
    child: Child,
    data_dir: PathBuf,
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn spawn_node(
    data_dir: &PathBuf,
    rpc_port: u16,
    p2p_port: u16,
    genesis_path: &PathBuf,
    bootstrap: Option<&str>,
) -> Child {
    let node_bin = env!("CARGO_BIN_EXE_kronos-node");
    let mut cmd = Command::new(node_bin);
    cmd.args([
        "--data-dir",
        data_dir.to_str().unwrap(),
        "--rpc-addr",
        &format!("127.0.0.1:{}", rpc_port),
        "--p2p-listen",
        &format!("/ip4/127.0.0.1/tcp/{}", p2p_port),
        "--genesis-file",
        genesis_path.to_str().unwrap(),
    ]);
    if let Some(bs) = bootstrap {
        cmd.args(["--bootstrap", bs]);
    }
    cmd.stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn kronos-node")
}

// ── RPC helpers ───────────────────────────────────────────────────────────────

async fn rpc_call(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> Option<serde_json::Value> {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });
    let resp = client.post(url).json(&body).send().await.ok()?;
    let json: serde_json::Value = resp.json().await.ok()?;
    if json.get("error").is_some() {
        return None;
    }
    Some(json["result"].clone())
}

async fn rpc_call_unwrap(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    rpc_call(client, url, method, params)
        .await
        .unwrap_or_else(|| panic!("RPC call {method} returned error/none"))
}

async fn wait_for_rpc(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": "kronos_getGenesisInfo",
        "params": [],
        "id": 1
    });
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(resp) = client.post(url).json(&body).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    false
}

async fn get_peer_multiaddr(client: &reqwest::Client, url: &str) -> String {
    let result = rpc_call_unwrap(client, url, "kronos_getNetworkInfo", serde_json::json!([])).await;
    result["peer_multiaddr"]
        .as_str()
        .expect("peer_multiaddr field")
        .to_string()
}

async fn get_balance(client: &reqwest::Client, url: &str, participant_b58: &str) -> u128 {
    let result = rpc_call_unwrap(client, url, "kronos_getBalance", serde_json::json!([participant_b58])).await;
    result.as_str().unwrap().parse().unwrap()
}

async fn get_recent_tx_ids(client: &reqwest::Client, url: &str, limit: u32) -> Vec<String> {
    let result = rpc_call_unwrap(
        client,
        url,
        "kronos_getRecentTransactions",
        serde_json::json!([limit]),
    )
    .await;
    result
        .as_array()
        .expect("recent tx array")
        .iter()
        .map(|v| v["tx_id"].as_str().unwrap().to_string())
        .collect()
}

async fn get_transaction(client: &reqwest::Client, url: &str, tx_id_hex: &str) -> Option<Transaction> {
    let result = rpc_call_unwrap(client, url, "kronos_getTransaction", serde_json::json!([tx_id_hex])).await;
    let hex_body = result.as_str()?;
    let bytes = hex::decode(hex_body).ok()?;
    bincode::deserialize(&bytes).ok()
}

async fn send_tx(client: &reqwest::Client, url: &str, tx: &Transaction) -> String {
    let bytes = bincode::serialize(tx).unwrap();
    let tx_hex = hex::encode(bytes);
    let result = rpc_call_unwrap(client, url, "kronos_sendTransaction", serde_json::json!([tx_hex])).await;
    result.as_str().unwrap().to_string()
}

/// Poll until `tx_id_hex` is visible via `kronos_getTransaction` on the
/// given node.
async fn wait_for_tx(client: &reqwest::Client, url: &str, tx_id_hex: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if get_transaction(client, url, tx_id_hex).await.is_some() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    false
}

/// Find the most recently minted coinbase output owned by `owner`,
/// decoding candidates from `kronos_getRecentTransactions` (newest
/// first) since the RPC surface has no per-output listing.
async fn find_spendable_coinbase_output(
    client: &reqwest::Client,
    url: &str,
    owner: &kronos_core::types::ParticipantId,
    timeout: Duration,
) -> (OutputId, u128) {
    let deadline = Instant::now() + timeout;
    loop {
        let tx_ids = get_recent_tx_ids(client, url, 50).await;
        for tx_id_hex in &tx_ids {
            if let Some(tx) = get_transaction(client, url, tx_id_hex).await {
                if !tx.is_coinbase() {
                    continue;
                }
                for (index, output) in tx.outputs.iter().enumerate() {
                    if &output.owner == owner {
                        return (
                            OutputId {
                                tx_id: TxId::from_hex(tx_id_hex).unwrap(),
                                index: index as u32,
                            },
                            output.amount,
                        );
                    }
                }
            }
        }
        if Instant::now() >= deadline {
            panic!("no coinbase output for this identity appeared in time");
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
}

// ── P2P test ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn p2p_gossip_propagation() {
    let http = reqwest::Client::new();

    let base_dir = std::env::temp_dir().join(format!("kronos_p2p_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&base_dir);

    let dir_a = base_dir.join("node_a");
    let dir_b = base_dir.join("node_b");
    std::fs::create_dir_all(&dir_a).unwrap();
    std::fs::create_dir_all(&dir_b).unwrap();

    // Both nodes load the same bundle (network params + genesis
    // producer keypair) so they independently derive the identical
    // genesis block.
    let genesis_path_a = dir_a.join("genesis.bin");
    let bundle = GenesisBundle {
        params: GenesisParams::default_network(),
        producer: KeyPair::generate(),
    };
    std::fs::write(&genesis_path_a, bincode::serialize(&bundle).unwrap()).unwrap();
    let genesis_path_b = dir_b.join("genesis.bin");
    std::fs::copy(&genesis_path_a, &genesis_path_b).unwrap();

    // ── Start node A (bootstrap node, no peers) ───────────────────────────────
    let rpc_a = free_port();
    let p2p_a = free_port();
    let url_a = format!("http://127.0.0.1:{}", rpc_a);

    let child_a = spawn_node(&dir_a, rpc_a, p2p_a, &genesis_path_a, None);
    let _guard_a = NodeGuard {
        child: child_a,
        data_dir: dir_a.clone(),
    };

    assert!(
        wait_for_rpc(&http, &url_a, Duration::from_secs(20)).await,
        "node A did not become ready"
    );

    let peer_multiaddr_a = get_peer_multiaddr(&http, &url_a).await;
    assert!(
        peer_multiaddr_a.contains("/p2p/"),
        "expected /p2p/ in multiaddr, got: {peer_multiaddr_a}"
    );

    // ── Start node B, bootstrapping off node A ────────────────────────────────
    let rpc_b = free_port();
    let p2p_b = free_port();
    let url_b = format!("http://127.0.0.1:{}", rpc_b);

    let child_b = spawn_node(&dir_b, rpc_b, p2p_b, &genesis_path_b, Some(&peer_multiaddr_a));
    let _guard_b = NodeGuard {
        child: child_b,
        data_dir: dir_b.clone(),
    };

    assert!(
        wait_for_rpc(&http, &url_b, Duration::from_secs(20)).await,
        "node B did not become ready"
    );

    // Heartbeats and GossipSub mesh formation both run on ~1s cadences;
    // give the mesh time to settle before relying on propagation.
    tokio::time::sleep(Duration::from_secs(5)).await;

    // ── Read node A's runtime identity, find a fresh coinbase output ──────────
    let identity_bytes = std::fs::read(dir_a.join("identity.bin")).expect("node A identity file");
    let identity_a: KeyPair = bincode::deserialize(&identity_bytes).expect("valid identity encoding");

    let (output_id, output_amount) =
        find_spendable_coinbase_output(&http, &url_a, &identity_a.participant_id, Duration::from_secs(15)).await;

    // ── Spend it to a fresh recipient, submitted only to node A ──────────────
    let recipient = KeyPair::generate();
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let mut tx = Transaction {
        tx_id: TxId::from_bytes([0u8; 32]),
        inputs: vec![TxInput {
            output_id,
            signature: kronos_core::types::SphincsSignature(vec![]),
        }],
        outputs: vec![TxOutput {
            owner: recipient.participant_id.clone(),
            amount: output_amount,
            tier: PrivacyTier::T0,
        }],
        timestamp: now,
        fee: 0,
        authorizer: Some(identity_a.public_key.clone()),
    };
    let body_bytes = tx.body_bytes();
    let signature = identity_a.sign(&body_bytes);
    for input in &mut tx.inputs {
        input.signature = signature.clone();
    }
    tx.tx_id = kronos_crypto::tx_id_from_body(&tx.body_bytes());
    let tx_id_hex = send_tx(&http, &url_a, &tx).await;

    // ── Node A embeds and applies it on its own first place ──────────────────
    assert!(
        wait_for_tx(&http, &url_a, &tx_id_hex, Duration::from_secs(10)).await,
        "node A did not apply its own transaction"
    );

    // ── Node B never saw the RPC call; it only learns via GossipSub ──────────
    assert!(
        wait_for_tx(&http, &url_b, &tx_id_hex, Duration::from_secs(15)).await,
        "node B did not receive the transaction via GossipSub propagation"
    );

    let recipient_b58 = recipient.participant_id.to_b58();
    let bal_a = get_balance(&http, &url_a, &recipient_b58).await;
    let bal_b = get_balance(&http, &url_b, &recipient_b58).await;
    assert_eq!(bal_a, output_amount, "node A: wrong recipient balance");
    assert_eq!(bal_b, output_amount, "node B: wrong recipient balance");
    assert_eq!(bal_a, bal_b, "nodes disagree on recipient balance");
}
