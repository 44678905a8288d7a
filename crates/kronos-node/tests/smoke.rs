//! End-to-end smoke test for kronos-node.
//!
//! Starts a real node process against a freshly minted genesis bundle,
//! lets it self-elect and mint a few coinbase blocks (a lone participant
//! always wins its own slot lottery), then spends part of that coinbase
//! to a fresh recipient via JSON-RPC and asserts the balance moved.
//!
//! Run with:
//!   cargo test -p kronos-node --test smoke

use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use kronos_core::transaction::{Transaction, TxInput, TxOutput};
use kronos_core::types::{OutputId, PrivacyTier, TxId};
use kronos_crypto::KeyPair;
use kronos_genesis::GenesisParams;

// ── Genesis bundle mirror ────────────────────────────────────────────────────
//
// kronos-node is a binary crate with no library surface, so this test
// cannot import its private `GenesisBundle` type. The wire format only
// depends on field order and types matching, so a local struct with the
// same shape round-trips through bincode exactly like the real one.
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

// ── RPC helpers ───────────────────────────────────────────────────────────────

async fn rpc_call(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    });
    let resp = client
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap_or_else(|e| panic!("RPC call {method} failed: {e}"));
    let json: serde_json::Value = resp.json().await.expect("parse RPC JSON");
    if let Some(err) = json.get("error") {
        panic!("RPC error from {method}: {err}");
    }
    json["result"].clone()
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

async fn get_balance(client: &reqwest::Client, url: &str, participant_b58: &str) -> u128 {
    let result = rpc_call(
        client,
        url,
        "kronos_getBalance",
        serde_json::json!([participant_b58]),
    )
    .await;
    result.as_str().unwrap().parse().expect("parse balance")
}

async fn wait_for_balance_above(
    client: &reqwest::Client,
    url: &str,
    participant_b58: &str,
    threshold: u128,
    timeout: Duration,
) -> u128 {
    let deadline = Instant::now() + timeout;
    loop {
        let balance = get_balance(client, url, participant_b58).await;
        if balance > threshold {
            return balance;
        }
        if Instant::now() >= deadline {
            panic!("balance for {participant_b58} did not exceed {threshold} within timeout");
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
}

async fn get_recent_tx_ids(client: &reqwest::Client, url: &str, limit: u32) -> Vec<String> {
    let result = rpc_call(
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

async fn get_transaction(client: &reqwest::Client, url: &str, tx_id_hex: &str) -> Transaction {
    let result = rpc_call(
        client,
        url,
        "kronos_getTransaction",
        serde_json::json!([tx_id_hex]),
    )
    .await;
    let hex_body = result.as_str().expect("transaction hex present");
    let bytes = hex::decode(hex_body).expect("valid hex");
    bincode::deserialize(&bytes).expect("valid transaction encoding")
}

async fn send_tx(client: &reqwest::Client, url: &str, tx: &Transaction) -> String {
    let bytes = bincode::serialize(tx).expect("serialize tx");
    let tx_hex = hex::encode(bytes);
    let result = rpc_call(
        client,
        url,
        "kronos_sendTransaction",
        serde_json::json!([tx_hex]),
    )
    .await;
    result.as_str().expect("tx_id string").to_string()
}

/// Find the first unspent coinbase output owned by `owner` among the most
/// recent transactions, by decoding each candidate and checking its
/// outputs directly (the RPC surface only exposes aggregate balances, not
/// a per-output listing).
async fn find_spendable_coinbase_output(
    client: &reqwest::Client,
    url: &str,
    owner: &kronos_core::types::ParticipantId,
) -> (OutputId, u128) {
    let deadline = Instant::now() + Duration::from_secs(15);
    loop {
        let tx_ids = get_recent_tx_ids(client, url, 50).await;
        for tx_id_hex in &tx_ids {
            let tx = get_transaction(client, url, tx_id_hex).await;
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
        if Instant::now() >= deadline {
            panic!("no coinbase output for this node's identity appeared within 15 seconds");
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
}

// ── Smoke test ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn smoke_self_mint_and_transfer() {
    let data_dir = std::env::temp_dir().join(format!("kronos_e2e_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&data_dir);
    std::fs::create_dir_all(&data_dir).unwrap();

    let genesis_path = data_dir.join("genesis.bin");
    let bundle = GenesisBundle {
        params: GenesisParams::default_network(),
        producer: KeyPair::generate(),
    };
    std::fs::write(&genesis_path, bincode::serialize(&bundle).unwrap()).unwrap();

    let rpc_port = free_port();
    let p2p_port = free_port();
    let rpc_url = format!("http://127.0.0.1:{}", rpc_port);
    let node_data_dir = data_dir.join("state");

    let node_bin = env!("CARGO_BIN_EXE_kronos-node");
    let child = Command::new(node_bin)
        .args([
            "--data-dir",
            node_data_dir.to_str().unwrap(),
            "--rpc-addr",
            &format!("127.0.0.1:{}", rpc_port),
            "--p2p-listen",
            &format!("/ip4/127.0.0.1/tcp/{}", p2p_port),
            "--genesis-file",
            genesis_path.to_str().unwrap(),
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn kronos-node");

    let _guard = NodeGuard {
        child,
        data_dir: data_dir.clone(),
    };

    let http = reqwest::Client::new();
    assert!(
        wait_for_rpc(&http, &rpc_url, Duration::from_secs(20)).await,
        "kronos-node did not become ready within 20 seconds"
    );

    // The node's runtime identity is generated on first start and
    // persisted directly under its data directory; read it back to learn
    // which participant id its self-minted coinbase pays.
    let identity_path = node_data_dir.join("identity.bin");
    let deadline = Instant::now() + Duration::from_secs(10);
    while !identity_path.exists() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    let identity_bytes = std::fs::read(&identity_path).expect("node identity file");
    let identity: KeyPair = bincode::deserialize(&identity_bytes).expect("valid identity encoding");
    let self_b58 = identity.participant_id.to_b58();

    // A lone participant always wins its own slot lottery, so a coinbase
    // balance should accrue within the first few one-second ticks.
    let balance = wait_for_balance_above(&http, &rpc_url, &self_b58, 0, Duration::from_secs(15)).await;
    assert!(balance > 0, "node should have minted itself a positive coinbase balance");

    let (output_id, output_amount) =
        find_spendable_coinbase_output(&http, &rpc_url, &identity.participant_id).await;

    // ── Spend that coinbase output entirely to a fresh recipient ──────────────
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
        authorizer: Some(identity.public_key.clone()),
    };
    let body_bytes = tx.body_bytes();
    let signature = identity.sign(&body_bytes);
    for input in &mut tx.inputs {
        input.signature = signature.clone();
    }
    tx.tx_id = kronos_crypto::tx_id_from_body(&tx.body_bytes());

    send_tx(&http, &rpc_url, &tx).await;

    let recipient_b58 = recipient.participant_id.to_b58();
    let recipient_balance =
        wait_for_balance_above(&http, &rpc_url, &recipient_b58, 0, Duration::from_secs(10)).await;
    assert_eq!(
        recipient_balance, output_amount,
        "recipient should receive the entire spent coinbase output"
    );
}
