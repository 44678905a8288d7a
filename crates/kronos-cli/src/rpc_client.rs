use anyhow::{bail, Context};

/// Simple JSON-RPC 2.0 client used by the CLI front-end to talk to a
/// running node.
///
/// Uses raw HTTP POST with serde_json rather than the full jsonrpsee client
/// to keep the CLI binary lean and dependency-minimal.
pub struct NodeRpcClient {
    url: String,
    client: reqwest::Client,
}

impl NodeRpcClient {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Call a JSON-RPC method and return the `result` field.
    async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("connecting to node at {}", self.url))?;

        let json: serde_json::Value = resp.json().await.context("parsing RPC response")?;

        if let Some(err) = json.get("error") {
            bail!("RPC error: {}", err);
        }

        Ok(json["result"].clone())
    }

    /// Probe the node's liveness. Used by `start` to wait for the RPC
    /// endpoint to come up, and by `status`/`peer add` to fail fast with a
    /// clear error if the node is unreachable.
    pub async fn ping(&self) -> anyhow::Result<()> {
        self.call("kronos_getVersion", serde_json::json!([])).await?;
        Ok(())
    }

    pub async fn get_version(&self) -> anyhow::Result<kronos_rpc::RpcVersionInfo> {
        let result = self.call("kronos_getVersion", serde_json::json!([])).await?;
        serde_json::from_value(result).context("parsing version info")
    }

    pub async fn get_chain_stats(&self) -> anyhow::Result<kronos_rpc::RpcChainStats> {
        let result = self.call("kronos_getChainStats", serde_json::json!([])).await?;
        serde_json::from_value(result).context("parsing chain stats")
    }

    pub async fn get_current_window(&self) -> anyhow::Result<kronos_rpc::RpcCurrentWindow> {
        let result = self.call("kronos_getCurrentWindow", serde_json::json!([])).await?;
        serde_json::from_value(result).context("parsing current window")
    }

    pub async fn get_finality_checkpoint(
        &self,
        window: u64,
    ) -> anyhow::Result<Option<kronos_rpc::RpcCheckpoint>> {
        let result = self
            .call("kronos_getFinalityCheckpoint", serde_json::json!([window]))
            .await?;
        serde_json::from_value(result).context("parsing finality checkpoint")
    }

    pub async fn get_network_info(&self) -> anyhow::Result<kronos_rpc::RpcNetworkInfo> {
        let result = self.call("kronos_getNetworkInfo", serde_json::json!([])).await?;
        serde_json::from_value(result).context("parsing network info")
    }

    pub async fn add_peer(&self, multiaddr: &str) -> anyhow::Result<()> {
        self.call("kronos_addPeer", serde_json::json!([multiaddr])).await?;
        Ok(())
    }
}
