//! JSON-RPC transport to the live node.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use strata_core::error::NodeError;
use strata_core::traits::NodeClient;

/// HTTP JSON-RPC client with optional basic-auth node credentials.
pub struct RpcHttpClient {
    client: Client,
    endpoint: String,
    credentials: Option<(String, String)>,
}

impl RpcHttpClient {
    pub fn new(endpoint: &str, credentials: Option<(String, String)>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("build reqwest client"),
            endpoint: endpoint.to_owned(),
            credentials,
        }
    }
}

#[async_trait]
impl NodeClient for RpcHttpClient {
    async fn call(&self, method: &str, params: Value) -> Result<Value, NodeError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some((user, pass)) = &self.credentials {
            request = request.basic_auth(user, Some(pass));
        }

        let resp: Value = request
            .send()
            .await
            .map_err(|e| NodeError::Transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| NodeError::Transport(e.to_string()))?;

        if let Some(err) = resp.get("error") {
            if !err.is_null() {
                return Err(NodeError::Rpc(err.to_string()));
            }
        }
        Ok(resp.get("result").cloned().unwrap_or(Value::Null))
    }

    fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }
}
