//! Trait seam between the indexer and the live node.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::NodeError;
use crate::types::{BlockDoc, TxDoc};

/// Uniform access to the node's JSON-RPC interface.
///
/// The sync driver and decomposer depend on this seam rather than a
/// concrete transport, so tests can drive them against an in-memory node.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Invoke a method with positional parameters.
    async fn call(&self, method: &str, params: Value) -> Result<Value, NodeError>;

    /// Whether node credentials are configured for privileged methods.
    fn has_credentials(&self) -> bool {
        false
    }

    async fn get_block_count(&self) -> Result<u64, NodeError> {
        let v = self.call("getblockcount", json!([])).await?;
        v.as_u64().ok_or_else(|| malformed("getblockcount", &v))
    }

    async fn get_block_hash(&self, height: u64) -> Result<String, NodeError> {
        let v = self.call("getblockhash", json!([height])).await?;
        v.as_str()
            .map(str::to_owned)
            .ok_or_else(|| malformed("getblockhash", &v))
    }

    async fn get_block(&self, hash: &str) -> Result<BlockDoc, NodeError> {
        let v = self.call("getblock", json!([hash])).await?;
        serde_json::from_value(v).map_err(|e| NodeError::Malformed {
            method: "getblock".into(),
            detail: e.to_string(),
        })
    }

    /// Verbose fetch of a full transaction body.
    async fn get_raw_transaction(&self, txid: &str) -> Result<TxDoc, NodeError> {
        let v = self.call("getrawtransaction", json!([txid, 1])).await?;
        serde_json::from_value(v).map_err(|e| NodeError::Malformed {
            method: "getrawtransaction".into(),
            detail: e.to_string(),
        })
    }
}

fn malformed(method: &str, value: &Value) -> NodeError {
    NodeError::Malformed {
        method: method.into(),
        detail: format!("unexpected shape: {value}"),
    }
}
