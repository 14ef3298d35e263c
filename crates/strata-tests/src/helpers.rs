//! Shared test helpers: an in-memory mock node and document builders.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Value, json};

use strata_core::error::NodeError;
use strata_core::traits::NodeClient;
use strata_core::types::{BlockDoc, ScriptPubKey, TxDoc, VinDoc, VoutDoc};

/// In-memory stand-in for the remote node's JSON-RPC surface.
///
/// Holds a fixed chain keyed by height. `getblock` answers without full
/// transaction bodies, matching a real node, so the sync driver has to
/// fetch each transaction separately.
pub struct MockNode {
    pub blocks: HashMap<u64, BlockDoc>,
    pub txs: HashMap<String, TxDoc>,
    pub tip: u64,
    pub connections: u64,
    /// When set, the stats handshake methods fail with an RPC error.
    pub fail_handshake: bool,
}

impl MockNode {
    /// Build a chain from per-height transaction lists, heights starting at 1.
    pub fn with_chain(heights: Vec<Vec<TxDoc>>) -> Self {
        let mut blocks = HashMap::new();
        let mut txs = HashMap::new();
        let tip = heights.len() as u64;
        for (i, block_txs) in heights.into_iter().enumerate() {
            let height = i as u64 + 1;
            let block = BlockDoc {
                hash: block_hash(height),
                height,
                tx: block_txs.iter().map(|t| t.txid.clone()).collect(),
                time: 1_700_000_000 + height * 600,
                ..BlockDoc::default()
            };
            for tx in block_txs {
                txs.insert(tx.txid.clone(), tx);
            }
            blocks.insert(height, block);
        }
        Self { blocks, txs, tip, connections: 8, fail_handshake: false }
    }
}

#[async_trait]
impl NodeClient for MockNode {
    async fn call(&self, method: &str, params: Value) -> Result<Value, NodeError> {
        if self.fail_handshake
            && matches!(method, "gettxoutsetinfo" | "getmininginfo" | "getconnectioncount")
        {
            return Err(NodeError::Rpc("node unavailable".into()));
        }
        match method {
            "getblockcount" => Ok(json!(self.tip)),
            "getblockhash" => {
                let height = params
                    .get(0)
                    .and_then(Value::as_u64)
                    .ok_or_else(|| NodeError::Rpc("missing height".into()))?;
                self.blocks
                    .get(&height)
                    .map(|b| json!(b.hash))
                    .ok_or_else(|| NodeError::Rpc("block height out of range".into()))
            }
            "getblock" => {
                let hash = params.get(0).and_then(Value::as_str).unwrap_or_default();
                let block = self
                    .blocks
                    .values()
                    .find(|b| b.hash == hash)
                    .ok_or_else(|| NodeError::Rpc("block not found".into()))?;
                serde_json::to_value(block).map_err(|e| NodeError::Rpc(e.to_string()))
            }
            "getrawtransaction" => {
                let txid = params.get(0).and_then(Value::as_str).unwrap_or_default();
                let tx = self
                    .txs
                    .get(txid)
                    .ok_or_else(|| NodeError::Rpc("no such transaction".into()))?;
                serde_json::to_value(tx).map_err(|e| NodeError::Rpc(e.to_string()))
            }
            "getmininginfo" => Ok(json!({
                "blocks": self.tip,
                "difficulty": 1.25,
                "networkhashps": 1000.0,
                "pooledtx": 3,
                "chain": "main",
                "warnings": "",
            })),
            "gettxoutsetinfo" => Ok(json!({
                "height": self.tip,
                "bestblock": block_hash(self.tip),
                "transactions": self.txs.len(),
                "txouts": self.txs.len() * 2,
                "total_amount": 5000.0,
            })),
            "getconnectioncount" => Ok(json!(self.connections)),
            "getpeerinfo" => Ok(json!([
                { "addr": "10.0.0.1:9333", "version": 70015, "subver": "/peer:1.0/" }
            ])),
            "getrawmempool" => Ok(json!(["mempool-tx-1"])),
            other => Err(NodeError::Rpc(format!("Method not found: {other}"))),
        }
    }
}

pub fn block_hash(height: u64) -> String {
    format!("blk{height:08}")
}

/// A standard pay-to-address output.
pub fn out(n: u32, address: &str, value: f64) -> VoutDoc {
    VoutDoc {
        value,
        n,
        script_pub_key: ScriptPubKey {
            script_type: "pubkeyhash".into(),
            addresses: vec![address.to_owned()],
        },
    }
}

/// A coinbase transaction paying newly minted value to one address.
pub fn coinbase_tx(txid: &str, address: &str, value: f64) -> TxDoc {
    TxDoc {
        txid: txid.to_owned(),
        hex: format!("{txid}-hex"),
        vin: vec![VinDoc { coinbase: Some("04deadbeef".into()), ..VinDoc::default() }],
        vout: vec![out(0, address, value)],
        ..TxDoc::default()
    }
}

/// A transaction spending one prior output into the given outputs.
pub fn transfer_tx(
    txid: &str,
    prev_txid: &str,
    prev_vout: u32,
    outputs: Vec<(&str, f64)>,
) -> TxDoc {
    TxDoc {
        txid: txid.to_owned(),
        hex: format!("{txid}-hex"),
        vin: vec![VinDoc {
            txid: Some(prev_txid.to_owned()),
            vout: Some(prev_vout),
            ..VinDoc::default()
        }],
        vout: outputs
            .into_iter()
            .enumerate()
            .map(|(n, (addr, value))| out(n as u32, addr, value))
            .collect(),
        ..TxDoc::default()
    }
}
