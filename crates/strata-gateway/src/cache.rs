//! Cache-side derivations of node RPC methods.
//!
//! Each supported method is answered from the mirrored store alone. A
//! derivation returning `Ok(None)` means the store cannot answer (missing
//! document, bad params) and the caller decides whether to fall back live.

use serde_json::{Value, json};

use strata_core::error::StoreError;
use strata_core::types::{BlockDoc, StatsDoc};
use strata_store::CacheStore;

/// Methods [`derive`] can answer. Seeds the configurable cacher registry
/// in `GatewayConfig`; the mempool methods are deliberately absent.
pub const CACHED_METHODS: [&str; 10] = [
    "getblockcount",
    "getblockhash",
    "getblock",
    "getrawtransaction",
    "getdifficulty",
    "getconnectioncount",
    "getnetworkhashps",
    "getmininginfo",
    "getpeerinfo",
    "gettxoutsetinfo",
];

/// Answer `method` from the store, or `Ok(None)` when it cannot.
pub fn derive(
    store: &CacheStore,
    coin: &str,
    method: &str,
    params: &[Value],
) -> Result<Option<Value>, StoreError> {
    match method {
        "getblockcount" => Ok(stats_field(store, coin, |s| json!(s.blocks))?),
        "getdifficulty" => Ok(stats_field(store, coin, |s| json!(s.difficulty))?),
        "getconnectioncount" => Ok(stats_field(store, coin, |s| json!(s.connections))?),
        "getnetworkhashps" => Ok(stats_field(store, coin, |s| json!(s.networkhashps))?),
        "getmininginfo" => Ok(stats_field(store, coin, |s| {
            json!({
                "blocks": s.blocks,
                "difficulty": s.difficulty,
                "networkhashps": s.networkhashps,
                "pooledtx": s.pooledtx,
                "chain": s.chain,
                "warnings": s.warnings,
            })
        })?),
        "gettxoutsetinfo" => Ok(stats_field(store, coin, |s| {
            json!({
                "height": s.blocks,
                "bestblock": s.bestblock,
                "transactions": s.transactions,
                "txouts": s.txouts,
                "total_amount": s.supply,
            })
        })?),
        "getblockhash" => {
            let Some(height) = params.first().and_then(Value::as_u64) else {
                return Ok(None);
            };
            Ok(store.block_hash_at(height)?.map(Value::String))
        }
        "getblock" => {
            let Some(hash) = params.first().and_then(Value::as_str) else {
                return Ok(None);
            };
            let Some(block) = store.block_by_hash(hash)? else {
                return Ok(None);
            };
            let tip = store.stats(coin)?.map(|s| s.blocks).unwrap_or(block.height);
            Ok(Some(block_to_rpc_json(&block, tip)))
        }
        "getrawtransaction" => {
            let Some(txid) = params.first().and_then(Value::as_str) else {
                return Ok(None);
            };
            let verbose = params
                .get(1)
                .map(|v| v.as_u64().unwrap_or(0) != 0 || v.as_bool().unwrap_or(false))
                .unwrap_or(false);
            let Some((tx, block)) = store.transaction(txid)? else {
                return Ok(None);
            };
            if !verbose {
                return Ok(Some(Value::String(tx.hex)));
            }
            let tip = store.stats(coin)?.map(|s| s.blocks).unwrap_or(block.height);
            let mut body = serde_json::to_value(&tx)
                .map_err(|e| StoreError::Codec(e.to_string()))?;
            if let Some(obj) = body.as_object_mut() {
                obj.insert("blockhash".to_owned(), json!(block.hash));
                obj.insert(
                    "confirmations".to_owned(),
                    json!(tip.saturating_sub(block.height)),
                );
                obj.insert("blocktime".to_owned(), json!(block.time));
            }
            Ok(Some(body))
        }
        "getpeerinfo" => {
            let peers = store.peers()?;
            Ok(Some(
                serde_json::to_value(&peers).map_err(|e| StoreError::Codec(e.to_string()))?,
            ))
        }
        _ => Ok(None),
    }
}

fn stats_field(
    store: &CacheStore,
    coin: &str,
    project: impl Fn(&StatsDoc) -> Value,
) -> Result<Option<Value>, StoreError> {
    Ok(store.stats(coin)?.map(|s| project(&s)))
}

/// Render a stored block the way the node's `getblock` would, with the
/// full transaction bodies stripped.
fn block_to_rpc_json(block: &BlockDoc, tip: u64) -> Value {
    json!({
        "hash": block.hash,
        "confirmations": tip.saturating_sub(block.height),
        "height": block.height,
        "size": block.size,
        "weight": block.weight,
        "version": block.version,
        "merkleroot": block.merkleroot,
        "tx": block.tx,
        "nTx": block.tx.len(),
        "time": block.time,
        "mediantime": block.mediantime,
        "bits": block.bits,
        "nonce": block.nonce,
        "difficulty": block.difficulty,
        "chainwork": block.chainwork,
        "previousblockhash": block.previousblockhash,
        "nextblockhash": block.nextblockhash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::types::{PeerDoc, TxDoc};

    fn store() -> (tempfile::TempDir, CacheStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn seed_stats(store: &CacheStore) {
        let mut stats = StatsDoc::new("strata");
        stats.blocks = 120;
        stats.difficulty = 2.5;
        stats.connections = 8;
        stats.supply = 6000.0;
        stats.bestblock = "00ff".into();
        store.put_stats(&stats).unwrap();
    }

    #[test]
    fn scalar_methods_project_stats() {
        let (_dir, store) = store();
        seed_stats(&store);
        assert_eq!(
            derive(&store, "strata", "getblockcount", &[]).unwrap(),
            Some(json!(120))
        );
        assert_eq!(
            derive(&store, "strata", "getdifficulty", &[]).unwrap(),
            Some(json!(2.5))
        );
    }

    #[test]
    fn missing_stats_yields_miss() {
        let (_dir, store) = store();
        assert_eq!(derive(&store, "strata", "getblockcount", &[]).unwrap(), None);
    }

    #[test]
    fn txoutsetinfo_renames_fields() {
        let (_dir, store) = store();
        seed_stats(&store);
        let out = derive(&store, "strata", "gettxoutsetinfo", &[])
            .unwrap()
            .unwrap();
        assert_eq!(out["height"], json!(120));
        assert_eq!(out["total_amount"], json!(6000.0));
        assert!(out.get("supply").is_none());
    }

    #[test]
    fn getblock_enriches_and_strips_fulltx() {
        let (_dir, store) = store();
        seed_stats(&store);
        let block = BlockDoc {
            hash: "00aa".into(),
            height: 100,
            tx: vec!["t1".into(), "t2".into()],
            fulltx: vec![TxDoc { txid: "t1".into(), ..TxDoc::default() }],
            ..BlockDoc::default()
        };
        store.put_block(&block).unwrap();

        let out = derive(&store, "strata", "getblock", &[json!("00aa")])
            .unwrap()
            .unwrap();
        assert_eq!(out["confirmations"], json!(20));
        assert_eq!(out["nTx"], json!(2));
        assert!(out.get("fulltx").is_none());
    }

    #[test]
    fn getblockhash_answers_from_height_index() {
        let (_dir, store) = store();
        let block = BlockDoc { hash: "00bb".into(), height: 9, ..BlockDoc::default() };
        store.put_block(&block).unwrap();
        assert_eq!(
            derive(&store, "strata", "getblockhash", &[json!(9)]).unwrap(),
            Some(json!("00bb"))
        );
        assert_eq!(
            derive(&store, "strata", "getblockhash", &[json!(10)]).unwrap(),
            None
        );
    }

    #[test]
    fn getrawtransaction_respects_verbose_flag() {
        let (_dir, store) = store();
        seed_stats(&store);
        let tx = TxDoc { txid: "t1".into(), hex: "deadbeef".into(), ..TxDoc::default() };
        let block = BlockDoc {
            hash: "00cc".into(),
            height: 110,
            tx: vec!["t1".into()],
            fulltx: vec![tx],
            ..BlockDoc::default()
        };
        store.put_block(&block).unwrap();

        let raw = derive(&store, "strata", "getrawtransaction", &[json!("t1")])
            .unwrap()
            .unwrap();
        assert_eq!(raw, json!("deadbeef"));

        let verbose =
            derive(&store, "strata", "getrawtransaction", &[json!("t1"), json!(1)])
                .unwrap()
                .unwrap();
        assert_eq!(verbose["blockhash"], json!("00cc"));
        assert_eq!(verbose["confirmations"], json!(10));
    }

    #[test]
    fn getpeerinfo_serves_stored_table() {
        let (_dir, store) = store();
        store
            .replace_peers(&[PeerDoc { address: "1.2.3.4:9333".into(), ..PeerDoc::default() }])
            .unwrap();
        let out = derive(&store, "strata", "getpeerinfo", &[]).unwrap().unwrap();
        assert_eq!(out.as_array().unwrap().len(), 1);
    }

    #[test]
    fn mempool_methods_have_no_cacher() {
        assert!(!CACHED_METHODS.contains(&"getrawmempool"));
        assert!(!CACHED_METHODS.contains(&"getmempoolinfo"));
        assert!(CACHED_METHODS.contains(&"getblock"));
    }

    #[test]
    fn every_registered_method_has_a_derivation() {
        let (_dir, store) = store();
        for method in CACHED_METHODS {
            // Parameterless methods miss on an empty store rather than
            // falling through to the unknown-method arm.
            let result = derive(&store, "strata", method, &[]).unwrap();
            if matches!(method, "getpeerinfo") {
                assert!(result.is_some());
            } else {
                assert!(result.is_none());
            }
        }
    }
}
