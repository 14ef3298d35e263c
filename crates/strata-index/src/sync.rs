//! Incremental sync driver.
//!
//! Single-threaded catch-up loop over block heights. All node calls and
//! store writes are awaited sequentially; an optional inter-iteration
//! delay is the sole backpressure mechanism. Per-block failures are
//! logged and skipped; only the initial stats handshake is fatal.

use std::str::FromStr;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use strata_core::constants::DEFAULT_TX_REF_CAP;
use strata_core::error::{StrataError, SyncError};
use strata_core::traits::NodeClient;
use strata_core::types::{PeerDoc, StatsDoc};
use strata_store::CacheStore;

use crate::decompose::decompose;
use crate::ledger::LedgerUpdater;
use crate::richlist::update_richlist;

/// What a sync run does once the lock is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Catch up from the last-synced height to the node's current height.
    Update,
    /// Re-walk from a checkpoint, filling any gaps. No rich-list recompute.
    Check,
    /// Clear mirrored state and resync from genesis.
    Reindex,
}

impl FromStr for SyncMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update" => Ok(Self::Update),
            "check" => Ok(Self::Check),
            "reindex" => Ok(Self::Reindex),
            _ => Err(()),
        }
    }
}

/// Sync driver configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub coin: String,
    /// Start boundary for check mode.
    pub check_from: u64,
    /// Inter-iteration delay in milliseconds; zero disables throttling.
    pub delay_ms: u64,
    /// Cap on each address's recent-transaction ring.
    pub tx_ref_cap: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            coin: "strata".to_owned(),
            check_from: 0,
            delay_ms: 0,
            tx_ref_cap: DEFAULT_TX_REF_CAP,
        }
    }
}

/// Outcome of a completed sync run.
#[derive(Debug, Clone, Copy)]
pub struct SyncReport {
    pub mode: SyncMode,
    /// First height considered.
    pub start: u64,
    /// Node height at the start of the run.
    pub tip: u64,
    /// Blocks newly mirrored this run.
    pub cached: u64,
    /// Heights skipped (already mirrored, empty, or unresolvable).
    pub skipped: u64,
}

/// Orchestrates incremental catch-up against the live node.
///
/// The caller acquires the cross-process lock before running and releases
/// it on every exit path.
pub struct SyncDriver<'a> {
    node: &'a dyn NodeClient,
    store: &'a CacheStore,
    config: SyncConfig,
}

impl<'a> SyncDriver<'a> {
    pub fn new(node: &'a dyn NodeClient, store: &'a CacheStore, config: SyncConfig) -> Self {
        Self { node, store, config }
    }

    /// Run one sync pass in the given mode.
    pub async fn run(&self, mode: SyncMode) -> Result<SyncReport, StrataError> {
        let coin = self.config.coin.clone();
        self.store.ensure_schema(&coin)?;

        let stats = self.refresh_stats().await?;
        self.refresh_peers().await;

        if mode == SyncMode::Reindex {
            self.store.clear_index(&coin)?;
            info!(coin, "index cleared for reindex");
        }

        let tip = stats.blocks;
        let start = match mode {
            SyncMode::Reindex => 1,
            SyncMode::Update => self.store.last_synced()?.max(1),
            SyncMode::Check => self.config.check_from.max(1),
        };

        let mut cached = 0u64;
        let mut skipped = 0u64;
        for height in start..=tip {
            match self.cache_height(height, mode == SyncMode::Reindex).await {
                Ok(true) => cached += 1,
                Ok(false) => skipped += 1,
                Err(e) => {
                    warn!(height, error = %e, "skipping block");
                    skipped += 1;
                }
            }
            if self.config.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.delay_ms)).await;
            }
        }

        if mode != SyncMode::Check {
            update_richlist(self.store, &coin)?;
            info!(coin, tip, "rich-list recomputed");
        }

        info!(?mode, start, tip, cached, skipped, "sync complete");
        Ok(SyncReport { mode, start, tip, cached, skipped })
    }

    /// Mirror one height. Returns false when the height was skipped.
    async fn cache_height(&self, height: u64, reindex: bool) -> Result<bool, StrataError> {
        if !reindex && self.store.has_block_at(height)? {
            return Ok(false);
        }

        let hash = self.node.get_block_hash(height).await?;
        let mut block = self.node.get_block(&hash).await?;
        if block.tx.is_empty() {
            debug!(height, "block has no transactions, skipping");
            return Ok(false);
        }
        block.height = height;

        let mut fulltx = Vec::with_capacity(block.tx.len());
        for txid in &block.tx {
            match self.node.get_raw_transaction(txid).await {
                Ok(tx) => fulltx.push(tx),
                Err(e) => warn!(height, txid = %txid, error = %e, "transaction body unavailable"),
            }
        }
        block.fulltx = fulltx;

        self.store.put_block(&block)?;

        let updater = LedgerUpdater::new(self.store, self.config.tx_ref_cap);
        for tx in &block.fulltx {
            let record = decompose(self.node, tx).await;
            updater.apply(&tx.txid, &record)?;
        }

        info!(height, hash = %block.hash, "cached block");
        Ok(true)
    }

    /// Refresh the stats snapshot from the node. Failure here means the
    /// node session is unusable, which is fatal for the run.
    async fn refresh_stats(&self) -> Result<StatsDoc, StrataError> {
        let handshake = |e: strata_core::error::NodeError| {
            StrataError::Sync(SyncError::Handshake(e.to_string()))
        };
        let txoutset = self.node.call("gettxoutsetinfo", json!([])).await.map_err(handshake)?;
        let mining = self.node.call("getmininginfo", json!([])).await.map_err(handshake)?;
        let connections = self
            .node
            .call("getconnectioncount", json!([]))
            .await
            .map_err(handshake)?;

        let doc = StatsDoc {
            coin: self.config.coin.clone(),
            blocks: field_u64(&mining, "blocks"),
            difficulty: field_f64(&mining, "difficulty"),
            networkhashps: field_f64(&mining, "networkhashps"),
            pooledtx: field_u64(&mining, "pooledtx"),
            supply: field_f64(&txoutset, "total_amount"),
            connections: connections.as_u64().unwrap_or_default(),
            bestblock: field_str(&txoutset, "bestblock"),
            transactions: field_u64(&txoutset, "transactions"),
            txouts: field_u64(&txoutset, "txouts"),
            chain: field_str(&mining, "chain"),
            warnings: field_str(&mining, "warnings"),
        };
        self.store.put_stats(&doc)?;
        Ok(doc)
    }

    /// Replace the mirrored peer table. Best-effort: a failure is logged
    /// and the run continues.
    async fn refresh_peers(&self) {
        let peers = match self.node.call("getpeerinfo", json!([])).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "peer refresh failed");
                return;
            }
        };
        let peers: Vec<PeerDoc> = match serde_json::from_value(peers) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "peer table malformed");
                return;
            }
        };
        if let Err(e) = self.store.replace_peers(&peers) {
            warn!(error = %e, "peer table write failed");
        }
    }
}

fn field_u64(v: &Value, key: &str) -> u64 {
    v.get(key).and_then(Value::as_u64).unwrap_or_default()
}

fn field_f64(v: &Value, key: &str) -> f64 {
    v.get(key).and_then(Value::as_f64).unwrap_or_default()
}

fn field_str(v: &Value, key: &str) -> String {
    v.get(key).and_then(Value::as_str).unwrap_or_default().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_from_cli_words() {
        assert_eq!("update".parse::<SyncMode>(), Ok(SyncMode::Update));
        assert_eq!("check".parse::<SyncMode>(), Ok(SyncMode::Check));
        assert_eq!("reindex".parse::<SyncMode>(), Ok(SyncMode::Reindex));
        assert!("resync".parse::<SyncMode>().is_err());
    }

    #[test]
    fn stats_fields_tolerate_missing_keys() {
        let v = json!({ "blocks": 12, "difficulty": 3.5 });
        assert_eq!(field_u64(&v, "blocks"), 12);
        assert_eq!(field_f64(&v, "difficulty"), 3.5);
        assert_eq!(field_u64(&v, "pooledtx"), 0);
        assert_eq!(field_str(&v, "chain"), "");
    }
}
