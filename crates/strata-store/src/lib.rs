//! RocksDB-backed persisted mirror of node data.
//!
//! One column family per document kind (blocks, addresses, rich-list,
//! stats, peers) plus two secondary indexes: height -> block hash and
//! txid -> block hash. Block writes land in a single atomic [`WriteBatch`]
//! so there is exactly one stored block per height and per hash.

use std::path::Path;

use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};

use strata_core::error::StoreError;
use strata_core::types::{AddressDoc, BlockDoc, PeerDoc, RichlistDoc, StatsDoc, TxDoc};

// --- Column family names ---

const CF_BLOCKS: &str = "blocks";
const CF_HEIGHT_INDEX: &str = "height_index";
const CF_TX_INDEX: &str = "tx_index";
const CF_ADDRESSES: &str = "addresses";
const CF_RICHLIST: &str = "richlist";
const CF_STATS: &str = "stats";
const CF_PEERS: &str = "peers";
const CF_METADATA: &str = "metadata";

const ALL_CFS: &[&str] = &[
    CF_BLOCKS,
    CF_HEIGHT_INDEX,
    CF_TX_INDEX,
    CF_ADDRESSES,
    CF_RICHLIST,
    CF_STATS,
    CF_PEERS,
    CF_METADATA,
];

// --- Metadata keys ---

const META_LAST_SYNCED: &[u8] = b"last_synced";

/// RocksDB-backed cache store shared by the sync driver and the gateway.
///
/// The sync driver holds the single primary (writing) instance. Gateway
/// processes attach as secondaries, each with its own scratch directory,
/// and pull in the primary's writes via [`CacheStore::catch_up`].
pub struct CacheStore {
    db: DB,
    secondary: bool,
}

impl CacheStore {
    /// Open or create the primary store at the given path, creating all
    /// column families if they don't exist. Exclusive per process.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cf_descriptors)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { db, secondary: false })
    }

    /// Attach a read-serving secondary instance to a primary store.
    ///
    /// The primary must already exist. Any number of secondaries may run
    /// concurrently with the primary; `scratch` is this instance's private
    /// log-replay directory and must not be shared between processes.
    pub fn open_secondary(
        primary: impl AsRef<Path>,
        scratch: impl AsRef<Path>,
    ) -> Result<Self, StoreError> {
        let db_opts = Options::default();
        let db = DB::open_cf_as_secondary(
            &db_opts,
            primary.as_ref(),
            scratch.as_ref(),
            ALL_CFS,
        )
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(Self { db, secondary: true })
    }

    /// Replay the primary's latest writes into this secondary instance.
    /// No-op on a primary.
    pub fn catch_up(&self) -> Result<(), StoreError> {
        if self.secondary {
            self.db
                .try_catch_up_with_primary()
                .map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        Ok(())
    }

    // --- Internal helpers ---

    fn cf_handle(&self, name: &str) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::MissingColumnFamily(name.to_string()))
    }

    fn height_key(height: u64) -> [u8; 8] {
        height.to_be_bytes()
    }

    fn encode<T: bincode::Encode>(doc: &T) -> Result<Vec<u8>, StoreError> {
        bincode::encode_to_vec(doc, bincode::config::standard())
            .map_err(|e| StoreError::Codec(e.to_string()))
    }

    fn decode<T: bincode::Decode<()>>(bytes: &[u8]) -> Result<T, StoreError> {
        let (doc, _) = bincode::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| StoreError::Codec(e.to_string()))?;
        Ok(doc)
    }

    fn get_doc<T: bincode::Decode<()>>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>, StoreError> {
        let cf = self.cf_handle(cf_name)?;
        match self
            .db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_doc<T: bincode::Encode>(
        &self,
        cf_name: &str,
        key: &[u8],
        doc: &T,
    ) -> Result<(), StoreError> {
        let cf = self.cf_handle(cf_name)?;
        self.db
            .put_cf(&cf, key, Self::encode(doc)?)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn clear_cf(&self, batch: &mut WriteBatch, cf_name: &str) -> Result<(), StoreError> {
        let cf = self.cf_handle(cf_name)?;
        let iter = self.db.iterator_cf(&cf, IteratorMode::Start);
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Backend(e.to_string()))?;
            batch.delete_cf(cf, key);
        }
        Ok(())
    }

    // --- Blocks ---

    /// Persist an enriched block atomically together with its height and
    /// transaction indexes and the last-synced watermark.
    pub fn put_block(&self, block: &BlockDoc) -> Result<(), StoreError> {
        let cf_blocks = self.cf_handle(CF_BLOCKS)?;
        let cf_height = self.cf_handle(CF_HEIGHT_INDEX)?;
        let cf_tx = self.cf_handle(CF_TX_INDEX)?;
        let cf_meta = self.cf_handle(CF_METADATA)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_blocks, block.hash.as_bytes(), Self::encode(block)?);
        batch.put_cf(cf_height, Self::height_key(block.height), block.hash.as_bytes());
        for txid in &block.tx {
            batch.put_cf(cf_tx, txid.as_bytes(), block.hash.as_bytes());
        }

        let watermark = self.last_synced()?.max(block.height);
        batch.put_cf(cf_meta, META_LAST_SYNCED, watermark.to_le_bytes());

        self.db
            .write(batch)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    pub fn block_by_hash(&self, hash: &str) -> Result<Option<BlockDoc>, StoreError> {
        self.get_doc(CF_BLOCKS, hash.as_bytes())
    }

    pub fn block_hash_at(&self, height: u64) -> Result<Option<String>, StoreError> {
        let cf = self.cf_handle(CF_HEIGHT_INDEX)?;
        match self
            .db
            .get_cf(&cf, Self::height_key(height))
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            Some(bytes) => Ok(Some(
                String::from_utf8(bytes.to_vec())
                    .map_err(|e| StoreError::Codec(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    pub fn block_by_height(&self, height: u64) -> Result<Option<BlockDoc>, StoreError> {
        match self.block_hash_at(height)? {
            Some(hash) => self.block_by_hash(&hash),
            None => Ok(None),
        }
    }

    pub fn has_block_at(&self, height: u64) -> Result<bool, StoreError> {
        Ok(self.block_hash_at(height)?.is_some())
    }

    /// Greatest block height ever persisted. Zero on a fresh store.
    pub fn last_synced(&self) -> Result<u64, StoreError> {
        let cf = self.cf_handle(CF_METADATA)?;
        match self
            .db
            .get_cf(&cf, META_LAST_SYNCED)
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            Some(bytes) if bytes.len() == 8 => {
                Ok(u64::from_le_bytes(bytes.as_slice().try_into().unwrap()))
            }
            Some(_) => Err(StoreError::Codec("invalid last_synced length".into())),
            None => Ok(0),
        }
    }

    // --- Transactions ---

    /// Locate a mirrored transaction body and its containing block.
    pub fn transaction(&self, txid: &str) -> Result<Option<(TxDoc, BlockDoc)>, StoreError> {
        let cf = self.cf_handle(CF_TX_INDEX)?;
        let hash = match self
            .db
            .get_cf(&cf, txid.as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?
        {
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map_err(|e| StoreError::Codec(e.to_string()))?,
            None => return Ok(None),
        };
        let Some(block) = self.block_by_hash(&hash)? else {
            return Ok(None);
        };
        Ok(block
            .fulltx
            .iter()
            .find(|tx| tx.txid == txid)
            .cloned()
            .map(|tx| (tx, block)))
    }

    // --- Addresses ---

    pub fn address(&self, a_id: &str) -> Result<Option<AddressDoc>, StoreError> {
        self.get_doc(CF_ADDRESSES, a_id.as_bytes())
    }

    pub fn put_address(&self, doc: &AddressDoc) -> Result<(), StoreError> {
        self.put_doc(CF_ADDRESSES, doc.a_id.as_bytes(), doc)
    }

    /// All ledger entries. The address set is bounded by chain usage, and
    /// rich-list recomputation needs a full scan either way.
    pub fn all_addresses(&self) -> Result<Vec<AddressDoc>, StoreError> {
        let cf = self.cf_handle(CF_ADDRESSES)?;
        let mut docs = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Backend(e.to_string()))?;
            docs.push(Self::decode(&value)?);
        }
        Ok(docs)
    }

    /// Sum of all positive balances, in satoshi-equivalent units.
    pub fn balance_supply(&self) -> Result<u64, StoreError> {
        Ok(self
            .all_addresses()?
            .iter()
            .map(|doc| doc.balance)
            .sum())
    }

    // --- Rich-list ---

    pub fn richlist(&self, coin: &str) -> Result<Option<RichlistDoc>, StoreError> {
        self.get_doc(CF_RICHLIST, coin.as_bytes())
    }

    pub fn put_richlist(&self, doc: &RichlistDoc) -> Result<(), StoreError> {
        self.put_doc(CF_RICHLIST, doc.coin.as_bytes(), doc)
    }

    // --- Stats ---

    pub fn stats(&self, coin: &str) -> Result<Option<StatsDoc>, StoreError> {
        self.get_doc(CF_STATS, coin.as_bytes())
    }

    pub fn put_stats(&self, doc: &StatsDoc) -> Result<(), StoreError> {
        self.put_doc(CF_STATS, doc.coin.as_bytes(), doc)
    }

    // --- Peers ---

    /// Replace the peer table wholesale.
    pub fn replace_peers(&self, peers: &[PeerDoc]) -> Result<(), StoreError> {
        let mut batch = WriteBatch::default();
        self.clear_cf(&mut batch, CF_PEERS)?;
        let cf = self.cf_handle(CF_PEERS)?;
        for peer in peers {
            batch.put_cf(cf, peer.address.as_bytes(), Self::encode(peer)?);
        }
        self.db
            .write(batch)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    pub fn peers(&self) -> Result<Vec<PeerDoc>, StoreError> {
        let cf = self.cf_handle(CF_PEERS)?;
        let mut peers = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Backend(e.to_string()))?;
            peers.push(Self::decode(&value)?);
        }
        Ok(peers)
    }

    // --- Schema & reindex ---

    /// First-launch bootstrap: create the stats and rich-list documents
    /// for the coin if they don't exist yet.
    pub fn ensure_schema(&self, coin: &str) -> Result<(), StoreError> {
        if self.stats(coin)?.is_none() {
            tracing::info!(coin, "initial stats entry created");
            self.put_stats(&StatsDoc::new(coin))?;
        }
        if self.richlist(coin)?.is_none() {
            tracing::info!(coin, "initial richlist entry created");
            self.put_richlist(&RichlistDoc::empty(coin))?;
        }
        Ok(())
    }

    /// Clear all mirrored block, transaction, and address state for a
    /// reindex, and empty the rich-list snapshot. Stats survive.
    pub fn clear_index(&self, coin: &str) -> Result<(), StoreError> {
        let mut batch = WriteBatch::default();
        for cf_name in [CF_BLOCKS, CF_HEIGHT_INDEX, CF_TX_INDEX, CF_ADDRESSES] {
            self.clear_cf(&mut batch, cf_name)?;
        }
        let cf_meta = self.cf_handle(CF_METADATA)?;
        batch.delete_cf(cf_meta, META_LAST_SYNCED);
        let cf_rich = self.cf_handle(CF_RICHLIST)?;
        batch.put_cf(
            cf_rich,
            coin.as_bytes(),
            Self::encode(&RichlistDoc::empty(coin))?,
        );
        self.db
            .write(batch)
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}
