//! Indexer-wide constants.

/// Satoshi-equivalent units per whole coin.
pub const SATS_PER_COIN: u64 = 100_000_000;

/// Pseudo-address credited with newly minted supply.
pub const COINBASE_ADDRESS: &str = "coinbase";

/// Number of entries kept in each rich-list ranking.
pub const RICH_LIST_SIZE: usize = 100;

/// Default cap on the per-address recent-transaction ring.
pub const DEFAULT_TX_REF_CAP: usize = 100;

/// Script classifications whose outputs carry no spendable address.
pub const NONSTANDARD_SCRIPT: &str = "nonstandard";
pub const NULLDATA_SCRIPT: &str = "nulldata";
