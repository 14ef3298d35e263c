//! # strata-index
//! Incremental chain mirroring: sync driver, transaction decomposer,
//! per-address ledger updater, and rich-list calculator.

pub mod decompose;
pub mod ledger;
pub mod lock;
pub mod richlist;
pub mod sync;
