//! # strata-core
//! Foundation types and traits for the Strata chain indexer.

pub mod amount;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
