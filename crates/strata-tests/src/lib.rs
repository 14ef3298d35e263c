//! End-to-end test suite for the indexer and gateway.
//!
//! The tests drive the real sync driver and HTTP router against an
//! in-memory mock of the node's JSON-RPC surface.

pub mod helpers;
