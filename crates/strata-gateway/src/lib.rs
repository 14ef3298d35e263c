//! # strata-gateway
//! RPC-compatible read path: a JSON-RPC client for the live node, a
//! per-method cache policy table, store-backed derivations, and the
//! axum HTTP surface that ties them together.

pub mod cache;
pub mod client;
pub mod policy;
pub mod routes;

pub use client::RpcHttpClient;
pub use policy::{AccessPolicy, CachePolicy, GatewayConfig};
pub use routes::GatewayState;
