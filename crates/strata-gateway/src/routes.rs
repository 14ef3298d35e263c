//! HTTP dispatch surface, one query-style endpoint per node method.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, warn};

use strata_core::traits::NodeClient;
use strata_store::CacheStore;

use crate::cache;
use crate::policy::{CachePolicy, GatewayConfig, requires_credentials};

/// Errors are reported in-band as plain text, never as HTTP error codes.
const ERROR_SENTINEL: &str = "There was an error, check your console.";
const RESTRICTED_SENTINEL: &str = "This method is restricted";
const WALLET_SENTINEL: &str = "A wallet password is required and has not been set.";

#[derive(Clone)]
pub struct GatewayState {
    pub store: Arc<CacheStore>,
    pub node: Arc<dyn NodeClient>,
    pub config: Arc<GatewayConfig>,
}

// ── Router ───────────────────────────────────────────────────────────────────

pub fn router(state: GatewayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/{method}", get(dispatch))
        .layer(cors)
        .with_state(state)
}

// ── Dispatch ─────────────────────────────────────────────────────────────────

async fn dispatch(
    State(s): State<GatewayState>,
    Path(method): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    if !s.config.access.allows(&method) {
        return text(RESTRICTED_SENTINEL.to_owned());
    }
    if requires_credentials(&method) && !s.node.has_credentials() {
        return text(WALLET_SENTINEL.to_owned());
    }

    let params = parse_params(query.as_deref().unwrap_or(""));

    // Pull in the sync process's latest writes before consulting the cache.
    if let Err(e) = s.store.catch_up() {
        debug!(error = %e, "store catch-up failed, serving last replayed state");
    }

    match s.config.policies.policy_for(&method) {
        CachePolicy::Force => {
            if !s.config.has_cacher(&method) {
                return text(format!("No caching method was supplied for {method}."));
            }
            match cache::derive(&s.store, &s.config.coin, &method, &params) {
                Ok(Some(value)) => respond(value),
                Ok(None) => text(ERROR_SENTINEL.to_owned()),
                Err(e) => {
                    warn!(%method, error = %e, "cache derivation failed");
                    text(ERROR_SENTINEL.to_owned())
                }
            }
        }
        CachePolicy::Never => live(&s, &method, params).await,
        CachePolicy::AsNeeded => {
            if s.config.has_cacher(&method) {
                if let Ok(Some(value)) = cache::derive(&s.store, &s.config.coin, &method, &params) {
                    return respond(value);
                }
                debug!(%method, "cache miss, falling back to node");
            }
            live(&s, &method, params).await
        }
    }
}

async fn live(s: &GatewayState, method: &str, params: Vec<Value>) -> Response {
    match s.node.call(method, Value::Array(params)).await {
        Ok(value) => respond(value),
        Err(e) => {
            warn!(%method, error = %e, "node call failed");
            text(ERROR_SENTINEL.to_owned())
        }
    }
}

// ── Params and rendering ─────────────────────────────────────────────────────

/// Split a raw query string into positional params, coercing numeric
/// values so height arguments reach the node as JSON numbers.
fn parse_params(query: &str) -> Vec<Value> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let raw = match pair.split_once('=') {
                Some((_, v)) => v,
                None => pair,
            };
            coerce(raw)
        })
        .collect()
}

fn coerce(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<u64>() {
        return Value::from(n);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(n) = raw.parse::<f64>() {
        return Value::from(n);
    }
    Value::String(raw.to_owned())
}

/// Objects and arrays go out as JSON, strings as raw text, and other
/// scalars via their JSON rendering. Always HTTP 200.
fn respond(value: Value) -> Response {
    match value {
        Value::Object(_) | Value::Array(_) => Json(value).into_response(),
        Value::String(s) => text(s),
        other => text(other.to_string()),
    }
}

fn text(body: String) -> Response {
    body.into_response()
}
