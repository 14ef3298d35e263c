//! Per-method access and caching policy.

use std::collections::{HashMap, HashSet};

use crate::cache::CACHED_METHODS;

/// How a method's responses are sourced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve from the store only, never contact the node.
    Force,
    /// Always proxy to the node.
    Never,
    /// Try the store first, fall back to the node.
    AsNeeded,
}

/// Which methods the gateway exposes at all.
#[derive(Debug, Clone)]
pub enum AccessPolicy {
    All,
    Only(HashSet<String>),
    Except(HashSet<String>),
}

impl AccessPolicy {
    pub fn allows(&self, method: &str) -> bool {
        match self {
            AccessPolicy::All => true,
            AccessPolicy::Only(set) => set.contains(method),
            AccessPolicy::Except(set) => !set.contains(method),
        }
    }
}

/// Methods that touch wallet keys. Refused unless node credentials are set.
pub const CREDENTIAL_METHODS: [&str; 8] = [
    "dumpprivkey",
    "importprivkey",
    "keypoolrefill",
    "sendfrom",
    "sendmany",
    "sendtoaddress",
    "signmessage",
    "signrawtransaction",
];

pub fn requires_credentials(method: &str) -> bool {
    CREDENTIAL_METHODS.contains(&method)
}

/// Default cache policy plus per-method overrides.
#[derive(Debug, Clone)]
pub struct MethodPolicies {
    pub default: CachePolicy,
    pub overrides: HashMap<String, CachePolicy>,
}

impl MethodPolicies {
    pub fn policy_for(&self, method: &str) -> CachePolicy {
        self.overrides.get(method).copied().unwrap_or(self.default)
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub coin: String,
    pub access: AccessPolicy,
    pub policies: MethodPolicies,
    /// Methods with a store-backed derivation. A method policy without a
    /// registered cacher is reported back to the caller by name.
    pub cachers: HashSet<String>,
}

impl GatewayConfig {
    pub fn has_cacher(&self, method: &str) -> bool {
        self.cachers.contains(method)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let exposed = [
            "getnetworkhashps",
            "getmininginfo",
            "getdifficulty",
            "getconnectioncount",
            "getblockcount",
            "getblockhash",
            "getblock",
            "getrawtransaction",
            "getpeerinfo",
            "gettxoutsetinfo",
            "getmempoolinfo",
            "getrawmempool",
        ];
        let mut overrides = HashMap::new();
        overrides.insert("getmempoolinfo".to_owned(), CachePolicy::AsNeeded);
        overrides.insert("getrawmempool".to_owned(), CachePolicy::AsNeeded);
        Self {
            coin: "strata".to_owned(),
            access: AccessPolicy::Only(exposed.iter().map(|m| m.to_string()).collect()),
            policies: MethodPolicies {
                default: CachePolicy::Force,
                overrides,
            },
            cachers: CACHED_METHODS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_access_list_admits_read_methods_only() {
        let config = GatewayConfig::default();
        assert!(config.access.allows("getblock"));
        assert!(config.access.allows("getrawmempool"));
        assert!(!config.access.allows("stop"));
        assert!(!config.access.allows("dumpprivkey"));
    }

    #[test]
    fn except_access_blocks_listed_methods() {
        let access = AccessPolicy::Except(["getblock".to_owned()].into_iter().collect());
        assert!(!access.allows("getblock"));
        assert!(access.allows("getblockhash"));
    }

    #[test]
    fn mempool_methods_override_to_as_needed() {
        let config = GatewayConfig::default();
        assert_eq!(config.policies.policy_for("getblock"), CachePolicy::Force);
        assert_eq!(
            config.policies.policy_for("getrawmempool"),
            CachePolicy::AsNeeded
        );
    }

    #[test]
    fn cacher_registry_is_configurable() {
        let mut config = GatewayConfig::default();
        assert!(config.has_cacher("getblockcount"));
        assert!(!config.has_cacher("getrawmempool"));

        config.cachers.remove("getblockcount");
        assert!(!config.has_cacher("getblockcount"));
    }

    #[test]
    fn wallet_methods_require_credentials() {
        assert!(requires_credentials("sendtoaddress"));
        assert!(!requires_credentials("getblockcount"));
    }
}
