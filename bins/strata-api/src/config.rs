use anyhow::Result;

pub struct Config {
    pub rpc_endpoint: String,
    pub rpc_user: Option<String>,
    pub rpc_pass: Option<String>,
    pub bind_addr: String,
    pub db_path: String,
    /// Private log-replay directory for this process's secondary store
    /// instance. Must differ between concurrently running gateways.
    pub db_scratch_path: String,
    pub coin: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let db_path = std::env::var("STRATA_DB_PATH").unwrap_or_else(|_| "./data".into());
        let db_scratch_path = std::env::var("STRATA_DB_SCRATCH_PATH")
            .unwrap_or_else(|_| format!("{db_path}-reader"));
        Ok(Self {
            rpc_endpoint: std::env::var("STRATA_RPC_ENDPOINT")
                .unwrap_or_else(|_| "http://127.0.0.1:9332".into()),
            rpc_user: std::env::var("STRATA_RPC_USER").ok(),
            rpc_pass: std::env::var("STRATA_RPC_PASS").ok(),
            bind_addr: std::env::var("STRATA_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".into()),
            db_path,
            db_scratch_path,
            coin: std::env::var("STRATA_COIN").unwrap_or_else(|_| "strata".into()),
        })
    }

    pub fn credentials(&self) -> Option<(String, String)> {
        match (&self.rpc_user, &self.rpc_pass) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        }
    }
}
