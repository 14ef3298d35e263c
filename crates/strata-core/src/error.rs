//! Error types for the Strata indexer.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage: {0}")] Backend(String),
    #[error("missing column family: {0}")] MissingColumnFamily(String),
    #[error("codec: {0}")] Codec(String),
}

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("transport: {0}")] Transport(String),
    #[error("node rpc error: {0}")] Rpc(String),
    #[error("malformed response for {method}: {detail}")] Malformed { method: String, detail: String },
}

#[derive(Error, Debug)]
pub enum LockError {
    #[error("sync lock already held for target '{0}'")] Held(String),
    #[error("unable to create lock file: {0}")] Io(String),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)] Lock(#[from] LockError),
    #[error("initial node handshake failed: {0}")] Handshake(String),
}

#[derive(Error, Debug)]
pub enum StrataError {
    #[error(transparent)] Store(#[from] StoreError),
    #[error(transparent)] Node(#[from] NodeError),
    #[error(transparent)] Sync(#[from] SyncError),
}

impl From<LockError> for StrataError {
    fn from(e: LockError) -> Self {
        StrataError::Sync(SyncError::Lock(e))
    }
}
