//! Error types for the edge proxy.
//!
//! None of these reach a client: the router turns every failure into a cached
//! value or an offline payload.

use thiserror::Error;

/// The origin could not be reached.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("origin request failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("origin unreachable: {0}")]
    Unreachable(String),

    #[error("invalid origin url: {0}")]
    InvalidUrl(String),
}

/// A cache bucket could not be read or written.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt cache entry: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("invalid bucket name: {0}")]
    InvalidBucket(String),
}

/// Pre-populating the static bucket failed; the proxy stays in pass-through.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed to fetch {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: NetworkError,
    },

    #[error("{path} answered with status {status}")]
    Status { path: String, status: u16 },

    #[error(transparent)]
    Cache(#[from] CacheError),
}
