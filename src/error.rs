//! Error types for each step of a merge run.
//!
//! Every step has its own recovery policy: load and fetch failures are
//! absorbed into a fallback, a trim failure skips the trim, and only a
//! persist failure ends the run.

use std::path::PathBuf;

/// Reading the persisted history document failed.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No history document exists yet.
    #[error("history file not found: {path}")]
    Missing { path: PathBuf },

    /// The file exists but could not be read.
    #[error("failed to read history file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid history document.
    #[error("malformed history file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Retrieving the remote snapshot failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// Network failure, timeout, or an unreadable body.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body is not a snapshot object.
    #[error("malformed snapshot from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The body is `null` or `{}`.
    #[error("empty snapshot from {url}")]
    Empty { url: String },
}

/// Applying the retention window failed; the trim is skipped as a whole.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrimError {
    #[error("unparseable record time {0:?}")]
    Unparseable(String),
}

/// Writing the merged history failed. Fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write history file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
