//! Error types for the indexer binary.

use options_indexer::error::IndexerError;

/// Main error type for the indexer binary.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Indexer error: {0}")]
    Indexer(#[from] IndexerError),

    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(#[from] url::ParseError),

    #[error("Event stream closed unexpectedly")]
    StreamClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
