use thiserror::Error;

use crate::values::TokenId;

/// Errors raised while building, querying or persisting the exchange graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("No pair registered for {0} / {1}")]
    PairNotFound(TokenId, TokenId),

    #[error("A pair cannot link token {0} with itself")]
    SelfPair(TokenId),

    #[error("Pair {0} / {1} is already registered")]
    DuplicatePair(TokenId, TokenId),

    #[error("Snapshot I/O error on {path}: {error}")]
    SnapshotIo { path: String, error: String },

    #[error("Snapshot decode error: {0}")]
    SnapshotFormat(String),

    #[error("A path needs at least one token")]
    EmptyPath,
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
