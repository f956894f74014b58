use stampede_core::GraphError;
use thiserror::Error;

/// Classified failure reported by a chain client
///
/// Clients must map their transport and node errors onto these variants;
/// the agent worker loop decides what to do purely from the variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// Connection dropped; recoverable by reconnecting
    #[error("Connection lost: {0}")]
    TransientNetwork(String),

    /// Not enough native balance left to pay transaction fees
    #[error("Account balance too low to pay fees: {0}")]
    AccountExhausted(String),

    /// Any other rejection by the node or the contract
    #[error("Rejected: {0}")]
    Rejected(String),
}

impl ChainError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ChainError::TransientNetwork(_))
    }
}

pub type ChainResult<T> = std::result::Result<T, ChainError>;

/// Failure while discovering the exchange graph
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
