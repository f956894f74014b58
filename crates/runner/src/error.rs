use stampede_core::{Amount, GraphError, TokenId};
use stampede_ports::ChainError;
use thiserror::Error;

/// Why a single trade cycle did not produce a receipt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    /// No tracked balance reaches the minimum
    #[error("No token holds at least {minimal_balance}")]
    NoCandidatePath { minimal_balance: Amount },

    /// The sampled start token has no unvisited neighbour
    #[error("No path leads out of {0}")]
    IsolatedStart(TokenId),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl TradeError {
    /// The cycle can be skipped and the agent keeps running
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            TradeError::NoCandidatePath { .. } | TradeError::IsolatedStart(_)
        )
    }
}

/// Errors raised by the agent pool itself
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Agent {index} failed to start: {reason}")]
    AgentStartup { index: usize, reason: String },

    #[error("Could not spawn thread for agent {index}")]
    SpawnFailed {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not spawn the traffic controller thread")]
    TrafficSpawnFailed(#[source] std::io::Error),

    #[error("Agents are already running")]
    AlreadySpawned,

    #[error("No agents are running")]
    NotSpawned,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, PoolError>;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
