use stampede_core::{GraphError, PairHandle, TokenId};
use thiserror::Error;

/// Errors raised while setting up a simulated chain
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Pool {0} already exists")]
    DuplicatePool(PairHandle),

    #[error("Pool needs two distinct tokens, got {0} twice")]
    SelfPool(TokenId),

    #[error("Pool {0} needs non-zero reserves")]
    EmptyReserves(PairHandle),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type Result<T> = std::result::Result<T, SimError>;
