//! In-process AMM chain
//!
//! Stands in for a real node when exercising the load generator: native
//! balances pay a flat fee per transaction, tokens move through
//! constant-product pools behind a router, and connection drops can be
//! injected on demand.

// Application layer
pub mod application;

// Infrastructure layer
pub mod infrastructure;

// Cross-cutting concerns
pub mod error;
pub mod model;
pub mod scenario;

// Re-export main types for convenience
pub use application::{SimChain, pair_account};
pub use error::SimError;
pub use infrastructure::{SimClient, SimConnector, SimGraphBuilder};
pub use model::{PoolState, SimConfig};

// Tests
#[cfg(test)]
mod tests;
