//! Stampede Runner - AMM load generator
//!
//! Drives a pool of independent trading identities that keep submitting
//! random swaps through an exchange:
//!
//! - **Agent**: one identity; samples a path, sizes and submits a swap
//! - **Worker**: the agent's thread loop; classifies chain failures
//! - **Pool**: spawns agents behind a readiness barrier, shares one queue
//! - **Traffic**: tops the queue up to a target rate once per tick
//!
//! ## Architecture
//!
//! ```text
//!   order_trades(n, k)         ┌─────────────────────┐
//!  ───────────────────────┐    │  TrafficController  │
//!                         │    │  (R items per tick) │
//!                         ▼    └──────────┬──────────┘
//!               ┌──────────────────────────▼───────┐
//!               │   shared work queue (k | 0)      │
//!               └───┬──────────────┬───────────┬───┘
//!                   ▼              ▼           ▼
//!              ┌─────────┐   ┌─────────┐  ┌─────────┐
//!              │ agent-0 │   │ agent-1 │  │ agent-N │   each with its
//!              └────┬────┘   └────┬────┘  └────┬────┘   own ChainClient
//!                   └─────────────┼────────────┘
//!                                 ▼
//!                      ┌─────────────────────┐
//!                      │   exchange (chain)  │
//!                      └─────────────────────┘
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod pool;
pub mod traffic;
pub mod worker;

// Re-export main types
pub use agent::{Agent, TradeReport};
pub use config::{DEFAULT_ALLOWANCE, HarnessConfig};
pub use error::{ConfigError, PoolError, TradeError};
pub use pool::{AgentPool, PoolReport};
pub use traffic::{SENTINEL_STOP, TrafficController};
pub use worker::{AgentExit, AgentSummary, POISON_PILL, WorkItem};
