//! Stampede Ports
//!
//! Port definitions (traits) for the Stampede load generator.
//! These define the boundaries between the trading core and the chain:
//! graph discovery, per-agent submission, and failure classification.

mod chain;
mod error;
mod operation;

pub use chain::{AgentIdentity, ChainClient, ChainConnector, GraphBuilder};
pub use error::{ChainError, ChainResult, DiscoveryError};
pub use operation::{
    DEADLINE_FOREVER, MIN_AMOUNT_OUT, Operation, Receipt, ReceiptMeta, SwapCall, SwapKind,
};
