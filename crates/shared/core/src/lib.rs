//! Stampede Core Domain
//!
//! Pure domain types for the Stampede load generator: the exchange's token
//! graph, swap paths, and trade sizing. This crate performs no network I/O
//! and is fully unit testable.

pub mod entities;
pub mod error;
pub mod graph;
pub mod sizing;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{Asset, Path};
pub use error::{GraphError, GraphResult};
pub use graph::{
    DexAddresses, ExchangeGraph, GraphSnapshot, PairEntry, TokenEntry, canonical_pair,
    snapshot_file_name,
};
pub use sizing::{Fraction, NATIVE_BAND, SizingBand, TOKEN_BAND, amount_out};
pub use values::{AccountId, Amount, PairHandle, Symbol, TokenId};
