mod client;
mod discovery;

pub use client::{SimClient, SimConnector};
pub use discovery::SimGraphBuilder;
