use log::info;

use stampede_core::ExchangeGraph;
use stampede_ports::{DiscoveryError, GraphBuilder};

use crate::application::SimChain;

/// Reads the exchange graph straight out of a [`SimChain`]'s pools
#[derive(Debug, Clone)]
pub struct SimGraphBuilder {
    chain: SimChain,
}

impl SimGraphBuilder {
    pub fn new(chain: SimChain) -> Self {
        Self { chain }
    }
}

impl GraphBuilder for SimGraphBuilder {
    fn fetch(&self) -> Result<ExchangeGraph, DiscoveryError> {
        let mut graph = ExchangeGraph::new(self.chain.addresses());
        for (handle, pool) in self.chain.pools() {
            graph.add_pair(pool.token_0, pool.token_1, handle)?;
        }
        for (token, symbol) in self.chain.symbols() {
            graph.set_symbol(token, symbol);
        }
        info!(
            "Discovered {} pairs over {} tokens",
            graph.pair_count(),
            graph.token_count()
        );
        Ok(graph)
    }
}
