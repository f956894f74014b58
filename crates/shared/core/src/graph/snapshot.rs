//! Graph snapshot
//!
//! Opaque on-disk form of an [`ExchangeGraph`], so discovery against the
//! chain only has to run once per deployment.

use serde::{Deserialize, Serialize};
use std::path::{Path as FsPath, PathBuf};

use super::{DexAddresses, ExchangeGraph};
use crate::error::{GraphError, GraphResult};
use crate::values::{AccountId, PairHandle, TokenId};

/// One registered pair, stored in canonical token order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairEntry {
    pub token_0: TokenId,
    pub token_1: TokenId,
    pub handle: PairHandle,
}

/// Token metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEntry {
    pub address: TokenId,
    pub symbol: Option<String>,
}

/// Serializable form of the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub router: AccountId,
    pub factory: AccountId,
    pub wnative: TokenId,
    pub pairs: Vec<PairEntry>,
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
}

impl From<&ExchangeGraph> for GraphSnapshot {
    fn from(graph: &ExchangeGraph) -> Self {
        Self {
            router: graph.addresses.router.clone(),
            factory: graph.addresses.factory.clone(),
            wnative: graph.addresses.wnative.clone(),
            pairs: graph
                .pairs
                .iter()
                .map(|((token_0, token_1), handle)| PairEntry {
                    token_0: token_0.clone(),
                    token_1: token_1.clone(),
                    handle: handle.clone(),
                })
                .collect(),
            tokens: graph
                .symbols
                .iter()
                .map(|(address, symbol)| TokenEntry {
                    address: address.clone(),
                    symbol: symbol.clone(),
                })
                .collect(),
        }
    }
}

impl TryFrom<GraphSnapshot> for ExchangeGraph {
    type Error = GraphError;

    fn try_from(snapshot: GraphSnapshot) -> GraphResult<Self> {
        let mut graph = ExchangeGraph::new(DexAddresses {
            router: snapshot.router,
            factory: snapshot.factory,
            wnative: snapshot.wnative,
        });
        for pair in snapshot.pairs {
            graph.add_pair(pair.token_0, pair.token_1, pair.handle)?;
        }
        for token in snapshot.tokens {
            graph.set_symbol(token.address, token.symbol);
        }
        Ok(graph)
    }
}

/// Default snapshot name: `<chain-id>.<router prefix>.dex`
///
/// The chain id is the last `/`-separated segment of the chain URL.
pub fn snapshot_file_name(chain_url: &str, router: &AccountId) -> String {
    let chain_id = chain_url.rsplit('/').next().unwrap_or(chain_url);
    let prefix: String = router.as_str().chars().take(6).collect();
    format!("{}.{}.dex", chain_id, prefix)
}

impl ExchangeGraph {
    /// Serialize the graph to a JSON string
    pub fn to_json(&self) -> GraphResult<String> {
        serde_json::to_string_pretty(&GraphSnapshot::from(self))
            .map_err(|e| GraphError::SnapshotFormat(e.to_string()))
    }

    /// Rebuild a graph from [`ExchangeGraph::to_json`] output
    pub fn from_json(json: &str) -> GraphResult<Self> {
        let snapshot: GraphSnapshot =
            serde_json::from_str(json).map_err(|e| GraphError::SnapshotFormat(e.to_string()))?;
        Self::try_from(snapshot)
    }

    /// Write the snapshot into `dir`, returning the full path written
    pub fn save_to_file(&self, dir: impl AsRef<FsPath>, file_name: &str) -> GraphResult<PathBuf> {
        let path = dir.as_ref().join(file_name);
        let json = self.to_json()?;
        std::fs::write(&path, json).map_err(|e| GraphError::SnapshotIo {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Ok(path)
    }

    /// Load a snapshot written by [`ExchangeGraph::save_to_file`]
    pub fn load_from_file(path: impl AsRef<FsPath>) -> GraphResult<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| GraphError::SnapshotIo {
                path: path.as_ref().display().to_string(),
                error: e.to_string(),
            })?;
        Self::from_json(&content)
    }
}
