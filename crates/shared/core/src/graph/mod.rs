//! Exchange graph
//!
//! Static, offline model of the tokens listed on the exchange and the pairs
//! connecting them. Built once (usually by a `GraphBuilder` collaborator
//! talking to the chain), then wrapped in an `Arc` and shared read-only
//! with every trading agent.

mod snapshot;

pub use snapshot::{GraphSnapshot, PairEntry, TokenEntry, snapshot_file_name};

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{BTreeMap, BTreeSet};

use crate::entities::Path;
use crate::error::{GraphError, GraphResult};
use crate::values::{AccountId, PairHandle, TokenId};

/// Contract addresses of the exchange itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexAddresses {
    /// Router contract every swap goes through
    pub router: AccountId,
    /// Factory contract the pairs were discovered from
    pub factory: AccountId,
    /// Token standing in for the native currency inside swap paths
    pub wnative: TokenId,
}

/// Sort two tokens into the order pairs are keyed by
pub fn canonical_pair(a: &TokenId, b: &TokenId) -> (TokenId, TokenId) {
    if a < b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Token/pair graph of the exchange
///
/// Neighbour sets are kept ordered so that a seeded random source fully
/// determines every sampled path.
#[derive(Debug, Clone)]
pub struct ExchangeGraph {
    addresses: DexAddresses,
    neighbors: BTreeMap<TokenId, BTreeSet<TokenId>>,
    pairs: BTreeMap<(TokenId, TokenId), PairHandle>,
    symbols: BTreeMap<TokenId, Option<String>>,
}

impl ExchangeGraph {
    /// Create an empty graph for the exchange at `addresses`
    pub fn new(addresses: DexAddresses) -> Self {
        Self {
            addresses,
            neighbors: BTreeMap::new(),
            pairs: BTreeMap::new(),
            symbols: BTreeMap::new(),
        }
    }

    /// Register a pair linking `token_0` and `token_1`
    ///
    /// Both directions of the edge are recorded.
    pub fn add_pair(
        &mut self,
        token_0: TokenId,
        token_1: TokenId,
        handle: PairHandle,
    ) -> GraphResult<()> {
        if token_0 == token_1 {
            return Err(GraphError::SelfPair(token_0));
        }
        let key = canonical_pair(&token_0, &token_1);
        if self.pairs.contains_key(&key) {
            return Err(GraphError::DuplicatePair(key.0, key.1));
        }
        self.pairs.insert(key, handle);

        self.neighbors
            .entry(token_0.clone())
            .or_default()
            .insert(token_1.clone());
        self.neighbors.entry(token_1).or_default().insert(token_0);
        Ok(())
    }

    /// Record the display symbol of a token (`None` if the token has no metadata)
    pub fn set_symbol(&mut self, token: TokenId, symbol: Option<String>) {
        self.symbols.insert(token, symbol);
    }

    pub fn addresses(&self) -> &DexAddresses {
        &self.addresses
    }

    pub fn router(&self) -> &AccountId {
        &self.addresses.router
    }

    pub fn wnative(&self) -> &TokenId {
        &self.addresses.wnative
    }

    /// All tokens that appear in at least one pair, in canonical order
    pub fn tokens(&self) -> impl Iterator<Item = &TokenId> {
        self.neighbors.keys()
    }

    pub fn token_count(&self) -> usize {
        self.neighbors.len()
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn contains(&self, token: &TokenId) -> bool {
        self.neighbors.contains_key(token)
    }

    /// Tokens sharing a pair with `token` (empty for unknown tokens)
    pub fn neighbors(&self, token: &TokenId) -> impl Iterator<Item = &TokenId> {
        self.neighbors.get(token).into_iter().flatten()
    }

    /// Handle of the pair linking `a` and `b`, in either order
    pub fn get_pair(&self, a: &TokenId, b: &TokenId) -> GraphResult<&PairHandle> {
        let key = canonical_pair(a, b);
        self.pairs
            .get(&key)
            .ok_or_else(|| GraphError::PairNotFound(key.0, key.1))
    }

    /// Display symbol for a token, falling back to its address
    pub fn symbol<'a>(&'a self, token: &'a TokenId) -> &'a str {
        match self.symbols.get(token) {
            Some(Some(sym)) => sym.as_str(),
            _ => token.as_str(),
        }
    }

    /// Render a path with token symbols, e.g. `WNAT->USDT->DOT`
    pub fn describe(&self, path: &Path) -> String {
        let symbols: Vec<&str> = path.tokens().iter().map(|t| self.symbol(t)).collect();
        symbols.join("->")
    }

    /// Sample a random walk starting at `start`
    ///
    /// Each step moves to a uniformly chosen neighbour that is not on the
    /// path yet. The walk stops after `max_length` hops or as soon as no
    /// unvisited neighbour is left, so the result may be shorter than asked
    /// for, down to just `[start]`. Unknown start tokens have no neighbours.
    pub fn random_path<R: Rng + ?Sized>(
        &self,
        start: &TokenId,
        max_length: usize,
        rng: &mut R,
    ) -> Path {
        let mut path = Path::starting_at(start.clone());
        let mut visited: BTreeSet<&TokenId> = BTreeSet::new();
        visited.insert(start);
        let mut current = start;

        while path.len() <= max_length {
            let candidates: Vec<&TokenId> = self
                .neighbors(current)
                .filter(|t| !visited.contains(t))
                .collect();
            let Some(next) = candidates.choose(rng).copied() else {
                break;
            };
            visited.insert(next);
            path.push(next.clone());
            current = next;
        }

        path
    }
}
