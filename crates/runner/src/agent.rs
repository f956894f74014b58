//! Agent - One trading identity
//!
//! An agent owns a chain connection and a view of its own balances, and
//! turns work items into swaps:
//! - Picks a start token it holds enough of
//! - Samples a random path through the exchange graph
//! - Sizes the trade relative to the balance being spent
//! - Submits a single router swap and refreshes the two balances it touched
//!
//! Failures from the chain are returned untouched; classifying them is the
//! worker loop's job.

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::sync::Arc;

use stampede_core::{
    AccountId, Amount, Asset, ExchangeGraph, NATIVE_BAND, Path, TOKEN_BAND, TokenId, amount_out,
    canonical_pair,
};
use stampede_ports::{
    ChainClient, ChainError, ChainResult, DEADLINE_FOREVER, MIN_AMOUNT_OUT, Operation, Receipt,
    SwapCall, SwapKind,
};

use crate::error::TradeError;

/// What a completed trade cycle submitted and how the chain answered
#[derive(Debug, Clone, PartialEq)]
pub struct TradeReport {
    pub path: Path,
    pub amount_in: Amount,
    pub receipt: Receipt,
    /// Balance refresh after a landed swap; `Ok` when nothing was read
    ///
    /// Kept apart from the trade result so a dropped connection after the
    /// swap is included does not hide the swap itself.
    pub refresh: ChainResult<()>,
}

impl TradeReport {
    pub fn is_success(&self) -> bool {
        self.receipt.success
    }
}

/// A trading identity bound to one chain connection
pub struct Agent<C: ChainClient> {
    index: usize,
    client: C,
    graph: Arc<ExchangeGraph>,
    balances: BTreeMap<Asset, Amount>,
    rng: StdRng,
    label: String,
}

impl<C: ChainClient> Agent<C> {
    /// Create an agent; balances start at zero until the first refresh
    ///
    /// Tracks the native currency and every graph token except the wrapped
    /// native one, which is never held directly.
    pub fn new(index: usize, client: C, graph: Arc<ExchangeGraph>, seed: Option<u64>) -> Self {
        let mut balances = BTreeMap::new();
        balances.insert(Asset::Native, 0);
        for token in graph.tokens() {
            if token != graph.wnative() {
                balances.insert(Asset::Token(token.clone()), 0);
            }
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            index,
            client,
            graph,
            balances,
            rng,
            label: format!("agent-{}", index),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn account(&self) -> &AccountId {
        self.client.account()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Last known balances
    pub fn balances(&self) -> &BTreeMap<Asset, Amount> {
        &self.balances
    }

    pub fn balance(&self, asset: &Asset) -> Amount {
        self.balances.get(asset).copied().unwrap_or(0)
    }

    /// Balance entry standing for `token` when it ends a path
    fn asset_for(&self, token: &TokenId) -> Asset {
        if token == self.graph.wnative() {
            Asset::Native
        } else {
            Asset::Token(token.clone())
        }
    }

    /// Re-read balances from the chain, all of them when `assets` is `None`
    ///
    /// A rejected read only skips that asset; any other failure aborts.
    pub fn refresh_balances(&mut self, assets: Option<&[Asset]>) -> ChainResult<()> {
        let assets: Vec<Asset> = match assets {
            Some(list) => list.to_vec(),
            None => self.balances.keys().cloned().collect(),
        };
        let owner = self.client.account().clone();
        for asset in assets {
            match self.client.balance_of(&owner, &asset) {
                Ok(amount) => {
                    self.balances.insert(asset, amount);
                }
                Err(ChainError::Rejected(reason)) => {
                    warn!(
                        "[{}] Fetching balance of {} FAILED: {}",
                        self.label,
                        self.symbol_of(&asset),
                        reason
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn symbol_of(&self, asset: &Asset) -> String {
        match asset {
            Asset::Native => Asset::Native.to_string(),
            Asset::Token(token) => self.graph.symbol(token).to_string(),
        }
    }

    /// Log the balance table
    pub fn show_balances(&self) {
        for (asset, amount) in &self.balances {
            info!("[{}] {:<12} {}", self.label, self.symbol_of(asset), amount);
        }
    }

    /// Approve the router to spend `amount` of each of `tokens`
    ///
    /// The wrapped native token is skipped. An unsuccessful receipt is
    /// logged and the remaining tokens are still approved. Returns how many
    /// approvals went through.
    pub fn set_allowances(&mut self, amount: Amount, tokens: &[TokenId]) -> ChainResult<usize> {
        let router = self.graph.router().clone();
        let mut granted = 0;
        for token in tokens {
            if token == self.graph.wnative() {
                continue;
            }
            let receipt = self.client.approve(token, &router, amount)?;
            if receipt.success {
                granted += 1;
            } else {
                warn!(
                    "[{}] Approving {} for the router FAILED",
                    self.label,
                    self.graph.symbol(token)
                );
            }
        }
        debug!("[{}] {} allowances granted", self.label, granted);
        Ok(granted)
    }

    /// Approve the router for every token in the graph
    pub fn set_all_allowances(&mut self, amount: Amount) -> ChainResult<usize> {
        let tokens: Vec<TokenId> = self.graph.tokens().cloned().collect();
        self.set_allowances(amount, &tokens)
    }

    /// Start tokens holding at least `minimal_balance`, in balance-map order
    fn candidates(&self, minimal_balance: Amount, include_native: bool) -> Vec<Asset> {
        self.balances
            .iter()
            .filter(|(asset, amount)| {
                **amount >= minimal_balance
                    && (include_native || !asset.is_native())
                    && asset.token() != Some(self.graph.wnative())
            })
            .map(|(asset, _)| asset.clone())
            .collect()
    }

    fn sample_path(&mut self, start: &Asset, max_path_len: usize) -> Result<Path, TradeError> {
        let start = match start {
            Asset::Native => self.graph.wnative().clone(),
            Asset::Token(token) => token.clone(),
        };
        let path = self.graph.random_path(&start, max_path_len, &mut self.rng);
        if path.len() < 2 {
            return Err(TradeError::IsolatedStart(start));
        }
        Ok(path)
    }

    /// Execute one trade along a random path of at most `max_path_len` hops
    pub fn trade(
        &mut self,
        max_path_len: usize,
        minimal_balance: Amount,
    ) -> Result<TradeReport, TradeError> {
        let candidates = self.candidates(minimal_balance, true);
        let start = candidates
            .choose(&mut self.rng)
            .cloned()
            .ok_or(TradeError::NoCandidatePath { minimal_balance })?;
        let path = self.sample_path(&start, max_path_len)?;

        let wnative = self.graph.wnative().clone();
        let native_origin = path.first() == &wnative;
        let amount_in = if native_origin {
            NATIVE_BAND.sample(self.balance(&Asset::Native), &mut self.rng)
        } else {
            TOKEN_BAND.sample(self.balance(&Asset::Token(path.first().clone())), &mut self.rng)
        };
        let kind = if native_origin {
            SwapKind::ExactNativeForTokens
        } else if path.last() == &wnative {
            SwapKind::ExactTokensForNative
        } else {
            SwapKind::ExactTokensForTokens
        };

        let call = SwapCall {
            kind,
            path: path.tokens().to_vec(),
            amount_in,
            amount_out_min: MIN_AMOUNT_OUT,
            to: self.client.account().clone(),
            deadline: DEADLINE_FOREVER,
        };
        let receipt = self.client.submit(&Operation::Swap(call))?;
        self.log_outcome("Trade", &path, &receipt);

        let refresh = if receipt.success {
            let ends = [self.asset_for(path.first()), self.asset_for(path.last())];
            self.refresh_balances(Some(&ends))
        } else {
            Ok(())
        };
        Ok(TradeReport {
            path,
            amount_in,
            receipt,
            refresh,
        })
    }

    /// Trade one hop by paying the pair directly and calling its swap
    ///
    /// Bypasses the router: tokens are transferred to the pair first, then
    /// the constant-product output is requested from the pair itself.
    pub fn trade_direct(&mut self, minimal_balance: Amount) -> Result<TradeReport, TradeError> {
        let candidates = self.candidates(minimal_balance, false);
        let start = candidates
            .choose(&mut self.rng)
            .cloned()
            .ok_or(TradeError::NoCandidatePath { minimal_balance })?;
        let path = self.sample_path(&start, 1)?;
        let (token_in, token_out) = (path.first().clone(), path.last().clone());

        let amount_in = TOKEN_BAND.sample(self.balance(&start), &mut self.rng);
        let pair = self.graph.get_pair(&token_in, &token_out)?.clone();
        let pair_account = AccountId::new(pair.as_str());
        let me = self.client.account().clone();

        let receipt = self.client.submit(&Operation::Transfer {
            token: token_in.clone(),
            to: pair_account,
            amount: amount_in,
        })?;
        if !receipt.success {
            warn!("[{}] Transfer to pair {} FAILED", self.label, pair);
            return Ok(TradeReport {
                path,
                amount_in,
                receipt,
                refresh: Ok(()),
            });
        }

        let (reserve_0, reserve_1) = self.client.reserves(&pair)?;
        let (token_0, _) = canonical_pair(&token_in, &token_out);
        let (amount_0_out, amount_1_out) = if token_in == token_0 {
            (0, amount_out(amount_in, reserve_0, reserve_1))
        } else {
            (amount_out(amount_in, reserve_1, reserve_0), 0)
        };
        let receipt = self.client.submit(&Operation::PairSwap {
            pair,
            amount_0_out,
            amount_1_out,
            to: me,
        })?;
        self.log_outcome("Direct trade", &path, &receipt);

        let refresh = if receipt.success {
            let ends = [self.asset_for(&token_in), self.asset_for(&token_out)];
            self.refresh_balances(Some(&ends))
        } else {
            Ok(())
        };
        Ok(TradeReport {
            path,
            amount_in,
            receipt,
            refresh,
        })
    }

    fn log_outcome(&self, what: &str, path: &Path, receipt: &Receipt) {
        let route = self.graph.describe(path);
        match (&receipt.meta, receipt.success) {
            (Some(meta), true) => debug!("[{}] {} {}  {}", self.label, what, route, meta),
            (None, true) => debug!("[{}] {} {}  OK", self.label, what, route),
            (_, false) => debug!("[{}] {} {}  FAILED", self.label, what, route),
        }
    }
}
