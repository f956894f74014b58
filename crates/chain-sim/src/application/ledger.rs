//! Simulated chain ledger
//!
//! Holds balances, allowances and constant-product pools behind a single
//! mutex. Every transaction is validated first and committed only once it
//! is known to succeed, so a rejected or reverted call never leaves partial
//! state behind.

use log::debug;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use stampede_core::{
    AccountId, Amount, Asset, DexAddresses, PairHandle, TokenId, amount_out, canonical_pair,
};
use stampede_ports::{
    ChainError, ChainResult, Operation, Receipt, ReceiptMeta, SwapCall, SwapKind,
};

use crate::error::{Result, SimError};
use crate::model::{PoolState, SimConfig};

/// Why an included call did not go through
enum Revert {
    Reverted(String),
    Invalid(String),
}

type CallResult<T> = std::result::Result<T, Revert>;

/// Balance changes and pool updates of a validated call
#[derive(Default)]
struct Plan {
    debits: Vec<(AccountId, Asset, Amount)>,
    credits: Vec<(AccountId, Asset, Amount)>,
    allowance_spend: Option<((AccountId, TokenId, AccountId), Amount)>,
    pool_updates: Vec<(PairHandle, TokenId, Amount, Amount)>,
    hops: u64,
}

#[derive(Debug)]
struct LedgerState {
    addresses: DexAddresses,
    pools: BTreeMap<PairHandle, PoolState>,
    pair_index: BTreeMap<(TokenId, TokenId), PairHandle>,
    symbols: BTreeMap<TokenId, Option<String>>,
    balances: HashMap<(AccountId, Asset), Amount>,
    allowances: HashMap<(AccountId, TokenId, AccountId), Amount>,
    block: u64,
    included: u64,
    pending_disconnects: u32,
}

impl LedgerState {
    fn balance(&self, account: &AccountId, asset: &Asset) -> Amount {
        self.balances
            .get(&(account.clone(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn allowance(&self, owner: &AccountId, token: &TokenId, spender: &AccountId) -> Amount {
        self.allowances
            .get(&(owner.clone(), token.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn credit(&mut self, account: AccountId, asset: Asset, amount: Amount) {
        let entry = self.balances.entry((account, asset)).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    fn debit(&mut self, account: AccountId, asset: Asset, amount: Amount) {
        let entry = self.balances.entry((account, asset)).or_insert(0);
        *entry = entry.saturating_sub(amount);
    }

    /// Walk `path` through the pools, returning the final output
    fn quote_path(
        &self,
        path: &[TokenId],
        amount_in: Amount,
        plan: &mut Plan,
    ) -> CallResult<Amount> {
        let mut amount = amount_in;
        for hop in path.windows(2) {
            let handle = self
                .pair_index
                .get(&canonical_pair(&hop[0], &hop[1]))
                .ok_or_else(|| Revert::Reverted(format!("no pair for {}/{}", hop[0], hop[1])))?;
            let (reserve_in, reserve_out) = self
                .pools
                .get(handle)
                .and_then(|pool| pool.reserves_for(&hop[0]))
                .ok_or_else(|| Revert::Invalid(format!("pool {} does not hold {}", handle, hop[0])))?;
            let out = amount_out(amount, reserve_in, reserve_out);
            if out == 0 || out >= reserve_out {
                return Err(Revert::Reverted(format!("insufficient liquidity in {}", handle)));
            }
            plan.pool_updates
                .push((handle.clone(), hop[0].clone(), amount, out));
            amount = out;
        }
        plan.hops = (path.len() - 1) as u64;
        Ok(amount)
    }

    fn plan_swap(&self, caller: &AccountId, call: &SwapCall, fee: Amount) -> CallResult<Plan> {
        if call.path.len() < 2 {
            return Err(Revert::Invalid(format!(
                "{} needs a path of at least two tokens",
                call.kind.method()
            )));
        }
        let wnative = &self.addresses.wnative;
        let router = &self.addresses.router;
        let first = &call.path[0];
        let last = &call.path[call.path.len() - 1];

        match call.kind {
            SwapKind::ExactNativeForTokens if first != wnative => {
                return Err(Revert::Invalid("path must start at wrapped native".into()));
            }
            SwapKind::ExactTokensForNative if last != wnative => {
                return Err(Revert::Invalid("path must end at wrapped native".into()));
            }
            _ => {}
        }

        if call.deadline < self.block {
            return Err(Revert::Reverted("expired".into()));
        }
        if call.amount_in == 0 {
            return Err(Revert::Reverted("zero input amount".into()));
        }

        let mut plan = Plan::default();

        let input = match call.kind {
            SwapKind::ExactNativeForTokens => {
                let native = self.balance(caller, &Asset::Native);
                if native < call.amount_in.saturating_add(fee) {
                    return Err(Revert::Reverted("native value exceeds balance".into()));
                }
                Asset::Native
            }
            SwapKind::ExactTokensForNative | SwapKind::ExactTokensForTokens => {
                if self.allowance(caller, first, router) < call.amount_in {
                    return Err(Revert::Reverted(format!("insufficient allowance for {}", first)));
                }
                if self.balance(caller, &Asset::Token(first.clone())) < call.amount_in {
                    return Err(Revert::Reverted(format!("insufficient balance of {}", first)));
                }
                plan.allowance_spend = Some((
                    (caller.clone(), first.clone(), router.clone()),
                    call.amount_in,
                ));
                Asset::Token(first.clone())
            }
        };

        let out = self.quote_path(&call.path, call.amount_in, &mut plan)?;
        if out < call.amount_out_min {
            return Err(Revert::Reverted(format!(
                "output {} below minimum {}",
                out, call.amount_out_min
            )));
        }

        let output = match call.kind {
            SwapKind::ExactTokensForNative => Asset::Native,
            _ => Asset::Token(last.clone()),
        };
        plan.debits.push((caller.clone(), input, call.amount_in));
        plan.credits.push((call.to.clone(), output, out));
        Ok(plan)
    }

    fn plan_transfer(
        &self,
        caller: &AccountId,
        token: &TokenId,
        to: &AccountId,
        amount: Amount,
    ) -> CallResult<Plan> {
        let asset = Asset::Token(token.clone());
        if self.balance(caller, &asset) < amount {
            return Err(Revert::Reverted(format!("insufficient balance of {}", token)));
        }
        let mut plan = Plan::default();
        plan.debits.push((caller.clone(), asset.clone(), amount));
        plan.credits.push((to.clone(), asset, amount));
        Ok(plan)
    }

    /// Swap on a single pool, paid for by tokens already sent to the pair
    fn plan_pair_swap(
        &self,
        pair: &PairHandle,
        amount_0_out: Amount,
        amount_1_out: Amount,
        to: &AccountId,
    ) -> CallResult<Plan> {
        let pool = self
            .pools
            .get(pair)
            .ok_or_else(|| Revert::Invalid(format!("unknown pair {}", pair)))?;
        let pair_account = pair_account(pair);
        let in_0 = self.balance(&pair_account, &Asset::Token(pool.token_0.clone()));
        let in_1 = self.balance(&pair_account, &Asset::Token(pool.token_1.clone()));

        let (token_in, amount_in, reserve_in, reserve_out, token_out, out) =
            match (amount_0_out, amount_1_out) {
                (0, 0) => return Err(Revert::Reverted("insufficient output amount".into())),
                (0, out) => (&pool.token_0, in_0, pool.reserve_0, pool.reserve_1, &pool.token_1, out),
                (out, 0) => (&pool.token_1, in_1, pool.reserve_1, pool.reserve_0, &pool.token_0, out),
                _ => return Err(Revert::Reverted("both sides requested".into())),
            };
        if out > amount_out(amount_in, reserve_in, reserve_out) {
            return Err(Revert::Reverted("constant product violated".into()));
        }

        // only the input side is consumed; stray tokens on the other side stay with the pair
        let mut plan = Plan::default();
        plan.debits
            .push((pair_account, Asset::Token(token_in.clone()), amount_in));
        plan.pool_updates
            .push((pair.clone(), token_in.clone(), amount_in, out));
        plan.credits.push((to.clone(), Asset::Token(token_out.clone()), out));
        plan.hops = 1;
        Ok(plan)
    }

    fn commit(&mut self, plan: Plan) {
        for (account, asset, amount) in plan.debits {
            self.debit(account, asset, amount);
        }
        if let Some((key, amount)) = plan.allowance_spend {
            let entry = self.allowances.entry(key).or_insert(0);
            *entry = entry.saturating_sub(amount);
        }
        for (handle, token_in, amount_in, out) in plan.pool_updates {
            if let Some(pool) = self.pools.get_mut(&handle) {
                pool.apply(&token_in, amount_in, out);
            }
        }
        for (account, asset, amount) in plan.credits {
            self.credit(account, asset, amount);
        }
    }
}

/// Account a pair contract holds transferred tokens under
pub fn pair_account(pair: &PairHandle) -> AccountId {
    AccountId::new(pair.as_str())
}

/// In-process chain with a constant-product exchange deployed on it
///
/// Cheap to clone; all clones share the same ledger.
#[derive(Debug, Clone)]
pub struct SimChain {
    state: Arc<Mutex<LedgerState>>,
    config: Arc<SimConfig>,
}

impl SimChain {
    /// Create an empty chain with the exchange at `addresses`
    pub fn new(addresses: DexAddresses, config: SimConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState {
                addresses,
                pools: BTreeMap::new(),
                pair_index: BTreeMap::new(),
                symbols: BTreeMap::new(),
                balances: HashMap::new(),
                allowances: HashMap::new(),
                block: 0,
                included: 0,
                pending_disconnects: 0,
            })),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn addresses(&self) -> DexAddresses {
        self.state.lock().addresses.clone()
    }

    /// Deploy a pool between two tokens with initial reserves
    pub fn add_pool(
        &self,
        token_a: TokenId,
        token_b: TokenId,
        reserve_a: Amount,
        reserve_b: Amount,
    ) -> Result<PairHandle> {
        if token_a == token_b {
            return Err(SimError::SelfPool(token_a));
        }
        let (token_0, token_1) = canonical_pair(&token_a, &token_b);
        let (reserve_0, reserve_1) = if token_a == token_0 {
            (reserve_a, reserve_b)
        } else {
            (reserve_b, reserve_a)
        };
        let handle = PairHandle::new(format!("pair:{}:{}", token_0, token_1));
        if reserve_0 == 0 || reserve_1 == 0 {
            return Err(SimError::EmptyReserves(handle));
        }

        let mut state = self.state.lock();
        if state.pools.contains_key(&handle) {
            return Err(SimError::DuplicatePool(handle));
        }
        state
            .pair_index
            .insert((token_0.clone(), token_1.clone()), handle.clone());
        state.pools.insert(
            handle.clone(),
            PoolState {
                token_0,
                token_1,
                reserve_0,
                reserve_1,
            },
        );
        debug!("Deployed pool {}", handle);
        Ok(handle)
    }

    /// Register token metadata
    pub fn set_symbol(&self, token: TokenId, symbol: Option<String>) {
        self.state.lock().symbols.insert(token, symbol);
    }

    /// Credit `amount` of `asset` to `account` out of thin air
    pub fn mint(&self, account: &AccountId, asset: Asset, amount: Amount) {
        self.state.lock().credit(account.clone(), asset, amount);
    }

    pub fn balance(&self, account: &AccountId, asset: &Asset) -> Amount {
        self.state.lock().balance(account, asset)
    }

    pub fn allowance(&self, owner: &AccountId, token: &TokenId, spender: &AccountId) -> Amount {
        self.state.lock().allowance(owner, token, spender)
    }

    pub fn pool(&self, handle: &PairHandle) -> Option<PoolState> {
        self.state.lock().pools.get(handle).cloned()
    }

    /// All pools, ordered by handle
    pub fn pools(&self) -> Vec<(PairHandle, PoolState)> {
        self.state
            .lock()
            .pools
            .iter()
            .map(|(h, p)| (h.clone(), p.clone()))
            .collect()
    }

    pub fn symbols(&self) -> Vec<(TokenId, Option<String>)> {
        self.state
            .lock()
            .symbols
            .iter()
            .map(|(t, s)| (t.clone(), s.clone()))
            .collect()
    }

    pub fn block_number(&self) -> u64 {
        self.state.lock().block
    }

    /// Number of transactions included so far (successful or reverted)
    pub fn included(&self) -> u64 {
        self.state.lock().included
    }

    /// Make the next `count` calls made by any client fail with a dropped connection
    pub fn inject_disconnects(&self, count: u32) {
        self.state.lock().pending_disconnects += count;
    }

    /// Consume one injected disconnect, if any is pending
    pub(crate) fn take_disconnect(&self) -> bool {
        let mut state = self.state.lock();
        if state.pending_disconnects > 0 {
            state.pending_disconnects -= 1;
            true
        } else {
            false
        }
    }

    fn receipt_meta(&self, block: u64, hops: u64) -> ReceiptMeta {
        ReceiptMeta {
            weight: self.config.base_weight + hops * self.config.weight_per_hop,
            fee: self.config.fee_per_call,
            block,
        }
    }

    /// Validate and apply `plan_fn`, charging the fee for every included call
    fn include<F>(&self, caller: &AccountId, plan_fn: F) -> ChainResult<Receipt>
    where
        F: FnOnce(&LedgerState, Amount) -> CallResult<Plan>,
    {
        let fee = self.config.fee_per_call;
        let mut state = self.state.lock();

        let native = state.balance(caller, &Asset::Native);
        if native < fee {
            return Err(ChainError::AccountExhausted(format!(
                "{} holds {} but the fee is {}",
                caller, native, fee
            )));
        }

        let outcome = plan_fn(&*state, fee);
        if let Err(Revert::Invalid(reason)) = &outcome {
            return Err(ChainError::Rejected(reason.clone()));
        }

        state.debit(caller.clone(), Asset::Native, fee);
        state.block += 1;
        state.included += 1;
        let block = state.block;

        match outcome {
            Ok(plan) => {
                let hops = plan.hops;
                state.commit(plan);
                Ok(Receipt::succeeded(self.receipt_meta(block, hops)))
            }
            Err(Revert::Reverted(reason)) => {
                debug!("Call from {} reverted in block {}: {}", caller, block, reason);
                Ok(Receipt::failed(Some(self.receipt_meta(block, 0))))
            }
            Err(Revert::Invalid(reason)) => Err(ChainError::Rejected(reason)),
        }
    }

    pub(crate) fn execute(&self, caller: &AccountId, operation: &Operation) -> ChainResult<Receipt> {
        match operation {
            Operation::Swap(call) => {
                self.include(caller, |state, fee| state.plan_swap(caller, call, fee))
            }
            Operation::Transfer { token, to, amount } => self.include(caller, |state, _| {
                state.plan_transfer(caller, token, to, *amount)
            }),
            Operation::PairSwap {
                pair,
                amount_0_out,
                amount_1_out,
                to,
            } => self.include(caller, |state, _| {
                state.plan_pair_swap(pair, *amount_0_out, *amount_1_out, to)
            }),
        }
    }

    pub(crate) fn approve(
        &self,
        owner: &AccountId,
        token: &TokenId,
        spender: &AccountId,
        amount: Amount,
    ) -> ChainResult<Receipt> {
        let receipt = self.include(owner, |_, _| Ok(Plan::default()))?;
        self.state
            .lock()
            .allowances
            .insert((owner.clone(), token.clone(), spender.clone()), amount);
        Ok(receipt)
    }
}
