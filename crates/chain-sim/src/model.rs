use stampede_core::{Amount, TokenId};

/// Fee and weight schedule of the simulated chain
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Native fee charged for every included transaction
    pub fee_per_call: Amount,
    /// Weight of a transaction before any swap hops
    pub base_weight: u64,
    /// Extra weight per pool touched
    pub weight_per_hop: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fee_per_call: 1_000_000,
            base_weight: 150_000,
            weight_per_hop: 250_000,
        }
    }
}

/// A constant-product liquidity pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    /// Lower token in canonical order
    pub token_0: TokenId,
    pub token_1: TokenId,
    pub reserve_0: Amount,
    pub reserve_1: Amount,
}

impl PoolState {
    /// Reserves ordered as (in, out) for a swap spending `token_in`
    pub fn reserves_for(&self, token_in: &TokenId) -> Option<(Amount, Amount)> {
        if token_in == &self.token_0 {
            Some((self.reserve_0, self.reserve_1))
        } else if token_in == &self.token_1 {
            Some((self.reserve_1, self.reserve_0))
        } else {
            None
        }
    }

    /// Apply a swap of `amount_in` of `token_in` for `amount_out` of the other token
    pub(crate) fn apply(&mut self, token_in: &TokenId, amount_in: Amount, amount_out: Amount) {
        if token_in == &self.token_0 {
            self.reserve_0 += amount_in;
            self.reserve_1 -= amount_out;
        } else {
            self.reserve_1 += amount_in;
            self.reserve_0 -= amount_out;
        }
    }
}
