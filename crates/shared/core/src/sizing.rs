//! Trade sizing
//!
//! Amounts are drawn as a fraction of the balance being spent. The native
//! currency also pays fees, so it is spent far more conservatively than
//! tokens.

use rand::Rng;

use crate::values::Amount;

/// Fraction of a balance, as `numerator / denominator`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fraction {
    pub numerator: Amount,
    pub denominator: Amount,
}

impl Fraction {
    pub const fn new(numerator: Amount, denominator: Amount) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// `floor(value * self)` without overflowing for any `value`
    pub fn of_floor(&self, value: Amount) -> Amount {
        let whole = value / self.denominator;
        let rest = value % self.denominator;
        whole * self.numerator + rest * self.numerator / self.denominator
    }

    /// `ceil(value * self)`
    pub fn of_ceil(&self, value: Amount) -> Amount {
        let rest = value % self.denominator;
        let floor = self.of_floor(value);
        if rest * self.numerator % self.denominator == 0 {
            floor
        } else {
            floor + 1
        }
    }
}

/// Range of fractions a trade amount is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizingBand {
    pub low: Fraction,
    pub high: Fraction,
}

/// Native-origin trades spend 0.01% to 1% of the native balance
pub const NATIVE_BAND: SizingBand = SizingBand {
    low: Fraction::new(1, 10_000),
    high: Fraction::new(1, 100),
};

/// Token-origin trades spend 20% to 60% of the token balance
pub const TOKEN_BAND: SizingBand = SizingBand {
    low: Fraction::new(1, 5),
    high: Fraction::new(3, 5),
};

impl SizingBand {
    /// Integer bounds of the band for `balance`, both inclusive
    ///
    /// The low bound is rounded up and the high bound down so every amount
    /// in the range stays inside the band. Balances too small to fit an
    /// integer in the band collapse to the high bound.
    pub fn bounds(&self, balance: Amount) -> (Amount, Amount) {
        let low = self.low.of_ceil(balance);
        let high = self.high.of_floor(balance);
        (low.min(high), high)
    }

    /// Draw an amount uniformly from the band
    pub fn sample<R: Rng + ?Sized>(&self, balance: Amount, rng: &mut R) -> Amount {
        let (low, high) = self.bounds(balance);
        rng.gen_range(low..=high)
    }
}

/// Output of a constant-product pool with a 0.3% fee
///
/// `amount_in * 997 * reserve_out / (reserve_in * 1000 + amount_in * 997)`.
/// Exact while the numerator fits in 128 bits, approximated in floating
/// point beyond that.
pub fn amount_out(amount_in: Amount, reserve_in: Amount, reserve_out: Amount) -> Amount {
    let amount_in_with_fee = amount_in.saturating_mul(997);
    let denominator = reserve_in
        .saturating_mul(1000)
        .saturating_add(amount_in_with_fee);
    if denominator == 0 {
        return 0;
    }
    let out = match amount_in_with_fee.checked_mul(reserve_out) {
        Some(numerator) => numerator / denominator,
        None => (amount_in_with_fee as f64 * reserve_out as f64 / denominator as f64) as Amount,
    };
    out.min(reserve_out)
}
