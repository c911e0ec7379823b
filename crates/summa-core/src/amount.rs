//! Fixed-point monetary values.
//!
//! A [`Value`] couples a signed amount with a [`CurrencyId`]. Amounts are
//! stored as `i64` multiples of `1/U`, i.e. `12.5` is represented as
//! `12.5 * 10^8 = 1_250_000_000`. Products and quotients of two amounts are
//! computed in `i128`, which always has room for an `i64 × i64` product.

use serde::{Deserialize, Serialize};
use std::ops::Neg;

use crate::currency::CurrencyId;

/// The fixed-point scale: every stored amount is the actual value times `U`.
pub const U: i64 = 100_000_000;

/// Maximum number of fractional digits a journal amount may carry.
pub const MAX_PRECISION: u32 = 8;

/// A signed amount in a single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Value {
    /// The amount, scaled by [`U`].
    pub amount: i64,
    /// The currency the amount is denominated in.
    pub currency: CurrencyId,
}

impl Value {
    /// Create a new value.
    #[must_use]
    pub const fn new(amount: i64, currency: CurrencyId) -> Self {
        Self { amount, currency }
    }

    /// Create a zero value in the given currency.
    #[must_use]
    pub const fn zero(currency: CurrencyId) -> Self {
        Self {
            amount: 0,
            currency,
        }
    }

    /// Check if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Multiply this value by a per-unit price, yielding the total in the
    /// price's currency.
    #[must_use]
    pub fn at_price(&self, price: Value) -> Value {
        Value::new(mul_scaled(self.amount, price.amount), price.currency)
    }
}

impl Neg for Value {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            amount: -self.amount,
            currency: self.currency,
        }
    }
}

/// Multiply two scaled amounts, keeping the result scaled by [`U`].
///
/// `a` and `b` are both multiples of `1/U`; the product is computed in
/// `i128` and divided by [`U`] (truncating toward zero) before narrowing.
#[must_use]
pub fn mul_scaled(a: i64, b: i64) -> i64 {
    let wide = i128::from(a) * i128::from(b) / i128::from(U);
    wide as i64
}

/// Compute the scaled ratio `num / den`, i.e. `num * U / den`.
///
/// Used for per-unit price synthesis: how much of `num`'s currency one unit
/// of `den`'s currency is worth. Truncates toward zero.
#[must_use]
pub fn ratio_scaled(num: i64, den: i64) -> i64 {
    let wide = i128::from(num) * i128::from(U) / i128::from(den);
    wide as i64
}
