//! Per-currency totals.
//!
//! A [`Balance`] holds at most one entry per currency and prunes entries
//! that reach zero, so an empty balance *is* the balanced state. Iteration
//! order is deterministic (by currency id).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::amount::Value;
use crate::currency::CurrencyId;

/// A set of per-currency amounts with no duplicate currencies and no
/// zero-amount entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    amounts: BTreeMap<CurrencyId, i64>,
}

impl Balance {
    /// Create an empty balance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether every currency nets to zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Number of currencies with a nonzero amount.
    #[must_use]
    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    /// The amount held in `currency`, zero when absent.
    #[must_use]
    pub fn get(&self, currency: CurrencyId) -> i64 {
        self.amounts.get(&currency).copied().unwrap_or(0)
    }

    /// Add a value, pruning the entry if the currency nets to zero.
    pub fn add(&mut self, value: Value) {
        self.add_amount(value.currency, value.amount);
    }

    /// Add a raw amount in a currency, pruning zero entries.
    pub fn add_amount(&mut self, currency: CurrencyId, amount: i64) {
        let entry = self.amounts.entry(currency).or_insert(0);
        *entry += amount;
        if *entry == 0 {
            self.amounts.remove(&currency);
        }
    }

    /// Add every entry of another balance.
    pub fn add_balance(&mut self, other: &Self) {
        for (currency, amount) in &other.amounts {
            self.add_amount(*currency, *amount);
        }
    }

    /// Iterate over `(currency, amount)` entries in currency-id order.
    pub fn iter(&self) -> impl Iterator<Item = (CurrencyId, i64)> + '_ {
        self.amounts.iter().map(|(c, a)| (*c, *a))
    }

    /// The single entry, if exactly one currency is present.
    #[must_use]
    pub fn single(&self) -> Option<(CurrencyId, i64)> {
        if self.amounts.len() == 1 {
            self.iter().next()
        } else {
            None
        }
    }
}

impl FromIterator<Value> for Balance {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut balance = Self::new();
        for value in iter {
            balance.add(value);
        }
        balance
    }
}
