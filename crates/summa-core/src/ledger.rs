//! The ledger: arena owner of all entities, plus queries.
//!
//! The [`Ledger`] owns accounts, transactions, splits, currencies and
//! prices in parallel arenas keyed by stable ids. Relationships between
//! entities are ids in one direction and derived id vectors in the other,
//! so the graph has no ownership cycles. A ledger is populated by a
//! back-end, completed once, and read-only afterwards.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::account::{Account, AccountId};
use crate::amount::{mul_scaled, Value};
use crate::balance::Balance;
use crate::currency::{Currency, CurrencyId};
use crate::price::Price;
use crate::transaction::{Split, SplitId, Transaction, TransactionId};

/// No price path connects two currencies at the requested time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no price path from '{from}' to '{to}'")]
pub struct ConversionError {
    /// Name of the currency the value is denominated in.
    pub from: String,
    /// Name of the requested target currency.
    pub to: String,
}

/// All the accounts, transactions, currencies and prices of one accounting.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Account arena; [`AccountId`] indexes into it.
    pub accounts: Vec<Account>,
    /// Accounts in pre-order (parents before descendants). Derived.
    pub account_order: Vec<AccountId>,
    /// Transaction arena, non-decreasing by time after completion.
    pub transactions: Vec<Transaction>,
    /// Split arena; transactions and accounts reference into it.
    pub splits: Vec<Split>,
    /// Currency arena; [`CurrencyId`] indexes into it.
    pub currencies: Vec<Currency>,
    /// Market prices, non-decreasing by time after completion.
    pub prices: Vec<Price>,
    /// Currency used when a value names no symbol.
    pub default_currency: Option<CurrencyId>,
    /// Per-split total prices (`@`/`@@` annotations), keyed by split id.
    pub split_prices: HashMap<SplitId, Value>,
    /// Per-split balance assertions (`=`), keyed by split id.
    pub assertions: HashMap<SplitId, Value>,
    /// The distinguished transfer account, once completion created it.
    pub transfer_account: Option<AccountId>,
}

impl Ledger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- arena accessors -------------------------------------------------

    /// The account with the given id.
    #[must_use]
    pub fn account(&self, id: AccountId) -> &Account {
        &self.accounts[id.index()]
    }

    /// Mutable access to an account.
    pub fn account_mut(&mut self, id: AccountId) -> &mut Account {
        &mut self.accounts[id.index()]
    }

    /// The transaction with the given id.
    #[must_use]
    pub fn transaction(&self, id: TransactionId) -> &Transaction {
        &self.transactions[id.index()]
    }

    /// Mutable access to a transaction.
    pub fn transaction_mut(&mut self, id: TransactionId) -> &mut Transaction {
        &mut self.transactions[id.index()]
    }

    /// The split with the given id.
    #[must_use]
    pub fn split(&self, id: SplitId) -> &Split {
        &self.splits[id.index()]
    }

    /// Mutable access to a split.
    pub fn split_mut(&mut self, id: SplitId) -> &mut Split {
        &mut self.splits[id.index()]
    }

    /// The currency with the given id.
    #[must_use]
    pub fn currency(&self, id: CurrencyId) -> &Currency {
        &self.currencies[id.index()]
    }

    /// Mutable access to a currency.
    pub fn currency_mut(&mut self, id: CurrencyId) -> &mut Currency {
        &mut self.currencies[id.index()]
    }

    // --- interning -------------------------------------------------------

    /// Look up a currency by symbol, creating it on first mention.
    ///
    /// The empty symbol denotes the ledger's default currency, which is
    /// created unnamed if nothing has claimed the role yet. Returns the id
    /// and whether the currency is new to the ledger.
    pub fn ensure_currency(&mut self, name: &str) -> (CurrencyId, bool) {
        if name.is_empty() {
            if let Some(id) = self.default_currency {
                return (id, false);
            }
            let id = CurrencyId::new(self.currencies.len());
            self.currencies.push(Currency::new(""));
            self.default_currency = Some(id);
            return (id, true);
        }
        if let Some(index) = self.currencies.iter().position(|c| c.name == name) {
            return (CurrencyId::new(index), false);
        }
        let id = CurrencyId::new(self.currencies.len());
        self.currencies.push(Currency::new(name));
        (id, true)
    }

    /// Look up an account by fully-qualified name, creating the whole
    /// parent chain on first mention. Returns the id and whether the leaf
    /// account is new.
    pub fn ensure_account(&mut self, full_name: &str) -> (AccountId, bool) {
        let full_name = full_name.trim();
        if let Some(id) = self.account_by_name(full_name) {
            return (id, false);
        }
        let (parent, name) = match full_name.rsplit_once(':') {
            Some((parent_name, name)) => (Some(self.ensure_account(parent_name).0), name),
            None => (None, full_name),
        };
        let id = AccountId::new(self.accounts.len());
        let mut account = Account::new(id, name, parent);
        if let Some(parent) = parent {
            account.level = self.account(parent).level + 1;
            self.account_mut(parent).children.push(id);
        }
        self.accounts.push(account);
        (id, true)
    }

    // --- queries ---------------------------------------------------------

    /// Find an account by its fully-qualified colon-joined name.
    #[must_use]
    pub fn account_by_name(&self, full_name: &str) -> Option<AccountId> {
        self.accounts
            .iter()
            .position(|a| self.full_name(a.id) == full_name)
            .map(AccountId::new)
    }

    /// Find a currency by its symbol.
    #[must_use]
    pub fn currency_by_name(&self, name: &str) -> Option<CurrencyId> {
        self.currencies
            .iter()
            .position(|c| c.name == name)
            .map(CurrencyId::new)
    }

    /// The fully-qualified colon-joined name of an account.
    #[must_use]
    pub fn full_name(&self, id: AccountId) -> String {
        let account = self.account(id);
        match account.parent {
            Some(parent) => format!("{}:{}", self.full_name(parent), account.name),
            None => account.name.clone(),
        }
    }

    /// The effective time of a split: its own when explicit, otherwise the
    /// owning transaction's.
    #[must_use]
    pub fn split_time(&self, id: SplitId) -> NaiveDateTime {
        let split = self.split(id);
        split
            .time
            .unwrap_or_else(|| self.transaction(split.transaction).time)
    }

    /// The value a split contributes to its transaction's balance: the
    /// split price when one is attached, the split's own value otherwise.
    #[must_use]
    pub fn effective_value(&self, id: SplitId) -> Option<Value> {
        self.split_prices
            .get(&id)
            .copied()
            .or(self.split(id).value)
    }

    /// The balance of an account at a point in time.
    ///
    /// `None` asks for the balance after the last split. Otherwise the
    /// balance after the latest split with effective time `<= when` is
    /// returned, or the account's start balance if no split qualifies.
    #[must_use]
    pub fn balance(&self, account: AccountId, when: Option<NaiveDateTime>) -> Balance {
        let account = self.account(account);
        let latest = match when {
            None => account.splits.last(),
            Some(when) => account
                .splits
                .iter()
                .rev()
                .find(|&&sid| self.split_time(sid) <= when),
        };
        match latest {
            Some(&sid) => self.split(sid).balance.clone(),
            None => account.start_balance.clone(),
        }
    }

    /// All transactions touching an account, in time order.
    #[must_use]
    pub fn transactions_in_account(&self, account: AccountId) -> Vec<TransactionId> {
        let mut out: Vec<TransactionId> = Vec::new();
        for &sid in &self.account(account).splits {
            let txn = self.split(sid).transaction;
            if !out.contains(&txn) {
                out.push(txn);
            }
        }
        out
    }

    /// All transactions with `start <= time <= end`, in time order.
    #[must_use]
    pub fn transactions_in_interval(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Vec<TransactionId> {
        self.transactions
            .iter()
            .filter(|t| t.time >= start && t.time <= end)
            .map(|t| t.id)
            .collect()
    }

    // --- conversion ------------------------------------------------------

    /// Convert a value into another currency using the market prices known
    /// at `when`.
    ///
    /// Prices straddling `when` are linearly interpolated in time; a price
    /// on one side only is used unshifted. When no price relates the pair
    /// directly, the latest price from the value's currency to any other
    /// currency is applied and the conversion recurses from there.
    pub fn convert(
        &self,
        value: Value,
        when: NaiveDateTime,
        target: CurrencyId,
    ) -> Result<Value, ConversionError> {
        self.convert_from(value, when, target, &mut Vec::new())
    }

    fn convert_from(
        &self,
        value: Value,
        when: NaiveDateTime,
        target: CurrencyId,
        visited: &mut Vec<CurrencyId>,
    ) -> Result<Value, ConversionError> {
        if value.currency == target {
            return Ok(value);
        }
        visited.push(value.currency);

        // Latest matching price at or before `when`, earliest at or after.
        let mut before: Option<&Price> = None;
        let mut after: Option<&Price> = None;
        for price in &self.prices {
            if price.currency != value.currency || price.value.currency != target {
                continue;
            }
            if price.time <= when {
                before = Some(price);
            }
            if price.time >= when && after.is_none() {
                after = Some(price);
            }
        }

        let rate = match (before, after) {
            (Some(b), Some(a)) if b.time != a.time => interpolate(b, a, when),
            (Some(b), _) => b.value.amount,
            (None, Some(a)) => a.value.amount,
            (None, None) => {
                // No direct pair: hop through the latest price from this
                // currency to any currency not yet tried.
                let mut bridge: Option<&Price> = None;
                for price in &self.prices {
                    if price.currency != value.currency
                        || price.value.currency == value.currency
                        || visited.contains(&price.value.currency)
                    {
                        continue;
                    }
                    if bridge.is_none() || price.time <= when {
                        bridge = Some(price);
                    }
                }
                let bridge = bridge.ok_or_else(|| self.conversion_error(value.currency, target))?;
                let mid = value.at_price(bridge.value);
                return self.convert_from(mid, when, target, visited);
            }
        };

        Ok(Value::new(mul_scaled(value.amount, rate), target))
    }

    fn conversion_error(&self, from: CurrencyId, to: CurrencyId) -> ConversionError {
        ConversionError {
            from: self.currency(from).name.clone(),
            to: self.currency(to).name.clone(),
        }
    }
}

/// Linear interpolation of a rate between two prices straddling `when`.
fn interpolate(before: &Price, after: &Price, when: NaiveDateTime) -> i64 {
    let t0 = before.time.and_utc().timestamp();
    let t1 = after.time.and_utc().timestamp();
    let t = when.and_utc().timestamp();
    let span = i128::from(t1 - t0);
    if span == 0 {
        return before.value.amount;
    }
    let p0 = i128::from(before.value.amount);
    let p1 = i128::from(after.value.amount);
    let rate = p0 + (p1 - p0) * i128::from(t - t0) / span;
    rate as i64
}
