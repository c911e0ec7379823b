//! Transactions and splits.
//!
//! A [`Transaction`] is a timed, described group of [`Split`]s whose
//! effective values sum to zero in every currency once the ledger is
//! completed. Splits live in a central arena on the ledger; transactions
//! and accounts reference them by [`SplitId`].

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::account::AccountId;
use crate::amount::Value;
use crate::balance::Balance;

/// Stable index of a transaction in the ledger's transaction arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct TransactionId(usize);

impl TransactionId {
    /// Create an id from a raw arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transaction#{}", self.0)
    }
}

/// Stable index of a split in the ledger's split arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct SplitId(usize);

impl SplitId {
    /// Create an id from a raw arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SplitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "split#{}", self.0)
    }
}

/// A deposit or withdrawal from one account, as one leg of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    /// This split's own id.
    pub id: SplitId,
    /// The transaction this split belongs to.
    pub transaction: TransactionId,
    /// The account the funds move into or out of.
    pub account: AccountId,
    /// Explicit effective time, when it differs from the transaction's
    /// (set through a `date:` tag). `None` inherits the transaction time.
    pub time: Option<NaiveDateTime>,
    /// The amount moved. `None` until the completion engine infers it.
    pub value: Option<Value>,
    /// The account's running balance after this split. Derived.
    pub balance: Balance,
    /// Free-text comments attached to this split.
    pub comments: Vec<String>,
}

impl Split {
    /// Create a split with nothing derived yet.
    #[must_use]
    pub fn new(id: SplitId, transaction: TransactionId, account: AccountId) -> Self {
        Self {
            id,
            transaction,
            account,
            time: None,
            value: None,
            balance: Balance::new(),
            comments: Vec::new(),
        }
    }

    /// Create a split with a known value.
    #[must_use]
    pub fn with_value(
        id: SplitId,
        transaction: TransactionId,
        account: AccountId,
        value: Value,
    ) -> Self {
        let mut split = Self::new(id, transaction, account);
        split.value = Some(value);
        split
    }
}

/// An entry in the journal: a timestamp, a description and two or more
/// money movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// This transaction's own id.
    pub id: TransactionId,
    /// Date and time. Date-only journal entries land on 12:00.
    pub time: NaiveDateTime,
    /// Short description.
    pub description: String,
    /// Splits in source order; completion may append transfer legs.
    pub splits: Vec<SplitId>,
    /// Free-text comments attached to this transaction.
    pub comments: Vec<String>,
}

impl Transaction {
    /// Create an empty transaction.
    #[must_use]
    pub fn new(id: TransactionId, time: NaiveDateTime, description: impl Into<String>) -> Self {
        Self {
            id,
            time,
            description: description.into(),
            splits: Vec::new(),
            comments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_split_inherits_time() {
        let s = Split::new(SplitId::new(0), TransactionId::new(0), AccountId::new(0));
        assert!(s.time.is_none());
        assert!(s.value.is_none());
    }

    #[test]
    fn test_transaction_new() {
        let t = Transaction::new(TransactionId::new(2), noon(2024, 1, 15), "lunch");
        assert_eq!(t.description, "lunch");
        assert!(t.splits.is_empty());
    }
}
