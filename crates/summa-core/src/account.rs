//! Accounts and the account tree.
//!
//! Accounts form a tree through their colon-joined names: mentioning
//! `Assets:Bank:Checking` creates `Assets`, `Assets:Bank` and the leaf, in
//! that order. The tree links (`children`, `level`) and the per-account
//! split timeline are derived data, rebuilt by the completion engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::balance::Balance;
use crate::transaction::SplitId;

/// Stable index of an account in the ledger's account arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct AccountId(usize);

impl AccountId {
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

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account#{}", self.0)
    }
}

/// One origin or destination of funds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// This account's own id.
    pub id: AccountId,
    /// Parent account, if this is not a root.
    pub parent: Option<AccountId>,
    /// Child accounts. Derived; rebuilt by completion.
    pub children: Vec<AccountId>,
    /// Depth in the tree: roots are level 0. Derived.
    pub level: u32,
    /// Short name, the last colon-separated component ("Checking").
    pub name: String,
    /// Optional account code, set through a `code:` tag.
    pub code: Option<String>,
    /// Splits touching this account, sorted by effective time. Derived.
    pub splits: Vec<SplitId>,
    /// Balance carried into the active period; empty unless a period
    /// front-end slices the ledger.
    pub start_balance: Balance,
    /// Free-text comments attached to the declaration.
    pub comments: Vec<String>,
}

impl Account {
    /// Create an account with no derived data yet.
    #[must_use]
    pub fn new(id: AccountId, name: impl Into<String>, parent: Option<AccountId>) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            level: 0,
            name: name.into(),
            code: None,
            splits: Vec::new(),
            start_balance: Balance::new(),
            comments: Vec::new(),
        }
    }

    /// Whether this account has no parent.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}
