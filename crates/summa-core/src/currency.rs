//! Currencies and their display conventions.
//!
//! A [`Currency`] is created on first mention and *refined* while the
//! journal is parsed: the value lexer learns the thousand and decimal
//! separators, the precision, and whether the symbol is printed before or
//! after the digits. After completion the descriptors are treated as frozen.
//!
//! Currencies are interned in the ledger's arena so that every value naming
//! the same symbol shares one [`CurrencyId`]; comparing ids is identity
//! comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable index of a currency in the ledger's currency arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct CurrencyId(usize);

impl CurrencyId {
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

impl fmt::Display for CurrencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "currency#{}", self.0)
    }
}

/// A currency or commodity, with everything needed to print its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Symbol as written in the journal ("EUR", "$", ...). Empty for the
    /// ledger's default currency when it was never named.
    pub name: String,
    /// Print the symbol before the digits ("$1.00") instead of after.
    pub prefix: bool,
    /// Print a space between digits and symbol ("1.00 EUR" vs "1.00EUR").
    pub space: bool,
    /// Separator inserted every three integer digits; empty for none.
    pub thousand: String,
    /// Decimal separator; empty until learned.
    pub decimal: String,
    /// Number of fractional digits to show (0..=8).
    pub precision: u32,
    /// ISIN, when declared through an `isin:` tag.
    pub isin: Option<String>,
    /// Free-text comments attached to the commodity declaration.
    pub comments: Vec<String>,
}

impl Currency {
    /// Create a currency with no learned conventions yet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: false,
            space: false,
            thousand: String::new(),
            decimal: String::new(),
            precision: 0,
            isin: None,
            comments: Vec::new(),
        }
    }

    /// The decimal separator to use when printing, falling back to `.`.
    #[must_use]
    pub fn decimal_or_default(&self) -> &str {
        if self.decimal.is_empty() {
            "."
        } else {
            &self.decimal
        }
    }
}
