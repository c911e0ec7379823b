//! Market prices.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::amount::Value;
use crate::currency::CurrencyId;

/// Comment marking a price synthesized by the completion engine.
pub const AUTOMATIC: &str = "automatic";

/// A market price: one unit of `currency` costs `value` at `time`.
///
/// Prices come from explicit `P` lines or are synthesized by the completion
/// engine from multi-currency transactions and split prices; synthesized
/// ones carry the [`AUTOMATIC`] comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// When this rate was observed.
    pub time: NaiveDateTime,
    /// The base currency being priced.
    pub currency: CurrencyId,
    /// Cost of one unit of the base currency, in the quote currency.
    pub value: Value,
    /// Free-text comments; `automatic` marks synthesized prices.
    pub comments: Vec<String>,
}

impl Price {
    /// Create an explicit price.
    #[must_use]
    pub fn new(time: NaiveDateTime, currency: CurrencyId, value: Value) -> Self {
        Self {
            time,
            currency,
            value,
            comments: Vec::new(),
        }
    }

    /// Create a synthesized price carrying the [`AUTOMATIC`] comment.
    #[must_use]
    pub fn automatic(time: NaiveDateTime, currency: CurrencyId, value: Value) -> Self {
        Self {
            time,
            currency,
            value,
            comments: vec![AUTOMATIC.to_string()],
        }
    }

    /// Whether this price was synthesized rather than declared.
    #[must_use]
    pub fn is_automatic(&self) -> bool {
        self.comments.iter().any(|c| c == AUTOMATIC)
    }
}
