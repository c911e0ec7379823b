//! Core types for the summa accounting engine.
//!
//! This crate provides the in-memory ledger model shared by every back-end:
//!
//! - [`Currency`] - A commodity with learned display conventions
//! - [`Value`] - A fixed-point amount paired with a currency
//! - [`Balance`] - Per-currency totals with zero entries pruned
//! - [`Account`], [`Transaction`], [`Split`], [`Price`] - The entity graph
//! - [`Ledger`] - Arena owner of all entities, plus queries and conversion
//!
//! All amounts are 64-bit integers scaled by [`U`] (`10^8`). Arithmetic that
//! can exceed 64 bits (price application, conversion, interpolation) widens
//! to `i128`; no floating point is used anywhere in the authoritative path.
//!
//! # Example
//!
//! ```
//! use summa_core::{Ledger, Value, U};
//!
//! let mut ledger = Ledger::new();
//! let (eur, _) = ledger.ensure_currency("EUR");
//! let v = Value::new(12 * U + U / 2, eur);
//! assert_eq!(v.amount, 1_250_000_000);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account;
pub mod amount;
pub mod balance;
pub mod currency;
pub mod format;
pub mod ledger;
pub mod price;
pub mod transaction;

pub use account::{Account, AccountId};
pub use amount::{mul_scaled, ratio_scaled, Value, MAX_PRECISION, U};
pub use balance::Balance;
pub use currency::{Currency, CurrencyId};
pub use ledger::{ConversionError, Ledger};
pub use price::{Price, AUTOMATIC};
pub use transaction::{Split, SplitId, Transaction, TransactionId};

// Re-export commonly used external types
pub use chrono::{NaiveDate, NaiveDateTime};
