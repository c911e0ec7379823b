//! summa - a double-entry accounting engine.
//!
//! A ledger is read from a back-end (the built-in one parses plain-text
//! journal files), completed - transactions balanced, missing amounts
//! inferred, assertions verified, running balances materialized - and then
//! queried read-only: balances at a point in time, transactions in an
//! interval, market-value conversion between currencies.
//!
//! # Example
//!
//! ```no_run
//! let book = summa::open("ledger:///home/me/accounts.journal")?;
//! let cash = book.ledger.account_by_name("Assets:Cash").unwrap();
//! let balance = book.ledger.balance(cash, None);
//! println!("{}", book.ledger.format_balance(&balance));
//! # Ok::<(), summa::Error>(())
//! ```
//!
//! URLs choose the back-end by scheme (`ledger://path`); a URL without a
//! scheme falls back to the `ledger` driver. Only that text back-end ships
//! here; others plug in through the [`Driver`] trait.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod display;
pub mod driver;
pub mod error;
pub mod journal;

use std::io;
use std::sync::{Arc, LazyLock};

pub use driver::{Connection, Driver, Registry};
pub use error::Error;
pub use journal::JournalDriver;

pub use summa_core::{
    Account, AccountId, Balance, ConversionError, Currency, CurrencyId, Ledger, NaiveDate,
    NaiveDateTime, Price, Split, SplitId, Transaction, TransactionId, Value, U,
};
pub use summa_fill::{fill, FillError, TRANSFER_ACCOUNT};
pub use summa_parser::{
    lex_value, parse_date, parse_journal, Diagnostic, Diagnostics, ParseError, Severity,
};

/// The process-wide driver registry, populated once with the built-in
/// drivers and read-only afterwards.
static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let mut registry = Registry::new();
    registry.register("ledger", Arc::new(JournalDriver));
    registry
});

/// An opened ledger: the completed data, the diagnostics the parse
/// produced, and the live back-end connection.
pub struct Book {
    /// The completed, read-only ledger.
    pub ledger: Ledger,
    /// Logged-but-continued problems from parsing.
    pub diagnostics: Diagnostics,
    connection: Box<dyn Connection>,
}

impl Book {
    /// Write the canonical textual form of the ledger, when the back-end
    /// has one.
    pub fn display(&self, out: &mut dyn io::Write) -> io::Result<()> {
        self.connection.display(&self.ledger, out)
    }

    /// Re-read the source and re-run completion.
    pub fn refresh(&mut self) -> Result<(), Error> {
        self.connection
            .refresh(&mut self.ledger, &mut self.diagnostics)?;
        fill(&mut self.ledger)?;
        Ok(())
    }

    /// Close the back-end connection.
    pub fn close(mut self) -> Result<(), Error> {
        self.connection.close()
    }
}

impl Registry {
    /// Open a URL against this registry: pick the driver, let it populate
    /// a fresh ledger, then run completion unconditionally.
    pub fn open_with(&self, url: &str, mut diagnostics: Diagnostics) -> Result<Book, Error> {
        let (driver, target) = self.resolve(url)?;
        let mut ledger = Ledger::new();
        let connection = driver.open(&target, &mut ledger, &mut diagnostics)?;
        fill(&mut ledger)?;
        Ok(Book {
            ledger,
            diagnostics,
            connection,
        })
    }
}

/// Open a ledger URL with the built-in drivers, collecting rejected lines
/// as diagnostics.
pub fn open(url: &str) -> Result<Book, Error> {
    REGISTRY.open_with(url, Diagnostics::new())
}

/// Open a ledger URL, treating every rejected line as fatal.
pub fn open_strict(url: &str) -> Result<Book, Error> {
    REGISTRY.open_with(url, Diagnostics::strict())
}
