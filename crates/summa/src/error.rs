//! The unified error taxonomy.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use summa_core::ConversionError;
use summa_fill::FillError;
use summa_parser::ParseError;

/// Anything that can go wrong opening or querying a ledger.
#[derive(Debug, Error)]
pub enum Error {
    /// A journal file (or an included one) could not be opened or read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A lexer or parser rejection that was (or became) fatal.
    #[error("{file}:{line}: syntax error: {message}")]
    Syntax {
        /// Originating file, across includes.
        file: String,
        /// 1-based line number in that file.
        line: u32,
        /// Human-readable reason.
        message: String,
    },

    /// A transaction or price line going backwards in time.
    #[error("{file}:{line}: {what} is not chronologically sorted")]
    Chronology {
        /// Originating file.
        file: String,
        /// 1-based line number.
        line: u32,
        /// Either `transaction` or `price`.
        what: &'static str,
    },

    /// An account or commodity declared twice.
    #[error("{file}:{line}: {what}")]
    Duplicate {
        /// Originating file.
        file: String,
        /// 1-based line number.
        line: u32,
        /// What was declared twice.
        what: String,
    },

    /// A transaction the completion engine cannot balance.
    #[error("transaction \"{transaction}\": {message}")]
    Balance {
        /// Time and description of the offending transaction.
        transaction: String,
        /// What went wrong.
        message: String,
    },

    /// A balance assertion that does not hold.
    #[error("account {account}: balance assertion failed: expected {expected}, found {actual}")]
    Assertion {
        /// Fully-qualified account name.
        account: String,
        /// The asserted amount.
        expected: String,
        /// The actual balance.
        actual: String,
    },

    /// No price path connects two currencies.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The URL names a scheme no driver is registered for.
    #[error("no driver registered for scheme \"{scheme}\"")]
    UnknownScheme {
        /// The scheme from the URL.
        scheme: String,
    },
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::Io { path, source } => Self::Io { path, source },
            ParseError::Syntax {
                file,
                line,
                message,
            } => Self::Syntax {
                file,
                line,
                message,
            },
            ParseError::Chronology { file, line, what } => Self::Chronology { file, line, what },
            ParseError::Duplicate { file, line, what } => Self::Duplicate { file, line, what },
        }
    }
}

impl From<FillError> for Error {
    fn from(e: FillError) -> Self {
        match e {
            FillError::Balance {
                transaction,
                message,
            } => Self::Balance {
                transaction,
                message,
            },
            FillError::Assertion {
                account,
                expected,
                actual,
            } => Self::Assertion {
                account,
                expected,
                actual,
            },
        }
    }
}
