//! Fatal parse errors.
//!
//! Per-line rejections are routed through the [`crate::Diagnostics`] sink
//! instead; only structural failures surface as [`ParseError`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A fatal error while reading a journal.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A journal file (or an included one) could not be opened or read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A structural syntax failure, or a rejection upgraded by strict mode.
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

    /// An `account` directive naming an already-defined account, or a
    /// `commodity` re-declaration with incompatible formatting.
    #[error("{file}:{line}: {what}")]
    Duplicate {
        /// Originating file.
        file: String,
        /// 1-based line number.
        line: u32,
        /// What was declared twice.
        what: String,
    },
}
