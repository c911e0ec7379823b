//! Diagnostics sink for logged-but-continued parse problems.
//!
//! The parser keeps going after most per-line problems; each one is
//! recorded here and emitted through `tracing`. A strict sink upgrades
//! every rejection to a fatal [`ParseError`] so callers can fail fast.

use crate::error::ParseError;

/// How bad a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// A notice, e.g. a posting touching an account never declared.
    Warning,
    /// A rejected line; fatal when the sink is strict.
    Error,
}

/// One recorded parse problem, with its true source location.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity of the problem.
    pub severity: Severity,
    /// Originating file, across includes.
    pub file: String,
    /// 1-based line number in that file.
    pub line: u32,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.message)
    }
}

/// Collects diagnostics during a parse.
#[derive(Debug, Default)]
pub struct Diagnostics {
    strict: bool,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create a lenient sink: rejections are recorded, parsing continues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a strict sink: every rejection becomes a fatal error.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            entries: Vec::new(),
        }
    }

    /// Whether rejections are fatal.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    /// Record a warning. Warnings never become fatal.
    pub fn warn(&mut self, file: &str, line: u32, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(file, line, "{message}");
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            file: file.to_string(),
            line,
            message,
        });
    }

    /// Record a rejected line.
    ///
    /// Returns the rejection as a fatal [`ParseError`] when the sink is
    /// strict, so the caller can `?` it and stop.
    pub fn reject(
        &mut self,
        file: &str,
        line: u32,
        message: impl Into<String>,
    ) -> Result<(), ParseError> {
        let message = message.into();
        tracing::warn!(file, line, "rejected: {message}");
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            file: file.to_string(),
            line,
            message: message.clone(),
        });
        if self.strict {
            return Err(ParseError::Syntax {
                file: file.to_string(),
                line,
                message,
            });
        }
        Ok(())
    }

    /// All recorded diagnostics, in order.
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Whether any line was rejected.
    #[must_use]
    pub fn has_rejections(&self) -> bool {
        self.entries
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_sink_collects() {
        let mut diags = Diagnostics::new();
        diags.warn("a.journal", 3, "undefined account X");
        assert!(diags.reject("a.journal", 4, "bad amount").is_ok());
        assert_eq!(diags.entries().len(), 2);
        assert!(diags.has_rejections());
    }

    #[test]
    fn test_strict_sink_fails_fast() {
        let mut diags = Diagnostics::strict();
        diags.warn("a.journal", 1, "only a warning");
        assert!(!diags.has_rejections());
        let err = diags.reject("a.journal", 2, "bad amount").unwrap_err();
        assert!(err.to_string().contains("a.journal:2"));
    }
}
