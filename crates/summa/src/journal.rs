//! The plain-text journal back-end, registered as the `ledger` scheme.

use std::io;
use std::path::PathBuf;

use summa_core::Ledger;
use summa_parser::{parse_journal, Diagnostics};

use crate::display;
use crate::driver::{Connection, Driver};
use crate::error::Error;

/// Driver reading ledger-style journal files.
pub struct JournalDriver;

impl Driver for JournalDriver {
    fn open(
        &self,
        target: &str,
        ledger: &mut Ledger,
        diagnostics: &mut Diagnostics,
    ) -> Result<Box<dyn Connection>, Error> {
        let path = PathBuf::from(target);
        tracing::debug!(path = %path.display(), "opening journal");
        parse_journal(ledger, diagnostics, &path)?;
        Ok(Box::new(JournalConnection { path }))
    }
}

struct JournalConnection {
    path: PathBuf,
}

impl Connection for JournalConnection {
    fn refresh(
        &mut self,
        ledger: &mut Ledger,
        diagnostics: &mut Diagnostics,
    ) -> Result<(), Error> {
        *ledger = Ledger::new();
        parse_journal(ledger, diagnostics, &self.path)?;
        Ok(())
    }

    fn display(&self, ledger: &Ledger, out: &mut dyn io::Write) -> io::Result<()> {
        display::emit(ledger, out)
    }
}
