//! The back-end driver facade.
//!
//! A [`Driver`] knows how to populate a [`Ledger`] from some storage; a
//! [`Connection`] is one opened instance of it. Drivers register under a
//! URL scheme in a [`Registry`]; the process-wide registry is initialized
//! once with the built-in text-journal driver and read-only afterwards.
//! Registering the same scheme twice is a configuration error and panics.

use std::io;
use std::sync::Arc;

use summa_core::Ledger;
use summa_parser::Diagnostics;

use crate::error::Error;

/// Scheme assumed when a URL carries none of its own.
const DEFAULT_SCHEME: &str = "ledger";

/// An accounting back-end.
pub trait Driver: Send + Sync {
    /// Populate `ledger` from `target` (the part of the URL after the
    /// scheme) and return a live connection. Completion runs afterwards,
    /// unconditionally, in [`Registry::open`].
    fn open(
        &self,
        target: &str,
        ledger: &mut Ledger,
        diagnostics: &mut Diagnostics,
    ) -> Result<Box<dyn Connection>, Error>;
}

/// One opened back-end instance.
pub trait Connection: Send {
    /// Flush and release whatever the back-end holds.
    fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }

    /// Re-read the source into `ledger`. The caller re-runs completion.
    fn refresh(&mut self, ledger: &mut Ledger, diagnostics: &mut Diagnostics)
        -> Result<(), Error>;

    /// Write the canonical textual form of the ledger, when the back-end
    /// has one. The default writes nothing.
    fn display(&self, ledger: &Ledger, out: &mut dyn io::Write) -> io::Result<()> {
        let _ = (ledger, out);
        Ok(())
    }
}

/// A scheme-to-driver table.
#[derive(Default)]
pub struct Registry {
    drivers: Vec<(String, Arc<dyn Driver>)>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a driver under a scheme name.
    ///
    /// # Panics
    ///
    /// Panics when the scheme is already taken: double registration is a
    /// configuration bug, not a runtime condition.
    pub fn register(&mut self, scheme: &str, driver: Arc<dyn Driver>) {
        assert!(
            !self.drivers.iter().any(|(name, _)| name == scheme),
            "driver registered twice for scheme \"{scheme}\""
        );
        self.drivers.push((scheme.to_string(), driver));
    }

    /// The driver for a scheme, if any.
    #[must_use]
    pub fn get(&self, scheme: &str) -> Option<&Arc<dyn Driver>> {
        self.drivers
            .iter()
            .find(|(name, _)| name == scheme)
            .map(|(_, driver)| driver)
    }

    /// The driver used when a URL has no scheme: the `ledger` driver when
    /// one is registered, or failing that the first registered at all.
    #[must_use]
    pub fn default_driver(&self) -> Option<&Arc<dyn Driver>> {
        self.get(DEFAULT_SCHEME)
            .or_else(|| self.drivers.first().map(|(_, driver)| driver))
    }

    /// Split a URL into scheme and target; no `://` means no scheme.
    pub(crate) fn resolve(&self, url: &str) -> Result<(&Arc<dyn Driver>, String), Error> {
        match url.split_once("://") {
            Some((scheme, target)) => {
                let driver = self.get(scheme).ok_or_else(|| Error::UnknownScheme {
                    scheme: scheme.to_string(),
                })?;
                Ok((driver, target.to_string()))
            }
            None => {
                let driver = self.default_driver().ok_or_else(|| Error::UnknownScheme {
                    scheme: String::new(),
                })?;
                Ok((driver, url.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullDriver;
    struct NullConnection;

    impl Driver for NullDriver {
        fn open(
            &self,
            _target: &str,
            _ledger: &mut Ledger,
            _diagnostics: &mut Diagnostics,
        ) -> Result<Box<dyn Connection>, Error> {
            Ok(Box::new(NullConnection))
        }
    }

    impl Connection for NullConnection {
        fn refresh(
            &mut self,
            _ledger: &mut Ledger,
            _diagnostics: &mut Diagnostics,
        ) -> Result<(), Error> {
            Ok(())
        }
    }

    #[test]
    fn test_lookup_by_scheme() {
        let mut registry = Registry::new();
        registry.register("ledger", Arc::new(NullDriver));
        assert!(registry.get("ledger").is_some());
        assert!(registry.get("sql").is_none());
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_duplicate_registration_panics() {
        let mut registry = Registry::new();
        registry.register("ledger", Arc::new(NullDriver));
        registry.register("ledger", Arc::new(NullDriver));
    }

    #[test]
    fn test_default_prefers_the_ledger_scheme() {
        let mut registry = Registry::new();
        registry.register("custom", Arc::new(NullDriver));
        registry.register("ledger", Arc::new(NullDriver));
        let default = registry.default_driver().unwrap();
        let ledger = registry.get("ledger").unwrap();
        assert!(Arc::ptr_eq(default, ledger));
    }

    #[test]
    fn test_default_falls_back_to_first_registered() {
        let mut registry = Registry::new();
        registry.register("custom", Arc::new(NullDriver));
        let default = registry.default_driver().unwrap();
        let custom = registry.get("custom").unwrap();
        assert!(Arc::ptr_eq(default, custom));
    }

    #[test]
    fn test_resolve_unknown_scheme() {
        let registry = Registry::new();
        assert!(matches!(
            registry.resolve("nope:///x"),
            Err(Error::UnknownScheme { .. })
        ));
    }
}
