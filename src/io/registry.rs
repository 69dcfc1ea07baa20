// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Format registry with first-match capability search.
//!
//! Formats are kept in registration order, which is the tie-break when more
//! than one format accepts a request.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use voxio::io::{FormatManager, Request};
//! use voxio::io::formats::MemoryFormat;
//!
//! let mut registry = FormatManager::new();
//! registry.add_format(Arc::new(MemoryFormat::new()), false)?;
//! if let Some(format) = registry.search_read_format(&Request::new("mem://scratch")) {
//!     println!("{}", format.name());
//! }
//! # Ok::<(), voxio::DatasetError>(())
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::core::{DatasetError, Result};

use super::formats::builtin_formats;
use super::options::SessionOptions;
use super::request::Request;
use super::session::{Reader, Writer};
use super::traits::{same_format, Format};

/// Ordered collection of registered formats.
///
/// Searching borrows the registry shared, registration borrows it exclusively,
/// so concurrent searches never race with a registration.
#[derive(Default, Clone)]
pub struct FormatManager {
    formats: Vec<Arc<dyn Format>>,
}

impl FormatManager {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in formats.
    pub fn with_builtin_formats() -> Self {
        let mut registry = Self::new();
        for format in builtin_formats() {
            // built-in names are distinct
            let _ = registry.add_format(format, false);
        }
        registry
    }

    /// Create a registry of built-in formats ordered and filtered by `config`.
    ///
    /// Built-ins named in `config.formats` come first, in that order, followed by
    /// the remaining built-ins. Formats listed in `config.disabled` are skipped.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let mut available = builtin_formats();
        let mut registry = Self::new();
        for name in &config.formats {
            let pos = available
                .iter()
                .position(|f| f.name() == name)
                .ok_or_else(|| {
                    DatasetError::invalid_argument("formats", format!("unknown format '{name}'"))
                })?;
            let format = available.remove(pos);
            if !config.disabled.contains(name) {
                registry.add_format(format, false)?;
            }
        }
        for format in available {
            if !config.disabled.iter().any(|d| d == format.name()) {
                registry.add_format(format, false)?;
            }
        }
        Ok(registry)
    }

    /// Register a format.
    ///
    /// Fails with [`DatasetError::Duplicate`] if this exact instance is already
    /// registered, or if another format holds the same name and `overwrite` is
    /// false. With `overwrite`, the existing entry is replaced in place and keeps
    /// its search position.
    pub fn add_format(&mut self, format: Arc<dyn Format>, overwrite: bool) -> Result<()> {
        if self.formats.iter().any(|f| same_format(f, &format)) {
            return Err(DatasetError::duplicate(
                format.name(),
                "instance is already registered",
            ));
        }
        match self.formats.iter().position(|f| f.name() == format.name()) {
            Some(pos) if overwrite => {
                warn!(name = format.name(), position = pos, "replacing registered format");
                self.formats[pos] = format;
            }
            Some(_) => {
                return Err(DatasetError::duplicate(
                    format.name(),
                    "is already registered",
                ));
            }
            None => {
                debug!(name = format.name(), "registered format");
                self.formats.push(format);
            }
        }
        Ok(())
    }

    /// Unregister a format by name.
    ///
    /// Returns the removed format, or `None` if no format has that name.
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Format>> {
        let pos = self.formats.iter().position(|f| f.name() == name)?;
        debug!(name, "unregistered format");
        Some(self.formats.remove(pos))
    }

    /// First format, in registration order, that can read `request`.
    ///
    /// `None` is a normal outcome, not an error.
    pub fn search_read_format(&self, request: &Request) -> Option<Arc<dyn Format>> {
        self.formats.iter().find(|f| f.can_read(request)).cloned()
    }

    /// First format, in registration order, that can write `request`.
    pub fn search_write_format(&self, request: &Request) -> Option<Arc<dyn Format>> {
        self.formats.iter().find(|f| f.can_write(request)).cloned()
    }

    /// Search a readable format and open a reader on it.
    pub fn open_reader(&self, request: Arc<Request>, options: &SessionOptions) -> Result<Reader> {
        let format = self
            .search_read_format(&request)
            .ok_or_else(|| DatasetError::NoFormat {
                operation: "read",
                location: request.location().to_string(),
            })?;
        Reader::open(format, request, options)
    }

    /// Search a writable format and open a writer on it.
    pub fn open_writer(&self, request: Arc<Request>, options: &SessionOptions) -> Result<Writer> {
        let format = self
            .search_write_format(&request)
            .ok_or_else(|| DatasetError::NoFormat {
                operation: "write",
                location: request.location().to_string(),
            })?;
        Writer::open(format, request, options)
    }

    /// Look up a format by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Format>> {
        self.formats.iter().find(|f| f.name() == name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.formats.iter().map(|f| f.name().to_string()).collect()
    }

    /// Iterate over registered formats in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Format>> {
        self.formats.iter()
    }

    /// Number of registered formats.
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Check if no format is registered.
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

/// One `"<name> - <description>"` line per format, in registration order.
impl fmt::Display for FormatManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.formats.is_empty() {
            return f.write_str("*empty*");
        }
        for (i, format) in self.formats.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} - {}", format.name(), format.description())?;
        }
        Ok(())
    }
}

impl fmt::Debug for FormatManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatManager")
            .field("formats", &self.names())
            .finish()
    }
}

static DEFAULT_REGISTRY: OnceLock<FormatManager> = OnceLock::new();

/// Process-wide registry of built-in formats.
///
/// Read-only once initialized. Build a [`FormatManager`] directly to register
/// custom formats.
pub fn default_registry() -> &'static FormatManager {
    DEFAULT_REGISTRY.get_or_init(FormatManager::with_builtin_formats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::traits::{ReaderDriver, WriterDriver};

    struct Probe {
        name: &'static str,
        reads: bool,
        writes: bool,
    }

    impl Probe {
        fn shared(name: &'static str, reads: bool, writes: bool) -> Arc<dyn Format> {
            Arc::new(Probe {
                name,
                reads,
                writes,
            })
        }
    }

    impl Format for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "stub"
        }

        fn can_read(&self, _request: &Request) -> bool {
            self.reads
        }

        fn can_write(&self, _request: &Request) -> bool {
            self.writes
        }

        fn open_reader(
            &self,
            request: &Request,
            _options: &SessionOptions,
        ) -> Result<Box<dyn ReaderDriver>> {
            Err(DatasetError::open(self.name, request.location(), "stub"))
        }

        fn open_writer(
            &self,
            request: &Request,
            _options: &SessionOptions,
        ) -> Result<Box<dyn WriterDriver>> {
            Err(DatasetError::open(self.name, request.location(), "stub"))
        }
    }

    #[test]
    fn test_first_match_wins() {
        let mut registry = FormatManager::new();
        registry.add_format(Probe::shared("a", false, false), false).unwrap();
        registry.add_format(Probe::shared("b", true, false), false).unwrap();
        registry.add_format(Probe::shared("c", true, true), false).unwrap();

        let request = Request::new("x");
        assert_eq!(registry.search_read_format(&request).unwrap().name(), "b");
        assert_eq!(registry.search_write_format(&request).unwrap().name(), "c");
    }

    #[test]
    fn test_no_match_is_none() {
        let mut registry = FormatManager::new();
        registry.add_format(Probe::shared("a", false, false), false).unwrap();
        assert!(registry.search_read_format(&Request::new("x")).is_none());
        assert!(registry.search_write_format(&Request::new("x")).is_none());
        assert!(matches!(
            registry.open_reader(Arc::new(Request::new("x")), &SessionOptions::default()),
            Err(DatasetError::NoFormat { operation: "read", .. })
        ));
    }

    #[test]
    fn test_same_instance_rejected() {
        let mut registry = FormatManager::new();
        let format = Probe::shared("a", true, true);
        registry.add_format(Arc::clone(&format), false).unwrap();
        let err = registry.add_format(Arc::clone(&format), true).unwrap_err();
        assert!(matches!(err, DatasetError::Duplicate { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_name_collision_leaves_registry_untouched() {
        let mut registry = FormatManager::new();
        let first = Probe::shared("a", false, false);
        registry.add_format(Arc::clone(&first), false).unwrap();
        registry.add_format(Probe::shared("b", false, false), false).unwrap();

        let err = registry
            .add_format(Probe::shared("a", true, true), false)
            .unwrap_err();
        assert!(matches!(err, DatasetError::Duplicate { .. }));
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert!(same_format(registry.get("a").unwrap(), &first));
    }

    #[test]
    fn test_overwrite_replaces_in_place() {
        let mut registry = FormatManager::new();
        registry.add_format(Probe::shared("a", false, false), false).unwrap();
        registry.add_format(Probe::shared("b", false, false), false).unwrap();
        registry.add_format(Probe::shared("c", true, false), false).unwrap();

        let replacement = Probe::shared("a", true, false);
        registry.add_format(Arc::clone(&replacement), true).unwrap();

        assert_eq!(registry.names(), vec!["a", "b", "c"]);
        let found = registry.search_read_format(&Request::new("x")).unwrap();
        assert!(same_format(&found, &replacement));
    }

    #[test]
    fn test_remove() {
        let mut registry = FormatManager::new();
        registry.add_format(Probe::shared("a", false, false), false).unwrap();
        assert!(registry.remove("a").is_some());
        assert!(registry.remove("a").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_listing() {
        let mut registry = FormatManager::new();
        assert_eq!(registry.to_string(), "*empty*");
        registry.add_format(Probe::shared("a", false, false), false).unwrap();
        registry.add_format(Probe::shared("b", false, false), false).unwrap();
        assert_eq!(registry.to_string(), "a - stub\nb - stub");
    }

    #[test]
    fn test_builtin_names_unique() {
        let registry = FormatManager::with_builtin_formats();
        let names = registry.names();
        assert_eq!(names, vec!["memory", "chunked", "stack"]);
        assert_eq!(default_registry().names(), names);
    }

    #[test]
    fn test_from_config_order_and_disabled() {
        let config = RegistryConfig {
            formats: vec!["stack".to_string()],
            disabled: vec!["memory".to_string()],
            ..Default::default()
        };
        let registry = FormatManager::from_config(&config).unwrap();
        assert_eq!(registry.names(), vec!["stack", "chunked"]);
    }

    #[test]
    fn test_from_config_unknown_format() {
        let config = RegistryConfig {
            formats: vec!["tiff".to_string()],
            ..Default::default()
        };
        assert!(FormatManager::from_config(&config).is_err());
    }

    #[test]
    fn test_concurrent_search() {
        use std::thread;

        let mut registry = FormatManager::new();
        registry.add_format(Probe::shared("a", false, false), false).unwrap();
        registry.add_format(Probe::shared("b", true, false), false).unwrap();
        let registry = Arc::new(registry);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    registry
                        .search_read_format(&Request::new("x"))
                        .map(|f| f.name().to_string())
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().as_deref(), Some("b"));
        }
    }
}
