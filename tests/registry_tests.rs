// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Registry tests: registration rules and capability search, using a
//! format defined outside the crate.

use std::any::Any;
use std::sync::Arc;
use std::thread;

use voxio::io::formats::MemoryFormat;
use voxio::io::traits::same_format;
use voxio::io::{DriverCommon, ReaderDriver, WriterDriver};
use voxio::{
    default_registry, DataType, DataUnit, DatasetError, Format, FormatExt, FormatManager, Index,
    IndexSpace, Metadata, RegistryConfig, Request, SessionOptions,
};

/// Accepts requests whose location ends with `suffix`.
struct SuffixFormat {
    name: &'static str,
    suffix: &'static str,
    writes: bool,
}

impl SuffixFormat {
    fn shared(name: &'static str, suffix: &'static str, writes: bool) -> Arc<dyn Format> {
        Arc::new(Self {
            name,
            suffix,
            writes,
        })
    }
}

struct ConstReader {
    space: IndexSpace,
}

impl DriverCommon for ConstReader {
    fn set_index(&mut self, index: &Index) -> voxio::Result<()> {
        self.space.validate(index)
    }

    fn close(&mut self) -> voxio::Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ReaderDriver for ConstReader {
    fn index_space(&self) -> &IndexSpace {
        &self.space
    }

    fn get_data(&mut self, index: &Index) -> voxio::Result<DataUnit> {
        let offset = self.space.offset(index)?;
        DataUnit::from_u8(vec![1], &[offset as u8])
    }

    fn get_metadata(&mut self, _index: Option<&Index>) -> voxio::Result<Metadata> {
        Ok(Metadata::new())
    }
}

impl Format for SuffixFormat {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Test format matching a location suffix"
    }

    fn can_read(&self, request: &Request) -> bool {
        request.location().ends_with(self.suffix)
    }

    fn can_write(&self, request: &Request) -> bool {
        self.writes && request.location().ends_with(self.suffix)
    }

    fn open_reader(
        &self,
        _request: &Request,
        _options: &SessionOptions,
    ) -> voxio::Result<Box<dyn ReaderDriver>> {
        Ok(Box::new(ConstReader {
            space: IndexSpace::from_sizes(&[("t", 4)])?,
        }))
    }

    fn open_writer(
        &self,
        request: &Request,
        _options: &SessionOptions,
    ) -> voxio::Result<Box<dyn WriterDriver>> {
        Err(DatasetError::open(self.name, request.location(), "read-only"))
    }
}

// ============================================================================
// Registration
// ============================================================================

#[test]
fn test_register_and_search() {
    let mut registry = FormatManager::new();
    assert!(registry.is_empty());
    registry
        .add_format(SuffixFormat::shared("tif", ".tif", false), false)
        .unwrap();
    registry
        .add_format(SuffixFormat::shared("any", "", true), false)
        .unwrap();

    let request = Request::new("/data/plate.tif");
    assert_eq!(registry.search_read_format(&request).unwrap().name(), "tif");
    assert_eq!(registry.search_write_format(&request).unwrap().name(), "any");
    assert_eq!(registry.names(), vec!["tif", "any"]);
}

#[test]
fn test_duplicate_instance_rejected() {
    let mut registry = FormatManager::new();
    let format = SuffixFormat::shared("tif", ".tif", false);
    registry.add_format(Arc::clone(&format), false).unwrap();

    for overwrite in [false, true] {
        let err = registry
            .add_format(Arc::clone(&format), overwrite)
            .unwrap_err();
        assert!(matches!(err, DatasetError::Duplicate { .. }));
    }
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_name_collision() {
    let mut registry = FormatManager::new();
    let first = SuffixFormat::shared("tif", ".tif", false);
    let second = SuffixFormat::shared("tif", ".tiff", false);
    registry.add_format(Arc::clone(&first), false).unwrap();
    registry
        .add_format(SuffixFormat::shared("other", ".x", false), false)
        .unwrap();

    let err = registry.add_format(Arc::clone(&second), false).unwrap_err();
    assert!(matches!(err, DatasetError::Duplicate { .. }));
    assert!(same_format(registry.get("tif").unwrap(), &first));

    registry.add_format(Arc::clone(&second), true).unwrap();
    assert_eq!(registry.names(), vec!["tif", "other"]);
    assert!(same_format(registry.get("tif").unwrap(), &second));
    assert!(registry
        .search_read_format(&Request::new("a.tif"))
        .is_none());
}

#[test]
fn test_listing() {
    let mut registry = FormatManager::new();
    assert_eq!(registry.to_string(), "*empty*");
    registry
        .add_format(SuffixFormat::shared("tif", ".tif", false), false)
        .unwrap();
    registry.add_format(Arc::new(MemoryFormat::new()), false).unwrap();
    let listing = registry.to_string();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "tif - Test format matching a location suffix");
    assert!(lines[1].starts_with("memory - "));
}

// ============================================================================
// Dispatch
// ============================================================================

#[test]
fn test_no_format() {
    let registry = FormatManager::with_builtin_formats();
    let request = Arc::new(Request::new("/nowhere/plate.tif"));
    assert!(registry.search_read_format(&request).is_none());
    assert!(registry.search_write_format(&request).is_none());
    assert!(matches!(
        registry.open_reader(Arc::clone(&request), &SessionOptions::new()),
        Err(DatasetError::NoFormat { operation: "read", .. })
    ));
    assert!(matches!(
        registry.open_writer(request, &SessionOptions::new()),
        Err(DatasetError::NoFormat { operation: "write", .. })
    ));
}

#[test]
fn test_open_through_custom_format() {
    let mut registry = FormatManager::new();
    registry
        .add_format(SuffixFormat::shared("tif", ".tif", false), false)
        .unwrap();
    let request = Arc::new(Request::new("plate.tif"));

    let mut reader = registry
        .open_reader(Arc::clone(&request), &SessionOptions::new())
        .unwrap();
    assert!(Arc::ptr_eq(reader.request(), &request));
    assert_eq!(reader.len(), 4);
    assert!(reader.downcast_ref::<ConstReader>().is_some());
    let values: Vec<u8> = reader
        .iter()
        .unwrap()
        .map(|item| item.unwrap().1.as_bytes()[0])
        .collect();
    assert_eq!(values, vec![0, 1, 2, 3]);

    // Formats without a layout entry cannot describe their layout.
    assert!(matches!(
        reader.layout(),
        Err(DatasetError::InvalidArgument { .. })
    ));

    let format = registry.get("tif").unwrap();
    assert!(matches!(
        format.get_writer(request, &SessionOptions::new()),
        Err(DatasetError::Open { .. })
    ));
}

#[test]
fn test_concurrent_search_on_shared_registry() {
    let registry = Arc::new(FormatManager::with_builtin_formats());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let request = Request::new(format!("/tmp/none_{i}.zarr"));
                registry.search_write_format(&request).map(|f| f.name().to_string())
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().as_deref(), Some("chunked"));
    }
}

// ============================================================================
// Configuration and the default registry
// ============================================================================

#[test]
fn test_default_registry_is_shared() {
    let a = default_registry();
    let b = default_registry();
    assert!(std::ptr::eq(a, b));
    assert_eq!(a.names(), vec!["memory", "chunked", "stack"]);
}

#[test]
fn test_registry_from_config() {
    let config = RegistryConfig::from_toml_str(
        r#"
formats = ["stack"]
disabled = ["memory"]

[session]
create_parents = true
"#,
    )
    .unwrap();
    let registry = FormatManager::from_config(&config).unwrap();
    assert_eq!(registry.names(), vec!["stack", "chunked"]);
    assert!(config.session.create_parents);

    let bad = RegistryConfig {
        formats: vec!["tiff".to_string()],
        ..Default::default()
    };
    assert!(FormatManager::from_config(&bad).is_err());
}

#[test]
fn test_config_layout_applies_to_writers() {
    let config = RegistryConfig::from_toml_str(
        r#"
[session.layout]
dtype = "uint8"
unit_shape = [2]
index_space = [{ name = "z", size = 3 }]
"#,
    )
    .unwrap();
    let layout = config.session.layout.clone().unwrap();
    assert_eq!(layout.dtype, DataType::UInt8);

    let registry = FormatManager::from_config(&config).unwrap();
    let mut writer = registry
        .open_writer(Arc::new(Request::new("mem://configured")), &config.session)
        .unwrap();
    writer
        .set_data(DataUnit::from_u8(vec![2], &[7, 8]).unwrap(), &Index::new().with("z", 2))
        .unwrap();
    writer.close().unwrap();

    let reader = registry
        .open_reader(Arc::new(Request::new("mem://configured")), &SessionOptions::new())
        .unwrap();
    assert_eq!(reader.len(), 3);
}
