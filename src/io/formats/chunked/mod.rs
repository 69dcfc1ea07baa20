// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Chunked array store.
//!
//! Zarr-like directory layout with one compressed chunk per unit:
//!
//! ```text
//! cells.zarr/
//!   array.json     layout, compression level, key separator
//!   attrs.json     dataset metadata
//!   0.0            chunk for the unit at coordinates (0, 0)
//!   0.1
//!   ...
//! ```
//!
//! With the `dimension_separator = "/"` option, keys nest as directories
//! (`0/1`). Chunks are framed by [`codec`], so a damaged chunk surfaces as an
//! I/O error instead of garbage data.

pub mod codec;

use std::any::Any;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{DataUnit, DatasetError, Index, IndexSpace, Metadata, Result};
use crate::io::detection::{has_marker, is_writable_destination};
use crate::io::options::{DatasetLayout, SessionOptions};
use crate::io::request::Request;
use crate::io::traits::{DriverCommon, Format, ReaderDriver, WriterDriver};

use super::{
    check_attrs, dataset_metadata, destination_path, resolve_layout, unit_metadata, Destination,
};

pub use codec::{decode_chunk, encode_chunk, DEFAULT_COMPRESSION_LEVEL};

const NAME: &str = "chunked";
const EXTENSION: &str = "zarr";
const HEADER: &str = "array.json";
const ATTRS: &str = "attrs.json";

/// Option key selecting the chunk key separator.
pub const SEPARATOR_OPTION: &str = "dimension_separator";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ArrayHeader {
    layout: DatasetLayout,
    compression_level: i32,
    #[serde(default = "default_separator")]
    dimension_separator: String,
}

fn default_separator() -> String {
    ".".to_string()
}

impl ArrayHeader {
    fn load(dir: &Path) -> Result<Self> {
        let text = fs::read_to_string(dir.join(HEADER))
            .map_err(|e| DatasetError::io(format!("{HEADER} in {}", dir.display()), e))?;
        let header: Self = serde_json::from_str(&text)?;
        header.layout.validate()?;
        Ok(header)
    }

    fn store(&self, dir: &Path) -> Result<()> {
        write_json(dir, HEADER, &serde_json::to_value(self)?)
    }

    /// Key of the chunk holding the unit at `index`.
    fn chunk_key(&self, index: &Index) -> Result<String> {
        let coords = self.layout.index_space.coords(index)?;
        if coords.is_empty() {
            return Ok("0".to_string());
        }
        let parts: Vec<String> = coords.iter().map(|c| c.to_string()).collect();
        Ok(parts.join(&self.dimension_separator))
    }
}

fn write_json(dir: &Path, name: &str, value: &serde_json::Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    let tmp = dir.join(format!("{name}.tmp"));
    fs::write(&tmp, text).map_err(|e| DatasetError::io(format!("{}", tmp.display()), e))?;
    fs::rename(&tmp, dir.join(name))
        .map_err(|e| DatasetError::io(format!("{name} in {}", dir.display()), e))
}

fn load_attrs(dir: &Path) -> Result<Metadata> {
    match fs::read_to_string(dir.join(ATTRS)) {
        Ok(text) => Ok(serde_json::from_str(&text)?),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Metadata::new()),
        Err(e) => Err(DatasetError::io(format!("{ATTRS} in {}", dir.display()), e)),
    }
}

fn parse_separator(options: &SessionOptions) -> Result<Option<String>> {
    match options.get_extra(SEPARATOR_OPTION) {
        None => Ok(None),
        Some(sep @ ("." | "/")) => Ok(Some(sep.to_string())),
        Some(other) => Err(DatasetError::invalid_argument(
            SEPARATOR_OPTION,
            format!("expected '.' or '/', got '{other}'"),
        )),
    }
}

/// Chunked array store format.
#[derive(Debug, Default)]
pub struct ChunkedFormat;

impl ChunkedFormat {
    /// Create the format.
    pub fn new() -> Self {
        Self
    }
}

impl Format for ChunkedFormat {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Chunked array store, one zstd chunk per unit (*.zarr)"
    }

    fn can_read(&self, request: &Request) -> bool {
        has_marker(request, HEADER)
    }

    fn can_write(&self, request: &Request) -> bool {
        is_writable_destination(request, EXTENSION, HEADER)
    }

    fn open_reader(
        &self,
        request: &Request,
        _options: &SessionOptions,
    ) -> Result<Box<dyn ReaderDriver>> {
        let dir = request
            .path()
            .ok_or_else(|| DatasetError::open(NAME, request.location(), "not a filesystem path"))?;
        let header = ArrayHeader::load(&dir)
            .map_err(|e| DatasetError::open(NAME, request.location(), e.to_string()))?;
        Ok(Box::new(ChunkedReader {
            dir,
            header,
            attrs: OnceLock::new(),
            cursor: None,
        }))
    }

    fn open_writer(
        &self,
        request: &Request,
        options: &SessionOptions,
    ) -> Result<Box<dyn WriterDriver>> {
        let separator = parse_separator(options)
            .map_err(|e| DatasetError::open(NAME, request.location(), e.to_string()))?;
        let dir = destination_path(NAME, request)?;
        let existing = if !options.overwrite && dir.join(HEADER).is_file() {
            Some(
                ArrayHeader::load(&dir)
                    .map_err(|e| DatasetError::open(NAME, request.location(), e.to_string()))?,
            )
        } else {
            None
        };

        let open_err = |e: DatasetError| DatasetError::open(NAME, request.location(), e.to_string());
        let (header, attrs) = match existing {
            Some(existing) => {
                if separator
                    .as_ref()
                    .is_some_and(|s| *s != existing.dimension_separator)
                {
                    return Err(DatasetError::open(
                        NAME,
                        request.location(),
                        "requested key separator differs from the existing store",
                    ));
                }
                let header = ArrayHeader {
                    layout: resolve_layout(NAME, request, Some(existing.layout), options)?,
                    compression_level: options
                        .compression_level
                        .unwrap_or(existing.compression_level),
                    dimension_separator: existing.dimension_separator,
                };
                (header, load_attrs(&dir).map_err(open_err)?)
            }
            None => {
                let header = ArrayHeader {
                    layout: resolve_layout(NAME, request, None, options)?,
                    compression_level: options
                        .compression_level
                        .unwrap_or(DEFAULT_COMPRESSION_LEVEL),
                    dimension_separator: separator.unwrap_or_else(default_separator),
                };
                (header, Metadata::new())
            }
        };

        let destination = Destination::prepare(NAME, request, dir, options, HEADER)?;
        header.store(destination.dir()).map_err(open_err)?;
        let dir = destination.keep();
        debug!(
            dir = %dir.display(),
            units = header.layout.index_space.len(),
            level = header.compression_level,
            "prepared chunked store"
        );
        Ok(Box::new(ChunkedWriter {
            dir,
            header,
            attrs,
            cursor: None,
        }))
    }
}

/// Reader over a chunked store.
struct ChunkedReader {
    dir: PathBuf,
    header: ArrayHeader,
    // loaded on first dataset-level metadata request
    attrs: OnceLock<Metadata>,
    cursor: Option<Index>,
}

impl ChunkedReader {
    fn attrs(&self) -> Result<&Metadata> {
        if let Some(attrs) = self.attrs.get() {
            return Ok(attrs);
        }
        let loaded = load_attrs(&self.dir)?;
        Ok(self.attrs.get_or_init(|| loaded))
    }
}

impl DriverCommon for ChunkedReader {
    fn set_index(&mut self, index: &Index) -> Result<()> {
        self.header.layout.index_space.validate(index)?;
        self.cursor = Some(index.clone());
        Ok(())
    }

    fn index(&self) -> Option<Index> {
        self.cursor.clone()
    }

    fn close(&mut self) -> Result<()> {
        self.attrs.take();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ReaderDriver for ChunkedReader {
    fn index_space(&self) -> &IndexSpace {
        &self.header.layout.index_space
    }

    fn get_data(&mut self, index: &Index) -> Result<DataUnit> {
        let key = self.header.chunk_key(index)?;
        let layout = &self.header.layout;
        let path = self.dir.join(&key);
        let framed = match fs::read(&path) {
            Ok(framed) => framed,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return DataUnit::zeros(layout.dtype, layout.unit_shape.clone())
            }
            Err(e) => return Err(DatasetError::io(format!("chunk {key}"), e)),
        };
        let raw = decode_chunk(&framed, layout.unit_bytes()?, &format!("chunk {key}"))?;
        DataUnit::new(layout.dtype, layout.unit_shape.clone(), raw)
            .map_err(|e| DatasetError::corrupt(format!("chunk {key}"), e.to_string()))
    }

    fn get_metadata(&mut self, index: Option<&Index>) -> Result<Metadata> {
        match index {
            None => Ok(dataset_metadata(&self.header.layout, self.attrs()?)),
            Some(index) => {
                let mut meta = unit_metadata(&self.header.layout, index)?;
                let key = self.header.chunk_key(index)?;
                let stored = fs::metadata(self.dir.join(&key)).ok().map(|m| m.len());
                meta.insert("present".into(), stored.is_some().into());
                meta.insert("stored_bytes".into(), stored.unwrap_or(0).into());
                meta.insert("chunk_key".into(), key.into());
                Ok(meta)
            }
        }
    }
}

/// Writer into a chunked store. Chunks are written through; attributes are
/// written on close.
struct ChunkedWriter {
    dir: PathBuf,
    header: ArrayHeader,
    attrs: Metadata,
    cursor: Option<Index>,
}

impl DriverCommon for ChunkedWriter {
    fn set_index(&mut self, index: &Index) -> Result<()> {
        self.header.layout.index_space.validate(index)?;
        self.cursor = Some(index.clone());
        Ok(())
    }

    fn index(&self) -> Option<Index> {
        self.cursor.clone()
    }

    fn close(&mut self) -> Result<()> {
        write_json(
            &self.dir,
            ATTRS,
            &serde_json::Value::Object(std::mem::take(&mut self.attrs)),
        )
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl WriterDriver for ChunkedWriter {
    fn set_data(&mut self, data: DataUnit, index: &Index) -> Result<()> {
        let key = self.header.chunk_key(index)?;
        let layout = &self.header.layout;
        data.check_layout(layout.dtype, &layout.unit_shape)?;

        let path = self.dir.join(&key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DatasetError::io(format!("chunk {key}"), e))?;
        }
        let framed = encode_chunk(data.as_bytes(), self.header.compression_level)?;
        fs::write(&path, framed).map_err(|e| DatasetError::io(format!("chunk {key}"), e))
    }

    fn set_metadata(&mut self, metadata: Metadata) -> Result<()> {
        check_attrs(&metadata)?;
        self.attrs = metadata;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    fn header(separator: &str) -> ArrayHeader {
        ArrayHeader {
            layout: DatasetLayout::new(
                IndexSpace::from_sizes(&[("t", 3), ("c", 2), ("z", 12)]).unwrap(),
                DataType::Float32,
                vec![8, 8],
            ),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            dimension_separator: separator.to_string(),
        }
    }

    #[test]
    fn test_chunk_key() {
        let index = Index::new().with("z", 11).with("t", 2).with("c", 0);
        assert_eq!(header(".").chunk_key(&index).unwrap(), "2.0.11");
        assert_eq!(header("/").chunk_key(&index).unwrap(), "2/0/11");
        assert!(header(".").chunk_key(&Index::new().with("z", 1)).is_err());
    }

    #[test]
    fn test_header_default_separator() {
        let json = serde_json::json!({
            "layout": {"index_space": [{"name": "z", "size": 2}], "dtype": "uint8", "unit_shape": [4]},
            "compression_level": 1
        });
        let header: ArrayHeader = serde_json::from_value(json).unwrap();
        assert_eq!(header.dimension_separator, ".");
    }

    #[test]
    fn test_parse_separator() {
        assert_eq!(parse_separator(&SessionOptions::new()).unwrap(), None);
        assert_eq!(
            parse_separator(&SessionOptions::new().extra(SEPARATOR_OPTION, "/")).unwrap(),
            Some("/".to_string())
        );
        assert!(parse_separator(&SessionOptions::new().extra(SEPARATOR_OPTION, "-")).is_err());
    }
}
