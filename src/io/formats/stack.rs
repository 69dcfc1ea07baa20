// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Image stack format.
//!
//! A stack is a directory holding a `stack.json` manifest and one raw
//! little-endian file per unit:
//!
//! ```text
//! cells.stack/
//!   stack.json          layout + dataset metadata
//!   c0000_z0000.raw
//!   c0000_z0001.raw
//!   ...
//! ```
//!
//! File names spell out the coordinates in canonical dimension order, so a
//! stack stays browsable with ordinary tools.

use std::any::Any;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

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

const NAME: &str = "stack";
const EXTENSION: &str = "stack";
const MANIFEST: &str = "stack.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StackManifest {
    layout: DatasetLayout,
    #[serde(default)]
    metadata: Metadata,
}

impl StackManifest {
    fn load(dir: &Path) -> Result<Self> {
        let text = fs::read_to_string(dir.join(MANIFEST))
            .map_err(|e| DatasetError::io(format!("{MANIFEST} in {}", dir.display()), e))?;
        let manifest: Self = serde_json::from_str(&text)?;
        manifest.layout.validate()?;
        Ok(manifest)
    }

    fn store(&self, dir: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        let tmp = dir.join(format!("{MANIFEST}.tmp"));
        fs::write(&tmp, text).map_err(|e| DatasetError::io(format!("{}", tmp.display()), e))?;
        fs::rename(&tmp, dir.join(MANIFEST))
            .map_err(|e| DatasetError::io(format!("{MANIFEST} in {}", dir.display()), e))
    }
}

/// File name of the unit at `index`.
fn unit_file_name(space: &IndexSpace, index: &Index) -> Result<String> {
    let coords = space.coords(index)?;
    if coords.is_empty() {
        return Ok("unit.raw".to_string());
    }
    let parts: Vec<String> = space
        .dims()
        .iter()
        .zip(&coords)
        .map(|(dim, coord)| format!("{}{:04}", dim.name, coord))
        .collect();
    Ok(format!("{}.raw", parts.join("_")))
}

/// Image stack format: a directory of raw planes.
#[derive(Debug, Default)]
pub struct StackFormat;

impl StackFormat {
    /// Create the format.
    pub fn new() -> Self {
        Self
    }
}

impl Format for StackFormat {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Image stack, one raw file per unit (*.stack)"
    }

    fn can_read(&self, request: &Request) -> bool {
        has_marker(request, MANIFEST)
    }

    fn can_write(&self, request: &Request) -> bool {
        is_writable_destination(request, EXTENSION, MANIFEST)
    }

    fn open_reader(
        &self,
        request: &Request,
        _options: &SessionOptions,
    ) -> Result<Box<dyn ReaderDriver>> {
        let dir = request
            .path()
            .ok_or_else(|| DatasetError::open(NAME, request.location(), "not a filesystem path"))?;
        let manifest = StackManifest::load(&dir)
            .map_err(|e| DatasetError::open(NAME, request.location(), e.to_string()))?;
        Ok(Box::new(StackReader {
            dir,
            manifest,
            cursor: None,
        }))
    }

    fn open_writer(
        &self,
        request: &Request,
        options: &SessionOptions,
    ) -> Result<Box<dyn WriterDriver>> {
        let dir = destination_path(NAME, request)?;
        let existing = if !options.overwrite && dir.join(MANIFEST).is_file() {
            Some(
                StackManifest::load(&dir)
                    .map_err(|e| DatasetError::open(NAME, request.location(), e.to_string()))?,
            )
        } else {
            None
        };
        let (layout, metadata) = match existing {
            Some(m) => (resolve_layout(NAME, request, Some(m.layout), options)?, m.metadata),
            None => (resolve_layout(NAME, request, None, options)?, Metadata::new()),
        };
        let manifest = StackManifest { layout, metadata };

        let destination = Destination::prepare(NAME, request, dir, options, MANIFEST)?;
        manifest
            .store(destination.dir())
            .map_err(|e| DatasetError::open(NAME, request.location(), e.to_string()))?;
        let dir = destination.keep();
        debug!(dir = %dir.display(), units = manifest.layout.index_space.len(), "prepared stack");
        Ok(Box::new(StackWriter {
            dir,
            manifest,
            cursor: None,
        }))
    }
}

/// Reader over a stack directory.
struct StackReader {
    dir: PathBuf,
    manifest: StackManifest,
    cursor: Option<Index>,
}

impl DriverCommon for StackReader {
    fn set_index(&mut self, index: &Index) -> Result<()> {
        self.manifest.layout.index_space.validate(index)?;
        self.cursor = Some(index.clone());
        Ok(())
    }

    fn index(&self) -> Option<Index> {
        self.cursor.clone()
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ReaderDriver for StackReader {
    fn index_space(&self) -> &IndexSpace {
        &self.manifest.layout.index_space
    }

    fn get_data(&mut self, index: &Index) -> Result<DataUnit> {
        let layout = &self.manifest.layout;
        let path = self.dir.join(unit_file_name(&layout.index_space, index)?);
        match fs::read(&path) {
            Ok(bytes) => DataUnit::new(layout.dtype, layout.unit_shape.clone(), bytes)
                .map_err(|e| DatasetError::corrupt(format!("{}", path.display()), e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                DataUnit::zeros(layout.dtype, layout.unit_shape.clone())
            }
            Err(e) => Err(DatasetError::io(format!("{}", path.display()), e)),
        }
    }

    fn get_metadata(&mut self, index: Option<&Index>) -> Result<Metadata> {
        let layout = &self.manifest.layout;
        match index {
            None => Ok(dataset_metadata(layout, &self.manifest.metadata)),
            Some(index) => {
                let mut meta = unit_metadata(layout, index)?;
                let file = unit_file_name(&layout.index_space, index)?;
                meta.insert("present".into(), self.dir.join(&file).is_file().into());
                meta.insert("file".into(), file.into());
                Ok(meta)
            }
        }
    }
}

/// Writer into a stack directory. Units are written through; the manifest is
/// rewritten on close.
struct StackWriter {
    dir: PathBuf,
    manifest: StackManifest,
    cursor: Option<Index>,
}

impl DriverCommon for StackWriter {
    fn set_index(&mut self, index: &Index) -> Result<()> {
        self.manifest.layout.index_space.validate(index)?;
        self.cursor = Some(index.clone());
        Ok(())
    }

    fn index(&self) -> Option<Index> {
        self.cursor.clone()
    }

    fn close(&mut self) -> Result<()> {
        self.manifest.store(&self.dir)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl WriterDriver for StackWriter {
    fn set_data(&mut self, data: DataUnit, index: &Index) -> Result<()> {
        let layout = &self.manifest.layout;
        let path = self.dir.join(unit_file_name(&layout.index_space, index)?);
        data.check_layout(layout.dtype, &layout.unit_shape)?;
        fs::write(&path, data.into_bytes())
            .map_err(|e| DatasetError::io(format!("{}", path.display()), e))
    }

    fn set_metadata(&mut self, metadata: Metadata) -> Result<()> {
        check_attrs(&metadata)?;
        self.manifest.metadata = metadata;
        Ok(())
    }
}
