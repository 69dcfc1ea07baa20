// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Options passed to a format when a session is opened.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{DataType, DatasetError, IndexSpace, Metadata, Result};

/// Metadata key under which readers of the built-in formats describe the
/// dataset layout. Writers of the built-in formats reject it as a user
/// attribute.
pub const LAYOUT_KEY: &str = "layout";

/// Shape of a dataset: its index space plus the element type and shape
/// shared by every unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetLayout {
    /// Dimensions addressing the units, canonical order
    pub index_space: IndexSpace,
    /// Element type of every unit
    pub dtype: DataType,
    /// Shape of every unit
    pub unit_shape: Vec<usize>,
}

impl DatasetLayout {
    /// Create a new layout.
    pub fn new(index_space: IndexSpace, dtype: DataType, unit_shape: Vec<usize>) -> Self {
        Self {
            index_space,
            dtype,
            unit_shape,
        }
    }

    /// Check that a unit of this layout fits in memory addressing.
    ///
    /// The index space checks its own unit count on construction.
    pub fn validate(&self) -> Result<()> {
        self.unit_bytes().map(|_| ())
    }

    /// Byte length of one unit.
    pub fn unit_bytes(&self) -> Result<usize> {
        self.dtype.checked_buffer_len(&self.unit_shape)
    }

    /// Describe the layout as metadata.
    pub fn to_metadata(&self) -> Metadata {
        let mut meta = Metadata::new();
        let dims = self
            .index_space
            .dims()
            .iter()
            .map(|d| (d.name.clone(), serde_json::Value::from(d.size)))
            .collect::<serde_json::Map<_, _>>();
        meta.insert("dims".into(), serde_json::Value::Object(dims));
        meta.insert("dtype".into(), self.dtype.as_str().into());
        meta.insert("unit_shape".into(), self.unit_shape.clone().into());
        meta.insert("count".into(), self.index_space.len().into());
        meta
    }

    /// Rebuild a layout from the metadata produced by [`to_metadata`].
    ///
    /// The `dims` entry is a JSON object and does not keep dimension order, so
    /// the index space is passed in separately.
    ///
    /// [`to_metadata`]: DatasetLayout::to_metadata
    pub fn from_metadata(index_space: IndexSpace, meta: &Metadata) -> Result<Self> {
        let dtype = meta
            .get("dtype")
            .and_then(|v| v.as_str())
            .ok_or_else(|| DatasetError::invalid_argument("layout", "missing dtype"))?
            .parse()?;
        let unit_shape = meta
            .get("unit_shape")
            .and_then(|v| v.as_array())
            .ok_or_else(|| DatasetError::invalid_argument("layout", "missing unit_shape"))?
            .iter()
            .map(|v| {
                v.as_u64().map(|n| n as usize).ok_or_else(|| {
                    DatasetError::invalid_argument("layout", format!("bad unit extent {v}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let layout = Self::new(index_space, dtype, unit_shape);
        layout.validate()?;
        Ok(layout)
    }
}

/// Options recognized by the built-in drivers.
///
/// Drivers ignore options they do not understand. Driver-specific settings go
/// into [`extra`](SessionOptions::extra).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Create missing parent directories of a write destination
    pub create_parents: bool,
    /// Replace an existing dataset at the write destination
    pub overwrite: bool,
    /// Compression level for compressing drivers
    pub compression_level: Option<i32>,
    /// Layout of a dataset being created
    pub layout: Option<DatasetLayout>,
    /// Driver-specific options
    pub extra: BTreeMap<String, String>,
}

impl SessionOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether missing parents are created.
    pub fn create_parents(mut self, create: bool) -> Self {
        self.create_parents = create;
        self
    }

    /// Set whether an existing dataset is replaced.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Set the compression level.
    pub fn compression_level(mut self, level: i32) -> Self {
        self.compression_level = Some(level);
        self
    }

    /// Set the layout of the dataset being created.
    pub fn layout(mut self, layout: DatasetLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Set a driver-specific option.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Get a driver-specific option.
    pub fn get_extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}
