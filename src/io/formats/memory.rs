// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! In-process datasets.
//!
//! Requests of the form `mem://<name>` address datasets held by a
//! [`MemoryFormat`] instance. A dataset lives as long as the format instance,
//! so it can be reopened by later sessions of the same format.
//!
//! Writers stage their changes and publish them on close; readers take a
//! snapshot at open and never observe later writes.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::core::{DataUnit, DatasetError, Index, IndexSpace, Metadata, Result};
use crate::io::options::{DatasetLayout, SessionOptions};
use crate::io::request::Request;
use crate::io::traits::{DriverCommon, Format, ReaderDriver, WriterDriver};

use super::{check_attrs, dataset_metadata, resolve_layout, unit_metadata};

const NAME: &str = "memory";
const SCHEME: &str = "mem";

#[derive(Debug, Clone)]
struct MemoryDataset {
    layout: DatasetLayout,
    units: HashMap<usize, DataUnit>,
    attrs: Metadata,
}

type Store = Arc<RwLock<HashMap<String, MemoryDataset>>>;

/// In-process dataset format.
#[derive(Debug, Default)]
pub struct MemoryFormat {
    store: Store,
}

impl MemoryFormat {
    /// Create a format with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the datasets currently held.
    pub fn datasets(&self) -> Vec<String> {
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = store.keys().cloned().collect();
        names.sort();
        names
    }

    fn lookup(&self, name: &str) -> Option<MemoryDataset> {
        let store = self.store.read().unwrap_or_else(|e| e.into_inner());
        store.get(name).cloned()
    }
}

impl Format for MemoryFormat {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "In-process datasets addressed as mem://<name>"
    }

    fn can_read(&self, request: &Request) -> bool {
        request.scheme() == Some(SCHEME) && self.lookup(request.target()).is_some()
    }

    fn can_write(&self, request: &Request) -> bool {
        request.scheme() == Some(SCHEME) && !request.target().is_empty()
    }

    fn open_reader(
        &self,
        request: &Request,
        _options: &SessionOptions,
    ) -> Result<Box<dyn ReaderDriver>> {
        let dataset = self
            .lookup(request.target())
            .ok_or_else(|| DatasetError::open(NAME, request.location(), "no such dataset"))?;
        Ok(Box::new(MemoryReader {
            dataset,
            cursor: None,
        }))
    }

    fn open_writer(
        &self,
        request: &Request,
        options: &SessionOptions,
    ) -> Result<Box<dyn WriterDriver>> {
        if request.target().is_empty() {
            return Err(DatasetError::open(NAME, request.location(), "empty dataset name"));
        }
        let existing = if options.overwrite {
            None
        } else {
            self.lookup(request.target())
        };
        let staged = match existing {
            Some(dataset) => {
                resolve_layout(NAME, request, Some(dataset.layout.clone()), options)?;
                dataset
            }
            None => MemoryDataset {
                layout: resolve_layout(NAME, request, None, options)?,
                units: HashMap::new(),
                attrs: Metadata::new(),
            },
        };
        Ok(Box::new(MemoryWriter {
            store: Arc::clone(&self.store),
            name: request.target().to_string(),
            staged: Some(staged),
            cursor: None,
        }))
    }
}

/// Reader over a snapshot of a memory dataset.
struct MemoryReader {
    dataset: MemoryDataset,
    cursor: Option<Index>,
}

impl DriverCommon for MemoryReader {
    fn set_index(&mut self, index: &Index) -> Result<()> {
        self.dataset.layout.index_space.validate(index)?;
        self.cursor = Some(index.clone());
        Ok(())
    }

    fn index(&self) -> Option<Index> {
        self.cursor.clone()
    }

    fn close(&mut self) -> Result<()> {
        self.dataset.units.clear();
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ReaderDriver for MemoryReader {
    fn index_space(&self) -> &IndexSpace {
        &self.dataset.layout.index_space
    }

    fn get_data(&mut self, index: &Index) -> Result<DataUnit> {
        let layout = &self.dataset.layout;
        let offset = layout.index_space.offset(index)?;
        Ok(match self.dataset.units.get(&offset) {
            Some(unit) => unit.clone(),
            None => DataUnit::zeros(layout.dtype, layout.unit_shape.clone())?,
        })
    }

    fn get_metadata(&mut self, index: Option<&Index>) -> Result<Metadata> {
        let layout = &self.dataset.layout;
        match index {
            None => Ok(dataset_metadata(layout, &self.dataset.attrs)),
            Some(index) => {
                let mut meta = unit_metadata(layout, index)?;
                let offset = layout.index_space.offset(index)?;
                meta.insert(
                    "present".into(),
                    self.dataset.units.contains_key(&offset).into(),
                );
                Ok(meta)
            }
        }
    }
}

/// Writer staging changes until close.
struct MemoryWriter {
    store: Store,
    name: String,
    staged: Option<MemoryDataset>,
    cursor: Option<Index>,
}

impl MemoryWriter {
    fn staged(&mut self) -> Result<&mut MemoryDataset> {
        self.staged
            .as_mut()
            .ok_or_else(|| DatasetError::Other("memory writer already published".to_string()))
    }
}

impl DriverCommon for MemoryWriter {
    fn set_index(&mut self, index: &Index) -> Result<()> {
        self.staged()?.layout.index_space.validate(index)?;
        self.cursor = Some(index.clone());
        Ok(())
    }

    fn index(&self) -> Option<Index> {
        self.cursor.clone()
    }

    fn close(&mut self) -> Result<()> {
        if let Some(dataset) = self.staged.take() {
            let mut store = self.store.write().unwrap_or_else(|e| e.into_inner());
            store.insert(self.name.clone(), dataset);
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl WriterDriver for MemoryWriter {
    fn set_data(&mut self, data: DataUnit, index: &Index) -> Result<()> {
        let staged = self.staged()?;
        let offset = staged.layout.index_space.offset(index)?;
        data.check_layout(staged.layout.dtype, &staged.layout.unit_shape)?;
        staged.units.insert(offset, data);
        Ok(())
    }

    fn set_metadata(&mut self, metadata: Metadata) -> Result<()> {
        check_attrs(&metadata)?;
        self.staged()?.attrs = metadata;
        Ok(())
    }
}
