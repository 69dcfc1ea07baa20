// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Built-in dataset formats.
//!
//! - [`memory`]: in-process datasets addressed as `mem://<name>`
//! - [`chunked`]: chunked array store, one compressed chunk per unit (`*.zarr`)
//! - [`stack`]: image stack, one raw file per unit (`*.stack`)
//!
//! Units that were never written read back as zeros in every built-in format.

pub mod chunked;
pub mod memory;
pub mod stack;

pub use chunked::ChunkedFormat;
pub use memory::MemoryFormat;
pub use stack::StackFormat;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::core::{DatasetError, Index, Metadata, Result};

use super::options::{DatasetLayout, SessionOptions, LAYOUT_KEY};
use super::request::Request;
use super::traits::Format;

/// Fresh instances of every built-in format, in default search order.
pub fn builtin_formats() -> Vec<Arc<dyn Format>> {
    vec![
        Arc::new(MemoryFormat::new()),
        Arc::new(ChunkedFormat::new()),
        Arc::new(StackFormat::new()),
    ]
}

/// Filesystem path of a writer's dataset directory.
pub(crate) fn destination_path(format: &str, request: &Request) -> Result<PathBuf> {
    request
        .path()
        .ok_or_else(|| DatasetError::open(format, request.location(), "not a filesystem path"))
}

/// Dataset directory of a writer that is being opened.
///
/// Directories created by [`Destination::prepare`] are removed again when the
/// value is dropped without [`Destination::keep`], so a failed open leaves no
/// trace on disk.
pub(crate) struct Destination {
    dir: PathBuf,
    created: Option<PathBuf>,
}

impl Destination {
    /// Create (or reuse) the dataset directory.
    ///
    /// Callers check every argument and load any existing dataset before this
    /// point. An existing dataset is removed first when `options.overwrite` is
    /// set. A missing parent directory is an open failure unless
    /// `options.create_parents` is set.
    pub(crate) fn prepare(
        format: &str,
        request: &Request,
        dir: PathBuf,
        options: &SessionOptions,
        marker: &str,
    ) -> Result<Self> {
        let open_err = |reason: String| DatasetError::open(format, request.location(), reason);

        if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() && !options.create_parents {
                return Err(open_err(format!(
                    "parent directory {} does not exist",
                    parent.display()
                )));
            }
        }

        if options.overwrite && dir.join(marker).is_file() {
            fs::remove_dir_all(&dir).map_err(|e| open_err(format!("cannot remove: {e}")))?;
        }

        let created = dir
            .ancestors()
            .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
            .last()
            .map(Path::to_path_buf);
        let destination = Self { dir, created };
        fs::create_dir_all(&destination.dir)
            .map_err(|e| open_err(format!("cannot create: {e}")))?;
        Ok(destination)
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keep the directory: the open succeeded.
    pub(crate) fn keep(mut self) -> PathBuf {
        self.created = None;
        std::mem::take(&mut self.dir)
    }
}

impl Drop for Destination {
    fn drop(&mut self) {
        if let Some(created) = self.created.take() {
            if let Err(e) = fs::remove_dir_all(&created) {
                if e.kind() != ErrorKind::NotFound {
                    warn!(dir = %created.display(), error = %e, "failed to remove directory of a failed open");
                }
            }
        }
    }
}

/// Pick the layout for a writer from an existing dataset and the options.
pub(crate) fn resolve_layout(
    format: &str,
    request: &Request,
    existing: Option<DatasetLayout>,
    options: &SessionOptions,
) -> Result<DatasetLayout> {
    let layout = match (existing, options.layout.as_ref()) {
        (Some(existing), Some(requested)) if &existing != requested => {
            return Err(DatasetError::open(
                format,
                request.location(),
                "requested layout differs from the existing dataset",
            ))
        }
        (Some(existing), _) => existing,
        (None, Some(requested)) => requested.clone(),
        (None, None) => {
            return Err(DatasetError::open(
                format,
                request.location(),
                "a layout is required to create a dataset",
            ))
        }
    };
    layout
        .validate()
        .map_err(|e| DatasetError::open(format, request.location(), e.to_string()))?;
    Ok(layout)
}

/// Reject user attributes that collide with keys readers generate.
pub(crate) fn check_attrs(attrs: &Metadata) -> Result<()> {
    if attrs.contains_key(LAYOUT_KEY) {
        return Err(DatasetError::invalid_argument(
            "metadata",
            format!("'{LAYOUT_KEY}' is reserved for the dataset layout"),
        ));
    }
    Ok(())
}

/// Dataset-level metadata as returned by readers: user attributes plus a
/// [`LAYOUT_KEY`] entry.
pub(crate) fn dataset_metadata(layout: &DatasetLayout, attrs: &Metadata) -> Metadata {
    let mut meta = attrs.clone();
    meta.insert(
        LAYOUT_KEY.into(),
        serde_json::Value::Object(layout.to_metadata()),
    );
    meta
}

/// Unit-level metadata common to every built-in format.
pub(crate) fn unit_metadata(layout: &DatasetLayout, index: &Index) -> Result<Metadata> {
    let offset = layout.index_space.offset(index)?;
    let mut meta = Metadata::new();
    meta.insert("index".into(), serde_json::to_value(index)?);
    meta.insert("offset".into(), offset.into());
    Ok(meta)
}
