// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core traits for dataset formats and their drivers.
//!
//! A [`Format`] is a named capability unit: it answers whether it can read or
//! write a [`Request`] and opens drivers for it. Drivers
//! ([`ReaderDriver`], [`WriterDriver`]) hold the format-specific resources.
//! Callers never touch drivers directly; they go through the
//! [`Reader`](super::session::Reader) and [`Writer`](super::session::Writer)
//! sessions, which own the open/closed lifecycle.

use std::any::Any;
use std::sync::Arc;

use crate::core::{DataUnit, Index, IndexSpace, Metadata, Result};

use super::options::SessionOptions;
use super::request::Request;
use super::session::{Reader, Writer};

/// A dataset format implementation.
///
/// # Example
///
/// ```no_run
/// use voxio::io::traits::Format;
/// use voxio::io::Request;
///
/// fn describe(format: &dyn Format, request: &Request) {
///     println!(
///         "{}: read={} write={}",
///         format.name(),
///         format.can_read(request),
///         format.can_write(request)
///     );
/// }
/// ```
pub trait Format: Send + Sync {
    /// Short name, unique within a registry.
    fn name(&self) -> &str;

    /// One-line description.
    fn description(&self) -> &str;

    /// Whether this format recognizes `request` as a readable dataset.
    ///
    /// Must not fail; an unrecognized resource is `false`.
    fn can_read(&self, request: &Request) -> bool;

    /// Whether this format can create or update a dataset at `request`.
    fn can_write(&self, request: &Request) -> bool;

    /// Acquire the resources needed to read `request`.
    ///
    /// On failure nothing acquired so far may outlive the call.
    fn open_reader(
        &self,
        request: &Request,
        options: &SessionOptions,
    ) -> Result<Box<dyn ReaderDriver>>;

    /// Acquire the resources needed to write `request`.
    fn open_writer(
        &self,
        request: &Request,
        options: &SessionOptions,
    ) -> Result<Box<dyn WriterDriver>>;
}

/// Session factories on shared formats.
///
/// Sessions keep a shared reference to their format, so they are created from
/// an `Arc<dyn Format>` rather than a plain reference.
pub trait FormatExt {
    /// Open a reader session on `request`.
    fn get_reader(&self, request: Arc<Request>, options: &SessionOptions) -> Result<Reader>;

    /// Open a writer session on `request`.
    fn get_writer(&self, request: Arc<Request>, options: &SessionOptions) -> Result<Writer>;

    /// `"<name> - <description>"`.
    fn summary(&self) -> String;
}

impl FormatExt for Arc<dyn Format> {
    fn get_reader(&self, request: Arc<Request>, options: &SessionOptions) -> Result<Reader> {
        Reader::open(Arc::clone(self), request, options)
    }

    fn get_writer(&self, request: Arc<Request>, options: &SessionOptions) -> Result<Writer> {
        Writer::open(Arc::clone(self), request, options)
    }

    fn summary(&self) -> String {
        format!("{} - {}", self.name(), self.description())
    }
}

/// Whether two shared formats are the same instance.
///
/// Two formats with equal names and descriptions are still distinct.
pub fn same_format(a: &Arc<dyn Format>, b: &Arc<dyn Format>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Hooks shared by reader and writer drivers.
pub trait DriverCommon: Send {
    /// Move the cursor to `index`.
    ///
    /// Fails with [`DatasetError::Index`](crate::DatasetError::Index) when the
    /// index is outside the dataset.
    fn set_index(&mut self, index: &Index) -> Result<()>;

    /// Current cursor position, for drivers that track one.
    fn index(&self) -> Option<Index> {
        None
    }

    /// Release every resource held by the driver.
    ///
    /// Called at most once, by the owning session.
    fn close(&mut self) -> Result<()>;

    /// Downcast to `Any` for accessing driver-specific functionality.
    fn as_any(&self) -> &dyn Any;
}

/// Format-specific reading.
pub trait ReaderDriver: DriverCommon {
    /// Dimensions of the dataset. Stable while the driver is open.
    fn index_space(&self) -> &IndexSpace;

    /// Number of addressable units.
    fn len(&self) -> usize {
        self.index_space().len()
    }

    /// Read the unit at `index`.
    fn get_data(&mut self, index: &Index) -> Result<DataUnit>;

    /// Read metadata of one unit, or of the whole dataset when `index` is `None`.
    ///
    /// Does not depend on the cursor.
    fn get_metadata(&mut self, index: Option<&Index>) -> Result<Metadata>;
}

/// Format-specific writing.
pub trait WriterDriver: DriverCommon {
    /// Write the unit at `index`. Units may arrive in any order.
    fn set_data(&mut self, data: DataUnit, index: &Index) -> Result<()>;

    /// Replace the dataset-level metadata.
    fn set_metadata(&mut self, metadata: Metadata) -> Result<()>;
}
