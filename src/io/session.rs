// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Reader and writer sessions.
//!
//! A session is one open interaction with a dataset, bound to the format that
//! produced it and the request it was opened against. Its lifecycle is
//! `Open -> Closed`:
//!
//! - Construction runs the driver's open hook synchronously; a session that
//!   exists is open.
//! - [`close`](Reader::close) is idempotent. The driver's close hook runs once.
//! - Dropping an open session closes it, so resources are released on every
//!   exit path, including `?` and panics unwinding through the caller.
//! - Every data or metadata access on a closed session fails with
//!   [`DatasetError::UseAfterClose`].
//!
//! Sessions are not internally synchronized. Sharing one across threads
//! requires the caller's own locking (e.g. a `Mutex<Reader>`).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use voxio::io::{FormatManager, Request, SessionOptions};
//!
//! # fn main() -> voxio::Result<()> {
//! let registry = FormatManager::with_builtin_formats();
//! let request = Arc::new(Request::new("/data/cells.zarr"));
//! let mut reader = registry.open_reader(request, &SessionOptions::default())?;
//! reader.scoped(|reader| {
//!     for item in reader.iter()? {
//!         let (index, unit) = item?;
//!         println!("{index}: {} elements", unit.len());
//!     }
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::{DataUnit, DatasetError, Index, IndexSpace, Metadata, Result};

use super::options::{DatasetLayout, SessionOptions, LAYOUT_KEY};
use super::request::Request;
use super::traits::{Format, ReaderDriver, WriterDriver};

/// Lifecycle state shared by readers and writers.
struct SessionState {
    format: Arc<dyn Format>,
    request: Arc<Request>,
    kind: &'static str,
    closed: bool,
}

impl SessionState {
    fn new(format: Arc<dyn Format>, request: Arc<Request>, kind: &'static str) -> Self {
        Self {
            format,
            request,
            kind,
            closed: false,
        }
    }

    fn label(&self) -> String {
        format!("{} {}", self.format.name(), self.kind)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(DatasetError::use_after_close(self.label()));
        }
        Ok(())
    }

    /// Flip to closed. Returns `false` if it already was.
    fn mark_closed(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        debug!(
            format = self.format.name(),
            location = self.request.location(),
            kind = self.kind,
            "closing session"
        );
        true
    }
}

/// Map a driver open failure onto [`DatasetError::Open`].
fn open_error(format: &dyn Format, request: &Request, err: DatasetError) -> DatasetError {
    match err {
        DatasetError::Open { .. } => err,
        other => DatasetError::open(format.name(), request.location(), other.to_string()),
    }
}

/// Session reading a dataset.
pub struct Reader {
    state: SessionState,
    index_space: IndexSpace,
    driver: Box<dyn ReaderDriver>,
}

impl Reader {
    /// Open a reader session. Usually reached through
    /// [`FormatExt::get_reader`](super::traits::FormatExt::get_reader).
    pub fn open(
        format: Arc<dyn Format>,
        request: Arc<Request>,
        options: &SessionOptions,
    ) -> Result<Self> {
        let driver = format
            .open_reader(&request, options)
            .map_err(|e| open_error(format.as_ref(), &request, e))?;
        let index_space = driver.index_space().clone();
        debug!(
            format = format.name(),
            location = request.location(),
            units = index_space.len(),
            "opened reader"
        );
        Ok(Self {
            state: SessionState::new(format, request, "reader"),
            index_space,
            driver,
        })
    }

    /// Format that produced this session.
    pub fn format(&self) -> &Arc<dyn Format> {
        &self.state.format
    }

    /// Request this session was opened against.
    pub fn request(&self) -> &Arc<Request> {
        &self.state.request
    }

    /// Whether the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.state.closed
    }

    /// Dimensions of the dataset, fixed when the session opened.
    pub fn index_space(&self) -> &IndexSpace {
        &self.index_space
    }

    /// Number of addressable units, fixed when the session opened.
    pub fn len(&self) -> usize {
        self.index_space.len()
    }

    /// Check if the dataset has no unit.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move the cursor to `index`.
    pub fn set_index(&mut self, index: &Index) -> Result<()> {
        self.state.ensure_open()?;
        self.driver.set_index(index)
    }

    /// Current cursor position, if the driver tracks one.
    pub fn index(&self) -> Result<Option<Index>> {
        self.state.ensure_open()?;
        Ok(self.driver.index())
    }

    /// Read the unit at `index`.
    pub fn get_data(&mut self, index: &Index) -> Result<DataUnit> {
        self.state.ensure_open()?;
        self.driver.get_data(index)
    }

    /// Read unit metadata, or dataset metadata when `index` is `None`.
    pub fn get_metadata(&mut self, index: Option<&Index>) -> Result<Metadata> {
        self.state.ensure_open()?;
        self.driver.get_metadata(index)
    }

    /// Layout of the dataset, from the [`LAYOUT_KEY`] entry of its metadata.
    ///
    /// Fails with [`DatasetError::InvalidArgument`] for formats that do not
    /// describe their layout.
    pub fn layout(&mut self) -> Result<DatasetLayout> {
        let meta = self.get_metadata(None)?;
        let layout = meta
            .get(LAYOUT_KEY)
            .and_then(|v| v.as_object())
            .ok_or_else(|| DatasetError::invalid_argument("layout", "format reports no layout"))?;
        DatasetLayout::from_metadata(self.index_space.clone(), layout)
    }

    /// Traverse every unit in canonical order.
    ///
    /// Each call starts over from the first unit.
    pub fn iter(&mut self) -> Result<Traversal<'_>> {
        self.state.ensure_open()?;
        Ok(Traversal {
            reader: self,
            next: 0,
        })
    }

    /// Downcast the driver for format-specific operations.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.driver.as_any().downcast_ref::<T>()
    }

    /// Close the session. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if !self.state.mark_closed() {
            return Ok(());
        }
        self.driver.close()
    }

    /// Run `f` on the open session, then close it whatever `f` returned.
    ///
    /// An error from `f` takes precedence over an error from closing.
    pub fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.state.ensure_open()?;
        let result = f(self);
        let closed = self.close();
        let value = result?;
        closed?;
        Ok(value)
    }
}

impl Drop for Reader {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(
                session = %self.state.label(),
                fields = ?e.log_fields(),
                "failed to close reader on drop"
            );
        }
    }
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("format", &self.state.format.name())
            .field("request", &self.state.request.location())
            .field("units", &self.index_space.len())
            .field("closed", &self.state.closed)
            .finish()
    }
}

/// Sequential traversal over a reader, produced by [`Reader::iter`].
///
/// Yields `(index, unit)` pairs in canonical order, visiting each index once.
pub struct Traversal<'a> {
    reader: &'a mut Reader,
    next: usize,
}

impl Iterator for Traversal<'_> {
    type Item = Result<(Index, DataUnit)>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.reader.index_space.index_at(self.next)?;
        self.next += 1;
        if let Err(e) = self.reader.state.ensure_open() {
            // stop after reporting once
            self.next = self.reader.index_space.len();
            return Some(Err(e));
        }
        let step = self
            .reader
            .driver
            .set_index(&index)
            .and_then(|_| self.reader.driver.get_data(&index));
        Some(step.map(|unit| (index, unit)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.reader.index_space.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

/// Session writing a dataset.
pub struct Writer {
    state: SessionState,
    driver: Box<dyn WriterDriver>,
}

impl Writer {
    /// Open a writer session. Usually reached through
    /// [`FormatExt::get_writer`](super::traits::FormatExt::get_writer).
    pub fn open(
        format: Arc<dyn Format>,
        request: Arc<Request>,
        options: &SessionOptions,
    ) -> Result<Self> {
        let driver = format
            .open_writer(&request, options)
            .map_err(|e| open_error(format.as_ref(), &request, e))?;
        debug!(
            format = format.name(),
            location = request.location(),
            "opened writer"
        );
        Ok(Self {
            state: SessionState::new(format, request, "writer"),
            driver,
        })
    }

    /// Format that produced this session.
    pub fn format(&self) -> &Arc<dyn Format> {
        &self.state.format
    }

    /// Request this session was opened against.
    pub fn request(&self) -> &Arc<Request> {
        &self.state.request
    }

    /// Whether the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.state.closed
    }

    /// Move the cursor to `index`.
    pub fn set_index(&mut self, index: &Index) -> Result<()> {
        self.state.ensure_open()?;
        self.driver.set_index(index)
    }

    /// Current cursor position, if the driver tracks one.
    pub fn index(&self) -> Result<Option<Index>> {
        self.state.ensure_open()?;
        Ok(self.driver.index())
    }

    /// Write the unit at `index`.
    pub fn set_data(&mut self, data: DataUnit, index: &Index) -> Result<()> {
        self.state.ensure_open()?;
        self.driver.set_data(data, index)
    }

    /// Replace the dataset-level metadata.
    pub fn set_metadata(&mut self, metadata: Metadata) -> Result<()> {
        self.state.ensure_open()?;
        self.driver.set_metadata(metadata)
    }

    /// Downcast the driver for format-specific operations.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.driver.as_any().downcast_ref::<T>()
    }

    /// Close the session, flushing pending writes. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if !self.state.mark_closed() {
            return Ok(());
        }
        self.driver.close()
    }

    /// Run `f` on the open session, then close it whatever `f` returned.
    pub fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.state.ensure_open()?;
        let result = f(self);
        let closed = self.close();
        let value = result?;
        closed?;
        Ok(value)
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(
                session = %self.state.label(),
                fields = ?e.log_fields(),
                "failed to close writer on drop"
            );
        }
    }
}

impl fmt::Debug for Writer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer")
            .field("format", &self.state.format.name())
            .field("request", &self.state.request.location())
            .field("closed", &self.state.closed)
            .finish()
    }
}
