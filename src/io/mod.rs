// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer: formats, sessions and the format registry.
//!
//! This module provides the pluggable side of the library: the [`Format`]
//! trait, the [`Reader`]/[`Writer`] sessions built on top of format drivers,
//! and the [`FormatManager`] that picks a format for a request.

pub mod detection;
pub mod formats;
pub mod options;
pub mod request;
pub mod session;

// Traits for formats and their drivers
pub mod traits;
pub use traits::{DriverCommon, Format, FormatExt, ReaderDriver, WriterDriver};

// Registry with capability search
pub mod registry;
pub use registry::{default_registry, FormatManager};

pub use options::{DatasetLayout, SessionOptions, LAYOUT_KEY};
pub use request::Request;
pub use session::{Reader, Traversal, Writer};
