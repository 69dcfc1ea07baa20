// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Voxio
//!
//! Pluggable dataset format registry for multi-dimensional imaging data.
//!
//! A dataset is a grid of equally shaped data units addressed by a
//! multi-dimensional [`Index`] (e.g. `{t, c, z}`). Formats are registered in a
//! [`FormatManager`](io::FormatManager), which finds the first format able to
//! read or write a request and opens a session for it.
//!
//! ## Architecture
//!
//! - `core/` - index space, data units, error type
//! - `io/traits.rs` - the `Format` trait and the driver traits formats implement
//! - `io/session.rs` - `Reader`/`Writer` sessions with an open/closed lifecycle
//! - `io/registry.rs` - `FormatManager` and the process-wide default registry
//! - `io/formats/` - built-in formats (memory, chunked, stack)
//! - `config.rs` - TOML registry configuration
//!
//! ## Example: Reading a dataset
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use voxio::io::{default_registry, Request, SessionOptions};
//!
//! let request = Arc::new(Request::new("cells.zarr"));
//! let mut reader = default_registry().open_reader(request, &SessionOptions::default())?;
//! println!("{} units over {}", reader.len(), reader.index_space());
//! for item in reader.iter()? {
//!     let (index, unit) = item?;
//!     println!("{index}: {:?}", unit.shape());
//! }
//! reader.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Writing a dataset
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use voxio::io::{default_registry, DatasetLayout, Request, SessionOptions};
//! use voxio::{DataType, DataUnit, Index, IndexSpace};
//!
//! let layout = DatasetLayout::new(
//!     IndexSpace::from_sizes(&[("c", 2), ("z", 10)])?,
//!     DataType::UInt16,
//!     vec![512, 512],
//! );
//! let options = SessionOptions::new().layout(layout).create_parents(true);
//! let mut writer = default_registry().open_writer(Arc::new(Request::new("out/cells.stack")), &options)?;
//! writer.scoped(|w| {
//!     let unit = DataUnit::zeros(DataType::UInt16, vec![512, 512])?;
//!     w.set_data(unit, &Index::new().with("c", 0).with("z", 0))
//! })?;
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{DataType, DataUnit, DatasetError, Dimension, Index, IndexSpace, Metadata, Result};

// Registry configuration
pub mod config;
pub use config::RegistryConfig;

// Formats, sessions and registry
pub mod io;

// Re-export key I/O types
pub use io::{
    default_registry, DatasetLayout, Format, FormatExt, FormatManager, Reader, Request,
    SessionOptions, Writer, LAYOUT_KEY,
};
