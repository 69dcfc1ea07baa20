// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout voxio.
//!
//! This module provides the foundational types for the library:
//! - [`DatasetError`] - Error taxonomy shared by formats, sessions and the registry
//! - [`Index`] / [`IndexSpace`] - Multi-dimensional addressing of logical units
//! - [`DataUnit`] / [`Metadata`] - Payloads moved through sessions

pub mod error;
pub mod index;
pub mod value;

pub use error::{DatasetError, Result};
pub use index::{Dimension, GroupIter, Index, IndexIter, IndexSpace};
pub use value::{DataType, DataUnit, Metadata};
