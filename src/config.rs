// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Registry configuration loaded from TOML.
//!
//! ```toml
//! # search order; unlisted built-ins follow in their default order
//! formats = ["chunked", "stack"]
//! disabled = ["memory"]
//!
//! [session]
//! create_parents = true
//! compression_level = 9
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{DatasetError, Result};
use crate::io::options::SessionOptions;

/// Which built-in formats to register, in what order, and the default
/// options for sessions opened through them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Format names in search order
    pub formats: Vec<String>,
    /// Format names to leave out
    pub disabled: Vec<String>,
    /// Default session options
    pub session: SessionOptions,
}

impl RegistryConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| DatasetError::invalid_argument("config", e.message().to_string()))
    }

    /// Load a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DatasetError::io(format!("config {}", path.display()), e))?;
        Self::from_toml_str(&text)
    }
}
