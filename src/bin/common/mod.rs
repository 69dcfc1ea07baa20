// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for CLI commands.

use std::path::Path;

use anyhow::Context as _;
use tracing::debug;
use voxio::{FormatManager, Index, Metadata, RegistryConfig, SessionOptions};

pub use anyhow::Result as CliResult;
pub type Result<T = ()> = CliResult<T>;

/// Registry and default session options shared by every command.
pub struct Context {
    pub registry: FormatManager,
    pub options: SessionOptions,
}

impl Context {
    /// Build the registry from a configuration file, or the built-ins.
    pub fn load(config: Option<&Path>) -> Result<Self> {
        let config = match config {
            Some(path) => RegistryConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => RegistryConfig::default(),
        };
        let registry = FormatManager::from_config(&config)?;
        debug!(formats = ?registry.names(), "registry ready");
        Ok(Self {
            registry,
            options: config.session,
        })
    }
}

/// Parse an index given as `dim=coord` pairs separated by commas.
///
/// An empty string is the index of a dataset without dimensions.
pub fn parse_index(s: &str) -> CliResult<Index> {
    let mut index = Index::new();
    for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (dim, coord) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid index component '{pair}', expected dim=coord"))?;
        let coord = coord
            .trim()
            .parse::<usize>()
            .with_context(|| format!("Invalid coordinate in '{pair}'"))?;
        index.set(dim.trim(), coord);
    }
    Ok(index)
}

/// Render metadata as indented JSON.
pub fn format_metadata(meta: &Metadata) -> String {
    serde_json::to_string_pretty(meta).unwrap_or_else(|_| format!("{meta:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index() {
        let index = parse_index("z=3, c=1").unwrap();
        assert_eq!(index, Index::new().with("c", 1).with("z", 3));
        assert!(parse_index("").unwrap().is_empty());
        assert!(parse_index("z").is_err());
        assert!(parse_index("z=-1").is_err());
    }

    #[test]
    fn test_format_metadata() {
        let mut meta = Metadata::new();
        meta.insert("objective".into(), "25x".into());
        assert!(format_metadata(&meta).contains("\"objective\": \"25x\""));
    }
}
