// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Dataset location handle.

use std::fmt;
use std::path::{Path, PathBuf};

/// Immutable reference to a dataset location.
///
/// A location is either a filesystem path or a `scheme://target` string.
/// `file://` locations are treated as plain paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Request {
    location: String,
}

impl Request {
    /// Create a request for a location.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }

    /// Create a request for a filesystem path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        Self::new(path.as_ref().to_string_lossy().into_owned())
    }

    /// The location as given.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// URI scheme, if the location has one other than `file`.
    pub fn scheme(&self) -> Option<&str> {
        match self.location.split_once("://") {
            Some(("file", _)) | None => None,
            Some((scheme, _)) => Some(scheme),
        }
    }

    /// Part of the location after `scheme://`, or the whole location.
    pub fn target(&self) -> &str {
        self.location
            .split_once("://")
            .map(|(_, target)| target)
            .unwrap_or(&self.location)
    }

    /// Filesystem path, for plain and `file://` locations.
    pub fn path(&self) -> Option<PathBuf> {
        if self.scheme().is_some() {
            return None;
        }
        Some(PathBuf::from(self.target()))
    }

    /// Lowercased extension of the filesystem path, if any.
    pub fn extension(&self) -> Option<String> {
        self.path()?
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.location)
    }
}

impl From<&str> for Request {
    fn from(location: &str) -> Self {
        Request::new(location)
    }
}

impl From<&Path> for Request {
    fn from(path: &Path) -> Self {
        Request::from_path(path)
    }
}
