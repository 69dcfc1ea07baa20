// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Capability checks for directory-based dataset layouts.
//!
//! Directory layouts are recognized by a marker file inside the dataset
//! directory (a manifest), falling back to the directory extension when the
//! dataset does not exist yet and is about to be written.
//!
//! Probes never fail: anything unreadable simply does not match.

use std::path::Path;

use super::request::Request;

/// Whether `request` names an existing directory containing `marker`.
pub fn has_marker(request: &Request, marker: &str) -> bool {
    match request.path() {
        Some(dir) => dir.is_dir() && dir.join(marker).is_file(),
        None => false,
    }
}

/// Whether `request` names a place where a dataset with `extension` can be
/// created or updated.
///
/// The path must carry the extension and must not be an existing regular file.
/// An existing directory only qualifies if it is empty or already holds
/// `marker`.
pub fn is_writable_destination(request: &Request, extension: &str, marker: &str) -> bool {
    if request.extension().as_deref() != Some(extension) {
        return false;
    }
    let Some(dir) = request.path() else {
        return false;
    };
    if !dir.exists() {
        return true;
    }
    if !dir.is_dir() {
        return false;
    }
    dir.join(marker).is_file() || is_empty_dir(&dir)
}

fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
