// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use voxio::io::DatasetLayout;
use voxio::{DataType, DataUnit, Index, IndexSpace, Writer};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// Temporary directories
// ============================================================================

/// Create a fresh temporary directory and a guard removing it on drop.
pub fn temp_dir(name: &str) -> (PathBuf, CleanupGuard) {
    let dir = std::env::temp_dir().join(format!(
        "voxio_{}_{}_{}",
        name,
        std::process::id(),
        NEXT_DIR.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    (dir.clone(), CleanupGuard(dir))
}

/// Cleanup guard for test temporary files.
#[derive(Debug)]
pub struct CleanupGuard(PathBuf);

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Unit extent used by the fixtures.
pub const UNIT_SHAPE: [usize; 2] = [4, 3];

/// A `{c: 2, z: 3}` dataset of 4x3 uint16 planes.
pub fn cz_layout() -> DatasetLayout {
    DatasetLayout::new(
        IndexSpace::from_sizes(&[("c", 2), ("z", 3)]).unwrap(),
        DataType::UInt16,
        UNIT_SHAPE.to_vec(),
    )
}

/// Deterministic content of the unit at `index`.
pub fn unit_for(index: &Index) -> DataUnit {
    let seed = index.iter().fold(1u16, |acc, (_, c)| acc * 10 + c as u16);
    let samples: Vec<u16> = (0..12u16).map(|i| seed.wrapping_mul(100) + i).collect();
    DataUnit::from_u16(UNIT_SHAPE.to_vec(), &samples).unwrap()
}

/// Write [`unit_for`] at every index of `layout`.
pub fn fill(writer: &mut Writer, layout: &DatasetLayout) {
    for index in layout.index_space.iter() {
        writer.set_data(unit_for(&index), &index).unwrap();
    }
}
