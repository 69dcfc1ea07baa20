// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI integration tests.
//!
//! These tests run the actual voxio binary and verify its behavior.

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;

use common::{cz_layout, fill, temp_dir, unit_for};
use voxio::{FormatManager, Index, Request, SessionOptions};

/// Get the path to the built voxio binary
fn voxio_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    // The test binary is in target/debug/deps/
    // The voxio binary is in target/debug/
    path.pop(); // deps
    path.pop(); // debug or release
    path.push("voxio");
    path
}

/// Run voxio with arguments
fn run(args: &[&str]) -> Output {
    let bin = voxio_bin();
    Command::new(&bin)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|_| panic!("Failed to run {:?}", bin))
}

/// Run voxio and assert success
fn run_ok(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "Command failed: {:?}\nstdout: {}\nstderr: {}",
        args,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run voxio and assert failure
fn run_err(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        !output.status.success(),
        "Command should have failed but succeeded: {:?}",
        args
    );
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Write the fixture dataset to `path` through the library.
fn write_dataset(path: &Path) {
    let layout = cz_layout();
    let registry = FormatManager::with_builtin_formats();
    let mut writer = registry
        .open_writer(
            Arc::new(Request::from_path(path)),
            &SessionOptions::new().layout(layout.clone()),
        )
        .unwrap();
    fill(&mut writer, &layout);
    writer.close().unwrap();
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    let output = run_ok(&["--help"]);
    assert!(output.contains("Dataset format registry toolkit"));
    assert!(output.contains("formats"));
    assert!(output.contains("inspect"));
    assert!(output.contains("convert"));
}

#[test]
fn test_cli_version() {
    let output = run_ok(&["--version"]);
    assert!(output.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_formats() {
    let output = run_ok(&["formats"]);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("memory - "));
    assert!(lines[1].starts_with("chunked - "));
    assert!(lines[2].starts_with("stack - "));

    let names = run_ok(&["formats", "--names"]);
    assert_eq!(names.trim(), "memory\nchunked\nstack");
}

#[test]
fn test_cli_formats_with_config() {
    let (dir, _guard) = temp_dir("cli_config");
    let config = dir.join("voxio.toml");
    fs::write(&config, "formats = [\"stack\"]\ndisabled = [\"memory\"]\n").unwrap();

    let names = run_ok(&["--config", config.to_str().unwrap(), "formats", "--names"]);
    assert_eq!(names.trim(), "stack\nchunked");

    fs::write(&config, "formats = [\"tiff\"]\n").unwrap();
    let stderr = run_err(&["--config", config.to_str().unwrap(), "formats"]);
    assert!(stderr.contains("tiff"));

    let stderr = run_err(&["--config", "/nonexistent/voxio.toml", "formats"]);
    assert!(stderr.contains("Error"));
}

// ============================================================================
// Inspect
// ============================================================================

#[test]
fn test_cli_inspect() {
    let (dir, _guard) = temp_dir("cli_inspect");
    let dataset = dir.join("cells.zarr");
    write_dataset(&dataset);

    let output = run_ok(&["inspect", dataset.to_str().unwrap(), "--unit", "c=1,z=2"]);
    assert!(output.contains("Format: chunked"));
    assert!(output.contains("Index space: (c: 2, z: 3)"));
    assert!(output.contains("Units: 6"));
    assert!(output.contains("\"dtype\": \"uint16\""));
    assert!(output.contains("\"chunk_key\": \"1.2\""));

    let listing = run_ok(&["inspect", dataset.to_str().unwrap(), "--units"]);
    assert!(listing.contains("{c=0, z=0}"));
    assert!(listing.contains("{c=1, z=2}"));
}

#[test]
fn test_cli_inspect_unknown_location() {
    let (dir, _guard) = temp_dir("cli_inspect_missing");
    let stderr = run_err(&["inspect", dir.join("nothing.zarr").to_str().unwrap()]);
    assert!(stderr.contains("No format can read"));
}

#[test]
fn test_cli_inspect_bad_unit() {
    let (dir, _guard) = temp_dir("cli_inspect_bad_unit");
    let dataset = dir.join("cells.stack");
    write_dataset(&dataset);
    let stderr = run_err(&["inspect", dataset.to_str().unwrap(), "--unit", "c=5,z=0"]);
    assert!(stderr.contains("Invalid index"));
}

// ============================================================================
// Convert
// ============================================================================

#[test]
fn test_cli_convert() {
    let (dir, _guard) = temp_dir("cli_convert");
    let source = dir.join("cells.stack");
    let target = dir.join("out").join("cells.zarr");
    write_dataset(&source);

    let stderr = run_err(&[
        "convert",
        source.to_str().unwrap(),
        target.to_str().unwrap(),
    ]);
    assert!(stderr.contains("does not exist"));

    let output = run_ok(&[
        "convert",
        source.to_str().unwrap(),
        target.to_str().unwrap(),
        "--create-parents",
        "--compression-level",
        "1",
        "-o",
        "dimension_separator=/",
    ]);
    assert!(output.contains("Converted 6 units"));
    assert!(target.join("1/2").is_file());

    let registry = FormatManager::with_builtin_formats();
    let mut reader = registry
        .open_reader(Arc::new(Request::from_path(&target)), &SessionOptions::new())
        .unwrap();
    assert_eq!(reader.format().name(), "chunked");
    let index = Index::new().with("c", 1).with("z", 0);
    assert_eq!(reader.get_data(&index).unwrap(), unit_for(&index));

    // An existing destination with a different layout needs --overwrite.
    let other = dir.join("other.stack");
    write_dataset(&other);
    fs::write(
        other.join("stack.json"),
        r#"{"layout":{"index_space":[{"name":"t","size":1}],"dtype":"uint8","unit_shape":[1]}}"#,
    )
    .unwrap();
    let stderr = run_err(&["convert", target.to_str().unwrap(), other.to_str().unwrap()]);
    assert!(stderr.contains("layout differs"));
    run_ok(&[
        "convert",
        target.to_str().unwrap(),
        other.to_str().unwrap(),
        "--overwrite",
    ]);
    assert!(other.join("c0001_z0002.raw").is_file());
}
