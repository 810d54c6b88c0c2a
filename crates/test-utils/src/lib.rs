//! Shared test utilities for the gfs-download workspace.
//!
//! This crate provides common testing infrastructure including:
//! - `.idx` inventory fixtures and matching GRIB payload bytes
//! - An in-process mock of the NOMADS archive with scripted responses
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../../crates/test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, MockArchive, MockResponse};
//! ```

pub mod fixtures;
pub mod mock_archive;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use mock_archive::{MockArchive, MockResponse};

/// Creates a temporary directory for downloaded files.
///
/// The directory is removed when the returned guard is dropped.
pub fn temp_output_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("gfs-download-test-")
        .tempdir()
        .expect("Failed to create temporary output directory")
}
