//! Error types for the grib-inventory crate.

use thiserror::Error;

/// Errors raised while parsing an `.idx` inventory document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Malformed inventory line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("Byte offsets not increasing at line {line}: {current} follows {previous}")]
    NonMonotonicOffsets {
        line: usize,
        previous: u64,
        current: u64,
    },

    #[error("Inventory document contains no records")]
    Empty,
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
