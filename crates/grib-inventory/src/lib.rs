//! GRIB2 inventory handling for partial downloads.
//!
//! NOAA publishes an `.idx` sidecar next to every GRIB2 file listing the byte
//! offset of each message. This crate turns that document into the `Range`
//! header needed to fetch only the requested fields:
//!
//! - [`Inventory`] parses the `.idx` text, preserving file order
//! - [`Selection`] joins requested [`FieldSpec`]s against the inventory
//! - [`ByteRangeSet`] formats the selection as `bytes=b1-e1,b2-e2,...`
//!
//! ```
//! use grib_inventory::{ByteRangeSet, FieldSpec, Inventory, Selection};
//!
//! let idx = "1:0:d=2022082606:PRMSL:mean sea level:6 hour fcst:\n\
//!            2:400:d=2022082606:TMP:2 m above ground:6 hour fcst:\n\
//!            3:900:d=2022082606:RH:2 m above ground:6 hour fcst:\n";
//! let inventory = Inventory::parse(idx).unwrap();
//! let selection = Selection::select(&inventory, &[FieldSpec::new("TMP", "2 m above ground")]);
//! let ranges = ByteRangeSet::from_selection(&selection);
//! assert_eq!(ranges.header_value().as_deref(), Some("bytes=400-900"));
//! ```

pub mod byte_range;
pub mod error;
pub mod inventory;
pub mod selection;

// Re-exports
pub use byte_range::{ByteRange, ByteRangeSet};
pub use error::{InventoryError, Result};
pub use inventory::{Inventory, InventoryRecord};
pub use selection::{is_supported_forecast, FieldSpec, Selection};
