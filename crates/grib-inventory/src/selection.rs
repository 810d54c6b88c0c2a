//! Field selection against a parsed inventory.
//!
//! Requested fields are joined to inventory records on the exact
//! `(variable, level)` pair. Only instantaneous forecasts (`6 hour fcst`) and
//! accumulations since the start of the run (`0-6 hour acc fcst`,
//! `0-1 day acc fcst`) are kept, since averaged fields share a variable and
//! level with the accumulated ones. The index occasionally lists the same
//! accumulation twice; only the first occurrence is kept.

use std::collections::HashSet;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::inventory::{Inventory, InventoryRecord};

static FORECAST_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+ hour fcst|^0-\d+ (?:hour|day) acc fcst").expect("valid forecast pattern")
});

/// Returns true if a forecast descriptor is instantaneous or accumulated
/// from the start of the run.
pub fn is_supported_forecast(descriptor: &str) -> bool {
    FORECAST_PATTERN.is_match(descriptor)
}

/// A requested field: variable short name and level, spelled exactly as
/// the inventory spells them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    pub variable: String,
    pub level: String,
}

impl FieldSpec {
    pub fn new(variable: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            level: level.into(),
        }
    }

    /// Exact, case-sensitive pair comparison.
    pub fn matches(&self, record: &InventoryRecord) -> bool {
        self.variable == record.variable && self.level == record.level
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.variable, self.level)
    }
}

/// Inventory records chosen for download, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    records: Vec<InventoryRecord>,
}

impl Selection {
    /// Select the records matching `fields`.
    pub fn select(inventory: &Inventory, fields: &[FieldSpec]) -> Self {
        let mut seen: HashSet<(&str, &str, &str)> = HashSet::new();
        let mut records = Vec::new();

        for record in inventory {
            if !fields.iter().any(|field| field.matches(record)) {
                continue;
            }
            if !is_supported_forecast(&record.forecast) {
                continue;
            }
            let key = (
                record.variable.as_str(),
                record.level.as_str(),
                record.forecast.as_str(),
            );
            if seen.insert(key) {
                records.push(record.clone());
            }
        }

        Self { records }
    }

    /// Requested fields for which nothing was selected.
    pub fn missing<'a>(&self, fields: &'a [FieldSpec]) -> Vec<&'a FieldSpec> {
        fields
            .iter()
            .filter(|field| !self.records.iter().any(|r| field.matches(r)))
            .collect()
    }

    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InventoryRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Selection {
    type Item = &'a InventoryRecord;
    type IntoIter = std::slice::Iter<'a, InventoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
