//! HTTP `Range` header assembly from a selection.
//!
//! Ranges are emitted in selection order, one per selected message, without
//! sorting or merging. The end of each range is the start offset of the
//! following message, so consecutive messages touch at one byte; the archive
//! accepts this. A message with no known end (the last one in the file)
//! becomes an open range, read to end of file.

use std::fmt;

use crate::inventory::InventoryRecord;
use crate::selection::Selection;

/// One `begin-end` entry of a `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub begin: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    pub fn new(begin: u64, end: Option<u64>) -> Self {
        Self { begin, end }
    }
}

impl From<&InventoryRecord> for ByteRange {
    fn from(record: &InventoryRecord) -> Self {
        Self::new(record.byte_begin, record.byte_end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}-{}", self.begin, end),
            None => write!(f, "{}-", self.begin),
        }
    }
}

/// Ordered byte ranges for a single ranged request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteRangeSet {
    ranges: Vec<ByteRange>,
}

impl ByteRangeSet {
    pub fn from_selection(selection: &Selection) -> Self {
        Self {
            ranges: selection.iter().map(ByteRange::from).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Value for the `Range` header, or `None` when there is nothing to fetch.
    pub fn header_value(&self) -> Option<String> {
        if self.ranges.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl FromIterator<ByteRange> for ByteRangeSet {
    fn from_iter<I: IntoIterator<Item = ByteRange>>(iter: I) -> Self {
        Self {
            ranges: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ByteRangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("bytes=")?;
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", range)?;
        }
        Ok(())
    }
}
