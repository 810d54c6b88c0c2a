//! Parser for GRIB2 `.idx` inventory documents.
//!
//! Each line of an inventory describes one GRIB message stored contiguously
//! in the companion binary file:
//!
//! ```text
//! 1:0:d=2022082606:PRMSL:mean sea level:anl:
//! 2:990253:d=2022082606:CLWMR:1 hybrid level:anl:
//! 596:418003711:d=2022082606:TMP:2 m above ground:6 hour fcst:
//! ```
//!
//! Columns are message number, byte offset, reference date, variable, level,
//! forecast descriptor and an optional ensemble member tag. Line order is
//! file order and is preserved exactly.

use std::str::FromStr;

use tracing::debug;

use crate::error::{InventoryError, Result};

/// Minimum number of colon-separated columns in an inventory line.
const MIN_COLUMNS: usize = 6;

/// One message of the binary file, as described by the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryRecord {
    /// Message number (e.g. "596", or "80.2" for a sub-message)
    pub message_number: String,
    /// Offset of the first byte of the message
    pub byte_begin: u64,
    /// Offset where the next message starts; `None` for the last message
    pub byte_end: Option<u64>,
    /// Reference date with the `d=` prefix removed (e.g. "2022082606")
    pub message_date: String,
    /// Variable short name (e.g. "TMP")
    pub variable: String,
    /// Level descriptor (e.g. "2 m above ground")
    pub level: String,
    /// Forecast descriptor (e.g. "6 hour fcst", "0-6 hour acc fcst")
    pub forecast: String,
    /// Ensemble member tag, when present
    pub member: Option<String>,
}

/// Ordered list of inventory records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    records: Vec<InventoryRecord>,
}

impl Inventory {
    /// Parse the full text of an `.idx` document.
    ///
    /// Blank lines are skipped. Every other line must have at least six
    /// columns and an integer byte offset, and offsets must never decrease.
    pub fn parse(text: &str) -> Result<Self> {
        let mut records: Vec<InventoryRecord> = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim_end();
            if line.trim().is_empty() {
                continue;
            }

            let record = parse_line(line, line_no)?;

            if let Some(previous) = records.last() {
                if record.byte_begin < previous.byte_begin {
                    return Err(InventoryError::NonMonotonicOffsets {
                        line: line_no,
                        previous: previous.byte_begin,
                        current: record.byte_begin,
                    });
                }
            }

            records.push(record);
        }

        if records.is_empty() {
            return Err(InventoryError::Empty);
        }

        assign_byte_ends(&mut records);

        debug!(records = records.len(), "Parsed inventory");
        Ok(Self { records })
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

impl FromStr for Inventory {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a InventoryRecord;
    type IntoIter = std::slice::Iter<'a, InventoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn parse_line(line: &str, line_no: usize) -> Result<InventoryRecord> {
    // Anything after the forecast column belongs to the member tag.
    let columns: Vec<&str> = line.splitn(MIN_COLUMNS + 1, ':').collect();
    if columns.len() < MIN_COLUMNS {
        return Err(InventoryError::MalformedLine {
            line: line_no,
            reason: format!(
                "expected at least {} columns, found {}",
                MIN_COLUMNS,
                columns.len()
            ),
        });
    }

    let byte_begin = columns[1]
        .trim()
        .parse::<u64>()
        .map_err(|e| InventoryError::MalformedLine {
            line: line_no,
            reason: format!("invalid byte offset '{}': {}", columns[1], e),
        })?;

    let message_date = columns[2].trim();
    let message_date = message_date.strip_prefix("d=").unwrap_or(message_date);

    let member = columns
        .get(MIN_COLUMNS)
        .map(|m| m.trim().trim_end_matches(':'))
        .filter(|m| !m.is_empty())
        .map(str::to_string);

    Ok(InventoryRecord {
        message_number: columns[0].trim().to_string(),
        byte_begin,
        byte_end: None,
        message_date: message_date.to_string(),
        variable: columns[3].to_string(),
        level: columns[4].to_string(),
        forecast: columns[5].to_string(),
        member,
    })
}

/// Each message ends where the next message with a greater offset begins.
///
/// Sub-messages (`80.1`, `80.2`) share an offset with their siblings, so the
/// end is the next *distinct* offset rather than the next line. The final
/// message has no known end.
fn assign_byte_ends(records: &mut [InventoryRecord]) {
    let mut following: Option<(u64, Option<u64>)> = None;

    for record in records.iter_mut().rev() {
        let end = match following {
            Some((next_begin, _)) if next_begin > record.byte_begin => Some(next_begin),
            Some((_, next_end)) => next_end,
            None => None,
        };
        record.byte_end = end;
        following = Some((record.byte_begin, end));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
1:0:d=2022082606:PRMSL:mean sea level:anl:
2:990253:d=2022082606:CLWMR:1 hybrid level:anl:
3:1250000:d=2022082606:TMP:2 m above ground:6 hour fcst:
";

    #[test]
    fn test_parse_preserves_order_and_columns() {
        let inventory = Inventory::parse(SAMPLE).unwrap();
        assert_eq!(inventory.len(), 3);

        let first = &inventory.records()[0];
        assert_eq!(first.message_number, "1");
        assert_eq!(first.byte_begin, 0);
        assert_eq!(first.message_date, "2022082606");
        assert_eq!(first.variable, "PRMSL");
        assert_eq!(first.level, "mean sea level");
        assert_eq!(first.forecast, "anl");
        assert_eq!(first.member, None);

        let names: Vec<&str> = inventory.iter().map(|r| r.variable.as_str()).collect();
        assert_eq!(names, vec!["PRMSL", "CLWMR", "TMP"]);
    }

    #[test]
    fn test_byte_end_is_next_begin() {
        let inventory = Inventory::parse(SAMPLE).unwrap();
        let ends: Vec<Option<u64>> = inventory.iter().map(|r| r.byte_end).collect();
        assert_eq!(ends, vec![Some(990253), Some(1250000), None]);
    }

    #[test]
    fn test_sub_messages_share_the_next_distinct_offset() {
        let text = "\
79:100:d=2022082606:HGT:500 mb:6 hour fcst:
80.1:200:d=2022082606:UGRD:10 m above ground:6 hour fcst:
80.2:200:d=2022082606:VGRD:10 m above ground:6 hour fcst:
81:300:d=2022082606:TMP:2 m above ground:6 hour fcst:
";
        let inventory = Inventory::parse(text).unwrap();
        let ends: Vec<Option<u64>> = inventory.iter().map(|r| r.byte_end).collect();
        assert_eq!(ends, vec![Some(200), Some(300), Some(300), None]);
    }

    #[test]
    fn test_member_column() {
        let text = "1:0:d=2022082606:TMP:2 m above ground:6 hour fcst:ENS=+1\n";
        let inventory = Inventory::parse(text).unwrap();
        assert_eq!(inventory.records()[0].member.as_deref(), Some("ENS=+1"));
    }

    #[test]
    fn test_line_without_trailing_colon() {
        let text = "1:0:d=2022082606:TMP:2 m above ground:6 hour fcst\r\n";
        let inventory = Inventory::parse(text).unwrap();
        assert_eq!(inventory.records()[0].forecast, "6 hour fcst");
        assert_eq!(inventory.records()[0].member, None);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let text = "\n1:0:d=2022082606:TMP:2 m above ground:6 hour fcst:\n\n";
        assert_eq!(Inventory::parse(text).unwrap().len(), 1);
    }

    #[test]
    fn test_too_few_columns() {
        let text = "1:0:d=2022082606:PRMSL:mean sea level:anl:\n2:990253:d=2022082606\n";
        match Inventory::parse(text) {
            Err(InventoryError::MalformedLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected MalformedLine, got {:?}", other),
        }
    }

    #[test]
    fn test_non_integer_offset() {
        let text = "1:abc:d=2022082606:PRMSL:mean sea level:anl:\n";
        assert!(matches!(
            Inventory::parse(text),
            Err(InventoryError::MalformedLine { line: 1, .. })
        ));
    }

    #[test]
    fn test_decreasing_offsets() {
        let text = "\
1:500:d=2022082606:PRMSL:mean sea level:anl:
2:100:d=2022082606:TMP:2 m above ground:6 hour fcst:
";
        assert_eq!(
            Inventory::parse(text),
            Err(InventoryError::NonMonotonicOffsets {
                line: 2,
                previous: 500,
                current: 100,
            })
        );
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(Inventory::parse(""), Err(InventoryError::Empty));
        assert_eq!("\n\n".parse::<Inventory>(), Err(InventoryError::Empty));
    }
}
