//! Inventory-to-range tests over realistic GFS inventories.

use grib_inventory::{ByteRangeSet, FieldSpec, Inventory, Selection};
use test_utils::fixtures::{GFS_F006_IDX, GFS_F012_IDX};

fn fields(pairs: &[(&str, &str)]) -> Vec<FieldSpec> {
    pairs.iter().map(|(v, l)| FieldSpec::new(*v, *l)).collect()
}

fn header(idx: &str, pairs: &[(&str, &str)]) -> Option<String> {
    let inventory = Inventory::parse(idx).unwrap();
    let selection = Selection::select(&inventory, &fields(pairs));
    ByteRangeSet::from_selection(&selection).header_value()
}

// ============================================================================
// Range headers
// ============================================================================

#[test]
fn test_f006_surface_temperature() {
    assert_eq!(
        header(GFS_F006_IDX, &[("TMP", "2 m above ground")]).as_deref(),
        Some("bytes=500-650")
    );
}

#[test]
fn test_f006_averaged_precipitation_excluded() {
    assert_eq!(
        header(GFS_F006_IDX, &[("APCP", "surface")]).as_deref(),
        Some("bytes=800-900")
    );
}

#[test]
fn test_ranges_follow_file_order_not_request_order() {
    assert_eq!(
        header(
            GFS_F006_IDX,
            &[("UGRD", "10 m above ground"), ("PRMSL", "mean sea level")]
        )
        .as_deref(),
        Some("bytes=0-200,1000-1100")
    );
}

#[test]
fn test_f012_keeps_first_duplicate_accumulation() {
    assert_eq!(
        header(GFS_F012_IDX, &[("APCP", "surface")]).as_deref(),
        Some("bytes=600-700")
    );
}

#[test]
fn test_unknown_field_yields_no_header() {
    assert_eq!(header(GFS_F006_IDX, &[("CAPE", "surface")]), None);
}

// ============================================================================
// Selection size
// ============================================================================

#[test]
fn test_selection_is_subset_of_requested_pairs() {
    let requested = fields(&[
        ("PRMSL", "mean sea level"),
        ("HGT", "500 mb"),
        ("TMP", "2 m above ground"),
        ("APCP", "surface"),
        ("UGRD", "10 m above ground"),
        ("VGRD", "10 m above ground"),
    ]);

    for idx in [GFS_F006_IDX, GFS_F012_IDX] {
        let inventory = Inventory::parse(idx).unwrap();
        for n in 0..=requested.len() {
            let selection = Selection::select(&inventory, &requested[..n]);
            assert!(selection.len() <= n);
            assert!(selection.len() <= inventory.len());
            for record in &selection {
                assert!(
                    requested[..n].iter().any(|field| field.matches(record)),
                    "{}:{} was not requested",
                    record.variable,
                    record.level
                );
            }
        }
    }
}

#[test]
fn test_missing_fields_reported() {
    let inventory = Inventory::parse(GFS_F012_IDX).unwrap();
    let requested = fields(&[("TMP", "2 m above ground"), ("HGT", "500 mb")]);
    let selection = Selection::select(&inventory, &requested);

    let missing: Vec<String> = selection
        .missing(&requested)
        .iter()
        .map(|f| f.to_string())
        .collect();
    assert_eq!(missing, vec!["HGT:500 mb"]);
}
