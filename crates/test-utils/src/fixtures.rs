//! Common test fixtures for inventory and download tests.
//!
//! The inventories mimic the layout of NOMADS `gfs.tCCz.pgrb2.0p25.fFFF.idx`
//! files, shortened to a handful of messages with small offsets so that a
//! matching payload can be held in memory.

/// Common cycle and date values.
pub mod run {
    /// Reference date used throughout the fixtures
    pub const DATE: &str = "20220826";

    /// Reference cycle
    pub const CYCLE: &str = "06";
}

/// Length of [`payload`] in bytes.
pub const PAYLOAD_LEN: usize = 1200;

/// Inventory for f006.
///
/// `TMP:2 m above ground` is the instantaneous message at `[500, 650)`; the
/// averaged `TMP` message that follows it must never be selected.
pub const GFS_F006_IDX: &str = "\
1:0:d=2022082606:PRMSL:mean sea level:6 hour fcst:
2:200:d=2022082606:HGT:500 mb:6 hour fcst:
3:500:d=2022082606:TMP:2 m above ground:6 hour fcst:
4:650:d=2022082606:TMP:2 m above ground:0-6 hour ave fcst:
5:800:d=2022082606:APCP:surface:0-6 hour acc fcst:
6:900:d=2022082606:APCP:surface:0-6 hour ave fcst:
7:1000:d=2022082606:UGRD:10 m above ground:6 hour fcst:
8:1100:d=2022082606:VGRD:10 m above ground:6 hour fcst:
";

/// Inventory for f012, with the duplicated accumulation NOMADS sometimes
/// publishes.
pub const GFS_F012_IDX: &str = "\
1:0:d=2022082606:PRMSL:mean sea level:12 hour fcst:
2:300:d=2022082606:TMP:2 m above ground:12 hour fcst:
3:450:d=2022082606:APCP:surface:6-12 hour acc fcst:
4:600:d=2022082606:APCP:surface:0-12 hour acc fcst:
5:700:d=2022082606:APCP:surface:0-12 hour acc fcst:
6:850:d=2022082606:UGRD:10 m above ground:12 hour fcst:
";

/// An inventory line with too few columns.
pub const MALFORMED_IDX: &str = "\
1:0:d=2022082606:PRMSL:mean sea level:6 hour fcst:
2:200:d=2022082606
";

/// Deterministic payload standing in for a GRIB2 file.
pub fn payload() -> Vec<u8> {
    (0..PAYLOAD_LEN).map(|i| (i % 251) as u8).collect()
}

/// Bytes covered by an inclusive HTTP range over [`payload`].
pub fn payload_range(begin: usize, end_inclusive: usize) -> Vec<u8> {
    payload()[begin..=end_inclusive.min(PAYLOAD_LEN - 1)].to_vec()
}

/// Archive path of a GFS file, relative to the archive root.
pub fn gfs_path(date: &str, cycle: &str, forecast_hour: u32) -> String {
    format!(
        "/gfs.{}/{}/atmos/gfs.t{}z.pgrb2.0p25.f{:03}",
        date, cycle, cycle, forecast_hour
    )
}
