//! Validated download requests.
//!
//! A [`RunRequest`] holds everything the user asked for in one invocation
//! (date, cycle, forecast hours and fields). It is validated once, before
//! any network activity, and then split into one [`ForecastRequest`] per
//! forecast hour. Each worker receives its request explicitly.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use grib_inventory::FieldSpec;

use crate::error::{DownloadError, Result};

/// First forecast hour published with the 3-hourly pgrb2 files.
pub const FIRST_FORECAST_HOUR: u32 = 3;
/// Last forecast hour in the catalog.
pub const LAST_FORECAST_HOUR: u32 = 381;
/// Spacing of the catalog.
pub const FORECAST_HOUR_STEP: u32 = 3;

/// Date format used in archive paths and output file names.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// A forecast hour from the catalog `f003, f006, ..., f381`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ForecastHour(u32);

impl ForecastHour {
    pub fn new(hour: u32) -> Result<Self> {
        let in_catalog = (FIRST_FORECAST_HOUR..=LAST_FORECAST_HOUR).contains(&hour)
            && hour % FORECAST_HOUR_STEP == 0;
        if !in_catalog {
            return Err(DownloadError::Configuration(format!(
                "forecast hour {} is not in the catalog (f{:03}..f{:03}, step {})",
                hour, FIRST_FORECAST_HOUR, LAST_FORECAST_HOUR, FORECAST_HOUR_STEP
            )));
        }
        Ok(Self(hour))
    }

    /// Every forecast hour of the catalog, ascending.
    pub fn catalog() -> Vec<Self> {
        (FIRST_FORECAST_HOUR..=LAST_FORECAST_HOUR)
            .step_by(FORECAST_HOUR_STEP as usize)
            .map(Self)
            .collect()
    }

    pub fn hours(self) -> u32 {
        self.0
    }

    /// Label used in archive file names, e.g. `f006`.
    pub fn label(self) -> String {
        format!("f{:03}", self.0)
    }
}

impl fmt::Display for ForecastHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{:03}", self.0)
    }
}

impl FromStr for ForecastHour {
    type Err = DownloadError;

    /// Accepts `f006`, `006` and `6`.
    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches(|c: char| c == 'f' || c == 'F');
        let hour = digits.parse::<u32>().map_err(|_| {
            DownloadError::Configuration(format!("invalid forecast hour '{}'", s))
        })?;
        Self::new(hour)
    }
}

/// Model initialization hour (00, 06, 12 or 18 UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cycle(u8);

impl Cycle {
    pub const ALL: [u8; 4] = [0, 6, 12, 18];

    pub fn new(hour: u8) -> Result<Self> {
        if Self::ALL.contains(&hour) {
            Ok(Self(hour))
        } else {
            Err(DownloadError::Configuration(format!(
                "run must be one of 00, 06, 12, 18 (got {})",
                hour
            )))
        }
    }

    pub fn hour(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

impl FromStr for Cycle {
    type Err = DownloadError;

    fn from_str(s: &str) -> Result<Self> {
        let hour = s
            .trim()
            .parse::<u8>()
            .map_err(|_| DownloadError::Configuration(format!("invalid run '{}'", s)))?;
        Self::new(hour)
    }
}

/// Parse a `YYYYMMDD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|e| {
        DownloadError::Configuration(format!("invalid date '{}' (expected YYYYMMDD): {}", s, e))
    })
}

/// Pair parallel variable and level lists into field specs.
pub fn pair_fields<V, L>(variables: &[V], levels: &[L]) -> Result<Vec<FieldSpec>>
where
    V: AsRef<str>,
    L: AsRef<str>,
{
    if variables.len() != levels.len() {
        return Err(DownloadError::Configuration(format!(
            "variables and levels must have the same length ({} variables, {} levels)",
            variables.len(),
            levels.len()
        )));
    }
    if variables.is_empty() {
        return Err(DownloadError::Configuration(
            "at least one variable/level pair is required".to_string(),
        ));
    }

    Ok(variables
        .iter()
        .zip(levels)
        .map(|(v, l)| FieldSpec::new(v.as_ref(), l.as_ref()))
        .collect())
}

/// Everything needed to retrieve one forecast hour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRequest {
    pub date: NaiveDate,
    pub cycle: Cycle,
    pub forecast_hour: ForecastHour,
    pub fields: Vec<FieldSpec>,
}

impl ForecastRequest {
    /// Build a request from parallel variable and level lists.
    pub fn new<V, L>(
        date: NaiveDate,
        cycle: Cycle,
        forecast_hour: ForecastHour,
        variables: &[V],
        levels: &[L],
    ) -> Result<Self>
    where
        V: AsRef<str>,
        L: AsRef<str>,
    {
        Ok(Self {
            date,
            cycle,
            forecast_hour,
            fields: pair_fields(variables, levels)?,
        })
    }

    pub fn date_label(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// `grib_gfs_<date>_<run>_<fNNN>`; stable across re-runs.
    pub fn output_file_name(&self) -> String {
        format!(
            "grib_gfs_{}_{}_{}",
            self.date_label(),
            self.cycle,
            self.forecast_hour.label()
        )
    }
}

/// All forecast hours of one date/cycle, sharing the same fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub date: NaiveDate,
    pub cycle: Cycle,
    pub forecast_hours: Vec<ForecastHour>,
    pub fields: Vec<FieldSpec>,
}

impl RunRequest {
    /// Validate a run. Duplicate hours are collapsed; hours are sorted.
    pub fn new<V, L>(
        date: NaiveDate,
        cycle: Cycle,
        forecast_hours: impl IntoIterator<Item = ForecastHour>,
        variables: &[V],
        levels: &[L],
    ) -> Result<Self>
    where
        V: AsRef<str>,
        L: AsRef<str>,
    {
        let fields = pair_fields(variables, levels)?;
        let forecast_hours: Vec<ForecastHour> = forecast_hours
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if forecast_hours.is_empty() {
            return Err(DownloadError::Configuration(
                "at least one forecast hour is required".to_string(),
            ));
        }

        Ok(Self {
            date,
            cycle,
            forecast_hours,
            fields,
        })
    }

    pub fn forecast_requests(&self) -> Vec<ForecastRequest> {
        self.forecast_hours
            .iter()
            .map(|&forecast_hour| ForecastRequest {
                date: self.date,
                cycle: self.cycle,
                forecast_hour,
                fields: self.fields.clone(),
            })
            .collect()
    }
}
