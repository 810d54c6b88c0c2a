//! Per-run outcome aggregation.

use std::collections::BTreeMap;

use crate::download::RetrievalOutcome;
use crate::error::RetrievalError;
use crate::request::ForecastHour;

/// Outcome of every forecast hour in a run, keyed by hour.
#[derive(Debug, Default)]
pub struct RunReport {
    outcomes: BTreeMap<ForecastHour, RetrievalOutcome>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, hour: ForecastHour, outcome: RetrievalOutcome) {
        self.outcomes.insert(hour, outcome);
    }

    pub fn get(&self, hour: ForecastHour) -> Option<&RetrievalOutcome> {
        self.outcomes.get(&hour)
    }

    /// Outcomes in ascending forecast-hour order.
    pub fn outcomes(&self) -> impl Iterator<Item = (ForecastHour, &RetrievalOutcome)> {
        self.outcomes.iter().map(|(hour, outcome)| (*hour, outcome))
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Files written with a non-empty payload.
    pub fn written(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                RetrievalOutcome::Written {
                    empty_after_retries: false,
                    ..
                }
            )
        })
    }

    /// Files written empty after exhausting retries.
    pub fn empty(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                RetrievalOutcome::Written {
                    empty_after_retries: true,
                    ..
                }
            )
        })
    }

    pub fn nothing_to_fetch(&self) -> usize {
        self.count(|o| matches!(o, RetrievalOutcome::NothingToFetch))
    }

    pub fn failed(&self) -> usize {
        self.count(RetrievalOutcome::is_failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = (ForecastHour, &RetrievalError)> {
        self.outcomes.iter().filter_map(|(hour, outcome)| match outcome {
            RetrievalOutcome::Failed(e) => Some((*hour, e)),
            _ => None,
        })
    }

    /// Failure counts grouped by [`RetrievalError::kind`].
    pub fn failures_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for (_, error) in self.failures() {
            *counts.entry(error.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// True when no hour failed. Empty payloads and empty selections count
    /// as success.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    fn count(&self, predicate: impl Fn(&RetrievalOutcome) -> bool) -> usize {
        self.outcomes.values().filter(|&o| predicate(o)).count()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn hour(h: u32) -> ForecastHour {
        ForecastHour::new(h).unwrap()
    }

    fn written(empty: bool) -> RetrievalOutcome {
        RetrievalOutcome::Written {
            path: PathBuf::from("/tmp/out"),
            bytes: if empty { 0 } else { 10 },
            attempts: 1,
            empty_after_retries: empty,
        }
    }

    #[test]
    fn test_counts() {
        let mut report = RunReport::new();
        report.record(hour(3), written(false));
        report.record(hour(6), written(true));
        report.record(hour(9), RetrievalOutcome::NothingToFetch);
        report.record(
            hour(12),
            RetrievalOutcome::Failed(RetrievalError::Forbidden { url: "u".into() }),
        );
        report.record(
            hour(15),
            RetrievalOutcome::Failed(RetrievalError::Forbidden { url: "v".into() }),
        );

        assert_eq!(report.total(), 5);
        assert_eq!(report.written(), 1);
        assert_eq!(report.empty(), 1);
        assert_eq!(report.nothing_to_fetch(), 1);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.failures_by_kind().get("forbidden"), Some(&2));
        assert!(!report.is_success());
    }

    #[test]
    fn test_outcomes_are_ordered_by_hour() {
        let mut report = RunReport::new();
        report.record(hour(12), written(false));
        report.record(hour(3), written(false));
        report.record(hour(6), RetrievalOutcome::NothingToFetch);

        let hours: Vec<u32> = report.outcomes().map(|(h, _)| h.hours()).collect();
        assert_eq!(hours, vec![3, 6, 12]);
        assert!(report.is_success());
    }
}
