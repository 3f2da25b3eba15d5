use serde::{Deserialize, Serialize};

use crate::config::MONTH_ABBR;

// ---------------------------------------------------------------------------
// TermBibleRow: one year of monthly averages
// ---------------------------------------------------------------------------

/// Monthly averages of one cash column for a single year.
///
/// `months[0]` is January. Values are rounded to 3 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermBibleRow {
    pub year: String,
    pub months: [Option<f64>; 12],
}

impl TermBibleRow {
    /// Look up a month by its three-letter abbreviation (`"Jan"`..`"Dec"`).
    pub fn month(&self, abbr: &str) -> Option<f64> {
        MONTH_ABBR
            .iter()
            .position(|m| *m == abbr)
            .and_then(|i| self.months[i])
    }
}

// ---------------------------------------------------------------------------
// PeriodStats: mean/min/max of monthly averages
// ---------------------------------------------------------------------------

/// Summary of the monthly averages falling in one period.
///
/// `period` is the calendar month number (1..=12) for monthly stats, or the
/// year for yearly stats. Values are rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub period: i64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PeriodStats {
    /// Three-letter month label, for monthly stats.
    pub fn month_abbr(&self) -> Option<&'static str> {
        usize::try_from(self.period)
            .ok()
            .and_then(|p| p.checked_sub(1))
            .and_then(|i| MONTH_ABBR.get(i).copied())
    }
}
