use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use crate::config;
use crate::error::{GasCashError, Result};

// ---------------------------------------------------------------------------
// DailyCashRow: one trade date of the pivoted report
// ---------------------------------------------------------------------------

/// Averaged cash prices for one trade date.
///
/// `prices` is aligned with [`DailyCashReport::columns`]; `None` means no
/// observation for that symbol on that date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCashRow {
    pub year: i32,
    pub month: u32,
    pub trade_date: NaiveDate,
    pub prices: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// DailyCashReport: the whole wide-format table
// ---------------------------------------------------------------------------

/// Wide-format daily cash report, rows descending by trade date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCashReport {
    pub columns: Vec<String>,
    pub rows: Vec<DailyCashRow>,
}

impl DailyCashReport {
    /// Assemble a report from raw query rows keyed by column name.
    pub(crate) fn from_rows(
        columns: Vec<String>,
        raw: Vec<HashMap<String, Value>>,
    ) -> Result<Self> {
        let mut rows = Vec::with_capacity(raw.len());
        for row in raw {
            let year = int_field(&row, "year")?;
            let month = int_field(&row, "month")?;
            let date_str = row
                .get("trade_date")
                .and_then(|v| v.as_str())
                .ok_or_else(|| GasCashError::InvalidData("row has no trade_date".into()))?;
            let trade_date = NaiveDate::parse_from_str(date_str, config::DATE_FORMAT)?;
            let prices = columns
                .iter()
                .map(|c| row.get(c).and_then(|v| v.as_f64()))
                .collect();

            rows.push(DailyCashRow {
                year: i32::try_from(year)
                    .map_err(|_| GasCashError::InvalidData(format!("year {} out of range", year)))?,
                month: u32::try_from(month)
                    .map_err(|_| GasCashError::InvalidData(format!("month {} out of range", month)))?,
                trade_date,
                prices,
            });
        }
        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in each row's `prices`.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// The row for a trade date, if that date is present in the source.
    pub fn row(&self, trade_date: NaiveDate) -> Option<&DailyCashRow> {
        self.rows.iter().find(|r| r.trade_date == trade_date)
    }

    /// Averaged price of `column` on `trade_date`.
    pub fn price(&self, trade_date: NaiveDate, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.row(trade_date).and_then(|r| r.prices[idx])
    }

    /// All values of one column, in row order.
    pub fn column(&self, column: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|r| r.prices[idx]).collect())
    }

    pub fn trade_dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.trade_date).collect()
    }
}

fn int_field(row: &HashMap<String, Value>, name: &str) -> Result<i64> {
    row.get(name)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| GasCashError::InvalidData(format!("row has no integer '{}'", name)))
}
