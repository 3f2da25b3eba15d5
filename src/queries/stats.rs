//! Term bible and period statistics derived from the daily pivot.
//!
//! All three queries start from the daily report (one row per trade date)
//! and first average one cash column per (year, month).

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::config::MONTH_ABBR;
use crate::connection::{quote_ident, Connection};
use crate::error::{GasCashError, Result};
use crate::models::{PeriodStats, TermBibleRow};
use crate::queries::daily::pivot_builder;
use crate::sql_builder::SqlBuilder;
use crate::symbol_map::SymbolMap;

// ---------------------------------------------------------------------------
// StatsQuery
// ---------------------------------------------------------------------------

/// Query interface for month/year summaries of one cash column.
pub struct StatsQuery<'a> {
    conn: &'a Connection,
    map: &'a SymbolMap,
}

impl<'a> StatsQuery<'a> {
    /// Create a new `StatsQuery` bound to the given connection and symbol map.
    pub fn new(conn: &'a Connection, map: &'a SymbolMap) -> Self {
        Self { conn, map }
    }

    /// Year × month table of monthly averages of `column`, rounded to 3 decimals.
    ///
    /// Years ascend. Years with no value for `column` at all are omitted;
    /// months without data are `None`.
    pub fn term_bible(&self, column: &str) -> Result<Vec<TermBibleRow>> {
        let symbol = self.map.require_column(column)?;
        self.conn.ensure_source()?;

        let col = quote_ident(column);
        let mut qb = self.with_daily();
        qb.select_expr("\"year\"", &[]);
        for (i, abbr) in MONTH_ABBR.iter().enumerate() {
            qb.select_expr(
                &format!(
                    "ROUND(AVG({}) FILTER (WHERE \"month\" = {}), 3) AS {}",
                    col,
                    i + 1,
                    quote_ident(abbr)
                ),
                &[],
            );
        }
        qb.group_by(&["\"year\""]);
        qb.having(&format!("COUNT({}) > 0", col), &[]);
        qb.order_by(&["\"year\" ASC"]);

        let (sql, params) = qb.build();
        let rows = self.conn.execute(&sql, &params)?;
        debug!(column, symbol, years = rows.len(), "evaluated term bible");
        rows.iter().map(term_bible_row).collect()
    }

    /// Mean, min and max of the monthly averages of `column`, per calendar month.
    ///
    /// `period` is the month number; rows ascend by month.
    pub fn monthly_stats(&self, column: &str) -> Result<Vec<PeriodStats>> {
        self.period_stats(column, "month")
    }

    /// Mean, min and max of the monthly averages of `column`, per year.
    ///
    /// `period` is the year; rows ascend by year.
    pub fn yearly_stats(&self, column: &str) -> Result<Vec<PeriodStats>> {
        self.period_stats(column, "year")
    }

    fn period_stats(&self, column: &str, period: &str) -> Result<Vec<PeriodStats>> {
        let symbol = self.map.require_column(column)?;
        self.conn.ensure_source()?;

        let monthly = format!(
            "SELECT \"year\", \"month\", AVG({}) AS avg_price FROM daily GROUP BY \"year\", \"month\"",
            quote_ident(column)
        );

        let period_col = quote_ident(period);
        let period_sel = format!("{} AS period", period_col);
        let period_order = format!("{} ASC", period_col);
        let (daily_sql, daily_params) = pivot_builder(self.map).build();

        let mut qb = SqlBuilder::new("monthly");
        qb.with("daily", &daily_sql, &daily_params);
        qb.with("monthly", &monthly, &[]);
        qb.select(&[
            period_sel.as_str(),
            "ROUND(AVG(avg_price), 2) AS mean",
            "ROUND(MIN(avg_price), 2) AS \"min\"",
            "ROUND(MAX(avg_price), 2) AS \"max\"",
        ]);
        qb.group_by(&[period_col.as_str()]);
        qb.order_by(&[period_order.as_str()]);

        let (sql, params) = qb.build();
        debug!(column, symbol, period, "evaluating period stats");
        self.conn.execute_into(&sql, &params)
    }

    fn with_daily(&self) -> SqlBuilder {
        let (daily_sql, daily_params) = pivot_builder(self.map).build();
        let mut qb = SqlBuilder::new("daily");
        qb.with("daily", &daily_sql, &daily_params);
        qb
    }
}

fn term_bible_row(row: &HashMap<String, Value>) -> Result<TermBibleRow> {
    let year = row
        .get("year")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| GasCashError::InvalidData("term bible row has no year".into()))?;
    let mut months = [None; 12];
    for (slot, abbr) in months.iter_mut().zip(MONTH_ABBR.iter()) {
        *slot = row.get(*abbr).and_then(|v| v.as_f64());
    }
    Ok(TermBibleRow {
        year: year.to_string(),
        months,
    })
}
