//! The daily cash pivot: one row per trade date, one averaged column per
//! tracked symbol.

use chrono::NaiveDate;
use tracing::debug;

use crate::config;
use crate::connection::{quote_ident, Connection};
use crate::error::Result;
use crate::models::{DailyCashReport, DailyCashRow};
use crate::queries::observations::ObservationQuery;
use crate::queries::normalized_source;
use crate::sql_builder::SqlBuilder;
use crate::symbol_map::SymbolMap;

// ---------------------------------------------------------------------------
// DailyQuery
// ---------------------------------------------------------------------------

/// Query interface for the pivoted daily cash report.
pub struct DailyQuery<'a> {
    conn: &'a Connection,
    map: &'a SymbolMap,
}

impl<'a> DailyQuery<'a> {
    /// Create a new `DailyQuery` bound to the given connection and symbol map.
    pub fn new(conn: &'a Connection, map: &'a SymbolMap) -> Self {
        Self { conn, map }
    }

    /// The full report: every distinct trade date in the source, newest first.
    ///
    /// Dates with no observation for a symbol get `None` in that column.
    /// Symbols outside the map are ignored.
    pub fn all(&self) -> Result<DailyCashReport> {
        self.report(None, None, None)
    }

    /// The report restricted to an inclusive trade-date window.
    pub fn range(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<DailyCashReport> {
        self.report(from, to, None)
    }

    /// The most recent trade date's row, or `None` if the source is empty.
    pub fn latest(&self) -> Result<Option<DailyCashRow>> {
        let report = self.report(None, None, Some(1))?;
        Ok(report.rows.into_iter().next())
    }

    /// The pivot SQL and its bound parameters, ordered by trade date descending.
    pub fn sql(&self) -> (String, Vec<String>) {
        let mut qb = pivot_builder(self.map);
        qb.order_by(&["trade_date DESC"]);
        qb.build()
    }

    fn report(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        limit: Option<usize>,
    ) -> Result<DailyCashReport> {
        self.conn.ensure_source()?;

        if tracing::enabled!(tracing::Level::DEBUG) {
            let untracked = ObservationQuery::new(self.conn).untracked_symbols(self.map)?;
            if !untracked.is_empty() {
                debug!(
                    count = untracked.len(),
                    "source contains symbols outside the symbol map; they are excluded"
                );
            }
        }

        let mut qb = pivot_builder(self.map);
        if let Some(from) = from {
            qb.where_date_gte("trade_date", &from.format(config::DATE_FORMAT).to_string());
        }
        if let Some(to) = to {
            qb.where_date_lte("trade_date", &to.format(config::DATE_FORMAT).to_string());
        }
        qb.order_by(&["trade_date DESC"]);
        if let Some(n) = limit {
            qb.limit(n);
        }

        let (sql, params) = qb.build();
        let rows = self.conn.execute(&sql, &params)?;
        debug!(rows = rows.len(), "evaluated daily cash pivot");

        let columns = self.map.columns().into_iter().map(String::from).collect();
        DailyCashReport::from_rows(columns, rows)
    }
}

/// Unordered pivot over the normalized source.
///
/// Each map entry becomes `AVG(CASE WHEN symbol = ? THEN value END)`; the
/// CASE yields NULL for other symbols, and AVG over no non-NULL input is NULL.
pub(crate) fn pivot_builder(map: &SymbolMap) -> SqlBuilder {
    let mut qb = SqlBuilder::from_subquery(&normalized_source(), "o");
    qb.select_expr("year(trade_date) AS \"year\"", &[]);
    qb.select_expr("month(trade_date) AS \"month\"", &[]);
    qb.select_expr("trade_date", &[]);
    for entry in map.entries() {
        qb.select_expr(
            &format!(
                "AVG(CASE WHEN symbol = ? THEN \"value\" END) AS {}",
                quote_ident(&entry.column)
            ),
            &[entry.symbol.as_str()],
        );
    }
    qb.group_by(&["year(trade_date)", "month(trade_date)", "trade_date"]);
    qb
}
