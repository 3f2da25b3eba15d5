//! Raw observation queries against the source relation.

use chrono::NaiveDate;

use crate::config;
use crate::connection::Connection;
use crate::error::Result;
use crate::models::{Observation, SymbolCount};
use crate::queries::normalized_source;
use crate::sql_builder::SqlBuilder;
use crate::symbol_map::SymbolMap;

// ---------------------------------------------------------------------------
// ObservationQuery
// ---------------------------------------------------------------------------

/// Query interface for the long-format observations.
pub struct ObservationQuery<'a> {
    conn: &'a Connection,
}

impl<'a> ObservationQuery<'a> {
    /// Create a new `ObservationQuery` bound to the given connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Observations for one symbol, ascending by date, optionally bounded
    /// (inclusive) on either side.
    pub fn history(
        &self,
        symbol: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Observation>> {
        self.conn.ensure_source()?;

        let mut qb = SqlBuilder::from_subquery(&normalized_source(), "o");
        qb.select(&["trade_date", "symbol", "\"value\""]);
        qb.where_eq("symbol", symbol);
        if let Some(from) = from {
            qb.where_date_gte("trade_date", &from.format(config::DATE_FORMAT).to_string());
        }
        if let Some(to) = to {
            qb.where_date_lte("trade_date", &to.format(config::DATE_FORMAT).to_string());
        }
        qb.order_by(&["trade_date ASC"]);

        let (sql, params) = qb.build();
        self.conn.execute_into(&sql, &params)
    }

    /// Every distinct symbol in the source with its observation count.
    pub fn symbols(&self) -> Result<Vec<SymbolCount>> {
        self.symbol_counts(&[])
    }

    /// Symbols present in the source that no map entry tracks.
    ///
    /// The pivot drops these silently; this lists what is being dropped.
    pub fn untracked_symbols(&self, map: &SymbolMap) -> Result<Vec<SymbolCount>> {
        self.symbol_counts(&map.symbols())
    }

    /// Total number of observations.
    pub fn count(&self) -> Result<i64> {
        self.conn.ensure_source()?;
        let sql = format!("SELECT COUNT(*) FROM {}", config::SOURCE_VIEW);
        let value = self.conn.execute_scalar(&sql, &[])?;
        Ok(value.and_then(|v| v.as_i64()).unwrap_or(0))
    }

    fn symbol_counts(&self, exclude: &[&str]) -> Result<Vec<SymbolCount>> {
        self.conn.ensure_source()?;

        let mut qb = SqlBuilder::new(config::SOURCE_VIEW);
        qb.select(&["CAST(symbol AS VARCHAR) AS symbol", "COUNT(*) AS observations"]);
        qb.where_not_in("symbol", exclude);
        qb.group_by(&["symbol"]);
        qb.order_by(&["symbol ASC"]);

        let (sql, params) = qb.build();
        self.conn.execute_into(&sql, &params)
    }
}
