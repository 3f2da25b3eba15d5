//! Writing the daily report to disk through DuckDB's `COPY`.
//!
//! `COPY` cannot bind parameters, so the pivot is first materialized into a
//! temporary table with a parameterized `INSERT ... SELECT`, copied out, and
//! dropped.

use std::path::Path;

use tracing::info;

use crate::connection::{quote_ident, sql_path, Connection};
use crate::error::Result;
use crate::queries::daily::pivot_builder;
use crate::symbol_map::SymbolMap;

const EXPORT_TABLE: &str = "daily_cash_export";

/// On-disk format for an exported report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Snappy-compressed parquet.
    Parquet,
    /// Comma-separated with a header row.
    Csv,
}

impl ExportFormat {
    fn copy_options(self) -> &'static str {
        match self {
            ExportFormat::Parquet => "FORMAT PARQUET, COMPRESSION SNAPPY",
            ExportFormat::Csv => "FORMAT CSV, HEADER",
        }
    }

    /// Pick a format from a file extension (`parquet` or `csv`).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => Some(ExportFormat::Parquet),
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

/// Write the full daily report, newest trade date first, to `path`.
///
/// Returns the number of rows written.
pub fn export_daily<P: AsRef<Path>>(
    conn: &Connection,
    map: &SymbolMap,
    path: P,
    format: ExportFormat,
) -> Result<usize> {
    conn.ensure_source()?;

    let mut columns = vec![
        "\"year\" BIGINT".to_string(),
        "\"month\" BIGINT".to_string(),
        "trade_date DATE".to_string(),
    ];
    columns.extend(
        map.columns()
            .into_iter()
            .map(|c| format!("{} DOUBLE", quote_ident(c))),
    );

    conn.raw().execute_batch(&format!(
        "CREATE OR REPLACE TEMP TABLE {} ({})",
        EXPORT_TABLE,
        columns.join(", ")
    ))?;

    let result = (|| -> Result<usize> {
        let mut qb = pivot_builder(map);
        qb.order_by(&["trade_date DESC"]);
        let (select_sql, params) = qb.build();
        let rows = conn.execute_statement(
            &format!("INSERT INTO {} {}", EXPORT_TABLE, select_sql),
            &params,
        )?;

        let dest = sql_path(&path.as_ref().to_string_lossy());
        conn.raw().execute_batch(&format!(
            "COPY (SELECT * FROM {} ORDER BY trade_date DESC) TO '{}' ({})",
            EXPORT_TABLE,
            dest,
            format.copy_options()
        ))?;
        info!(path = %dest, rows, ?format, "exported daily cash report");
        Ok(rows)
    })();

    conn.raw()
        .execute_batch(&format!("DROP TABLE IF EXISTS {}", EXPORT_TABLE))?;
    result
}
