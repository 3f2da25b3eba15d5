//! Query modules for the gas cash report.
//!
//! Each module provides a query struct that borrows from a
//! [`Connection`](crate::connection::Connection) (and, where the pivot is
//! involved, the [`SymbolMap`](crate::symbol_map::SymbolMap)) and exposes
//! methods returning `Result<T>`.

pub mod daily;
pub mod observations;
pub mod stats;

pub use daily::DailyQuery;
pub use observations::ObservationQuery;
pub use stats::StatsQuery;

use crate::config;

/// The source relation with its columns coerced to the types the pivot expects.
///
/// `trade_date` goes through a string-to-date cast, so malformed dates fail
/// at evaluation time with DuckDB's conversion error.
pub(crate) fn normalized_source() -> String {
    format!(
        "SELECT CAST(trade_date AS DATE) AS trade_date, \
         CAST(symbol AS VARCHAR) AS symbol, \
         CAST(\"value\" AS DOUBLE) AS \"value\" \
         FROM {}",
        config::SOURCE_VIEW
    )
}
