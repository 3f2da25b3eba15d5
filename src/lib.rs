//! Daily natural-gas cash price reports.
//!
//! Pivots a long-format table of index observations `(trade_date, symbol,
//! value)` into one row per trade date with an averaged price column per
//! tracked symbol (Henry Hub, Transco, Waha, Tetco M3, AGT, Iroquois, SoCal,
//! PG&E, CIG). Observations are registered into an in-process DuckDB and the
//! report is recomputed from the current source on every call.
//!
//! # Quick start
//!
//! ```no_run
//! use gas_cash::GasCash;
//!
//! let client = GasCash::builder().offline(true).build().unwrap();
//! client.load_parquet("observations.parquet").unwrap();
//!
//! let report = client.daily().all().unwrap();
//! for row in &report.rows {
//!     println!("{} {:?}", row.trade_date, row.prices);
//! }
//!
//! let bible = client.stats().term_bible("hh_cash").unwrap();
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod cache;
pub mod config;
pub mod connection;
pub mod error;
pub mod export;
pub mod models;
pub mod queries;
pub mod sql_builder;
pub mod style;
pub mod symbol_map;

#[cfg(feature = "async")]
pub use async_client::AsyncGasCash;
pub use cache::CacheManager;
pub use connection::Connection;
pub use error::{GasCashError, Result};
pub use export::ExportFormat;
pub use models::{DailyCashReport, DailyCashRow, Observation, PeriodStats, TermBibleRow};
pub use sql_builder::SqlBuilder;
pub use symbol_map::{SymbolEntry, SymbolMap};

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

// ---------------------------------------------------------------------------
// GasCashBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`GasCash`] client.
///
/// Use [`GasCash::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](GasCashBuilder::build) to create the client.
pub struct GasCashBuilder {
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
    source_url: Option<String>,
    symbol_map: SymbolMap,
}

impl Default for GasCashBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            offline: false,
            timeout: Duration::from_secs(120),
            source_url: None,
            symbol_map: SymbolMap::default(),
        }
    }
}

impl GasCashBuilder {
    /// Set a custom cache directory for the downloaded snapshot.
    ///
    /// If not set, the platform cache directory is used (e.g.
    /// `~/.cache/gas-cash` on Linux).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable offline mode.
    ///
    /// When offline, the snapshot is never downloaded; only a previously
    /// cached copy or explicitly loaded sources are used. Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout for snapshot downloads.
    ///
    /// Defaults to 120 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of a parquet snapshot of the observations relation.
    ///
    /// Used when a query runs before any source has been loaded explicitly.
    pub fn source_url(mut self, url: &str) -> Self {
        self.source_url = Some(url.to_string());
        self
    }

    /// Replace the default ten-symbol map.
    pub fn symbol_map(mut self, map: SymbolMap) -> Self {
        self.symbol_map = map;
        self
    }

    /// Build the client, validating the symbol map and opening DuckDB.
    ///
    /// Nothing is downloaded here; the snapshot is fetched lazily on the
    /// first query if no source was loaded.
    pub fn build(self) -> Result<GasCash> {
        self.symbol_map.validate()?;
        let cache = CacheManager::new(self.cache_dir, self.offline, self.timeout, self.source_url)?;
        let conn = Connection::new(cache)?;
        Ok(GasCash {
            conn,
            map: self.symbol_map,
        })
    }
}

// ---------------------------------------------------------------------------
// GasCash
// ---------------------------------------------------------------------------

/// The main entry point.
///
/// Wraps a [`Connection`] (which owns the [`CacheManager`] and DuckDB
/// database) and the [`SymbolMap`], and exposes query interfaces as
/// lightweight borrowing wrappers.
pub struct GasCash {
    conn: Connection,
    map: SymbolMap,
}

impl GasCash {
    /// Create a new builder for configuring the client.
    pub fn builder() -> GasCashBuilder {
        GasCashBuilder::default()
    }

    // -- Query accessors ---------------------------------------------------

    /// Access the daily cash pivot.
    pub fn daily(&self) -> queries::DailyQuery<'_> {
        queries::DailyQuery::new(&self.conn, &self.map)
    }

    /// Access raw observation queries.
    pub fn observations(&self) -> queries::ObservationQuery<'_> {
        queries::ObservationQuery::new(&self.conn)
    }

    /// Access term bible and period statistics.
    pub fn stats(&self) -> queries::StatsQuery<'_> {
        queries::StatsQuery::new(&self.conn, &self.map)
    }

    /// Symbols in the source that the symbol map does not track.
    pub fn untracked_symbols(&self) -> Result<Vec<models::SymbolCount>> {
        self.observations().untracked_symbols(&self.map)
    }

    /// The symbol map driving the pivot.
    pub fn symbol_map(&self) -> &SymbolMap {
        &self.map
    }

    // -- Sources -----------------------------------------------------------

    /// Use a local parquet file as the observations relation.
    pub fn load_parquet<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.conn.register_view_from_parquet(config::SOURCE_VIEW, path)
    }

    /// Use a local CSV file (with header) as the observations relation.
    pub fn load_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.conn.register_view_from_csv(config::SOURCE_VIEW, path)
    }

    /// Copy a newline-delimited JSON file into the observations table.
    pub fn load_ndjson<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.conn
            .register_table_from_ndjson(config::SOURCE_VIEW, &path.as_ref().to_string_lossy())
    }

    /// Load observations held in memory, replacing the current source.
    pub fn load_observations(&self, observations: &[Observation]) -> Result<usize> {
        self.conn.reset_observations()?;
        self.conn.insert_observations(observations)
    }

    /// Append observations to the in-memory observations table.
    pub fn insert_observations(&self, observations: &[Observation]) -> Result<usize> {
        self.conn.insert_observations(observations)
    }

    // -- Output ------------------------------------------------------------

    /// Write the daily report to `path` as parquet or CSV.
    pub fn export_daily<P: AsRef<Path>>(&self, path: P, format: ExportFormat) -> Result<usize> {
        export::export_daily(&self.conn, &self.map, path, format)
    }

    /// Render the term bible of `column` as a shaded HTML table.
    pub fn term_bible_html(&self, column: &str) -> Result<String> {
        let rows = self.stats().term_bible(column)?;
        Ok(style::render_term_bible_html(&rows))
    }

    // -- Metadata and utility methods --------------------------------------

    /// Return the list of currently registered DuckDB relation names.
    pub fn views(&self) -> Vec<String> {
        self.conn.views()
    }

    /// Execute a raw SQL query against the DuckDB database.
    ///
    /// # Arguments
    ///
    /// * `query` - SQL string with `?` positional placeholders.
    /// * `params` - Parameter values corresponding to the placeholders.
    pub fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        self.conn.execute(query, params)
    }

    /// Check the remote snapshot and drop the cached copy if it changed.
    ///
    /// Returns `true` if the snapshot was stale; the next query re-downloads
    /// it. Explicitly loaded sources are left untouched.
    pub fn refresh(&self) -> Result<bool> {
        let mut cache = self.conn.cache.borrow_mut();
        if cache.source_url.is_none() {
            return Ok(false);
        }
        cache.forget_remote();
        let stale = cache.is_stale()?;
        if stale {
            cache.clear()?;
            if self.conn.is_snapshot_backed() {
                self.conn.forget_view(config::SOURCE_VIEW);
            }
            info!("observations snapshot was stale; cache cleared");
        }
        Ok(stale)
    }

    /// Consume the client and release all resources.
    pub fn close(self) {
        drop(self);
    }

    /// Return a reference to the underlying [`Connection`] for advanced usage.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for GasCash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let views = self.conn.views();
        let cache = self.conn.cache.borrow();
        write!(
            f,
            "GasCash(cache_dir={}, views=[{}], symbols={}, offline={})",
            cache.cache_dir.display(),
            views.join(", "),
            self.map.len(),
            cache.offline
        )
    }
}
