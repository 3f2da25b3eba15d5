//! Async wrapper around [`GasCash`] for use in Tokio runtimes.
//!
//! Runs every operation on the blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//!
//! # Example
//!
//! ```no_run
//! use gas_cash::AsyncGasCash;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let client = AsyncGasCash::builder().offline(true).build().await.unwrap();
//!     client.run(|c| c.load_parquet("observations.parquet")).await.unwrap();
//!
//!     let report = client.daily().await.unwrap();
//!     println!("{} trade dates", report.len());
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{GasCashError, Result};
use crate::models::{DailyCashReport, PeriodStats, TermBibleRow};
use crate::symbol_map::SymbolMap;
use crate::GasCash;

// ---------------------------------------------------------------------------
// AsyncGasCashBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncGasCash`] instance.
pub struct AsyncGasCashBuilder {
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
    source_url: Option<String>,
    symbol_map: Option<SymbolMap>,
}

impl Default for AsyncGasCashBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            offline: false,
            timeout: Duration::from_secs(120),
            source_url: None,
            symbol_map: None,
        }
    }
}

impl AsyncGasCashBuilder {
    /// Set a custom cache directory.
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable offline mode.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout for snapshot downloads.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of a parquet snapshot of the observations relation.
    pub fn source_url(mut self, url: &str) -> Self {
        self.source_url = Some(url.to_string());
        self
    }

    /// Replace the default symbol map.
    pub fn symbol_map(mut self, map: SymbolMap) -> Self {
        self.symbol_map = Some(map);
        self
    }

    /// Build the async client on the blocking thread pool.
    pub async fn build(self) -> Result<AsyncGasCash> {
        tokio::task::spawn_blocking(move || {
            let mut builder = GasCash::builder();
            if let Some(dir) = self.cache_dir {
                builder = builder.cache_dir(dir);
            }
            if let Some(url) = self.source_url {
                builder = builder.source_url(&url);
            }
            if let Some(map) = self.symbol_map {
                builder = builder.symbol_map(map);
            }
            builder = builder.offline(self.offline).timeout(self.timeout);
            let client = builder.build()?;
            Ok(AsyncGasCash {
                inner: Arc::new(Mutex::new(client)),
            })
        })
        .await
        .map_err(|e| GasCashError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncGasCash
// ---------------------------------------------------------------------------

/// Async wrapper around [`GasCash`].
///
/// The client uses `RefCell` internally, so it sits behind a [`Mutex`] and
/// each call runs on a dedicated blocking thread.
pub struct AsyncGasCash {
    inner: Arc<Mutex<GasCash>>,
}

impl AsyncGasCash {
    /// Create a new builder for configuring the async client.
    pub fn builder() -> AsyncGasCashBuilder {
        AsyncGasCashBuilder::default()
    }

    /// Run a sync client operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&GasCash) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let client = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = client
                .lock()
                .map_err(|_| GasCashError::InvalidArgument("client lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| GasCashError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// The full daily cash report.
    pub async fn daily(&self) -> Result<DailyCashReport> {
        self.run(|c| c.daily().all()).await
    }

    /// Term bible for one cash column.
    pub async fn term_bible(&self, column: &str) -> Result<Vec<TermBibleRow>> {
        let column = column.to_string();
        self.run(move |c| c.stats().term_bible(&column)).await
    }

    /// Monthly stats for one cash column.
    pub async fn monthly_stats(&self, column: &str) -> Result<Vec<PeriodStats>> {
        let column = column.to_string();
        self.run(move |c| c.stats().monthly_stats(&column)).await
    }

    /// Yearly stats for one cash column.
    pub async fn yearly_stats(&self, column: &str) -> Result<Vec<PeriodStats>> {
        let column = column.to_string();
        self.run(move |c| c.stats().yearly_stats(&column)).await
    }

    /// Execute a raw SQL query asynchronously.
    pub async fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        let query = query.to_string();
        let params = params.to_vec();
        self.run(move |c| c.sql(&query, &params)).await
    }

    /// Check the remote snapshot and drop the cached copy if it changed.
    pub async fn refresh(&self) -> Result<bool> {
        self.run(|c| c.refresh()).await
    }

    /// Return the list of currently registered DuckDB relation names.
    pub async fn views(&self) -> Result<Vec<String>> {
        self.run(|c| Ok(c.views())).await
    }
}
