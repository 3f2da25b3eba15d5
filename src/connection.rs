//! DuckDB connection wrapper with source registration and query execution.
//!
//! The observations relation can come from a local parquet, CSV or NDJSON
//! file, from rows inserted directly, or from the cached remote snapshot. It
//! is always exposed to queries under [`config::SOURCE_VIEW`].

use crate::cache::CacheManager;
use crate::config;
use crate::error::{GasCashError, Result};
use crate::models::Observation;
use chrono::NaiveDate;
use duckdb::{params, types::ValueRef, Connection as DuckDbConnection};
use serde::de::DeserializeOwned;
use serde_json::{Map as JsonMap, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Wraps a DuckDB connection and tracks which relations have been registered.
pub struct Connection {
    conn: DuckDbConnection,
    /// The cache manager used to download/locate the source snapshot.
    pub cache: RefCell<CacheManager>,
    registered_views: RefCell<HashSet<String>>,
    snapshot_backed: Cell<bool>,
}

impl Connection {
    /// Create a connection backed by the given cache.
    ///
    /// Opens an in-memory DuckDB database.
    pub fn new(cache: CacheManager) -> Result<Self> {
        let conn = DuckDbConnection::open_in_memory()?;
        Ok(Self {
            conn,
            cache: RefCell::new(cache),
            registered_views: RefCell::new(HashSet::new()),
            snapshot_backed: Cell::new(false),
        })
    }

    /// Ensure the observations relation exists, fetching the snapshot if needed.
    pub fn ensure_source(&self) -> Result<()> {
        if self.has_view(config::SOURCE_VIEW) {
            return Ok(());
        }
        let path = self.cache.borrow_mut().ensure_snapshot()?;
        self.register_view_from_parquet(config::SOURCE_VIEW, &path)?;
        self.snapshot_backed.set(true);
        Ok(())
    }

    /// Whether the observations relation currently reads the cached snapshot.
    pub fn is_snapshot_backed(&self) -> bool {
        self.snapshot_backed.get()
    }

    /// Execute SQL and return results as a `Vec` of `HashMap`s.
    ///
    /// Each row is represented as a `HashMap<String, serde_json::Value>`.
    /// Automatically converts DuckDB types to `serde_json::Value`.
    pub fn execute(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, Value>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows_result = stmt.query(bind(params).as_slice())?;

        // Column metadata is only available once the statement has executed
        let executed = rows_result
            .as_ref()
            .ok_or_else(|| GasCashError::InvalidData("statement produced no result set".into()))?;
        let column_names: Vec<String> = executed
            .column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        let column_count = executed.column_count();

        let mut out = Vec::new();
        while let Some(row) = rows_result.next()? {
            let mut record = HashMap::with_capacity(column_count);
            for (i, name) in column_names.iter().enumerate() {
                record.insert(name.clone(), convert_value_ref(row.get_ref(i)?));
            }
            out.push(record);
        }

        Ok(out)
    }

    /// Execute SQL and deserialize each row into type `T`.
    pub fn execute_into<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Vec<T>> {
        self.execute(sql, params)?
            .into_iter()
            .map(|row| {
                let object: JsonMap<String, Value> = row.into_iter().collect();
                Ok(serde_json::from_value(Value::Object(object))?)
            })
            .collect()
    }

    /// Execute SQL and return the first column of the first row.
    ///
    /// Returns `None` if the result set is empty.
    pub fn execute_scalar(
        &self,
        sql: &str,
        params: &[String],
    ) -> Result<Option<Value>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(bind(params).as_slice())?;

        match rows.next()? {
            Some(row) => Ok(Some(convert_value_ref(row.get_ref(0)?))),
            None => Ok(None),
        }
    }

    /// Execute a parameterized statement that returns no rows.
    ///
    /// Returns the number of rows changed.
    pub fn execute_statement(&self, sql: &str, params: &[String]) -> Result<usize> {
        Ok(self.conn.execute(sql, bind(params).as_slice())?)
    }

    /// Create a DuckDB table from a newline-delimited JSON file.
    ///
    /// Data is streamed from disk by DuckDB and copied into memory, so the
    /// file may be removed afterwards.
    pub fn register_table_from_ndjson(&self, table_name: &str, ndjson_path: &str) -> Result<()> {
        let path = sql_path(ndjson_path);
        self.drop_relation(table_name)?;
        self.conn.execute_batch(&format!(
            "CREATE TABLE {name} AS SELECT * FROM read_json_auto('{path}', format='newline_delimited')",
            name = table_name,
            path = path
        ))?;
        self.mark_registered(table_name);
        info!(table = table_name, path = %path, "registered table from NDJSON");
        Ok(())
    }

    /// Register a parquet file as a DuckDB view.
    ///
    /// The view reads the file on every query, so the report reflects the
    /// file's current contents.
    pub fn register_view_from_parquet<P: AsRef<Path>>(&self, view_name: &str, path: P) -> Result<()> {
        let path = sql_path(&path.as_ref().to_string_lossy());
        self.drop_relation(view_name)?;
        self.conn.execute_batch(&format!(
            "CREATE VIEW {name} AS SELECT * FROM read_parquet('{path}')",
            name = view_name,
            path = path
        ))?;
        self.mark_registered(view_name);
        info!(view = view_name, path = %path, "registered view from parquet");
        Ok(())
    }

    /// Register a CSV file (with header) as a DuckDB view.
    pub fn register_view_from_csv<P: AsRef<Path>>(&self, view_name: &str, path: P) -> Result<()> {
        let path = sql_path(&path.as_ref().to_string_lossy());
        self.drop_relation(view_name)?;
        self.conn.execute_batch(&format!(
            "CREATE VIEW {name} AS SELECT * FROM read_csv_auto('{path}', header=true)",
            name = view_name,
            path = path
        ))?;
        self.mark_registered(view_name);
        info!(view = view_name, path = %path, "registered view from CSV");
        Ok(())
    }

    /// Replace the observations relation with an empty in-memory table.
    pub fn reset_observations(&self) -> Result<()> {
        self.drop_relation(config::SOURCE_VIEW)?;
        self.create_observations_table()
    }

    /// Append observations to the in-memory observations table.
    ///
    /// Creates the table on first use. All rows are inserted in a single
    /// transaction; on failure none are kept. Fails if the observations
    /// relation is currently a file-backed view.
    pub fn insert_observations(&self, observations: &[Observation]) -> Result<usize> {
        if self.relation_type(config::SOURCE_VIEW)?.as_deref() == Some("VIEW") {
            return Err(GasCashError::InvalidArgument(format!(
                "{} is a file-backed view; use load_observations to replace it",
                config::SOURCE_VIEW
            )));
        }
        self.create_observations_table()?;

        self.conn.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize> {
            let mut stmt = self.conn.prepare(&format!(
                "INSERT INTO {} (trade_date, symbol, value) VALUES (CAST(? AS DATE), ?, ?)",
                config::SOURCE_VIEW
            ))?;
            for obs in observations {
                let date = obs.trade_date.format(config::DATE_FORMAT).to_string();
                stmt.execute(params![date, obs.symbol, obs.value])?;
            }
            Ok(observations.len())
        })();

        match result {
            Ok(n) => {
                self.conn.execute_batch("COMMIT")?;
                debug!(rows = n, "inserted observations");
                Ok(n)
            }
            Err(e) => {
                self.conn.execute_batch("ROLLBACK")?;
                Err(e)
            }
        }
    }

    /// Check whether a view has been registered.
    pub fn has_view(&self, name: &str) -> bool {
        self.registered_views.borrow().contains(name)
    }

    /// Return a list of all registered view names.
    pub fn views(&self) -> Vec<String> {
        let mut views: Vec<String> = self.registered_views.borrow().iter().cloned().collect();
        views.sort();
        views
    }

    /// Access the underlying DuckDB connection for advanced usage.
    pub fn raw(&self) -> &DuckDbConnection {
        &self.conn
    }

    /// Drop an existing table or view of the given name, whichever it is.
    ///
    /// DuckDB refuses `DROP TABLE` on a view (and vice versa) even with
    /// `IF EXISTS`, so the catalog is consulted first.
    fn drop_relation(&self, name: &str) -> Result<()> {
        match self.relation_type(name)?.as_deref() {
            Some("VIEW") => self.conn.execute_batch(&format!("DROP VIEW {}", name))?,
            Some(_) => self.conn.execute_batch(&format!("DROP TABLE {}", name))?,
            None => {}
        }
        Ok(())
    }

    /// Catalog `table_type` of a relation (`VIEW`, `BASE TABLE`, ...), if it exists.
    fn relation_type(&self, name: &str) -> Result<Option<String>> {
        let kind = self.execute_scalar(
            "SELECT table_type FROM information_schema.tables WHERE table_name = ?",
            &[name.to_string()],
        )?;
        Ok(kind.and_then(|v| v.as_str().map(String::from)))
    }

    fn create_observations_table(&self) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (trade_date DATE, symbol VARCHAR, value DOUBLE)",
            config::SOURCE_VIEW
        ))?;
        self.mark_registered(config::SOURCE_VIEW);
        Ok(())
    }

    /// Forget a registration so the relation is re-created on next access.
    pub fn forget_view(&self, name: &str) {
        self.registered_views.borrow_mut().remove(name);
        if name == config::SOURCE_VIEW {
            self.snapshot_backed.set(false);
        }
    }

    fn mark_registered(&self, name: &str) {
        if name == config::SOURCE_VIEW {
            self.snapshot_backed.set(false);
        }
        self.registered_views.borrow_mut().insert(name.to_string());
    }
}

/// Render a filesystem path as the body of a DuckDB string literal.
///
/// Forward slashes for DuckDB compatibility, single quotes doubled.
pub(crate) fn sql_path(path: &str) -> String {
    path.replace('\\', "/").replace('\'', "''")
}

/// Quote an identifier for DuckDB.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn bind(params: &[String]) -> Vec<&dyn duckdb::ToSql> {
    params.iter().map(|p| p as &dyn duckdb::ToSql).collect()
}

fn number<N: Into<serde_json::Number>>(n: N) -> Value {
    Value::Number(n.into())
}

fn float(f: f64) -> Value {
    // NaN and infinities have no JSON representation
    serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)
}

/// Map one DuckDB cell onto JSON. Dates become `YYYY-MM-DD` strings;
/// types the reports never produce map to `null`.
fn convert_value_ref(val: ValueRef<'_>) -> Value {
    match val {
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(n) => number(n),
        ValueRef::SmallInt(n) => number(n),
        ValueRef::Int(n) => number(n),
        ValueRef::BigInt(n) => number(n),
        ValueRef::UTinyInt(n) => number(n),
        ValueRef::USmallInt(n) => number(n),
        ValueRef::UInt(n) => number(n),
        ValueRef::UBigInt(n) => number(n),
        ValueRef::HugeInt(n) => i64::try_from(n)
            .map(number)
            .unwrap_or_else(|_| Value::String(n.to_string())),
        ValueRef::Float(f) => float(f64::from(f)),
        ValueRef::Double(f) => float(f),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Date32(days) => days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map_or(Value::Null, |d| {
                Value::String(d.format(config::DATE_FORMAT).to_string())
            }),
        _ => Value::Null,
    }
}
