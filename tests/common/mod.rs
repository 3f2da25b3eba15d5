//! Shared test fixtures for the gas-cash integration tests.
//!
//! `setup_sample_db()` creates an in-memory DuckDB connection whose
//! `observations` table is loaded from an NDJSON temp file, the same way a
//! real snapshot would be exposed.

#![allow(dead_code)]

use chrono::NaiveDate;
use gas_cash::{CacheManager, Connection, GasCash, Observation};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Offline cache over a fresh temp directory.
pub fn offline_cache(dir: &tempfile::TempDir) -> CacheManager {
    CacheManager::new(Some(dir.path().to_path_buf()), true, Duration::from_secs(30), None).unwrap()
}

/// Offline client over a fresh temp directory.
///
/// Returns `(GasCash, TempDir)`; keep the `TempDir` alive for the test.
pub fn offline_client() -> (GasCash, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let client = GasCash::builder()
        .cache_dir(tmp_dir.path())
        .offline(true)
        .build()
        .unwrap();
    (client, tmp_dir)
}

/// Offline client with the given observations loaded in memory.
pub fn client_with(observations: &[Observation]) -> (GasCash, tempfile::TempDir) {
    let (client, tmp_dir) = offline_client();
    client.load_observations(observations).unwrap();
    (client, tmp_dir)
}

/// A `Connection` with the sample observations registered.
///
/// Returns `(Connection, tempfile::TempDir)`. The caller must keep the
/// `TempDir` alive for the duration of the test.
pub fn setup_sample_db() -> (Connection, tempfile::TempDir) {
    let tmp_dir = tempfile::tempdir().unwrap();
    let conn = Connection::new(offline_cache(&tmp_dir)).unwrap();
    write_ndjson_and_register(&conn, "observations", &sample_observations());
    (conn, tmp_dir)
}

/// Four trade dates across three months and two years.
///
/// - 2025-03-15: Henry Hub only, two ticks (10.0, 12.0)
/// - 2025-03-14: Henry Hub, Waha, SoCal, Tetco M3
/// - 2025-02-28: six tracked symbols plus one untracked symbol
/// - 2024-12-31: Henry Hub only
///
/// CIG (`YKL D1-IPG`) never appears.
pub fn sample_observations() -> Vec<serde_json::Value> {
    vec![
        serde_json::json!({"trade_date": "2025-03-15", "symbol": "XGF D1-IPG", "value": 10.0}),
        serde_json::json!({"trade_date": "2025-03-15", "symbol": "XGF D1-IPG", "value": 12.0}),
        serde_json::json!({"trade_date": "2025-03-14", "symbol": "XGF D1-IPG", "value": 3.5}),
        serde_json::json!({"trade_date": "2025-03-14", "symbol": "XT6 D1-IPG", "value": -1.25}),
        serde_json::json!({"trade_date": "2025-03-14", "symbol": "XKF D1-IPG", "value": 4.1}),
        serde_json::json!({"trade_date": "2025-03-14", "symbol": "XZR D1-IPG", "value": 2.0}),
        serde_json::json!({"trade_date": "2025-02-28", "symbol": "XGF D1-IPG", "value": 4.0}),
        serde_json::json!({"trade_date": "2025-02-28", "symbol": "XVA D1-IPG", "value": 4.2}),
        serde_json::json!({"trade_date": "2025-02-28", "symbol": "YFF D1-IPG", "value": 3.1}),
        serde_json::json!({"trade_date": "2025-02-28", "symbol": "X7F D1-IPG", "value": 5.0}),
        serde_json::json!({"trade_date": "2025-02-28", "symbol": "YP8 D1-IPG", "value": 4.8}),
        serde_json::json!({"trade_date": "2025-02-28", "symbol": "XGV D1-IPG", "value": 3.9}),
        serde_json::json!({"trade_date": "2025-02-28", "symbol": "ZZZ D1-IPG", "value": 99.0}),
        serde_json::json!({"trade_date": "2024-12-31", "symbol": "XGF D1-IPG", "value": 3.0}),
    ]
}

/// Write a slice of JSON values as NDJSON to a temp file and register it
/// as a DuckDB table via `Connection::register_table_from_ndjson`.
pub fn write_ndjson_and_register(conn: &Connection, table_name: &str, rows: &[serde_json::Value]) {
    let mut file = NamedTempFile::new().unwrap();
    for row in rows {
        writeln!(file, "{}", serde_json::to_string(row).unwrap()).unwrap();
    }
    file.flush().unwrap();

    let path = file.path().to_str().unwrap();
    conn.register_table_from_ndjson(table_name, path).unwrap();
    // DuckDB has copied the rows into an in-memory table, so the temp file
    // may be dropped here.
}

pub fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("expected a value, got None");
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
