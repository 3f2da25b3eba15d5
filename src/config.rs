use std::path::PathBuf;

/// Name of the DuckDB view or table holding the raw observations.
pub const SOURCE_VIEW: &str = "observations";

/// Local file name of the cached source snapshot.
pub const SNAPSHOT_FILE: &str = "observations.parquet";

/// File next to the snapshot recording the ETag it was downloaded with.
pub const ETAG_FILE: &str = "etag.txt";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub const MONTH_ABBR: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("gas-cash")
    } else {
        PathBuf::from(".gas-cash-cache")
    }
}
