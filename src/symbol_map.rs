//! The symbol-to-column table driving the daily pivot.
//!
//! Each entry names an index symbol as it appears in the source relation and
//! the report column its averaged price lands in. Column names are spliced
//! into SQL as identifiers, so [`SymbolMap::validate`] restricts them to
//! lowercase snake case; symbols always travel as bound parameters.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GasCashError, Result};

/// Column names produced by the pivot itself.
pub const RESERVED_COLUMNS: [&str; 3] = ["year", "month", "trade_date"];

/// A single tracked index symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub symbol: String,
    pub column: String,
    #[serde(default)]
    pub region: String,
}

impl SymbolEntry {
    pub fn new(symbol: &str, column: &str, region: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            column: column.to_string(),
            region: region.to_string(),
        }
    }
}

/// Ordered symbol-to-column table. Entry order is report column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolMap {
    entries: Vec<SymbolEntry>,
}

impl Default for SymbolMap {
    /// The ten ICE next-day gas indices tracked by the daily cash report.
    fn default() -> Self {
        Self {
            entries: vec![
                SymbolEntry::new("XGF D1-IPG", "hh_cash", "Henry Hub"),
                SymbolEntry::new("XVA D1-IPG", "transco_st85_cash", "Southeast"),
                SymbolEntry::new("XT6 D1-IPG", "waha_cash", "East Texas"),
                SymbolEntry::new("YFF D1-IPG", "transco_zone_5_south_cash", "Northeast"),
                SymbolEntry::new("XZR D1-IPG", "tetco_m3_cash", "Northeast"),
                SymbolEntry::new("X7F D1-IPG", "agt_cash", "Northeast"),
                SymbolEntry::new("YP8 D1-IPG", "iroquois_z2_cash", "Northeast"),
                SymbolEntry::new("XKF D1-IPG", "socal_cg_cash", "West"),
                SymbolEntry::new("XGV D1-IPG", "pge_cg_cash", "West"),
                SymbolEntry::new("YKL D1-IPG", "cig_cash", "Rockies/Northwest"),
            ],
        }
    }
}

impl SymbolMap {
    /// Build a map from explicit entries and validate it.
    pub fn new(entries: Vec<SymbolEntry>) -> Result<Self> {
        let map = Self { entries };
        map.validate()?;
        Ok(map)
    }

    /// Load a map from a JSON array of `{symbol, column, region}` objects.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse a map from a JSON array string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let map: Self = serde_json::from_str(json)?;
        map.validate()?;
        Ok(map)
    }

    /// Append an entry, rejecting it if the result would be invalid.
    pub fn insert(&mut self, entry: SymbolEntry) -> Result<()> {
        self.entries.push(entry);
        if let Err(e) = self.validate() {
            self.entries.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Check the invariants the pivot SQL relies on.
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(GasCashError::InvalidSymbolMap(
                "symbol map has no entries".to_string(),
            ));
        }

        let mut symbols = HashSet::new();
        let mut columns = HashSet::new();

        for entry in &self.entries {
            if entry.symbol.trim().is_empty() {
                return Err(GasCashError::InvalidSymbolMap(format!(
                    "empty symbol for column '{}'",
                    entry.column
                )));
            }
            if !is_valid_column(&entry.column) {
                return Err(GasCashError::InvalidSymbolMap(format!(
                    "column '{}' must be lowercase snake case",
                    entry.column
                )));
            }
            if RESERVED_COLUMNS.contains(&entry.column.as_str()) {
                return Err(GasCashError::InvalidSymbolMap(format!(
                    "column '{}' is reserved",
                    entry.column
                )));
            }
            if !symbols.insert(entry.symbol.as_str()) {
                return Err(GasCashError::InvalidSymbolMap(format!(
                    "duplicate symbol '{}'",
                    entry.symbol
                )));
            }
            if !columns.insert(entry.column.as_str()) {
                return Err(GasCashError::InvalidSymbolMap(format!(
                    "duplicate column '{}'",
                    entry.column
                )));
            }
        }

        Ok(())
    }

    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Report column names in output order.
    pub fn columns(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.column.as_str()).collect()
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.symbol.as_str()).collect()
    }

    pub fn symbol_for(&self, column: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.column == column)
            .map(|e| e.symbol.as_str())
    }

    /// Resolve a report column to its source symbol, failing with
    /// `InvalidArgument` if it is not mapped.
    pub(crate) fn require_column(&self, column: &str) -> Result<&str> {
        self.symbol_for(column).ok_or_else(|| {
            GasCashError::InvalidArgument(format!(
                "unknown report column '{}'; expected one of: {}",
                column,
                self.columns().join(", ")
            ))
        })
    }
}

fn is_valid_column(column: &str) -> bool {
    let mut chars = column.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
