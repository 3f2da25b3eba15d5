use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Observation: one raw price tick from the source relation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub trade_date: NaiveDate,
    pub symbol: String,
    pub value: f64,
}

impl Observation {
    pub fn new(trade_date: NaiveDate, symbol: &str, value: f64) -> Self {
        Self {
            trade_date,
            symbol: symbol.to_string(),
            value,
        }
    }
}

// ---------------------------------------------------------------------------
// SymbolCount: distinct symbol with its observation count
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolCount {
    pub symbol: String,
    pub observations: i64,
}
