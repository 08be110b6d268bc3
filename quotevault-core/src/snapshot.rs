//! Snapshot record: the single normalized quote observation per run.

use crate::quote::RawQuote;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical, immutable snapshot of one quote.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub symbol: String,
    pub current_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub open_price: f64,
    pub previous_close: f64,
    /// Capture time (ISO-8601), not the quote's own time.
    pub timestamp: String,
}

impl SnapshotRecord {
    /// Column names, in serialization order.
    pub const FIELDS: [&'static str; 7] = [
        "symbol",
        "current_price",
        "high_price",
        "low_price",
        "open_price",
        "previous_close",
        "timestamp",
    ];
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformError {
    #[error("quote response is missing required field '{field}'")]
    MissingField { field: &'static str },
}

fn require(value: Option<f64>, field: &'static str) -> Result<f64, TransformError> {
    value.ok_or(TransformError::MissingField { field })
}

/// Map a raw quote into a snapshot record stamped with `captured_at`.
///
/// Pure. Fails on the first missing price field (wire name in the error).
/// Values are passed through without range checks.
pub fn transform(
    raw: &RawQuote,
    symbol: &str,
    captured_at: DateTime<FixedOffset>,
) -> Result<SnapshotRecord, TransformError> {
    Ok(SnapshotRecord {
        symbol: symbol.to_string(),
        current_price: require(raw.current, "c")?,
        high_price: require(raw.high, "h")?,
        low_price: require(raw.low, "l")?,
        open_price: require(raw.open, "o")?,
        previous_close: require(raw.previous_close, "pc")?,
        timestamp: captured_at.to_rfc3339_opts(SecondsFormat::Micros, false),
    })
}
