//! Quote source trait and the raw response shape.
//!
//! The QuoteSource trait abstracts over the quote API so the pipeline can be
//! driven by a fake in tests.

pub mod finnhub;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use finnhub::FinnhubClient;

/// Quote as returned by the API, before any field is required.
///
/// Field names follow the wire format: `c` current, `h` high, `l` low,
/// `o` open, `pc` previous close. Presence is checked by the transform,
/// not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    #[serde(rename = "c")]
    pub current: Option<f64>,
    #[serde(rename = "h")]
    pub high: Option<f64>,
    #[serde(rename = "l")]
    pub low: Option<f64>,
    #[serde(rename = "o")]
    pub open: Option<f64>,
    #[serde(rename = "pc")]
    pub previous_close: Option<f64>,
    /// Change since previous close.
    #[serde(rename = "d")]
    pub change: Option<f64>,
    /// Percent change since previous close.
    #[serde(rename = "dp")]
    pub percent_change: Option<f64>,
    /// Quote time, unix seconds.
    #[serde(rename = "t")]
    pub quote_time: Option<i64>,
}

/// Any failure while fetching a quote. Callers don't branch on the kind.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("quote API returned HTTP {status} for {symbol}")]
    Status { symbol: String, status: u16 },

    #[error("malformed quote response for {symbol}: {message}")]
    Malformed { symbol: String, message: String },
}

/// A source of point-in-time quotes.
pub trait QuoteSource {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch the current quote for one symbol. Single attempt.
    fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, FetchError>;
}
