use serde::{Deserialize, Serialize};

pub const UNKNOWN_NAME: &str = "Unknown";
pub const UNKNOWN_SYMBOL: &str = "???";
pub const MISSING_PRICE: f64 = 0.0;

/// One feed entry as decoded from the wire. Every field is optional: feeds omit
/// values, and non-numeric values are decoded as `None` upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub price: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub volume_24h_usd: Option<f64>,
    pub fdv: Option<f64>,
}

impl RawRecord {
    pub fn liquidity_or_zero(&self) -> f64 {
        finite_or_zero(self.liquidity_usd)
    }

    pub fn volume_or_zero(&self) -> f64 {
        finite_or_zero(self.volume_24h_usd)
    }

    pub fn symbol_or_unknown(&self) -> &str {
        self.symbol.as_deref().unwrap_or(UNKNOWN_SYMBOL)
    }
}

/// A feed record that passed the admissibility filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub liquidity_usd: f64,
    pub volume_24h_usd: f64,
    pub fdv: Option<f64>,
}

impl Candidate {
    pub(crate) fn from_record(record: &RawRecord) -> Self {
        Self {
            name: record
                .name
                .clone()
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            symbol: record.symbol_or_unknown().to_string(),
            price: record
                .price
                .filter(|price| price.is_finite())
                .unwrap_or(MISSING_PRICE),
            liquidity_usd: record.liquidity_or_zero(),
            volume_24h_usd: record.volume_or_zero(),
            fdv: record.fdv.filter(|fdv| fdv.is_finite()),
        }
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|value| value.is_finite()).unwrap_or(0.0)
}
