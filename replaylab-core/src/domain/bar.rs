//! Bar: one price candle of the replayed series.

use super::action::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// OHLC bar plus precomputed feature columns (moving averages and the like).
///
/// Features are produced upstream and carried through untouched; the ledger
/// only ever reads `close`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub features: BTreeMap<String, f64>,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: finite prices, high >= low, high >= open,
    /// high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() || !self.high.is_finite() || !self.low.is_finite() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.close > 0.0
    }

    pub fn feature(&self, name: &str) -> Option<f64> {
        self.features.get(name).copied()
    }
}
