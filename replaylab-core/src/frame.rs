//! Replay frame: the price series joined with the action log.
//!
//! The replay screen walks bars, not actions: every bar carries the actions
//! recorded at its timestamp, and the series stops at the bar of the last
//! action. The hold-through ledger marks open entries at each row's close.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::domain::{ActionLog, Bar, Timestamp, TradeAction};
use crate::marker::{replay_marker, Marker};

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("action at '{0}' does not match any bar timestamp")]
    UnmatchedAction(Timestamp),

    #[error("bar #{index} at '{timestamp}' precedes the previous bar")]
    BarsOutOfOrder { index: usize, timestamp: Timestamp },

    #[error("bar csv: missing column '{0}'")]
    MissingColumn(String),

    #[error("bar csv row #{row}, column '{column}': '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("bar csv row #{row} at '{timestamp}': OHLC prices are not a valid candle")]
    InvalidBar { row: usize, timestamp: Timestamp },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error on {path}: {source}")]
    Io { path: String, source: io::Error },
}

/// One bar of the replay together with the actions recorded on it.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRow {
    pub bar: Bar,
    pub actions: Vec<TradeAction>,
}

impl FrameRow {
    pub fn has_action(&self) -> bool {
        !self.actions.is_empty()
    }

    /// Overlay marker for this row: the latest action recorded on the bar.
    pub fn marker(&self) -> Option<Marker> {
        self.actions.last().map(|a| replay_marker(a.kind))
    }
}

/// Join `bars` with `log`.
///
/// Rows run from the first bar up to and including the bar holding the last
/// action; an empty log yields an empty frame. Every action must land on a
/// bar timestamp.
pub fn join_actions(bars: &[Bar], log: &ActionLog) -> Result<Vec<FrameRow>, FrameError> {
    let actions = log.as_slice();
    let mut rows = Vec::new();
    let mut next = 0;

    for (index, bar) in bars.iter().enumerate() {
        if next == actions.len() {
            break;
        }
        if index > 0 && bar.timestamp < bars[index - 1].timestamp {
            return Err(FrameError::BarsOutOfOrder {
                index,
                timestamp: bar.timestamp.clone(),
            });
        }
        if actions[next].timestamp < bar.timestamp {
            return Err(FrameError::UnmatchedAction(actions[next].timestamp.clone()));
        }

        let start = next;
        while next < actions.len() && actions[next].timestamp == bar.timestamp {
            next += 1;
        }
        rows.push(FrameRow {
            bar: bar.clone(),
            actions: actions[start..next].to_vec(),
        });
    }

    if let Some(action) = actions.get(next) {
        return Err(FrameError::UnmatchedAction(action.timestamp.clone()));
    }
    debug!(rows = rows.len(), actions = actions.len(), "joined replay frame");
    Ok(rows)
}

fn parse_number(row: usize, column: &str, value: &str) -> Result<f64, FrameError> {
    let value = value.trim();
    value.parse().map_err(|_| FrameError::InvalidNumber {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Feature cells may be empty (warm-up rows of rolling features).
fn parse_feature(row: usize, column: &str, value: &str) -> Result<f64, FrameError> {
    if value.trim().is_empty() {
        return Ok(f64::NAN);
    }
    parse_number(row, column, value)
}

/// Read bars from CSV: `<index_field>` plus `open,high,low,close` (matched
/// case-insensitively). Every other column becomes a feature; empty feature
/// cells are NaN. Prices must be present and form a sane candle.
pub fn read_bars_csv<R: io::Read>(reader: R, index_field: &str) -> Result<Vec<Bar>, FrameError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| FrameError::MissingColumn(name.to_string()))
    };
    let ts_col = column(index_field)?;
    let ohlc = [column("open")?, column("high")?, column("low")?, column("close")?];
    let features: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != ts_col && !ohlc.contains(i))
        .collect();

    let mut bars = Vec::new();
    for (row_index, record) in rdr.records().enumerate() {
        let record = record?;
        let cell = |col: usize| record.get(col).unwrap_or_default();
        let price = |col: usize| parse_number(row_index, &headers[col], cell(col));

        let mut feature_values = BTreeMap::new();
        for &(col, name) in &features {
            feature_values.insert(name.to_string(), parse_feature(row_index, name, cell(col))?);
        }
        let bar = Bar {
            timestamp: Timestamp::new(cell(ts_col).trim()),
            open: price(ohlc[0])?,
            high: price(ohlc[1])?,
            low: price(ohlc[2])?,
            close: price(ohlc[3])?,
            features: feature_values,
        };
        if !bar.is_sane() {
            return Err(FrameError::InvalidBar {
                row: row_index,
                timestamp: bar.timestamp,
            });
        }
        bars.push(bar);
    }
    debug!(bars = bars.len(), features = features.len(), "read bars csv");
    Ok(bars)
}

/// Load bars from a CSV file.
pub fn load_bars(path: &Path, index_field: &str) -> Result<Vec<Bar>, FrameError> {
    let file = fs::File::open(path).map_err(|source| FrameError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_bars_csv(file, index_field)
}
