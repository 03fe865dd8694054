//! Action log ingestion and serialization.
//!
//! Wire shape (JSON): an array of records
//! `{ "<index_field>": "<timestamp>", "level": <float>, "act": "<kind>" }`.
//! The same three columns are used for the CSV archive written by "save
//! actions". Validation happens here so the ledger only ever sees a
//! well-formed [`ActionLog`].

use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::domain::{ActionKind, ActionLog, InvalidLevel, LogError, OutOfOrder, Timestamp, TradeAction};

pub const LEVEL_FIELD: &str = "level";
pub const ACT_FIELD: &str = "act";

/// Errors raised while reading or writing an action log.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed action log{}: {reason}", fmt_index(.index))]
    Parse { index: Option<usize>, reason: String },

    #[error("invalid action kind '{kind}' in record #{index}")]
    InvalidActionKind { index: usize, kind: String },

    #[error(transparent)]
    OutOfOrder(OutOfOrder),

    #[error(transparent)]
    InvalidLevel(InvalidLevel),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error on {path}: {source}")]
    Io { path: String, source: io::Error },
}

fn fmt_index(index: &Option<usize>) -> String {
    index.map(|i| format!(" (record #{i})")).unwrap_or_default()
}

impl From<LogError> for IngestError {
    fn from(err: LogError) -> Self {
        match err {
            LogError::OutOfOrder(e) => IngestError::OutOfOrder(e),
            LogError::InvalidLevel(e) => IngestError::InvalidLevel(e),
        }
    }
}

impl IngestError {
    fn parse(index: Option<usize>, reason: impl Into<String>) -> Self {
        IngestError::Parse {
            index,
            reason: reason.into(),
        }
    }
}

fn parse_kind(index: usize, raw: &str) -> Result<ActionKind, IngestError> {
    raw.parse().map_err(|_| IngestError::InvalidActionKind {
        index,
        kind: raw.to_string(),
    })
}

fn record_to_action(
    index: usize,
    record: &Map<String, Value>,
    index_field: &str,
) -> Result<TradeAction, IngestError> {
    let field = |name: &str| {
        record
            .get(name)
            .ok_or_else(|| IngestError::parse(Some(index), format!("missing field '{name}'")))
    };

    let timestamp = field(index_field)?
        .as_str()
        .ok_or_else(|| IngestError::parse(Some(index), format!("'{index_field}' must be a string")))?;
    let level = field(LEVEL_FIELD)?
        .as_f64()
        .ok_or_else(|| IngestError::parse(Some(index), "'level' must be a number"))?;
    let act = field(ACT_FIELD)?
        .as_str()
        .ok_or_else(|| IngestError::parse(Some(index), "'act' must be a string"))?;

    Ok(TradeAction::new(timestamp, level, parse_kind(index, act)?))
}

/// Parse a JSON action log.
pub fn parse_actions(json: &str, index_field: &str) -> Result<ActionLog, IngestError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| IngestError::parse(None, e.to_string()))?;
    let records = value
        .as_array()
        .ok_or_else(|| IngestError::parse(None, "expected an array of records"))?;

    let mut log = ActionLog::new();
    for (index, record) in records.iter().enumerate() {
        let record = record
            .as_object()
            .ok_or_else(|| IngestError::parse(Some(index), "expected an object"))?;
        log.push(record_to_action(index, record, index_field)?)?;
    }
    debug!(actions = log.len(), "parsed action log");
    Ok(log)
}

/// Serialize an action log to its JSON wire shape.
pub fn to_json(log: &ActionLog, index_field: &str) -> String {
    let records: Vec<Value> = log
        .iter()
        .map(|action| {
            let mut record = Map::new();
            record.insert(
                index_field.to_string(),
                Value::String(action.timestamp.to_string()),
            );
            record.insert(LEVEL_FIELD.to_string(), Value::from(action.level));
            record.insert(
                ACT_FIELD.to_string(),
                Value::String(action.kind.as_str().to_string()),
            );
            Value::Object(record)
        })
        .collect();
    Value::Array(records).to_string()
}

/// Read an action log from CSV with header `<index_field>,level,act`
/// (columns may appear in any order; extra columns are ignored).
pub fn read_csv<R: io::Read>(reader: R, index_field: &str) -> Result<ActionLog, IngestError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| IngestError::parse(None, format!("missing column '{name}'")))
    };
    let ts_col = column(index_field)?;
    let level_col = column(LEVEL_FIELD)?;
    let act_col = column(ACT_FIELD)?;

    let mut log = ActionLog::new();
    for (index, row) in rdr.records().enumerate() {
        let row = row?;
        let get = |col: usize| row.get(col).unwrap_or_default();
        let level: f64 = get(level_col).trim().parse().map_err(|_| {
            IngestError::parse(Some(index), format!("'level' is not a number: '{}'", get(level_col)))
        })?;
        log.push(TradeAction::new(
            Timestamp::new(get(ts_col).trim()),
            level,
            parse_kind(index, get(act_col).trim())?,
        ))?;
    }
    debug!(actions = log.len(), "read action log csv");
    Ok(log)
}

/// Write an action log as CSV with header `<index_field>,level,act`.
pub fn write_csv<W: io::Write>(
    writer: W,
    log: &ActionLog,
    index_field: &str,
) -> Result<(), IngestError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([index_field, LEVEL_FIELD, ACT_FIELD])?;
    for action in log {
        let level = action.level.to_string();
        wtr.write_record([action.timestamp.as_str(), level.as_str(), action.kind.as_str()])?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn io_error(path: &Path, source: io::Error) -> IngestError {
    IngestError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Load an action log from disk: `.csv` files as CSV, anything else as JSON.
pub fn load_actions(path: &Path, index_field: &str) -> Result<ActionLog, IngestError> {
    debug!(path = %path.display(), "loading action log");
    if is_csv(path) {
        let file = fs::File::open(path).map_err(|e| io_error(path, e))?;
        read_csv(file, index_field)
    } else {
        let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        parse_actions(&content, index_field)
    }
}

/// Save an action log to disk, choosing the format from the extension.
pub fn save_actions(path: &Path, log: &ActionLog, index_field: &str) -> Result<(), IngestError> {
    debug!(path = %path.display(), actions = log.len(), "saving action log");
    if is_csv(path) {
        let file = fs::File::create(path).map_err(|e| io_error(path, e))?;
        write_csv(file, log, index_field)
    } else {
        fs::write(path, to_json(log, index_field)).map_err(|e| io_error(path, e))
    }
}
