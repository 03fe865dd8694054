//! TradeAction and ActionLog: the sole input to every return computation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque, ordered timestamp key (ISO-like string, e.g. `2023-04-13 10:30:00`).
///
/// Never parsed: only compared. Callers must use one consistent format per log
/// so that lexical order equals chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub String);

impl Timestamp {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Timestamp {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Timestamp {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which book a position lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Percentage return of a position on this side opened at `entry` and
    /// valued at `exit`. The short side inverts the sign.
    pub fn return_pct(self, entry: f64, exit: f64) -> f64 {
        match self {
            Side::Long => (exit - entry) / entry * 100.0,
            Side::Short => (entry - exit) / entry * 100.0,
        }
    }
}

/// The four trade actions a labeler can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Buy,
    Sell,
    BuyClear,
    SellClear,
}

impl ActionKind {
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Buy,
        ActionKind::Sell,
        ActionKind::BuyClear,
        ActionKind::SellClear,
    ];

    /// Wire name (`buy`, `sell`, `buy_clear`, `sell_clear`).
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Buy => "buy",
            ActionKind::Sell => "sell",
            ActionKind::BuyClear => "buy_clear",
            ActionKind::SellClear => "sell_clear",
        }
    }

    /// The side this action opens or clears.
    pub fn side(self) -> Side {
        match self {
            ActionKind::Buy | ActionKind::BuyClear => Side::Long,
            ActionKind::Sell | ActionKind::SellClear => Side::Short,
        }
    }

    pub fn is_entry(self) -> bool {
        matches!(self, ActionKind::Buy | ActionKind::Sell)
    }

    pub fn is_clear(self) -> bool {
        !self.is_entry()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action kind '{0}' (expected buy, sell, buy_clear or sell_clear)")]
pub struct UnknownActionKind(pub String);

impl FromStr for ActionKind {
    type Err = UnknownActionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownActionKind(s.to_string()))
    }
}

/// One recorded action. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeAction {
    pub timestamp: Timestamp,
    pub level: f64,
    pub kind: ActionKind,
}

impl TradeAction {
    pub fn new(timestamp: impl Into<Timestamp>, level: f64, kind: ActionKind) -> Self {
        Self {
            timestamp: timestamp.into(),
            level,
            kind,
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @ {:.3}", self.timestamp, self.kind, self.level)
    }
}

/// Appending an action whose timestamp is earlier than the last one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("action #{index} at '{timestamp}' precedes previous action at '{previous}'")]
pub struct OutOfOrder {
    pub index: usize,
    pub timestamp: Timestamp,
    pub previous: Timestamp,
}

/// Appending an action whose level is not a positive, finite price.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("action #{index} at '{timestamp}' has level {level}; expected a positive finite price")]
pub struct InvalidLevel {
    pub index: usize,
    pub timestamp: Timestamp,
    pub level: f64,
}

/// Why an action was refused by [`ActionLog::push`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LogError {
    #[error(transparent)]
    OutOfOrder(#[from] OutOfOrder),

    #[error(transparent)]
    InvalidLevel(#[from] InvalidLevel),
}

/// Ordered, append-only sequence of actions.
///
/// Insertion order is chronological order: timestamps never decrease.
/// Every level is a positive finite price. Duplicates and repeated prices
/// are kept as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionLog {
    actions: Vec<TradeAction>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from actions already in order, rejecting the first
    /// timestamp regression or invalid level.
    pub fn from_actions(actions: Vec<TradeAction>) -> Result<Self, LogError> {
        let mut log = Self {
            actions: Vec::with_capacity(actions.len()),
        };
        for action in actions {
            log.push(action)?;
        }
        Ok(log)
    }

    pub fn push(&mut self, action: TradeAction) -> Result<(), LogError> {
        if !(action.level.is_finite() && action.level > 0.0) {
            return Err(InvalidLevel {
                index: self.actions.len(),
                timestamp: action.timestamp,
                level: action.level,
            }
            .into());
        }
        if let Some(last) = self.actions.last() {
            if action.timestamp < last.timestamp {
                return Err(OutOfOrder {
                    index: self.actions.len(),
                    timestamp: action.timestamp,
                    previous: last.timestamp.clone(),
                }
                .into());
            }
        }
        self.actions.push(action);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TradeAction> {
        self.actions.iter()
    }

    pub fn as_slice(&self) -> &[TradeAction] {
        &self.actions
    }

    pub fn first(&self) -> Option<&TradeAction> {
        self.actions.first()
    }

    pub fn last(&self) -> Option<&TradeAction> {
        self.actions.last()
    }

    /// Prefix of actions recorded at or before `timestamp`.
    pub fn up_to(&self, timestamp: &Timestamp) -> &[TradeAction] {
        let end = self.actions.partition_point(|a| a.timestamp <= *timestamp);
        &self.actions[..end]
    }

    /// Actions recorded exactly at `timestamp` (possibly several).
    pub fn at(&self, timestamp: &Timestamp) -> &[TradeAction] {
        let start = self.actions.partition_point(|a| a.timestamp < *timestamp);
        let end = self.actions.partition_point(|a| a.timestamp <= *timestamp);
        &self.actions[start..end]
    }
}

impl<'a> IntoIterator for &'a ActionLog {
    type Item = &'a TradeAction;
    type IntoIter = std::slice::Iter<'a, TradeAction>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

impl AsRef<[TradeAction]> for ActionLog {
    fn as_ref(&self) -> &[TradeAction] {
        &self.actions
    }
}
