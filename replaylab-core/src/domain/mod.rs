//! Domain types for ReplayLab

pub mod action;
pub mod bar;

pub use action::{
    ActionKind, ActionLog, InvalidLevel, LogError, OutOfOrder, Side, Timestamp, TradeAction,
    UnknownActionKind,
};
pub use bar::Bar;
