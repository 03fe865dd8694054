//! ReplayLab Core: trade-action ledger and return computation.
//!
//! This crate turns a manually labeled sequence of trade actions into the
//! figures the labeling and replay screens display:
//! - Action log ingestion (JSON / CSV) with a closed action-kind enum
//! - Position stack ledger with realized-only and hold-through accounting
//! - Paired, compounded session profit
//! - Replay cursor windows and the manual step cursor
//! - Replay frame (bars joined with actions), overlay markers, history text
//!
//! Every computation is a pure function of its inputs: nothing is cached and
//! there is no process-wide state.

pub mod cursor;
pub mod domain;
pub mod frame;
pub mod history;
pub mod ingest;
pub mod ledger;
pub mod marker;
pub mod paired;
pub mod settings;

pub use cursor::{window, window_from_settings, StepCursor, Window};
pub use domain::{ActionKind, ActionLog, Bar, LogError, Side, Timestamp, TradeAction};
pub use frame::{join_actions, FrameError, FrameRow};
pub use history::{archive_file_name, history_text};
pub use ingest::{parse_actions, to_json, IngestError};
pub use ledger::{replay, replay_frame, replay_window, AccountingMode, Summary};
pub use marker::{Marker, MarkerColor, Stroke};
pub use paired::{paired_profit, session_profit_text};
pub use settings::{ReplaySettings, SettingsError};
