//! Position stack ledger.
//!
//! Replays an action sequence from empty stacks into a [`Summary`]: the
//! accumulated return percentage and the number of positions still open on
//! each side. Nothing is cached between calls; identical input always yields
//! an identical summary.
//!
//! Each side keeps a LIFO stack of entry prices. `Buy`/`Sell` push onto the
//! long/short stack; `BuyClear`/`SellClear` drain the whole matching stack at
//! the clear price, every entry adding its own return term. A clear against
//! an empty stack is a no-op.
//!
//! Two accounting modes exist and are never mixed:
//! - [`AccountingMode::RealizedOnly`]: only clears contribute.
//! - [`AccountingMode::HoldThrough`]: clears contribute, and after every step
//!   each still-open entry also adds its mark-to-market return against that
//!   step's price (once per step held).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cursor::Window;
use crate::domain::{ActionKind, Side, TradeAction};
use crate::frame::FrameRow;

/// Which return figure the ledger accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountingMode {
    #[default]
    RealizedOnly,
    HoldThrough,
}

impl AccountingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountingMode::RealizedOnly => "realized_only",
            AccountingMode::HoldThrough => "hold_through",
        }
    }
}

impl fmt::Display for AccountingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a full replay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub mode: AccountingMode,
    /// Accumulated return in percent (10.0 means +10%).
    pub return_pct: f64,
    pub open_long: usize,
    pub open_short: usize,
}

impl Summary {
    pub fn empty(mode: AccountingMode) -> Self {
        Self {
            mode,
            return_pct: 0.0,
            open_long: 0,
            open_short: 0,
        }
    }

    /// Return figure as shown in the status line, e.g. `"10.000%"`.
    pub fn summary_text(&self) -> String {
        format!("{:.3}%", self.return_pct)
    }

    pub fn open_count(&self, side: Side) -> usize {
        match side {
            Side::Long => self.open_long,
            Side::Short => self.open_short,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "return: {} (long: {}, short: {})",
            self.summary_text(),
            self.open_long,
            self.open_short
        )
    }
}

/// Open entry prices for both sides.
#[derive(Debug, Default)]
struct PositionStacks {
    long: Vec<f64>,
    short: Vec<f64>,
}

impl PositionStacks {
    fn stack_mut(&mut self, side: Side) -> &mut Vec<f64> {
        match side {
            Side::Long => &mut self.long,
            Side::Short => &mut self.short,
        }
    }

    /// Apply one action, returning the realized return it produced.
    fn apply(&mut self, kind: ActionKind, price: f64) -> f64 {
        let side = kind.side();
        let stack = self.stack_mut(side);
        if kind.is_entry() {
            stack.push(price);
            return 0.0;
        }
        let mut realized = 0.0;
        while let Some(entry) = stack.pop() {
            realized += side.return_pct(entry, price);
        }
        realized
    }

    /// Sum of unrealized returns of every open entry at `price`.
    fn mark_to_market(&self, price: f64) -> f64 {
        let long: f64 = self
            .long
            .iter()
            .map(|&entry| Side::Long.return_pct(entry, price))
            .sum();
        let short: f64 = self
            .short
            .iter()
            .map(|&entry| Side::Short.return_pct(entry, price))
            .sum();
        long + short
    }
}

/// Core replay loop. Each step applies its actions in order, then (in
/// hold-through mode) marks every open entry against `mark`.
fn replay_steps<'a, I>(steps: I, mode: AccountingMode) -> Summary
where
    I: IntoIterator<Item = (&'a [TradeAction], f64)>,
{
    let mut stacks = PositionStacks::default();
    let mut return_pct = 0.0;

    for (actions, mark) in steps {
        for action in actions {
            return_pct += stacks.apply(action.kind, action.level);
        }
        if mode == AccountingMode::HoldThrough {
            return_pct += stacks.mark_to_market(mark);
        }
    }

    Summary {
        mode,
        return_pct,
        open_long: stacks.long.len(),
        open_short: stacks.short.len(),
    }
}

/// Replay an action sequence. One step per action; the step price is the
/// action's own level.
pub fn replay(actions: &[TradeAction], mode: AccountingMode) -> Summary {
    replay_steps(
        actions
            .iter()
            .map(|action| (std::slice::from_ref(action), action.level)),
        mode,
    )
}

/// Replay a bar-aligned frame. One step per bar: the bar's actions open or
/// clear at their recorded levels, open entries are marked at the bar close.
pub fn replay_frame(rows: &[FrameRow], mode: AccountingMode) -> Summary {
    replay_steps(
        rows.iter()
            .map(|row| (row.actions.as_slice(), row.bar.close)),
        mode,
    )
}

/// Replay only the rows inside a cursor window (the trailing `window_size`
/// bars of the current replay tick).
pub fn replay_window(rows: &[FrameRow], window: Window, mode: AccountingMode) -> Summary {
    replay_frame(window.slice(rows), mode)
}
