//! Replay cursor: tick → visible window, and the step state machine.
//!
//! Pure index arithmetic. Every caller slices bars, features and frame rows
//! with these bounds, so the clamping rules here are load-bearing:
//! - cyclic mode wraps `tick` modulo `total` first;
//! - `end = min(total, tick + offset + window_size)`;
//! - `start = end - window_size`, clamped at 0.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::domain::{ActionKind, ActionLog, Bar, TradeAction};
use crate::settings::ReplaySettings;

/// Half-open index range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Window {
    pub start: usize,
    pub end: usize,
}

impl Window {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slice `items` by this window, clipped to the slice length.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let end = self.end.min(items.len());
        let start = self.start.min(end);
        &items[start..end]
    }
}

/// Visible window for a replay tick.
///
/// `total == 0` yields an empty window at 0; `window_size == 0` yields an
/// empty window at `end`.
pub fn window(tick: usize, total: usize, offset: usize, window_size: usize, cyclic: bool) -> Window {
    if total == 0 {
        return Window::default();
    }
    let tick = if cyclic { tick % total } else { tick };
    let end = tick
        .saturating_add(offset)
        .saturating_add(window_size)
        .min(total);
    let start = end.saturating_sub(window_size);
    Window { start, end }
}

/// [`window`] with offset, size and cyclic flag taken from settings.
pub fn window_from_settings(tick: usize, total: usize, settings: &ReplaySettings) -> Window {
    window(
        tick,
        total,
        settings.offset,
        settings.window_size,
        settings.cyclic,
    )
}

/// Manual stepping position over `len` bars. `step` counts visible bars, so
/// the current bar is `step - 1` and step 0 shows nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepCursor {
    step: usize,
    len: usize,
}

impl StepCursor {
    pub fn new(len: usize) -> Self {
        Self { step: 0, len }
    }

    /// Cursor at `step`, clamped to `[0, len]`.
    pub fn at(step: usize, len: usize) -> Self {
        Self {
            step: step.min(len),
            len,
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn step_forward(&mut self) -> usize {
        self.step = (self.step + 1).min(self.len);
        self.step
    }

    pub fn step_backward(&mut self) -> usize {
        self.step = self.step.saturating_sub(1);
        self.step
    }

    /// Bar under the cursor (`None` at step 0).
    pub fn current_bar<'a>(&self, bars: &'a [Bar]) -> Option<&'a Bar> {
        self.step.checked_sub(1).and_then(|i| bars.get(i))
    }

    /// The action a button press records at the current bar: its timestamp
    /// and close. `None` at step 0.
    pub fn mark(&self, kind: ActionKind, bars: &[Bar]) -> Option<TradeAction> {
        self.current_bar(bars)
            .map(|bar| TradeAction::new(bar.timestamp.clone(), bar.close, kind))
    }

    /// Actions visible at the current step: everything recorded at or before
    /// the current bar.
    pub fn visible_actions<'a>(&self, log: &'a ActionLog, bars: &[Bar]) -> &'a [TradeAction] {
        match self.current_bar(bars) {
            Some(bar) => log.up_to(&bar.timestamp),
            None => &[],
        }
    }
}
