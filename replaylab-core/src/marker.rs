//! Overlay markers for recorded actions.
//!
//! The chart itself lives elsewhere; this only decides which horizontal and
//! vertical guide lines an action gets and how they look.

use serde::{Deserialize, Serialize};

use crate::domain::{ActionKind, TradeAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    Green,
    Red,
    Grey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stroke {
    Dash,
    Solid,
}

/// Guide lines drawn through an action's bar and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub color: MarkerColor,
    pub stroke: Stroke,
}

/// Labeling screen: only the newest action is drawn, and only when it opens
/// a position.
pub fn labeling_marker(latest: Option<&TradeAction>) -> Option<Marker> {
    let color = match latest?.kind {
        ActionKind::Buy => MarkerColor::Green,
        ActionKind::Sell => MarkerColor::Red,
        ActionKind::BuyClear | ActionKind::SellClear => return None,
    };
    Some(Marker {
        color,
        stroke: Stroke::Dash,
    })
}

/// Replay screen: every action row is drawn; entries dashed, clears solid grey.
pub fn replay_marker(kind: ActionKind) -> Marker {
    match kind {
        ActionKind::Buy => Marker {
            color: MarkerColor::Green,
            stroke: Stroke::Dash,
        },
        ActionKind::Sell => Marker {
            color: MarkerColor::Red,
            stroke: Stroke::Dash,
        },
        ActionKind::BuyClear | ActionKind::SellClear => Marker {
            color: MarkerColor::Grey,
            stroke: Stroke::Solid,
        },
    }
}
