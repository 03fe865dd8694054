//! Paired profit: the compounded "session profit" figure.
//!
//! Unlike the ledger, actions are not matched through stacks: the log is read
//! as consecutive `(entry, exit)` pairs in order, and every accepted pair
//! multiplies a running ratio.

use crate::domain::{ActionKind, TradeAction};

/// Gross ratio of one `(entry, exit)` pair, or `None` when the pair is not a
/// matching open/clear of the same side.
fn pair_ratio(entry: &TradeAction, exit: &TradeAction) -> Option<f64> {
    match (entry.kind, exit.kind) {
        (ActionKind::Buy, ActionKind::BuyClear) => Some(exit.level / entry.level),
        (ActionKind::Sell, ActionKind::SellClear) => Some(entry.level / exit.level),
        _ => None,
    }
}

/// Compounded percentage profit over consecutive action pairs.
///
/// A trailing unpaired action is ignored. Pairs that are not `buy→buy_clear`
/// or `sell→sell_clear` contribute nothing.
pub fn paired_profit(actions: &[TradeAction]) -> f64 {
    let total_ratio: f64 = actions
        .chunks_exact(2)
        .filter_map(|pair| pair_ratio(&pair[0], &pair[1]))
        .product();
    (total_ratio - 1.0) * 100.0
}

/// Session profit as printed above the action history: `"0 %"` until at
/// least two actions exist, then three significant digits in the labeling
/// screen's general format (`10.0%`, `22.2%`, `1.23e+03%`).
pub fn session_profit_text(actions: &[TradeAction]) -> String {
    if actions.len() < 2 {
        return "0 %".to_string();
    }
    format!("{}%", format_significant(paired_profit(actions), 3))
}

/// General-format `value` with `digits` significant digits.
///
/// Fixed notation keeps at least one fractional digit (`10.0`, `0.0123`);
/// magnitudes below `1e-4` or at least `10^digits` switch to exponent
/// notation with a signed two-digit exponent (`1.23e+03`).
pub(crate) fn format_significant(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    if value == 0.0 {
        return "0.0".to_string();
    }
    let digits = digits.max(1);
    // Exponent after rounding, so 9.996 counts as 1.00e1.
    let sci = format!("{:.*e}", digits - 1, value);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= digits as i32 {
        let mantissa = strip_fraction_zeros(mantissa);
        return format!("{mantissa}e{exp:+03}");
    }
    let decimals = (digits as i32 - 1 - exp).max(0) as usize;
    let fixed = format!("{value:.decimals$}");
    let fixed = strip_fraction_zeros(&fixed);
    if fixed.contains('.') {
        fixed.to_string()
    } else {
        format!("{fixed}.0")
    }
}

fn strip_fraction_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
