//! Action-history pane text and archive naming.

use crate::domain::ActionLog;
use crate::paired::{paired_profit, session_profit_text};
use crate::settings::ReplaySettings;

/// Text of the action-history pane: the session profit, then every action
/// newest-first.
pub fn history_text(log: &ActionLog) -> String {
    let mut text = format!("profits: {}", session_profit_text(log.as_slice()));
    for action in log.iter().rev() {
        text.push('\n');
        text.push_str(&action.to_string());
    }
    text
}

/// File name for a saved action log:
/// `<ticker>_<interval>_<first>_<last>_<profit:.3>_<suffix>`.
///
/// Characters that are awkward in file names (`:`, ` `, `/`) in the
/// timestamps become `_`. `None` for an empty log.
pub fn archive_file_name(settings: &ReplaySettings, log: &ActionLog) -> Option<String> {
    let first = log.first()?;
    let last = log.last()?;
    let profit = paired_profit(log.as_slice());
    Some(format!(
        "{}_{}_{}_{}_{:.3}_{}",
        settings.ticker,
        settings.interval,
        sanitize(first.timestamp.as_str()),
        sanitize(last.timestamp.as_str()),
        profit,
        settings.actions_suffix
    ))
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if matches!(c, ':' | ' ' | '/') { '_' } else { c })
        .collect()
}
