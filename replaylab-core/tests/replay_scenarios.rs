//! End-to-end replay scenarios.
//!
//! Tests:
//! 1. Ledger figures on hand-computed logs (realized and hold-through)
//! 2. Paired session profit on the same logs
//! 3. Labeling flow: step cursor, marks, visible sublog
//! 4. Replay flow: bars joined with saved actions, windowed replay
//! 5. Archive round trip through disk
//! 6. Malformed prices stop at loading

use std::collections::BTreeMap;

use replaylab_core::cursor::{window, StepCursor};
use replaylab_core::domain::{ActionKind, ActionLog, Bar, TradeAction};
use replaylab_core::frame::{join_actions, load_bars, FrameError};
use replaylab_core::history::{archive_file_name, history_text};
use replaylab_core::ingest::{load_actions, parse_actions, save_actions, IngestError};
use replaylab_core::ledger::{replay, replay_frame, replay_window, AccountingMode};
use replaylab_core::paired::paired_profit;
use replaylab_core::settings::ReplaySettings;

/// Helper: daily bars with the given closes, starting 2024-01-01.
fn bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            timestamp: format!("2024-01-{:02}", i + 1).into(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            features: BTreeMap::new(),
        })
        .collect()
}

fn act(ts: &str, level: f64, kind: ActionKind) -> TradeAction {
    TradeAction::new(ts, level, kind)
}

fn assert_approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// ── 1. Ledger ───────────────────────────────────────────────────────

#[test]
fn empty_log_summary() {
    let summary = replay(&[], AccountingMode::RealizedOnly);
    assert_eq!(summary.summary_text(), "0.000%");
    assert_eq!(summary.return_pct, 0.0);
    assert_eq!((summary.open_long, summary.open_short), (0, 0));
}

#[test]
fn single_long_round_trip() {
    let log = [act("d1", 100.0, ActionKind::Buy), act("d2", 110.0, ActionKind::BuyClear)];
    let summary = replay(&log, AccountingMode::RealizedOnly);
    assert_eq!(summary.summary_text(), "10.000%");
    assert_eq!((summary.open_long, summary.open_short), (0, 0));
}

#[test]
fn stacked_longs_cleared_together() {
    let log = [
        act("d1", 100.0, ActionKind::Buy),
        act("d2", 105.0, ActionKind::Buy),
        act("d3", 110.0, ActionKind::BuyClear),
    ];
    let summary = replay(&log, AccountingMode::RealizedOnly);
    assert_approx(summary.return_pct, 10.0 + 5.0 / 105.0 * 100.0);
    assert_eq!(summary.summary_text(), "14.762%");
    assert_eq!(summary.open_long, 0);
}

#[test]
fn short_round_trip() {
    let log = [act("d1", 100.0, ActionKind::Sell), act("d2", 90.0, ActionKind::SellClear)];
    assert_eq!(replay(&log, AccountingMode::RealizedOnly).summary_text(), "10.000%");
}

#[test]
fn lone_sell_clear_is_noop() {
    let log = [act("d1", 90.0, ActionKind::SellClear)];
    let summary = replay(&log, AccountingMode::RealizedOnly);
    assert_eq!(summary.return_pct, 0.0);
    assert_eq!(summary.open_short, 0);
}

#[test]
fn clear_then_reopen() {
    let log = [
        act("d1", 100.0, ActionKind::Buy),
        act("d2", 110.0, ActionKind::BuyClear),
        act("d3", 110.0, ActionKind::Buy),
        act("d4", 110.0, ActionKind::BuyClear),
        act("d5", 99.0, ActionKind::Buy),
    ];
    let summary = replay(&log, AccountingMode::RealizedOnly);
    assert_approx(summary.return_pct, 10.0);
    assert_eq!(summary.open_long, 1);
}

// ── 2. Paired profit ────────────────────────────────────────────────

#[test]
fn paired_profit_compounds() {
    let log = [
        act("d1", 100.0, ActionKind::Buy),
        act("d2", 110.0, ActionKind::BuyClear),
        act("d3", 100.0, ActionKind::Sell),
        act("d4", 90.0, ActionKind::SellClear),
    ];
    assert_approx(paired_profit(&log), (1.1 * 100.0 / 90.0 - 1.0) * 100.0);

    let mut odd = log.to_vec();
    odd.push(act("d5", 80.0, ActionKind::Sell));
    assert_eq!(paired_profit(&odd), paired_profit(&log));
}

#[test]
fn paired_and_ledger_differ_on_multi_leg() {
    let log = [
        act("d1", 100.0, ActionKind::Buy),
        act("d2", 110.0, ActionKind::BuyClear),
        act("d3", 110.0, ActionKind::Buy),
        act("d4", 121.0, ActionKind::BuyClear),
    ];
    // Additive: 10% + 10%; compounding: 1.1 * 1.1 - 1.
    assert_approx(replay(&log, AccountingMode::RealizedOnly).return_pct, 20.0);
    assert_approx(paired_profit(&log), 21.0);
}

// ── 3. Labeling flow ────────────────────────────────────────────────

#[test]
fn labeling_session_records_and_rewinds() {
    let series = bars(&[100.0, 104.0, 108.0, 103.0, 99.0]);
    let mut cursor = StepCursor::new(series.len());
    let mut log = ActionLog::new();

    // Pressing buy before the first step records nothing.
    assert!(cursor.mark(ActionKind::Buy, &series).is_none());

    cursor.step_forward();
    log.push(cursor.mark(ActionKind::Buy, &series).unwrap()).unwrap();
    cursor.step_forward();
    cursor.step_forward();
    log.push(cursor.mark(ActionKind::BuyClear, &series).unwrap()).unwrap();
    cursor.step_forward();
    log.push(cursor.mark(ActionKind::Sell, &series).unwrap()).unwrap();

    let full = replay(log.as_slice(), AccountingMode::RealizedOnly);
    assert_approx(full.return_pct, 8.0);
    assert_eq!(full.open_short, 1);

    // Stepping back hides the sell; the ledger only sees the visible sublog.
    cursor.step_backward();
    let visible = cursor.visible_actions(&log, &series);
    assert_eq!(visible.len(), 2);
    let rewound = replay(visible, AccountingMode::RealizedOnly);
    assert_eq!(rewound.open_short, 0);
    assert_approx(rewound.return_pct, 8.0);

    assert!(history_text(&log).starts_with("profits: 8.0%"));
}

// ── 4. Replay flow ──────────────────────────────────────────────────

#[test]
fn hold_through_over_bars() {
    let series = bars(&[100.0, 102.0, 104.0, 110.0, 120.0]);
    let log = ActionLog::from_actions(vec![
        act("2024-01-01", 100.0, ActionKind::Buy),
        act("2024-01-04", 110.0, ActionKind::BuyClear),
    ])
    .unwrap();
    let rows = join_actions(&series, &log).unwrap();
    assert_eq!(rows.len(), 4);

    let realized = replay_frame(&rows, AccountingMode::RealizedOnly);
    assert_approx(realized.return_pct, 10.0);

    // Held on bars 1..3: 0% + 2% + 4%, then realized 10% on the clear bar.
    let held = replay_frame(&rows, AccountingMode::HoldThrough);
    assert_approx(held.return_pct, 16.0);
    assert_eq!(held.open_long, 0);
}

#[test]
fn windowed_replay_sees_trailing_bars_only() {
    let series = bars(&[100.0, 102.0, 104.0, 106.0, 108.0, 110.0]);
    let log = ActionLog::from_actions(vec![
        act("2024-01-01", 100.0, ActionKind::Buy),
        act("2024-01-03", 104.0, ActionKind::BuyClear),
        act("2024-01-04", 106.0, ActionKind::Sell),
        act("2024-01-06", 110.0, ActionKind::SellClear),
    ])
    .unwrap();
    let rows = join_actions(&series, &log).unwrap();

    // Window [3, 6) drops the long round trip.
    let w = window(1, rows.len(), 0, 5, true);
    assert_eq!((w.start, w.end), (1, 6));
    let w = window(3, rows.len(), 0, 3, true);
    assert_eq!((w.start, w.end), (3, 6));
    let summary = replay_window(&rows, w, AccountingMode::RealizedOnly);
    assert_approx(summary.return_pct, (106.0 - 110.0) / 106.0 * 100.0);

    // Tick equal to the series length wraps to the start.
    assert_eq!(window(rows.len(), rows.len(), 0, 3, true), window(0, rows.len(), 0, 3, true));
}

// ── 5. Archive round trip ───────────────────────────────────────────

#[test]
fn archive_round_trip_on_disk() {
    let settings = ReplaySettings {
        ticker: "AAPL".into(),
        interval: "15m".into(),
        index_field: "Datetime".into(),
        ..ReplaySettings::default()
    };
    let log = parse_actions(
        r#"[
            {"Datetime": "2023-04-13 10:30:00", "level": 165.0, "act": "sell"},
            {"Datetime": "2023-04-13 13:45:00", "level": 150.0, "act": "sell_clear"}
        ]"#,
        &settings.index_field,
    )
    .unwrap();

    let name = archive_file_name(&settings, &log).unwrap();
    assert!(name.starts_with("AAPL_15m_2023-04-13_10_30_00_"));
    assert!(name.ends_with("_10.000_actions.csv"));

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join(&name);
    save_actions(&csv_path, &log, &settings.index_field).unwrap();
    assert_eq!(load_actions(&csv_path, &settings.index_field).unwrap(), log);

    let json_path = dir.path().join("actions.json");
    save_actions(&json_path, &log, &settings.index_field).unwrap();
    assert_eq!(load_actions(&json_path, &settings.index_field).unwrap(), log);
}

#[test]
fn ingestion_errors_never_reach_ledger() {
    let err = parse_actions(r#"[{"Date": "d1", "level": 1.0, "act": "close"}]"#, "Date").unwrap_err();
    assert!(matches!(err, IngestError::InvalidActionKind { .. }));

    let err = parse_actions(r#""not records""#, "Date").unwrap_err();
    assert!(matches!(err, IngestError::Parse { .. }));

    let dir = tempfile::tempdir().unwrap();
    let err = load_actions(&dir.path().join("missing.json"), "Date").unwrap_err();
    assert!(matches!(err, IngestError::Io { .. }));
}

#[test]
fn bar_file_with_missing_close_fails_to_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("AAPL_1d.csv");
    std::fs::write(
        &path,
        "Date,Open,High,Low,Close\n\
         2024-01-01,100,101,99,100\n\
         2024-01-02,101,103,100,\n\
         2024-01-03,102,106,101,105\n",
    )
    .unwrap();
    assert!(matches!(
        load_bars(&path, "Date"),
        Err(FrameError::InvalidNumber { row: 1, .. })
    ));

    let mut log = ActionLog::new();
    log.push(TradeAction::new("2024-01-01", 100.0, ActionKind::Buy)).unwrap();
    assert!(log
        .push(TradeAction::new("2024-01-02", f64::NAN, ActionKind::BuyClear))
        .is_err());
    assert_eq!(replay(log.as_slice(), AccountingMode::HoldThrough).return_pct, 0.0);
}
