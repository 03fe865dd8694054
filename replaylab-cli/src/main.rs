//! ReplayLab CLI: replay, profit, window and history commands.
//!
//! Commands:
//! - `replay`: ledger summary of an action log (optionally bar-aligned)
//! - `profit`: compounded session profit of an action log
//! - `window`: replay window bounds for a tick
//! - `history`: action-history pane text
//! - `archive-name`: file name the labeling screen saves a log under

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;

use replaylab_core::cursor::{window_from_settings, Window};
use replaylab_core::domain::ActionLog;
use replaylab_core::frame::{join_actions, load_bars};
use replaylab_core::history::{archive_file_name, history_text};
use replaylab_core::ingest::load_actions;
use replaylab_core::ledger::{replay, replay_frame, replay_window, AccountingMode, Summary};
use replaylab_core::paired::{paired_profit, session_profit_text};
use replaylab_core::settings::ReplaySettings;

#[derive(Parser)]
#[command(
    name = "replaylab",
    about = "ReplayLab CLI: trade-label ledger and replay figures"
)]
struct Cli {
    /// Settings TOML file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the timestamp field name of action records.
    #[arg(long, global = true)]
    index_field: Option<String>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    RealizedOnly,
    HoldThrough,
}

impl From<ModeArg> for AccountingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::RealizedOnly => AccountingMode::RealizedOnly,
            ModeArg::HoldThrough => AccountingMode::HoldThrough,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an action log through the position stack ledger.
    Replay {
        /// Action log (JSON, or CSV by extension).
        #[arg(long)]
        actions: PathBuf,

        /// Accounting mode. Defaults to the settings value.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Bar CSV; when given, the log is joined with the bars and replayed
        /// bar by bar.
        #[arg(long)]
        bars: Option<PathBuf>,

        /// Replay tick; with --bars, only the window for this tick is replayed.
        #[arg(long, requires = "bars")]
        tick: Option<usize>,
    },
    /// Compounded session profit over consecutive action pairs.
    Profit {
        #[arg(long)]
        actions: PathBuf,
    },
    /// Window bounds for a replay tick.
    Window {
        #[arg(long)]
        tick: usize,

        /// Series length.
        #[arg(long)]
        total: usize,

        #[arg(long)]
        offset: Option<usize>,

        #[arg(long)]
        window_size: Option<usize>,

        /// Do not wrap the tick around the series.
        #[arg(long, default_value_t = false)]
        no_cyclic: bool,
    },
    /// Action-history pane text, newest first.
    History {
        #[arg(long)]
        actions: PathBuf,
    },
    /// Archive file name for an action log.
    ArchiveName {
        #[arg(long)]
        actions: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("replaylab=info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref(), cli.index_field)?;

    match cli.command {
        Commands::Replay {
            actions,
            mode,
            bars,
            tick,
        } => {
            let mode = mode.map(AccountingMode::from).unwrap_or(settings.accounting);
            run_replay(&settings, &actions, mode, bars.as_deref(), tick, cli.json)
        }
        Commands::Profit { actions } => run_profit(&settings, &actions, cli.json),
        Commands::Window {
            tick,
            total,
            offset,
            window_size,
            no_cyclic,
        } => {
            let settings = ReplaySettings {
                offset: offset.unwrap_or(settings.offset),
                window_size: window_size.unwrap_or(settings.window_size),
                cyclic: settings.cyclic && !no_cyclic,
                ..settings
            };
            print_window(window_from_settings(tick, total, &settings), cli.json)
        }
        Commands::History { actions } => {
            let log = read_log(&settings, &actions)?;
            println!("{}", history_text(&log));
            Ok(())
        }
        Commands::ArchiveName { actions } => {
            let log = read_log(&settings, &actions)?;
            let Some(name) = archive_file_name(&settings, &log) else {
                bail!("action log {} is empty; nothing to archive", actions.display());
            };
            println!("{}", settings.assets_dir.join(name).display());
            Ok(())
        }
    }
}

fn load_settings(config: Option<&Path>, index_field: Option<String>) -> Result<ReplaySettings> {
    let mut settings = match config {
        Some(path) => ReplaySettings::from_file(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => ReplaySettings::default(),
    };
    if let Some(field) = index_field {
        settings.index_field = field;
        settings.validate()?;
    }
    Ok(settings)
}

fn read_log(settings: &ReplaySettings, path: &Path) -> Result<ActionLog> {
    let log = load_actions(path, &settings.index_field)
        .with_context(|| format!("reading action log {}", path.display()))?;
    info!(actions = log.len(), path = %path.display(), "loaded action log");
    Ok(log)
}

fn run_replay(
    settings: &ReplaySettings,
    actions: &Path,
    mode: AccountingMode,
    bars: Option<&Path>,
    tick: Option<usize>,
    json: bool,
) -> Result<()> {
    let log = read_log(settings, actions)?;

    let summary = match bars {
        None => replay(log.as_slice(), mode),
        Some(bars_path) => {
            let bars = load_bars(bars_path, &settings.index_field)
                .with_context(|| format!("reading bars {}", bars_path.display()))?;
            let rows = join_actions(&bars, &log).context("joining actions with bars")?;
            match tick {
                Some(tick) => {
                    let w = window_from_settings(tick, rows.len(), settings);
                    info!(start = w.start, end = w.end, "replaying window");
                    replay_window(&rows, w, mode)
                }
                None => replay_frame(&rows, mode),
            }
        }
    };
    print_summary(&summary, json)
}

fn print_summary(summary: &Summary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!("{summary} [{}]", summary.mode);
    }
    Ok(())
}

fn run_profit(settings: &ReplaySettings, actions: &Path, json: bool) -> Result<()> {
    let log = read_log(settings, actions)?;
    if json {
        let value = serde_json::json!({
            "paired_profit_pct": paired_profit(log.as_slice()),
            "actions": log.len(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("profits: {}", session_profit_text(log.as_slice()));
    }
    Ok(())
}

fn print_window(w: Window, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&w)?);
    } else {
        println!("[{}, {})", w.start, w.end);
    }
    Ok(())
}
