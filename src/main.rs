//! transcript-layout - headless entry point
//!
//! Lays out a transcript for a given viewport, optionally paginating history
//! for a number of idle ticks, and prints the resulting geometry as JSON.

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use transcript_layout::config;
use transcript_layout::integration::Scene;
use transcript_layout::logging::{self, LogTarget};
use transcript_layout::model::{AppError, AppState};
use transcript_layout::shaping::MonospaceShaper;
use transcript_layout::source::{FileHistory, HistoryApi, MemoryHistory};

/// Lay out a conversation transcript and print its geometry as JSON
#[derive(Parser, Debug)]
#[command(name = "transcript-layout")]
#[command(version)]
#[command(about = "Headless layout of a paginated conversation transcript")]
pub struct Args {
    /// JSONL history file, one page (JSON array of messages) per line
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Viewport width in content units
    #[arg(long, default_value_t = 800.0)]
    pub width: f32,

    /// Viewport height in content units
    #[arg(long, default_value_t = 600.0)]
    pub height: f32,

    /// Idle intervals to simulate after the first frame
    #[arg(long, default_value_t = 0)]
    pub ticks: u32,

    /// Lifecycle state to enter before the first frame
    #[arg(long, default_value = "idle", value_parser = parse_state)]
    pub state: AppState,

    /// Text in the input block
    #[arg(long)]
    pub input: Option<String>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Shift responses left by their trust score
    #[arg(long)]
    pub trust_weighted: bool,

    /// Milliseconds between idle ticks
    #[arg(long)]
    pub idle_interval_ms: Option<u64>,

    /// Log to stderr instead of the log file
    #[arg(long)]
    pub log_stderr: bool,
}

fn parse_state(value: &str) -> Result<AppState, String> {
    value.parse::<AppState>().map_err(|e| e.to_string())
}

fn main() -> Result<(), AppError> {
    let args = Args::parse();

    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = config::load_config_with_precedence(args.config.clone())?;
        let merged = config::merge_config(config_file);
        let with_env = config::apply_env_overrides(merged);
        // Only override trust weighting if the flag was explicitly set
        let trust_override = args.trust_weighted.then_some(true);
        config::apply_cli_overrides(with_env, trust_override, args.idle_interval_ms)
    };

    let target = if args.log_stderr {
        LogTarget::Stderr
    } else {
        LogTarget::File(config.log_file_path.clone())
    };
    logging::init(&target)?;

    info!(config = ?config, "Configuration loaded and resolved");

    let history: Box<dyn HistoryApi> = match &args.history {
        Some(path) => Box::new(FileHistory::open(path)?),
        None => Box::new(MemoryHistory::default()),
    };

    let mut scene = Scene::new(
        &config,
        args.width,
        args.height,
        history,
        Box::new(MonospaceShaper::default()),
    );
    scene.set_state(args.state);
    if let Some(text) = &args.input {
        scene.set_input(text, text.chars().count());
    }

    let report = scene.run_headless(Instant::now(), args.ticks);

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &report)?;
    writeln!(stdout)?;
    Ok(())
}
