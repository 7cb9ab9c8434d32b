use anyhow::{bail, Context, Result};
use colored::Colorize;
use dragtree::components::scoreboard::RunResult;
use dragtree::prelude::*;
use dragtree::{ENGINE_NAME, VERSION as LIB_VERSION};
use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::{mpsc, watch};
use tracing::info;

mod terminal;
mod view;

use terminal::TerminalGuard;

const SHELL_VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_CONFIG: &str = "dragtree.toml";
/// Set this to anything to log to `DEBUG_LOG`.
const DEBUG_ENV: &str = "DRAGTREE_DEBUG";
const DEBUG_LOG: &str = "debug.log";
const KEY_CHANNEL_CAPACITY: usize = 16;

/// Command-line options. `None` means the user only asked for usage text.
fn parse_args() -> Result<Option<PathBuf>> {
    let mut config_path = PathBuf::from(DEFAULT_CONFIG);
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => match args.next() {
                Some(path) => config_path = PathBuf::from(path),
                None => bail!("{} needs a path", arg),
            },
            "-h" | "--help" => {
                print_usage();
                return Ok(None);
            }
            "-V" | "--version" => {
                println!("dragshell v{} ({} v{})", SHELL_VERSION, ENGINE_NAME, LIB_VERSION);
                return Ok(None);
            }
            other => bail!("unknown argument '{}'. Try --help.", other),
        }
    }
    Ok(Some(config_path))
}

fn print_usage() {
    println!("{}", "dragshell".cyan().bold());
    println!("  A drag racing Christmas tree in your terminal.");
    println!();
    println!("Usage: dragshell [--config <PATH>]");
    println!();
    println!("  -c, --config <PATH>   Tree configuration (default: {})", DEFAULT_CONFIG);
    println!("  -h, --help            Show this text.");
    println!("  -V, --version         Show versions.");
    println!();
    println!("Set {} to write a debug log to ./{}.", DEBUG_ENV, DEBUG_LOG);
}

/// Logs to a file when asked to; the terminal itself is the drawing surface.
fn init_logging() -> Result<()> {
    if env::var_os(DEBUG_ENV).is_none() {
        return Ok(());
    }
    let file = File::create(DEBUG_LOG)
        .with_context(|| format!("couldn't open {} for logging", DEBUG_LOG))?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();
    Ok(())
}

/// Redraws the tree every time the engine publishes a new frame.
async fn paint(
    mut frames: watch::Receiver<Frame>,
    mapper: InputMapper,
    yellow_count: u8,
) -> Result<()> {
    loop {
        let frame = *frames.borrow_and_update();
        terminal::draw(&view::render(&frame, &mapper, yellow_count))?;
        if frames.changed().await.is_err() {
            return Ok(());
        }
    }
}

fn describe(result: &RunResult) -> String {
    match result {
        RunResult::Reaction(time) => view::format_time(*time),
        RunResult::FalseStart(stage) => format!("{} during {}", "FALSE START".red(), stage),
    }
}

fn print_summary(scoreboard: &Scoreboard) {
    println!("{}", "-----------------------------------------".dimmed());
    println!(
        "{} session: {} runs, {} false starts",
        ENGINE_NAME.cyan(),
        scoreboard.runs(),
        scoreboard.false_starts()
    );
    if let Some(best) = scoreboard.best() {
        println!("  Best reaction:  {}", view::format_time(best).green().bold());
    }
    if let Some(average) = scoreboard.recent_average() {
        println!("  Recent average: {}", view::format_time(average));
    }
    if let Some(last) = scoreboard.last() {
        println!("  Last run:       {}", describe(&last.result));
    }
    for record in scoreboard.history() {
        let when = record.recorded_at.with_timezone(&chrono::Local).format("%H:%M:%S");
        println!("  {}  {}", when, describe(&record.result));
    }
    println!("{}", "-----------------------------------------".dimmed());
}

#[tokio::main]
async fn main() -> Result<()> {
    let Some(config_path) = parse_args()? else {
        return Ok(());
    };
    init_logging()?;

    let engine = TreeEngine::new(TreeConfig::load(&config_path)?);
    let yellow_count = engine.config().timing.yellow_count();
    let mapper = engine.mapper().clone();
    let frames = engine.watch_frames();
    info!("dragshell v{} starting with {}", SHELL_VERSION, config_path.display());

    let guard = TerminalGuard::enter()?;

    let (key_tx, key_rx) = mpsc::channel(KEY_CHANNEL_CAPACITY);
    let reader = tokio::task::spawn_blocking(move || terminal::read_keys(key_tx));
    let painter = tokio::spawn(paint(frames, mapper, yellow_count));

    let outcome = engine.run(key_rx).await;
    let painted = painter.await.context("painter task failed")?;
    let read = reader.await.context("key reader task failed")?;
    drop(guard);

    let scoreboard = outcome?;
    painted?;
    read?;
    print_summary(&scoreboard);
    Ok(())
}
