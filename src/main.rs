use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod app;
mod chat;
mod config;
mod handler;
mod home;
mod tui;
mod ui;

use app::App;
use config::Config;

#[derive(Parser)]
#[command(name = "cropchat")]
#[command(version, about = "Terminal demo of a crop-recommendation chat assistant")]
struct Cli {
    /// Path to an alternate config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed the reply selection for reproducible demos
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;
    info!(
        replies = config.response_corpus.len(),
        response_delay_ms = config.response_delay_ms,
        "starting cropchat"
    );

    let mut app = App::new(config, cli.seed);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new(tui::TICK_INTERVAL);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;
        if let Some(event) = events.next().await {
            handler::handle_event(app, event);
        }
    }

    Ok(())
}

/// Logs go to a file: the TUI owns stderr, so writing there would tear the
/// screen apart.
fn init_logging(verbose: bool) -> Result<()> {
    let path = Config::log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::options().create(true).append(true).open(path)?;

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
