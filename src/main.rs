use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod settings;

use app::App;
use settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "pagepilot", version, about = "Conversational web-automation agent")]
struct Cli {
    /// Settings file path
    #[arg(long, default_value = "settings.json")]
    config: PathBuf,

    /// Log filter, e.g. "info" or "pagepilot_agent=debug"
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive conversation (default)
    Chat,
    /// Execute a single goal and exit
    Run {
        /// What to accomplish
        goal: String,
    },
    /// Write the effective settings back to the settings file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting PagePilot v{}", env!("CARGO_PKG_VERSION"));
    let settings = Settings::load(&cli.config)?;

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => App::build(&settings)?.chat().await,
        Command::Run { goal } => App::build(&settings)?.run_once(&goal).await,
        Command::InitConfig => {
            settings.save(&cli.config)?;
            println!("wrote {}", cli.config.display());
            Ok(())
        }
    }
}
