use clap::{Parser, Subcommand};
use productivity_core::{Config, ConfigError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod transport;

use commands::{ChatCommand, DashboardCommand, HabitCommand, TodoCommand};
use transport::UreqTransport;

#[derive(Parser)]
#[command(name = "productivity")]
#[command(version)]
#[command(about = "Todos, habits and an assistant, backed by a remote store", long_about = None)]
struct Cli {
    /// Base URL of the backend; overrides PRODUCTIVITY_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage todos
    Todo(TodoCommand),

    /// Manage habits
    Habit(HabitCommand),

    /// Summary of todos and habits
    Dashboard(DashboardCommand),

    /// Ask the assistant
    Chat(ChatCommand),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "productivity_core=warn,productivity=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = with_url_flag(Config::from_env()?, cli.api_url.as_deref())?;
    tracing::debug!("Using backend at {}", config.api_url);

    let transport = UreqTransport::new(config.timeout);
    let base_url = config.api_url.as_str();

    match cli.command {
        Some(Commands::Todo(cmd)) => cmd.run(base_url, &transport),
        Some(Commands::Habit(cmd)) => cmd.run(base_url, &transport),
        Some(Commands::Dashboard(cmd)) => cmd.run(base_url, &transport),
        Some(Commands::Chat(cmd)) => cmd.run(base_url, &transport),
        None => println!("Use --help to see available commands"),
    }

    Ok(())
}

/// Apply `--api-url` on top of the environment, with the same checks.
fn with_url_flag(mut config: Config, flag: Option<&str>) -> Result<Config, ConfigError> {
    if let Some(url) = flag {
        config.set_api_url(url, "--api-url")?;
    }
    Ok(config)
}
