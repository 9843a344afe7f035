use clap::Parser;
use color_eyre::Result;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tickets::cli::{Cli, Commands};
use tickets::{Config, Profile, SqliteTicketStore};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev {
        Profile::Dev
    } else {
        Profile::Prod
    };

    let custom_config = cli.config.as_deref().map(PathBuf::from);
    let config = Config::load(profile, custom_config.as_deref())?;

    init_logging(&config.get_log_path(), &config.log_level)?;

    // Initialize the ticket store
    let db_path = config.get_database_path();
    let store = SqliteTicketStore::new(
        db_path.to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?
    )?;

    // Dispatch to appropriate command handler
    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let app = tickets::tui::App::new(config, Box::new(store))?;
            tickets::tui::run_event_loop(app)?;
        }
        Commands::Add { description, priority, due } => {
            tickets::cli::handle_add(description, priority, due, config.default_due_date(), &store)?;
        }
        Commands::List { status, priority, json } => {
            tickets::cli::handle_list(status, priority, json, &store)?;
        }
        Commands::Delete { id } => {
            tickets::cli::handle_delete(id, &store)?;
        }
        Commands::Stats => {
            tickets::cli::handle_stats(&store)?;
        }
    }

    Ok(())
}

/// Log to a file; the terminal belongs to the TUI. RUST_LOG overrides the configured level.
fn init_logging(log_path: &Path, level: &str) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(log_path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("tickets={}", level).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    Ok(())
}
