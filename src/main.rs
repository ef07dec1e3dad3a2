use std::io::Write;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use micro_analysis::{
    cli::{execute_command, Commands},
    config::{Config, LogFormat},
    storage::SqliteStorage,
    workspace::ReviewWorkspace,
};

/// Duplicate detection and batch completion for pairwise response review
#[derive(Parser, Debug)]
#[command(name = "micro-analysis", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "micro-analysis starting");

    let storage = match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    let mut workspace = ReviewWorkspace::new(storage);
    let result = execute_command(cli.command, &mut workspace).await;

    if result.exit_code == 0 {
        print!("{}", result.message);
        let _ = std::io::stdout().flush();
    } else {
        eprint!("{}", result.message);
        if !result.message.ends_with('\n') {
            eprintln!();
        }
    }
    std::process::exit(result.exit_code);
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
