//! newsdesk CLI application
//!
//! Command-line interface for reading and managing the news site through
//! its cached data-access layer.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use newsdesk::cli::{
    handle_config, handle_media, handle_preload, handle_read, Cli, Commands, GlobalArgs,
};
use newsdesk::config::{AppConfig, LoggingConfig};
use newsdesk::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        tracing::debug!("Command failed ({} error)", e.category());
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let Cli { global, command } = Cli::parse_args();

    // `config` manages the file itself, so it runs on the default level
    let config = match command {
        Commands::Config(args) => {
            init_logging(&global, &LoggingConfig::default())?;
            return handle_config(&global, args).await;
        }
        _ => AppConfig::load(global.config.clone()).await?,
    };
    init_logging(&global, &config.logging)?;

    info!("newsdesk v{} starting", env!("CARGO_PKG_VERSION"));

    match command {
        Commands::Preload => handle_preload(&global, &config).await,
        Commands::Media(args) => {
            info!("Executing media command");
            handle_media(&global, &config, args).await
        }
        command => handle_read(&global, &config, command).await,
    }
}

/// Initialize logging from the configured level and the CLI verbosity flags
fn init_logging(global: &GlobalArgs, logging: &LoggingConfig) -> Result<()> {
    let log_level = global.log_level(logging.parsed_level()?);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("newsdesk={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if global.very_verbose {
        info!("Very verbose logging enabled");
    } else if global.verbose {
        info!("Verbose logging enabled");
    }
    Ok(())
}
