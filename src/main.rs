// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use bulk_translate::app_config::{self, Config};
use bulk_translate::app_controller::Controller;
use bulk_translate::{get_language_name, PersistedSnapshot, QueueItem, QueueSummary};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate every item of a JSON array file, one after another
    Run {
        /// JSON file with an array of queue items
        #[arg(value_name = "ITEMS_JSON")]
        items_path: PathBuf,
    },

    /// Continue the saved queue from where it stopped
    Resume,

    /// Show the saved queue, if any
    Status,

    /// Delete the saved queue
    Clear,

    /// Generate shell completions for bulk-translate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// bulk-translate - Bulk document translation queue
///
/// Sends documents one at a time through a remote step-wise translation
/// endpoint, with pause/resume across restarts.
#[derive(Parser, Debug)]
#[command(name = "bulk-translate")]
#[command(version)]
#[command(about = "Queue-driven bulk document translation client")]
#[command(long_about = "bulk-translate runs a queue of document translations against a remote chunked translation endpoint.

EXAMPLES:
    bulk-translate run items.json                     # Translate every item in items.json
    bulk-translate --api-url https://site/wp-json/x/v1 run items.json
    bulk-translate resume                             # Continue an interrupted queue
    bulk-translate status                             # Show the saved queue
    bulk-translate completions bash > bulk-translate.bash

ITEMS FILE:
    [{\"source_document_id\": 10, \"target_language\": \"es\", \"display_title\": \"Hello\"}]

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json", global = true)]
    config_path: String,

    /// Base URL of the translation REST namespace
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Anti-forgery token sent with every step request
    #[arg(long, env = "BULK_TRANSLATE_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // The logger itself lets everything through; the max level does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                Self::color_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "bulk-translate", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(&cli)?;

    // If log level was not set via command line, update it from config now
    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Run { items_path } => {
            let items = Controller::load_items(&items_path)?;
            info!("Loaded {} item(s) from {}", items.len(), items_path.display());
            let summary = controller.run_items(items).await?;
            print_summary(&summary);
        }
        Commands::Resume => match controller.resume().await? {
            Some(summary) => print_summary(&summary),
            None => println!("No saved queue to resume"),
        },
        Commands::Status => match controller.status()? {
            Some(snapshot) => print_status(&snapshot),
            None => println!("No saved queue"),
        },
        Commands::Clear => controller.clear()?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}

// Load or create configuration, then apply CLI overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let config_path = Path::new(&cli.config_path);
    let mut config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        // Create default configuration if not exists
        warn!("Config file not found at '{}', creating default config.", cli.config_path);
        let config = Config::default();
        config
            .save(config_path)
            .context("Failed to write default config")?;
        config
    };

    if let Some(api_url) = &cli.api_url {
        config.api.base_url = api_url.clone();
    }

    if let Some(token) = &cli.token {
        config.api.token = token.clone();
    }

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn describe(item: &QueueItem) -> String {
    let language = get_language_name(&item.target_language)
        .unwrap_or_else(|_| item.target_language.clone());
    format!("{} [{}]", item.label(), language)
}

fn print_summary(summary: &QueueSummary) {
    println!(
        "{} completed, {} failed{}",
        summary.completed.len(),
        summary.failed.len(),
        if summary.cancelled { " (cancelled)" } else { "" }
    );
    for item in &summary.failed {
        println!(
            "  failed: {}: {}",
            describe(item),
            item.error_message.as_deref().unwrap_or_default()
        );
    }
}

fn print_status(snapshot: &PersistedSnapshot) {
    println!(
        "Saved at {}: {} pending, {} completed, {} failed{}",
        snapshot.saved_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
        snapshot.pending.len() + usize::from(snapshot.interrupted.is_some()),
        snapshot.completed.len(),
        snapshot.failed.len(),
        if snapshot.paused { " (paused)" } else { "" }
    );
    if let Some(item) = &snapshot.interrupted {
        println!("  interrupted: {}", describe(item));
    }
    for item in &snapshot.pending {
        println!("  pending: {}", describe(item));
    }
}
