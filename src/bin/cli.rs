//! seatwatch CLI
//!
//! Local front end for the watch engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use seatwatch::{
    error::Result,
    models::{AddOutcome, Config, CourseCode, RemoveOutcome, UserId},
    pipeline::WatchEngine,
    services::{LogNotifier, Notifier, WebSocScraper, WebhookNotifier},
    storage::JsonFileStorage,
    utils::http,
};

/// seatwatch - Course Seat Watcher
#[derive(Parser, Debug)]
#[command(
    name = "seatwatch",
    version,
    about = "Notifies you when a watched course section has an open seat"
)]
struct Cli {
    /// Path to storage directory containing config and watch list
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Engine(EngineCommand),

    /// Validate configuration file
    Validate,
}

/// Commands that run against the watch engine.
#[derive(Subcommand, Debug)]
enum EngineCommand {
    /// Add a course to a user's watch list
    Watch {
        #[arg(short, long)]
        user: String,
        /// Course code to watch
        course: String,
    },

    /// Remove a course from a user's watch list
    Unwatch {
        #[arg(short, long)]
        user: String,
        course: String,
    },

    /// Show a user's watch list
    List {
        #[arg(short, long)]
        user: String,
    },

    /// Run a single check cycle now
    Check,

    /// Check on the configured interval until interrupted
    Run,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, configured: &str) {
    let level = if verbose { "debug" } else { configured };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Check the configuration and report the outcome.
fn run_validate(config: &Config) -> Result<()> {
    log::info!("Validating configuration...");
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    log::info!("✓ Config OK");
    Ok(())
}

/// Wire the engine to the real scraper, notifier and watch list file.
async fn build_engine(storage_dir: &Path, config: &Config) -> Result<WatchEngine> {
    let client = http::create_async_client(&config.scraper)?;
    let scraper = Arc::new(WebSocScraper::with_client(&config.scraper, client.clone())?);
    let notifier: Arc<dyn Notifier> = match &config.notifier.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(client, url)?),
        None => Arc::new(LogNotifier),
    };
    let backend = Arc::new(JsonFileStorage::new(
        storage_dir,
        &config.storage.watchlist_file,
    ));
    Ok(WatchEngine::from_config(config, backend, scraper, notifier).await)
}

async fn run_command(engine: &WatchEngine, config: &Config, command: EngineCommand) -> Result<()> {
    match command {
        EngineCommand::Watch { user, course } => {
            match engine.add_watch(UserId::new(user), CourseCode::new(&course)).await? {
                AddOutcome::Added => println!("Added course `{course}` to your watch list."),
                AddOutcome::AlreadyWatching => {
                    println!("You are already watching course `{course}`.")
                }
            }
        }

        EngineCommand::Unwatch { user, course } => {
            let user = UserId::new(user);
            match engine.remove_watch(&user, &CourseCode::new(&course)).await? {
                RemoveOutcome::Removed => {
                    println!("Removed course `{course}` from your watch list.")
                }
                RemoveOutcome::NotWatching => {
                    println!("Course `{course}` is not in your watch list.")
                }
            }
        }

        EngineCommand::List { user } => {
            let courses = engine.list_watches(&UserId::new(user)).await;
            if courses.is_empty() {
                println!("Your watch list is empty.");
            } else {
                let joined: Vec<&str> = courses.iter().map(CourseCode::as_str).collect();
                println!("Your current watch list: {}", joined.join(", "));
            }
        }

        EngineCommand::Check => {
            let report = engine.check_now().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        EngineCommand::Run => {
            engine.start_scheduled_loop(config.watch.interval()).await?;
            tokio::signal::ctrl_c().await?;
            log::info!("Interrupted, finishing current cycle...");
            engine.stop_scheduled_loop().await;
        }
    }

    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.storage_dir.join("config.toml");
    let loaded = Config::load(&config_path);
    let level = loaded
        .as_ref()
        .map_or("info", |config| config.logging.level.as_str());
    init_logging(cli.verbose, level);

    let config = loaded.unwrap_or_else(|e| {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            config_path.display(),
            e
        );
        Config::default()
    });

    match cli.command {
        Command::Validate => run_validate(&config),
        Command::Engine(command) => {
            config.validate()?;
            let engine = build_engine(&cli.storage_dir, &config).await?;
            run_command(&engine, &config, command).await
        }
    }
}
