use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use rarely::cache::Cache;
use rarely::config::Config;
use rarely::db::models::InputType;
use rarely::input::RawSubmission;
use rarely::moderation::ModerationOrchestrator;
use rarely::trends::TrendAggregator;

/// Rarely: tell people how rare the thing they did today is.
///
/// Accepts a short statement about your day, checks it, and reports how
/// many other people did the same thing.
#[derive(Parser)]
#[command(name = "rarely", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    #[cfg(feature = "sqlite")]
    Init,

    /// Start the JSON API server
    #[cfg(all(feature = "web", feature = "sqlite"))]
    Serve {
        /// Port to listen on (default: RARELY_PORT or 8080)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (default: RARELY_BIND or 0.0.0.0)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run a statement through the input, quality and moderation gates
    Check {
        /// The statement to check
        text: String,

        /// action or day_summary
        #[arg(long, default_value = "action")]
        kind: String,
    },

    /// Fetch and show a sample of trending activity
    Trending {
        /// How many items to show (default: 10)
        #[arg(long, default_value = "10")]
        count: usize,

        /// Skip the cache and refetch every source
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rarely=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        #[cfg(feature = "sqlite")]
        Commands::Init => {
            info!("Initializing Rarely database...");
            let config = Config::load()?;
            let store = rarely::db::open_sqlite(&config.db_path)?;
            let table_count = store.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nRarely is ready. Next step: set up your .env file");
            println!("  (see .env.example for the available variables)");
            println!("\nThen run: cargo run -- serve");
        }

        #[cfg(all(feature = "web", feature = "sqlite"))]
        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            config.require_classifier()?;

            let store = rarely::db::open_sqlite(&config.db_path)?;
            let cache = Cache::from_config(&config).await;
            let classifier = rarely::toxicity::scorer_from_config(&config)?;
            let trends = TrendAggregator::from_config(&config, cache.clone())?;

            let port = port.unwrap_or(config.port);
            let bind = bind.unwrap_or_else(|| config.bind.clone());
            let state = rarely::web::AppState::new(config, store, cache, classifier, trends);
            rarely::web::run_server(state, port, &bind).await?;
        }

        Commands::Check { text, kind } => {
            let config = Config::load()?;
            config.require_classifier()?;
            let input_type: InputType = kind.parse().map_err(|e: String| anyhow::anyhow!(e))?;

            let raw = RawSubmission {
                content: text,
                input_type: input_type.as_str().to_string(),
                scope: None,
                location_city: None,
                location_state: None,
                location_country: None,
            };
            let submission = match rarely::input::validate_submission(raw) {
                Ok(s) => s,
                Err(e) => {
                    println!("{} input: {e}", "REJECT".red().bold());
                    return Ok(());
                }
            };
            println!("{} {}", "Sanitized:".dimmed(), submission.content);

            let assessment = rarely::quality::analyze(&submission.content, input_type);
            rarely::output::terminal::display_quality(&assessment);

            let cache = Cache::disabled();
            let moderation = ModerationOrchestrator::new(
                rarely::toxicity::scorer_from_config(&config)?,
                cache,
                config.classifier_timeout,
            );
            let verdict = moderation.moderate(&submission.content).await;
            rarely::output::terminal::display_moderation(&verdict);

            let fingerprint = rarely::scoring::fingerprint(&submission.content);
            println!("\n{} {}", "Fingerprint:".dimmed(), fingerprint);
        }

        Commands::Trending { count, force } => {
            let config = Config::load()?;
            let cache = Cache::from_config(&config).await;
            let trends = TrendAggregator::from_config(&config, cache)?;
            let response = trends.sample(count, force).await;
            rarely::output::terminal::display_trending(&response);
        }
    }

    Ok(())
}
