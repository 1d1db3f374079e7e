// src/main.rs
// QueryGenius - answer business questions over HTTP or from the command line

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use querygenius::config::{AppConfig, StoreKind};
use querygenius::pipeline::QueryPipeline;
use querygenius::store::{MemoryStore, QueryStore, SqliteStore};
use querygenius::web;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Level, info, warn};

#[derive(Parser)]
#[command(name = "querygenius")]
#[command(about = "Answer business questions from SQL, REST and spreadsheet sources")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Port to listen on (overrides QG_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer one question and print the stored record
    Ask {
        question: String,

        /// Use the REST descriptor route instead of classification + SQL
        #[arg(long)]
        structured: bool,
    },
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn QueryStore>> {
    let store: Arc<dyn QueryStore> = match config.store.kind {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::Sqlite => Arc::new(SqliteStore::connect(&config.store.database_url).await?),
    };
    info!(kind = ?config.store.kind, "Query store open");
    Ok(store)
}

async fn run_server(config: AppConfig, port: Option<u16>) -> Result<()> {
    let store = open_store(&config).await?;
    let pipeline = QueryPipeline::from_config(&config, store).await?;
    let app = web::create_router(web::AppState::new(pipeline));

    let addr = format!("{}:{}", config.server.host, port.unwrap_or(config.server.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("QueryGenius listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn run_ask(config: AppConfig, question: &str, structured: bool) -> Result<()> {
    let store = open_store(&config).await?;
    let pipeline = QueryPipeline::from_config(&config, store).await?;

    let record = if structured {
        pipeline.answer_structured(question).await?
    } else {
        pipeline.answer(question).await?
    };
    println!("{}", serde_json::to_string_pretty(&record)?);

    Ok(())
}

fn stderr_subscriber(level: &str) -> impl tracing::Subscriber + Send + Sync + 'static {
    tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(Level::from_str(level).unwrap_or(Level::INFO))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .finish()
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Config loading logs through a bootstrap subscriber; the configured
    // level only applies once loading is done
    let bootstrap_level = std::env::var("QG_LOG_LEVEL").unwrap_or_default();
    let config = tracing::subscriber::with_default(stderr_subscriber(&bootstrap_level), AppConfig::load);
    tracing::subscriber::set_global_default(stderr_subscriber(&config.log_level))?;

    let validation = config.validate();
    if !validation.is_valid() {
        bail!("Invalid configuration:\n{}", validation.report());
    }
    for warning in &validation.warnings {
        warn!("{}", warning);
    }
    info!(credentials = %config.api_keys.summary(), "Configuration loaded");

    match cli.command {
        None => run_server(config, None).await?,
        Some(Commands::Serve { port }) => run_server(config, port).await?,
        Some(Commands::Ask { question, structured }) => run_ask(config, &question, structured).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_level_from_config_string() {
        tracing::subscriber::with_default(stderr_subscriber("warn"), || {
            assert!(tracing::enabled!(Level::WARN));
            assert!(!tracing::enabled!(Level::INFO));
        });
    }

    #[test]
    fn test_unset_level_defaults_to_info() {
        tracing::subscriber::with_default(stderr_subscriber(""), || {
            assert!(tracing::enabled!(Level::INFO));
            assert!(!tracing::enabled!(Level::DEBUG));
        });
    }
}
