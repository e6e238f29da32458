//! Forage: web ingestion pipeline for retrieval-augmented chat

use anyhow::Result;
use clap::{Parser, Subcommand};
use forage::{
    config::{Config, LogFormat},
    crawl::{Crawler, HttpFetcher},
    http::{AppState, HttpServer},
    ingest::IngestContext,
    jobs::{CancelFlag, JobRunner},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use url::Url;

#[derive(Parser)]
#[command(name = "forage")]
#[command(about = "Domain-restricted web crawler and ingestion pipeline")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Listen address (overrides config)
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Crawl a URL and print the discovered pages without ingesting
    Crawl {
        /// Seed URL to crawl
        url: String,

        /// Maximum pages to visit
        #[arg(short, long)]
        max_pages: Option<usize>,
    },

    /// Write a default configuration file
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.as_str()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    init_logging(&config);

    match cli.command {
        Commands::Serve { listen } => serve(config, listen).await,
        Commands::Crawl { url, max_pages } => crawl_preview(config, &url, max_pages).await,
        Commands::Init { path } => init_config(&path),
    }
}

async fn serve(mut config: Config, listen: Option<String>) -> Result<()> {
    if let Some(listen) = listen {
        config.server.listen_addr = listen;
    }
    config.validate()?;

    let server_config = config.server.clone();
    let ctx = Arc::new(IngestContext::new(config)?);
    let runner = JobRunner::new(Arc::clone(&ctx));

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);

    let server = HttpServer::new(
        server_config,
        AppState {
            ctx,
            runner: Arc::clone(&runner),
        },
    );

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c, shutting down");
            let _ = shutdown_tx.send(());
        }
    });

    let result = server.run(shutdown_rx).await;
    runner.shutdown();
    result
}

async fn crawl_preview(mut config: Config, url: &str, max_pages: Option<usize>) -> Result<()> {
    if let Some(max_pages) = max_pages {
        config.crawl.max_pages = max_pages;
    }
    let seed = Url::parse(url)?;

    let fetcher = HttpFetcher::new(&config.crawl)?;
    let crawler = Crawler::new(&fetcher, &config.crawl);

    let mut visited = crawler.crawl(&seed, &CancelFlag::new()).await?;
    visited.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    println!("Discovered {} pages:", visited.len());
    for url in &visited {
        println!("  {}", url);
    }
    Ok(())
}

fn init_config(path: &PathBuf) -> Result<()> {
    let target = path.join("config.toml");
    if target.exists() {
        anyhow::bail!("{} already exists", target.display());
    }
    std::fs::write(&target, Config::default_toml()?)?;
    println!("Wrote default configuration to {}", target.display());
    Ok(())
}
