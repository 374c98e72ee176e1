use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use pricewatch::config::AppConfig;
use pricewatch::notify::{LogNotifier, Notifier, PushbulletNotifier};
use pricewatch::runner::Runner;

#[derive(Parser, Debug)]
#[command(name = "pricewatch", version, about = "Track prices and alert when they drop")]
struct Cli {
    /// Item sheet (CSV) to load
    #[arg(long)]
    items: Option<String>,

    /// Price history JSON file
    #[arg(long)]
    history: Option<String>,

    /// SQLite database URL for the selector table
    #[arg(long)]
    selector_db: Option<String>,

    /// Attempts per item before giving up on finding a price element
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Delay between attempts, in milliseconds
    #[arg(long)]
    retry_delay_ms: Option<u64>,

    /// Maximum number of items processed at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Log notifications instead of pushing them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pricewatch=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;

    if let Some(items) = cli.items {
        config.store.items_file = items;
    }
    if let Some(history) = cli.history {
        config.store.history_file = history;
    }
    if let Some(selector_db) = cli.selector_db {
        config.store.selector_db = selector_db;
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.fetcher.max_attempts = max_attempts;
    }
    if let Some(retry_delay_ms) = cli.retry_delay_ms {
        config.fetcher.retry_delay_ms = retry_delay_ms;
    }
    if let Some(concurrency) = cli.concurrency {
        config.runner.concurrency = concurrency;
    }
    config.validate()?;

    let notifier: Arc<dyn Notifier> = if cli.dry_run {
        Arc::new(LogNotifier)
    } else {
        let token = config
            .notifications
            .pushbullet
            .access_token
            .clone()
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Pushbullet access token not configured; set PUSHBULLET_TOKEN or pass --dry-run"
                )
            })?;
        Arc::new(PushbulletNotifier::new(token))
    };

    info!("Starting pricewatch...");
    let report = Runner::new(config, notifier).run().await?;
    info!(
        total = report.items_total,
        succeeded = report.succeeded,
        failed = report.failed,
        "Run complete"
    );

    Ok(())
}
