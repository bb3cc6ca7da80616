use clap::Parser;
use market_rs::analytics::{MemoryCounterStore, PopularityConfig, PopularityTracker};
use market_rs::api::ApiServer;
use market_rs::cache::MemoryCache;
use market_rs::config::Config;
use market_rs::search::SearchManager;
use market_rs::store::SqliteListingStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "market-rs", about = "Marketplace search & discovery server")]
struct Args {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let config = if args.config.exists() {
        Config::from_file(&args.config)?
    } else {
        Config::default()
    };

    // Initialize logging
    let level = match config.logging.level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .pretty()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Starting market-rs server");
    info!("  Listening on: {}", config.server.listen_addr);
    info!("  Database: {}", config.storage.database_url);

    // Listing store
    let store = SqliteListingStore::connect(&config.storage.database_url)
        .await
        .map_err(|e| format!("failed to open listing store: {e}"))?;
    store
        .init_db()
        .await
        .map_err(|e| format!("failed to initialize schema: {e}"))?;

    // Shared cache and analytics counters
    let cache = Arc::new(MemoryCache::new());
    let counters = Arc::new(MemoryCounterStore::new());
    let tracker = Arc::new(PopularityTracker::with_config(
        counters,
        PopularityConfig {
            trending_window_days: config.analytics.trending_window_days,
            history_max_entries: config.analytics.history_max_entries,
            history_retention_days: config.analytics.history_retention_days,
            ..Default::default()
        },
    ));

    let manager = Arc::new(SearchManager::new(
        Arc::new(store),
        cache,
        tracker,
        config.search.clone(),
    ));

    let server = ApiServer::new(config.server.listen_addr.clone(), manager);
    server.run().await?;

    Ok(())
}
