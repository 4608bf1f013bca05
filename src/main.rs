//! Price ledger server.
//!
//! Serves `/api/v0/prices`: POST records an uploaded zip-wrapped CSV price
//! list, GET returns the ledger in the same format.

use std::sync::Arc;

use clap::Parser;
use price_ledger::config::{
    default_database_path, upload_limit_bytes, DEFAULT_LISTEN, DEFAULT_MAX_UPLOAD_MB,
    DEFAULT_POOL_SIZE,
};
use price_ledger::server::{self, AppState};
use price_ledger::{AsyncPriceLedger, IngestMode, Location};

/// HTTP service exchanging zip-wrapped CSV price lists with a DuckDB ledger
#[derive(Parser, Debug)]
#[command(name = "price-ledger")]
#[command(version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "PRICE_LEDGER_LISTEN", default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Path to the DuckDB database file, or `:memory:`
    #[arg(short, long, env = "PRICE_LEDGER_DATABASE", default_value_t = default_database())]
    database: String,

    /// How uploads are validated and written: `strict` or `lenient`
    #[arg(long, env = "PRICE_LEDGER_INGEST_MODE", default_value_t = IngestMode::Strict)]
    ingest_mode: IngestMode,

    /// Number of pooled store connections
    #[arg(long, env = "PRICE_LEDGER_POOL_SIZE", default_value_t = DEFAULT_POOL_SIZE)]
    pool_size: usize,

    /// Largest accepted upload, in MiB
    #[arg(long, env = "PRICE_LEDGER_MAX_UPLOAD_MB", default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    max_upload_mb: usize,
}

fn default_database() -> String {
    default_database_path().to_string_lossy().to_string()
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let location = Location::parse(&args.database);

    let Some(max_upload_bytes) = upload_limit_bytes(args.max_upload_mb) else {
        log::error!("Upload limit of {} MiB is too large", args.max_upload_mb);
        std::process::exit(1);
    };

    log::info!("Starting price-ledger...");
    log::info!("Database: {}", location);

    // The service refuses to start without a reachable store.
    let ledger = match AsyncPriceLedger::builder()
        .location(location)
        .ingest_mode(args.ingest_mode)
        .pool_size(args.pool_size)
        .build()
        .await
    {
        Ok(ledger) => ledger,
        Err(e) => {
            log::error!("Failed to open price ledger: {}", e);
            std::process::exit(1);
        }
    };

    match ledger.stats().await {
        Ok(stats) => log::info!(
            "Ledger holds {} item(s) across {} category(ies)",
            stats.total_items,
            stats.total_categories
        ),
        Err(e) => {
            log::error!("Failed to read ledger: {}", e);
            std::process::exit(1);
        }
    }

    let listener = match tokio::net::TcpListener::bind(&args.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };
    log::info!("Listening on http://{}", args.listen);

    let state = Arc::new(AppState::new(ledger, max_upload_bytes));
    if let Err(e) = server::serve(listener, state).await {
        log::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
