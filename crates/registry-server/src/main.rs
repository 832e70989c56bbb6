//! User Registry Server binary
//!
//! Wires the durable store, the advisory cache, the broadcast listener, and
//! the HTTP API together. All connections are established up front; any
//! failure there terminates the process.

use anyhow::{Context, Result};
use registry_core::ports::UserStore;
use registry_server::config::Config;
use registry_server::ingest::BroadcastListener;
use registry_server::storage::{Database, RedisCache};
use registry_server::{build_router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() {
    // Set up panic hook to log crashes
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()));
        let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        eprintln!("[PANIC] at {:?}: {}", location, payload);
        tracing::error!("PANIC at {:?}: {}", location, payload);
    }));

    // Initialize tracing; RUST_LOG overrides the info default
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("[FATAL] Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    info!(
        "Starting User Registry Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    if let Err(e) = run_server().await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server() -> Result<()> {
    info!("Loading configuration...");
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Config loaded: bind={}, channel={}",
        config.bind_address, config.broadcast_channel
    );

    // Durable store: the source of truth for both user tables
    let db = Arc::new(
        Database::new(&config.database_url)
            .await
            .context("Failed to initialize database")?,
    );

    // Advisory read cache
    let cache = Arc::new(
        RedisCache::new(&config.redis_url, config.cache_ttl)
            .await
            .context("Failed to connect to Redis")?,
    );

    // Broadcast ingestion runs concurrently with every request task and
    // shares nothing with them but the store.
    let listener = BroadcastListener::new(
        config.broker_url.clone(),
        config.broadcast_channel.clone(),
        db.clone() as Arc<dyn UserStore>,
    );
    let ingest_task = tokio::spawn(listener.run());

    let state = AppState {
        store: db,
        cache,
    };

    info!("Building HTTP router...");
    let app = build_router(state, config.request_timeout);

    let addr: SocketAddr = config
        .bind_address
        .parse()
        .context("Failed to parse bind address")?;

    let tcp = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Server listening on {}", addr);

    axum::serve(tcp, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // The subscription holds no state worth flushing; dropping it releases
    // the channel connection.
    ingest_task.abort();
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
