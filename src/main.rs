mod api;
mod cache;
mod config;
mod engine;
mod error;
mod fetcher;
mod types;
mod weights;

use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::cache::EventCache;
use crate::config::Config;
use crate::error::Result;
use crate::weights::WeightsTable;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Raw-event cache setup ---
    let options = SqliteConnectOptions::new()
        .filename(&cfg.db_path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;

    let latency = Arc::new(LatencyStats::new());
    let health = Arc::new(HealthState::new());
    let client = fetcher::build_client(&cfg)?;
    let cache = Arc::new(
        EventCache::new(
            pool,
            client.clone(),
            cfg.clone(),
            Arc::clone(&latency),
            Arc::clone(&health),
        )
        .await?,
    );
    info!("Raw-event cache ready at {}", cfg.db_path);

    // --- Immutable season weights ---
    let weights = Arc::new(WeightsTable::builtin());

    // --- HTTP API server ---
    let api_state = ApiState {
        cache,
        weights,
        latency,
        health,
        client,
        cfg: cfg.clone(),
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
