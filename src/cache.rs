use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::Config;
use crate::error::Result;
use crate::fetcher::{self, PlayerRole};
use crate::types::SeasonType;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS raw_events (
    cache_key   TEXT PRIMARY KEY,
    entity_id   INTEGER NOT NULL,
    start_date  TEXT NOT NULL,
    end_date    TEXT NOT NULL,
    season_type TEXT NOT NULL,
    payload     TEXT NOT NULL,
    fetched_at  INTEGER NOT NULL
)
"#;

/// On-disk cache of raw Savant CSV payloads keyed by
/// `(role, entity, date range, season type)`.
///
/// A miss takes a per-key mutex before fetching, so concurrent requests for
/// the same key coalesce into one upstream fetch; hits never touch the lock.
/// Payloads are kept verbatim — aggregation always reparses, never reads
/// derived state from disk.
pub struct EventCache {
    pool: sqlx::SqlitePool,
    client: reqwest::Client,
    cfg: Config,
    latency: Arc<LatencyStats>,
    health: Arc<HealthState>,
    inflight: DashMap<String, Arc<Mutex<()>>>,
}

impl EventCache {
    pub async fn new(
        pool: sqlx::SqlitePool,
        client: reqwest::Client,
        cfg: Config,
        latency: Arc<LatencyStats>,
        health: Arc<HealthState>,
    ) -> Result<Self> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self {
            pool,
            client,
            cfg,
            latency,
            health,
            inflight: DashMap::new(),
        })
    }

    /// Raw CSV for one entity and date range, from cache or upstream.
    pub async fn events_csv(
        &self,
        role: PlayerRole,
        entity_id: i64,
        start_date: &str,
        end_date: &str,
        season_type: SeasonType,
    ) -> Result<String> {
        let key = format!("{role}|{entity_id}|{start_date}|{end_date}|{season_type}");

        if let Some(payload) = self.lookup(&key).await? {
            self.health.inc_cache_hits();
            debug!(key = %key, "raw-event cache hit");
            return Ok(payload);
        }

        let guard = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _lock = guard.lock().await;

        // A racing request may have filled the key while we waited.
        if let Some(payload) = self.lookup(&key).await? {
            self.health.inc_cache_hits();
            return Ok(payload);
        }

        let started = Instant::now();
        let fetched = fetcher::fetch_statcast_csv(
            &self.client,
            &self.cfg,
            role,
            entity_id,
            start_date,
            end_date,
            season_type,
        )
        .await;
        self.latency.record(started.elapsed());

        let payload = match fetched {
            Ok(p) => p,
            Err(e) => {
                drop(_lock);
                self.inflight.remove(&key);
                return Err(e);
            }
        };

        self.health.inc_upstream_fetches();
        self.health.set_last_fetch_at_ns(now_ns());
        self.store(&key, entity_id, start_date, end_date, season_type, &payload)
            .await?;
        info!(
            key = %key,
            bytes = payload.len(),
            "raw-event cache filled from upstream"
        );

        drop(_lock);
        self.inflight.remove(&key);
        Ok(payload)
    }

    pub async fn cached_key_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM raw_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn lookup(&self, key: &str) -> Result<Option<String>> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM raw_events WHERE cache_key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(payload)
    }

    async fn store(
        &self,
        key: &str,
        entity_id: i64,
        start_date: &str,
        end_date: &str,
        season_type: SeasonType,
        payload: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO raw_events
                (cache_key, entity_id, start_date, end_date, season_type, payload, fetched_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(key)
        .bind(entity_id)
        .bind(start_date)
        .bind(end_date)
        .bind(season_type.to_string())
        .bind(payload)
        .bind(now_ns() as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
