use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::cache::EventCache;
use crate::config::Config;
use crate::engine::{aggregate_by, aggregate_rates, bin_zone_grid, classify_pitch, reduce_to_plate_appearances};
use crate::error::AppError;
use crate::fetcher::{self, PlayerMatch, PlayerRole};
use crate::types::{
    ClassifiedPitch, PitchEvent, SeasonLine, SeasonType, SplitDim, SplitLine, ZoneBinMode, ZoneGrid,
};
use crate::weights::WeightsTable;

use super::health::HealthState;
use super::latency::LatencyStats;

#[derive(Clone)]
pub struct ApiState {
    pub cache: Arc<EventCache>,
    pub weights: Arc<WeightsTable>,
    pub latency: Arc<LatencyStats>,
    pub health: Arc<HealthState>,
    pub client: reqwest::Client,
    pub cfg: Config,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .route("/players/search", get(get_players_search))
        .route("/players/lookup", get(get_players_lookup))
        .route("/hitters/:id/season", get(get_hitter_season))
        .route("/hitters/:id/splits", get(get_hitter_splits))
        .route("/hitters/:id/heatmap", get(get_hitter_heatmap))
        .route("/hitters/:id/zone", get(get_hitter_zone))
        .route("/pitchers/:id/season", get(get_pitcher_season))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Deserialize)]
pub struct LookupQuery {
    pub name: String,
}

#[derive(Deserialize)]
pub struct SeasonsQuery {
    /// Comma-separated years, e.g. "2023,2024".
    pub seasons: Option<String>,
    pub include_postseason: Option<bool>,
}

#[derive(Deserialize)]
pub struct SplitsQuery {
    pub season: Option<u32>,
    pub split: Option<String>,
    pub include_postseason: Option<bool>,
}

#[derive(Deserialize)]
pub struct GridQuery {
    pub season: Option<u32>,
    pub pitch_family: Option<String>,
    pub pitch_type: Option<String>,
    pub include_postseason: Option<bool>,
}

#[derive(Deserialize)]
pub struct PitcherQuery {
    pub season: Option<u32>,
    pub include_postseason: Option<bool>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub cached_keys: i64,
    pub upstream_fetches: u64,
    pub cache_hits: u64,
    pub last_fetch_at_ns: u64,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub items: Vec<PlayerMatch>,
}

#[derive(Serialize)]
pub struct SeasonRowsResponse {
    pub rows: Vec<SeasonLine>,
}

#[derive(Serialize)]
pub struct SplitsResponse {
    pub batter: i64,
    pub season: u32,
    pub split: SplitDim,
    pub data: Vec<SplitLine>,
}

#[derive(Serialize)]
pub struct GridResponse {
    pub batter: i64,
    pub season: u32,
    pub grid: ZoneGrid,
}

#[derive(Serialize)]
pub struct PitcherSeasonLine {
    pub pitcher: i64,
    pub player_name: Option<String>,
    pub season: u32,
    #[serde(rename = "BF")]
    pub bf: u32,
    #[serde(rename = "AB")]
    pub ab: u32,
    #[serde(rename = "H")]
    pub h: u32,
    #[serde(rename = "HR")]
    pub hr: u32,
    #[serde(rename = "BB")]
    pub bb: u32,
    #[serde(rename = "HBP")]
    pub hbp: u32,
    #[serde(rename = "AVG_against")]
    pub avg_against: f64,
    #[serde(rename = "OBP_against")]
    pub obp_against: f64,
    #[serde(rename = "SLG_against")]
    pub slg_against: f64,
}

#[derive(Serialize)]
pub struct PitcherSeasonResponse {
    pub data: PitcherSeasonLine,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Result<Json<HealthResponse>, AppError> {
    let cached_keys = state.cache.cached_key_count().await?;
    Ok(Json(HealthResponse {
        ok: true,
        cached_keys,
        upstream_fetches: state.health.upstream_fetches(),
        cache_hits: state.health.cache_hits(),
        last_fetch_at_ns: state.health.last_fetch_at_ns(),
    }))
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<serde_json::Value> {
    let (p50, p95, p99) = state.latency.percentiles();
    let to_ms = |us: Option<u64>| us.map(|v| v as f64 / 1000.0);
    Json(serde_json::json!({
        "samples": state.latency.len(),
        "p50_ms": to_ms(p50),
        "p95_ms": to_ms(p95),
        "p99_ms": to_ms(p99),
    }))
}

async fn get_players_search(
    State(state): State<ApiState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    let items = fetcher::search_players(&state.client, &state.cfg, &params.q).await?;
    Ok(Json(SearchResponse { items }))
}

/// Resolve a name to an id, 404 when nothing matches. Unlike an empty
/// stat line, an unresolvable id is a real failure for the caller.
async fn get_players_lookup(
    State(state): State<ApiState>,
    Query(params): Query<LookupQuery>,
) -> Result<Json<PlayerMatch>, AppError> {
    let found = fetcher::lookup_entity_id(&state.client, &state.cfg, &params.name).await?;
    Ok(Json(found))
}

async fn get_hitter_season(
    State(state): State<ApiState>,
    Path(batter): Path<i64>,
    Query(params): Query<SeasonsQuery>,
) -> Result<Json<SeasonRowsResponse>, AppError> {
    let seasons = parse_seasons(params.seasons.as_deref())?;
    let include_postseason = params.include_postseason.unwrap_or(false);

    let mut rows = Vec::with_capacity(seasons.len());
    for season in seasons {
        let events =
            load_events(&state, PlayerRole::Batter, batter, season, include_postseason).await?;
        let mut line = season_line(&events, &state.weights)?;
        if line.pa == 0 {
            // "No stats yet" is a normal outcome, not a failure.
            line.batter = batter;
            line.season = season;
        }
        rows.push(line);
    }
    rows.sort_by_key(|r| r.season);
    Ok(Json(SeasonRowsResponse { rows }))
}

async fn get_hitter_splits(
    State(state): State<ApiState>,
    Path(batter): Path<i64>,
    Query(params): Query<SplitsQuery>,
) -> Result<Json<SplitsResponse>, AppError> {
    let season = require_season(params.season)?;
    let split = match params.split.as_deref() {
        None => SplitDim::PitchFamily,
        Some(raw) => raw.parse::<SplitDim>().map_err(AppError::MalformedInput)?,
    };
    let include_postseason = params.include_postseason.unwrap_or(false);

    let events = load_events(&state, PlayerRole::Batter, batter, season, include_postseason).await?;
    let pas = reduce_to_plate_appearances(&events)?;
    let pitches: Vec<ClassifiedPitch> = events.iter().map(classify_pitch).collect();
    let data = aggregate_by(&pas, &pitches, split, &state.weights);

    Ok(Json(SplitsResponse {
        batter,
        season,
        split,
        data,
    }))
}

async fn get_hitter_heatmap(
    State(state): State<ApiState>,
    Path(batter): Path<i64>,
    Query(params): Query<GridQuery>,
) -> Result<Json<GridResponse>, AppError> {
    grid_response(&state, batter, params, ZoneBinMode::FixedBounds9x9).await
}

async fn get_hitter_zone(
    State(state): State<ApiState>,
    Path(batter): Path<i64>,
    Query(params): Query<GridQuery>,
) -> Result<Json<GridResponse>, AppError> {
    grid_response(&state, batter, params, ZoneBinMode::BatterRelative5x5).await
}

async fn get_pitcher_season(
    State(state): State<ApiState>,
    Path(pitcher): Path<i64>,
    Query(params): Query<PitcherQuery>,
) -> Result<Json<PitcherSeasonResponse>, AppError> {
    let season = require_season(params.season)?;
    let include_postseason = params.include_postseason.unwrap_or(false);

    let events =
        load_events(&state, PlayerRole::Pitcher, pitcher, season, include_postseason).await?;
    let line = season_line(&events, &state.weights)?;
    let player_name = match events.iter().find_map(|e| e.player_name.clone()) {
        Some(name) => Some(name),
        None => fetcher::name_for_id(&state.client, &state.cfg, pitcher).await.ok(),
    };

    Ok(Json(PitcherSeasonResponse {
        data: PitcherSeasonLine {
            pitcher,
            player_name,
            season,
            bf: line.pa,
            ab: line.ab,
            h: line.h,
            hr: line.hr,
            bb: line.bb,
            hbp: line.hbp,
            avg_against: line.avg,
            obp_against: line.obp,
            slg_against: line.slg,
        },
    }))
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

async fn grid_response(
    state: &ApiState,
    batter: i64,
    params: GridQuery,
    mode: ZoneBinMode,
) -> Result<Json<GridResponse>, AppError> {
    let season = require_season(params.season)?;
    let include_postseason = params.include_postseason.unwrap_or(false);

    let events = load_events(state, PlayerRole::Batter, batter, season, include_postseason).await?;
    let mut pitches: Vec<ClassifiedPitch> = events.iter().map(classify_pitch).collect();

    if let Some(family) = params.pitch_family.as_deref() {
        let want = family.trim().to_lowercase();
        pitches.retain(|p| p.pitch_family.to_string() == want);
    }
    if let Some(pitch_type) = params.pitch_type.as_deref() {
        let want = pitch_type.trim();
        pitches.retain(|p| {
            p.pitch_name
                .as_deref()
                .map_or(false, |n| n.eq_ignore_ascii_case(want))
        });
    }

    Ok(Json(GridResponse {
        batter,
        season,
        grid: bin_zone_grid(&pitches, mode),
    }))
}

/// Fetch (through the raw-event cache) and parse one season of events,
/// optionally extended with the postseason window.
async fn load_events(
    state: &ApiState,
    role: PlayerRole,
    entity_id: i64,
    season: u32,
    include_postseason: bool,
) -> Result<Vec<PitchEvent>, AppError> {
    let body = state
        .cache
        .events_csv(
            role,
            entity_id,
            &format!("{season}-03-01"),
            &format!("{season}-11-30"),
            SeasonType::Regular,
        )
        .await?;
    let mut events = fetcher::parse_statcast_csv(&body)?;

    if include_postseason {
        let post = state
            .cache
            .events_csv(
                role,
                entity_id,
                &format!("{season}-10-01"),
                &format!("{season}-12-31"),
                SeasonType::Postseason,
            )
            .await?;
        events.extend(fetcher::parse_statcast_csv(&post)?);
    }

    Ok(events)
}

fn season_line(events: &[PitchEvent], weights: &WeightsTable) -> Result<SeasonLine, AppError> {
    let pas = reduce_to_plate_appearances(events)?;
    let pitches: Vec<ClassifiedPitch> = events.iter().map(classify_pitch).collect();
    Ok(aggregate_rates(&pas, &pitches, weights))
}

fn parse_seasons(raw: Option<&str>) -> Result<Vec<u32>, AppError> {
    let raw = raw.ok_or_else(|| {
        AppError::MalformedInput("seasons query parameter is required, e.g. seasons=2023,2024".to_string())
    })?;
    let mut years = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let year = token.parse::<u32>().map_err(|_| {
            AppError::MalformedInput(format!("seasons must be comma-separated years, got {token:?}"))
        })?;
        years.push(year);
    }
    if years.is_empty() {
        return Err(AppError::MalformedInput(
            "seasons query parameter is empty".to_string(),
        ));
    }
    years.sort_unstable();
    years.dedup();
    Ok(years)
}

fn require_season(season: Option<u32>) -> Result<u32, AppError> {
    season.ok_or_else(|| AppError::MalformedInput("season query parameter is required".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_seasons_accepts_lists_and_rejects_garbage() {
        assert_eq!(parse_seasons(Some("2023,2024")).unwrap(), vec![2023, 2024]);
        assert_eq!(parse_seasons(Some(" 2024 , 2019,2024")).unwrap(), vec![2019, 2024]);
        assert!(parse_seasons(Some("two-thousand")).is_err());
        assert!(parse_seasons(Some(",, ,")).is_err());
        assert!(parse_seasons(None).is_err());
    }
}
