use crate::error::{AppError, Result};

pub const SAVANT_API_URL: &str = "https://baseballsavant.mlb.com/statcast_search/csv";
pub const MLB_API_URL: &str = "https://statsapi.mlb.com/api/v1";

/// Savant rejects requests without a browser-looking User-Agent.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17 Safari/605.1.15";

/// Retry backoff values in milliseconds for upstream fetches.
/// One attempt per entry plus the initial try — the fetch layer never
/// retries indefinitely.
pub const FETCH_BACKOFF_MS: &[u64] = &[500, 1_000, 2_000];

/// Horizontal half-width of the strike zone in feet (plate is 17in wide,
/// plus ball radius).
pub const ZONE_HALF_WIDTH: f64 = 0.83;

/// Fallback vertical zone bounds (feet) when a row is missing sz_bot/sz_top.
/// Used by the batter-relative 5x5 binner only.
pub const DEFAULT_SZ_BOT: f64 = 1.5;
pub const DEFAULT_SZ_TOP: f64 = 3.5;

/// Fixed absolute bounds for the 9x9 heatmap grid (feet).
pub const GRID9_X_MIN: f64 = -0.85;
pub const GRID9_X_MAX: f64 = 0.85;
pub const GRID9_Z_MIN: f64 = 1.0;
pub const GRID9_Z_MAX: f64 = 4.0;

/// Exit-velocity threshold for a hard-hit ball (mph).
pub const HARD_HIT_EV: f64 = 95.0;

/// Simplified barrel box: EV at or above this, launch angle inside the window.
pub const BARREL_EV: f64 = 98.0;
pub const BARREL_LA_MIN: f64 = 26.0;
pub const BARREL_LA_MAX: f64 = 30.0;

#[derive(Debug, Clone)]
pub struct Config {
    pub savant_api_url: String,
    pub mlb_api_url: String,
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Upstream request timeout in seconds (FETCH_TIMEOUT_SECS).
    pub fetch_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            savant_api_url: std::env::var("SAVANT_API_URL")
                .unwrap_or_else(|_| SAVANT_API_URL.to_string()),
            mlb_api_url: std::env::var("MLB_API_URL")
                .unwrap_or_else(|_| MLB_API_URL.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "statlab.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse::<u64>()
                .unwrap_or(60),
        })
    }
}
