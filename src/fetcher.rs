use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{Config, FETCH_BACKOFF_MS, USER_AGENT};
use crate::error::{AppError, Result};
use crate::types::{PitchEvent, SeasonType};

/// Which side of the matchup a Savant query is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerRole {
    Batter,
    Pitcher,
}

impl PlayerRole {
    pub fn as_param(&self) -> &'static str {
        match self {
            PlayerRole::Batter => "batter",
            PlayerRole::Pitcher => "pitcher",
        }
    }
}

impl std::fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_param())
    }
}

pub fn build_client(cfg: &Config) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.fetch_timeout_secs))
        .user_agent(USER_AGENT)
        .build()?)
}

/// Fetch the raw statcast_search CSV for one player and date range.
///
/// Bounded retries with backoff; an empty body is a valid "no data" result,
/// not an error. Every terminal failure surfaces as `AppError::Fetch` so the
/// HTTP layer maps it to a service-unavailable response.
pub async fn fetch_statcast_csv(
    client: &reqwest::Client,
    cfg: &Config,
    role: PlayerRole,
    player_id: i64,
    start_date: &str,
    end_date: &str,
    season_type: SeasonType,
) -> Result<String> {
    let player_id = player_id.to_string();
    let lookup_param = match role {
        PlayerRole::Batter => "batters_lookup[]",
        PlayerRole::Pitcher => "pitchers_lookup[]",
    };
    let params = [
        ("all", "true"),
        ("type", "details"),
        ("hfGT", season_type.game_type_filter()),
        ("player_type", role.as_param()),
        (lookup_param, player_id.as_str()),
        ("game_date_gt", start_date),
        ("game_date_lt", end_date),
    ];

    let attempts = FETCH_BACKOFF_MS.len() + 1;
    let mut last_err = String::new();
    for attempt in 0..attempts {
        match client.get(&cfg.savant_api_url).query(&params).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => {
                    debug!(
                        role = %role,
                        player_id = %player_id,
                        bytes = body.len(),
                        "statcast fetch ok"
                    );
                    return Ok(body);
                }
                Err(e) => last_err = format!("body read failed: {e}"),
            },
            Ok(resp) => last_err = format!("status {}", resp.status()),
            Err(e) => last_err = e.to_string(),
        }
        if attempt < FETCH_BACKOFF_MS.len() {
            let backoff = Duration::from_millis(FETCH_BACKOFF_MS[attempt]);
            warn!(
                attempt = attempt + 1,
                backoff_ms = FETCH_BACKOFF_MS[attempt],
                "statcast fetch failed ({last_err}), retrying"
            );
            tokio::time::sleep(backoff).await;
        }
    }

    Err(AppError::Fetch(format!(
        "statcast fetch failed after {attempts} attempts: {last_err}"
    )))
}

/// Parse a statcast_search CSV body. Unknown columns are ignored; lenient
/// numeric fields (see `PitchEvent`) turn empty cells into None rather than
/// failing the row. A blank body parses to no rows.
pub fn parse_statcast_csv(body: &str) -> Result<Vec<PitchEvent>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_reader(body.as_bytes());
    let mut events = Vec::new();
    for row in reader.deserialize::<PitchEvent>() {
        events.push(row?);
    }
    Ok(events)
}

// ---------------------------------------------------------------------------
// MLB StatsAPI player lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlayerMatch {
    pub id: i64,
    pub name: String,
}

/// Full name for an MLBAM id, via the StatsAPI people endpoint.
pub async fn name_for_id(client: &reqwest::Client, cfg: &Config, player_id: i64) -> Result<String> {
    let url = format!("{}/people/{player_id}", cfg.mlb_api_url);
    let resp: serde_json::Value = client.get(&url).send().await?.json().await?;
    resp.get("people")
        .and_then(|p| p.as_array())
        .and_then(|a| a.first())
        .and_then(|p| p.get("fullName"))
        .and_then(|n| n.as_str())
        .map(|n| n.to_string())
        .ok_or_else(|| AppError::NotFound(format!("no MLBAM player with id {player_id}")))
}

/// Search players by name via the StatsAPI people search, token-scored so an
/// exact (or name-order-swapped) match outranks full token coverage, which
/// outranks partial coverage. At most 10 matches; no match is an empty list.
pub async fn search_players(
    client: &reqwest::Client,
    cfg: &Config,
    query: &str,
) -> Result<Vec<PlayerMatch>> {
    let url = format!("{}/people/search", cfg.mlb_api_url);
    let resp: serde_json::Value = client
        .get(&url)
        .query(&[("q", query)])
        .send()
        .await?
        .json()
        .await?;

    let mut scored: Vec<(u32, PlayerMatch)> = resp
        .get("people")
        .and_then(|p| p.as_array())
        .map(|people| {
            people
                .iter()
                .filter_map(|p| {
                    let id = p.get("id").and_then(|i| i.as_i64())?;
                    let name = p.get("fullName").and_then(|n| n.as_str())?.to_string();
                    Some(PlayerMatch { id, name })
                })
                .collect::<Vec<PlayerMatch>>()
        })
        .unwrap_or_default()
        .into_iter()
        .map(|m| (score_name(&m.name, query), m))
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));
    Ok(scored.into_iter().take(10).map(|(_, m)| m).collect())
}

/// Resolve a player name to an MLBAM id: the best-scoring search match.
pub async fn lookup_entity_id(
    client: &reqwest::Client,
    cfg: &Config,
    name: &str,
) -> Result<PlayerMatch> {
    search_players(client, cfg, name)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("no MLBAM player matching {name:?}")))
}

fn norm(s: &str) -> String {
    let folded: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 100 for an exact or name-order-swapped normalized match, 90 when every
/// query token appears in the name, 60 for a partial token hit, else 0.
pub fn score_name(name: &str, query: &str) -> u32 {
    let name_norm = norm(name);
    let query_norm = norm(query);
    if query_norm.is_empty() {
        return 0;
    }
    let swapped = query_norm
        .split(' ')
        .rev()
        .collect::<Vec<_>>()
        .join(" ");
    if name_norm == query_norm || name_norm == swapped {
        return 100;
    }
    let tokens: Vec<&str> = query_norm.split(' ').collect();
    let hits = tokens.iter().filter(|t| name_norm.contains(**t)).count();
    if hits == tokens.len() {
        90
    } else if hits > 0 {
        60
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
pitch_type,game_date,player_name,batter,pitcher,events,description,zone,game_type,stand,type,balls,strikes,game_year,plate_x,plate_z,sz_top,sz_bot,launch_speed,launch_angle,estimated_ba_using_speedangle,estimated_woba_using_speedangle,estimated_slg_using_speedangle,at_bat_number,pitch_number,game_pk,pitch_name
FF,2023-06-01,\"Trout, Mike\",545361,621244,,called_strike,5,R,R,S,0,0,2023,0.12,2.61,3.41,1.62,,,,,,12,1,717465,4-Seam Fastball
SL,2023-06-01,\"Trout, Mike\",545361,621244,double,hit_into_play,8,R,R,X,0,1,2023,-0.31,1.98,3.41,1.62,101.0,18.0,0.654,0.912,1.310,12,2,717465,Slider
";

    #[test]
    fn parses_rows_and_lenient_blanks() {
        let events = parse_statcast_csv(SAMPLE_CSV).unwrap();
        assert_eq!(events.len(), 2);

        let first = &events[0];
        assert_eq!(first.game_pk, Some(717465));
        assert_eq!(first.pitch_number, Some(1));
        assert_eq!(first.events, None);
        assert_eq!(first.launch_speed, None);
        assert_eq!(first.pitch_result.as_deref(), Some("S"));

        let second = &events[1];
        assert_eq!(second.events.as_deref(), Some("double"));
        assert_eq!(second.launch_speed, Some(101.0));
        assert_eq!(second.estimated_woba, Some(0.912));
        assert_eq!(second.player_name.as_deref(), Some("Trout, Mike"));
        assert_eq!(second.season(), Some(2023));
    }

    #[test]
    fn blank_body_is_no_rows() {
        assert!(parse_statcast_csv("").unwrap().is_empty());
        assert!(parse_statcast_csv("  \n ").unwrap().is_empty());
    }

    #[test]
    fn unknown_columns_are_ignored() {
        let body = "game_pk,at_bat_number,pitch_number,batter,spin_axis\n1,2,3,4,220\n";
        let events = parse_statcast_csv(body).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].at_bat_number, Some(2));
    }

    #[test]
    fn name_scoring_ranks_exact_over_partial() {
        assert_eq!(score_name("Mike Trout", "mike trout"), 100);
        assert_eq!(score_name("Mike Trout", "Trout Mike"), 100);
        assert_eq!(score_name("Mike Trout", "mike trout jr"), 60);
        assert_eq!(score_name("Mike Trout", "trout"), 90);
        assert_eq!(score_name("Mike Trout", "ohtani"), 0);
        assert_eq!(score_name("Mike Trout", "  "), 0);
    }
}
