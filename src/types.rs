use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Raw input row
// ---------------------------------------------------------------------------

/// One pitch observation as exported by the Savant statcast_search CSV.
/// Numeric fields are lenient: empty cells and literal "null"/"NA" markers
/// deserialize to None instead of failing the whole row. Unknown columns
/// are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PitchEvent {
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub game_pk: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_u32")]
    pub at_bat_number: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_u32")]
    pub pitch_number: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub batter: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub pitcher: Option<i64>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub player_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_u32")]
    pub game_year: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub game_date: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub game_type: Option<String>,
    /// Outcome tag, non-empty only on the PA-terminating pitch
    /// ("single", "strikeout", "walk", ...).
    #[serde(default, deserialize_with = "de_opt_string")]
    pub events: Option<String>,
    /// Pitch description ("called_strike", "swinging_strike", "foul", ...).
    #[serde(default, deserialize_with = "de_opt_string")]
    pub description: Option<String>,
    /// Coarse result code: B = ball, S = strike, X = ball in play.
    #[serde(default, rename = "type", deserialize_with = "de_opt_string")]
    pub pitch_result: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub plate_x: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub plate_z: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub sz_top: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub sz_bot: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub launch_speed: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub launch_angle: Option<f64>,
    #[serde(
        default,
        rename = "estimated_woba_using_speedangle",
        deserialize_with = "de_opt_f64"
    )]
    pub estimated_woba: Option<f64>,
    #[serde(
        default,
        rename = "estimated_ba_using_speedangle",
        deserialize_with = "de_opt_f64"
    )]
    pub estimated_ba: Option<f64>,
    #[serde(
        default,
        rename = "estimated_slg_using_speedangle",
        deserialize_with = "de_opt_f64"
    )]
    pub estimated_slg: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_u32")]
    pub balls: Option<u32>,
    #[serde(default, deserialize_with = "de_opt_u32")]
    pub strikes: Option<u32>,
    /// Batter handedness, "L" or "R".
    #[serde(default, deserialize_with = "de_opt_string")]
    pub stand: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub pitch_name: Option<String>,
    /// Statcast attack zone id (1-14).
    #[serde(default, deserialize_with = "de_opt_u32")]
    pub zone: Option<u32>,
}

impl PitchEvent {
    /// Season year: game_year when present, else the leading year of game_date.
    pub fn season(&self) -> Option<u32> {
        if self.game_year.is_some() {
            return self.game_year;
        }
        self.game_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok())
    }
}

fn de_opt_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.and_then(|s| {
        let t = s.trim();
        if t.is_empty() || t.eq_ignore_ascii_case("null") {
            None
        } else {
            Some(t.to_string())
        }
    }))
}

fn de_opt_f64<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.and_then(|s| s.trim().parse::<f64>().ok()))
}

fn de_opt_i64<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.and_then(|s| {
        let t = s.trim();
        t.parse::<i64>()
            .ok()
            .or_else(|| t.parse::<f64>().ok().map(|f| f as i64))
    }))
}

fn de_opt_u32<'de, D>(de: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(de)?;
    Ok(raw.and_then(|s| {
        let t = s.trim();
        t.parse::<u32>()
            .ok()
            .or_else(|| t.parse::<f64>().ok().map(|f| f as u32))
    }))
}

// ---------------------------------------------------------------------------
// Pitch family
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PitchFamily {
    Fastball,
    Sinker,
    Cutter,
    Slider,
    Curveball,
    Changeup,
    Splitter,
    Knuckleball,
    Unknown,
}

impl PitchFamily {
    /// Map a Savant pitch_name (long form or two-letter code) to a family.
    /// Sweepers are grouped with sliders.
    pub fn from_name(name: &str) -> Self {
        match name {
            "4-Seam Fastball" | "4-Seam" | "FF" | "Fastball" => PitchFamily::Fastball,
            "Sinker" | "SI" | "Two-Seam Fastball" | "FT" => PitchFamily::Sinker,
            "Cutter" | "FC" => PitchFamily::Cutter,
            "Slider" | "SL" | "Sweeper" | "SV" => PitchFamily::Slider,
            "Curveball" | "CU" | "Knuckle Curve" | "KC" => PitchFamily::Curveball,
            "Changeup" | "CH" => PitchFamily::Changeup,
            "Splitter" | "FS" => PitchFamily::Splitter,
            "Knuckleball" | "KN" => PitchFamily::Knuckleball,
            _ => PitchFamily::Unknown,
        }
    }
}

impl Default for PitchFamily {
    fn default() -> Self {
        PitchFamily::Unknown
    }
}

impl std::fmt::Display for PitchFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PitchFamily::Fastball => "fastball",
            PitchFamily::Sinker => "sinker",
            PitchFamily::Cutter => "cutter",
            PitchFamily::Slider => "slider",
            PitchFamily::Curveball => "curveball",
            PitchFamily::Changeup => "changeup",
            PitchFamily::Splitter => "splitter",
            PitchFamily::Knuckleball => "knuckleball",
            PitchFamily::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Season type (fetch parameter + cache key component)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonType {
    Regular,
    Postseason,
}

impl SeasonType {
    /// Value for the Savant hfGT game-type filter.
    pub fn game_type_filter(&self) -> &'static str {
        match self {
            SeasonType::Regular => "R|",
            SeasonType::Postseason => "F|D|L|W|",
        }
    }
}

impl std::fmt::Display for SeasonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeasonType::Regular => write!(f, "regular"),
            SeasonType::Postseason => write!(f, "postseason"),
        }
    }
}

// ---------------------------------------------------------------------------
// Derived rows
// ---------------------------------------------------------------------------

/// Outcome-tag classification for a terminal pitch. Produced by
/// `engine::classifier::classify_outcome`; total over all tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeFlags {
    pub is_at_bat: bool,
    pub is_hit: bool,
    pub is_walk: bool,
    pub is_intent_walk: bool,
    pub is_hbp: bool,
    pub is_sac_fly: bool,
    pub is_strikeout: bool,
    /// 1/2/3/4 for single/double/triple/home run, else 0.
    pub total_bases: u8,
}

/// Every pitch, tagged with swing/zone/contact classification plus the raw
/// fields the aggregators and binners read. One per input row, terminal or not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedPitch {
    pub season: Option<u32>,
    pub pitch_family: PitchFamily,
    pub pitch_name: Option<String>,
    pub stand: Option<String>,
    pub balls: Option<u32>,
    pub strikes: Option<u32>,
    pub zone: Option<u32>,
    pub plate_x: Option<f64>,
    pub plate_z: Option<f64>,
    pub sz_top: Option<f64>,
    pub sz_bot: Option<f64>,
    pub launch_speed: Option<f64>,
    pub launch_angle: Option<f64>,
    pub estimated_woba: Option<f64>,
    pub estimated_ba: Option<f64>,
    pub estimated_slg: Option<f64>,
    pub in_zone: bool,
    pub is_swing: bool,
    pub is_whiff: bool,
    pub is_ball_in_play: bool,
    pub is_hard_hit: bool,
    pub is_barrel_like: bool,
}

/// The terminal pitch of one plate appearance, with its outcome classified.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateAppearance {
    pub game_pk: i64,
    pub at_bat_number: u32,
    pub batter: i64,
    pub player_name: Option<String>,
    /// Empty string when the terminal pitch carried no tag.
    pub outcome_tag: String,
    pub outcome: OutcomeFlags,
    pub pitch: ClassifiedPitch,
}

// ---------------------------------------------------------------------------
// Output aggregates
// ---------------------------------------------------------------------------

/// One aggregation bucket (typically a player-season). Counting stats are
/// integers; every rate is a defined 0.0 when its denominator is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonLine {
    pub batter: i64,
    pub player_name: String,
    pub season: u32,
    #[serde(rename = "PA")]
    pub pa: u32,
    #[serde(rename = "AB")]
    pub ab: u32,
    #[serde(rename = "H")]
    pub h: u32,
    #[serde(rename = "1B")]
    pub singles: u32,
    #[serde(rename = "2B")]
    pub doubles: u32,
    #[serde(rename = "3B")]
    pub triples: u32,
    #[serde(rename = "HR")]
    pub hr: u32,
    #[serde(rename = "BB")]
    pub bb: u32,
    #[serde(rename = "IBB")]
    pub ibb: u32,
    #[serde(rename = "SO")]
    pub so: u32,
    #[serde(rename = "HBP")]
    pub hbp: u32,
    #[serde(rename = "SF")]
    pub sf: u32,
    #[serde(rename = "AVG")]
    pub avg: f64,
    #[serde(rename = "OBP")]
    pub obp: f64,
    #[serde(rename = "SLG")]
    pub slg: f64,
    #[serde(rename = "OPS")]
    pub ops: f64,
    #[serde(rename = "ISO")]
    pub iso: f64,
    #[serde(rename = "BABIP")]
    pub babip: f64,
    #[serde(rename = "BB%")]
    pub bb_pct: f64,
    #[serde(rename = "K%")]
    pub k_pct: f64,
    #[serde(rename = "wOBA")]
    pub woba: f64,
    #[serde(rename = "wRC+")]
    pub wrc_plus: f64,
    #[serde(rename = "EV")]
    pub ev: f64,
    #[serde(rename = "LA")]
    pub la: f64,
    #[serde(rename = "HardHitPct")]
    pub hard_hit_pct: f64,
    #[serde(rename = "BarrelPct")]
    pub barrel_pct: f64,
    #[serde(rename = "WhiffSwingPct")]
    pub whiff_swing_pct: f64,
    #[serde(rename = "ChasePct")]
    pub chase_pct: f64,
    #[serde(rename = "xwOBA")]
    pub xwoba: f64,
    #[serde(rename = "xBA")]
    pub xba: f64,
    #[serde(rename = "xSLG")]
    pub xslg: f64,
}

/// One split row: the group key plus the full stat line for that partition.
/// `key` is None for rows whose grouping value was missing; such rows are
/// kept, never dropped.
#[derive(Debug, Clone, Serialize)]
pub struct SplitLine {
    pub key: Option<String>,
    #[serde(flatten)]
    pub line: SeasonLine,
}

// ---------------------------------------------------------------------------
// Split dimension
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitDim {
    Season,
    PitchFamily,
    PitchType,
    Stand,
    Count,
    Zone,
}

impl std::str::FromStr for SplitDim {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "season" => Ok(SplitDim::Season),
            "pitch_family" => Ok(SplitDim::PitchFamily),
            "pitch_type" => Ok(SplitDim::PitchType),
            "stand" => Ok(SplitDim::Stand),
            "count" => Ok(SplitDim::Count),
            "zone" => Ok(SplitDim::Zone),
            other => Err(format!("unknown split dimension: {other}")),
        }
    }
}

impl std::fmt::Display for SplitDim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SplitDim::Season => "season",
            SplitDim::PitchFamily => "pitch_family",
            SplitDim::PitchType => "pitch_type",
            SplitDim::Stand => "stand",
            SplitDim::Count => "count",
            SplitDim::Zone => "zone",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Zone grid
// ---------------------------------------------------------------------------

/// The two binning strategies use genuinely different coordinate systems
/// and are deliberately not merged: the 5x5 summary view normalizes against
/// the batter's own zone bounds and reports 1-indexed sparse cells; the 9x9
/// heatmap uses fixed absolute plate bounds and reports a dense 0-indexed grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneBinMode {
    #[serde(rename = "batter_relative_5x5")]
    BatterRelative5x5,
    #[serde(rename = "fixed_bounds_9x9")]
    FixedBounds9x9,
}

impl ZoneBinMode {
    pub fn size(&self) -> usize {
        match self {
            ZoneBinMode::BatterRelative5x5 => 5,
            ZoneBinMode::FixedBounds9x9 => 9,
        }
    }
}

impl std::fmt::Display for ZoneBinMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZoneBinMode::BatterRelative5x5 => write!(f, "batter_relative_5x5"),
            ZoneBinMode::FixedBounds9x9 => write!(f, "fixed_bounds_9x9"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
    /// Pitches binned into this cell.
    pub count: u32,
    pub swing_pct: f64,
    pub whiff_swing_pct: f64,
    pub contact_pct: f64,
    #[serde(rename = "xwOBA")]
    pub xwoba: f64,
}

/// Binner output. Dense (all size*size cells, row-major) for the 9x9 mode,
/// sparse (occupied cells only) for the 5x5 mode.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneGrid {
    pub mode: ZoneBinMode,
    pub size: usize,
    pub cells: Vec<GridCell>,
}
