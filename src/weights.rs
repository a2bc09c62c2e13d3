//! Per-season linear weights for wOBA / wRC+.
//!
//! The table is an immutable lookup injected into the aggregator; nothing in
//! the engine mutates it. Missing seasons fall back to the nearest prior
//! year, and only when the requested season predates the whole table does
//! the earliest known year apply.

use std::collections::BTreeMap;

/// Linear weights and league context for one season.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonWeights {
    pub w_bb: f64,
    pub w_hbp: f64,
    pub w_1b: f64,
    pub w_2b: f64,
    pub w_3b: f64,
    pub w_hr: f64,
    pub scale: f64,
    pub league_woba: f64,
    pub league_runs_per_pa: f64,
}

#[derive(Debug, Clone)]
pub struct WeightsTable {
    by_season: BTreeMap<u32, SeasonWeights>,
}

impl WeightsTable {
    pub fn new(by_season: BTreeMap<u32, SeasonWeights>) -> Self {
        Self { by_season }
    }

    /// The FanGraphs guts values the service ships with.
    pub fn builtin() -> Self {
        let mut by_season = BTreeMap::new();
        let mut add = |year: u32, w: SeasonWeights| {
            by_season.insert(year, w);
        };
        add(2019, weights(0.690, 0.719, 0.877, 1.232, 1.549, 2.031, 1.200, 0.320, 0.126));
        add(2020, weights(0.690, 0.719, 0.877, 1.232, 1.549, 2.031, 1.190, 0.320, 0.125));
        add(2021, weights(0.688, 0.720, 0.877, 1.240, 1.568, 2.010, 1.178, 0.314, 0.120));
        add(2022, weights(0.688, 0.720, 0.878, 1.242, 1.569, 2.007, 1.183, 0.310, 0.118));
        add(2023, weights(0.688, 0.720, 0.880, 1.247, 1.578, 2.013, 1.212, 0.318, 0.125));
        add(2024, weights(0.688, 0.720, 0.880, 1.247, 1.578, 2.013, 1.212, 0.318, 0.125));
        add(2025, weights(0.688, 0.720, 0.880, 1.247, 1.578, 2.013, 1.212, 0.318, 0.125));
        Self { by_season }
    }

    /// Weights for `season`, falling back to the nearest prior year, then to
    /// the earliest known year. None only for an empty table.
    pub fn for_season(&self, season: u32) -> Option<&SeasonWeights> {
        self.by_season
            .range(..=season)
            .next_back()
            .map(|(_, w)| w)
            .or_else(|| self.by_season.values().next())
    }
}

#[allow(clippy::too_many_arguments)]
fn weights(
    w_bb: f64,
    w_hbp: f64,
    w_1b: f64,
    w_2b: f64,
    w_3b: f64,
    w_hr: f64,
    scale: f64,
    league_woba: f64,
    league_runs_per_pa: f64,
) -> SeasonWeights {
    SeasonWeights {
        w_bb,
        w_hbp,
        w_1b,
        w_2b,
        w_3b,
        w_hr,
        scale,
        league_woba,
        league_runs_per_pa,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_season_hits() {
        let table = WeightsTable::builtin();
        let w = table.for_season(2021).unwrap();
        assert!((w.scale - 1.178).abs() < 1e-9);
    }

    #[test]
    fn future_season_falls_back_to_nearest_prior() {
        let table = WeightsTable::builtin();
        let w = table.for_season(2031).unwrap();
        assert_eq!(w, table.for_season(2025).unwrap());
    }

    #[test]
    fn prehistoric_season_falls_back_to_earliest_known() {
        let table = WeightsTable::builtin();
        let w = table.for_season(1998).unwrap();
        assert_eq!(w, table.for_season(2019).unwrap());
    }

    #[test]
    fn empty_table_yields_none() {
        let table = WeightsTable::new(BTreeMap::new());
        assert!(table.for_season(2024).is_none());
    }
}
