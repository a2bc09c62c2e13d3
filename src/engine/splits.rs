use std::collections::HashMap;

use crate::types::{ClassifiedPitch, PlateAppearance, SplitDim, SplitLine};
use crate::weights::WeightsTable;

use super::rates::aggregate_grouped;

/// Grouping value of one pitch under a split dimension. None means the
/// source row was missing the field; those rows group under the null key.
/// Pitch family is total (unmapped names are the "unknown" family), so it
/// never produces a null key.
pub fn split_key(dim: SplitDim, pitch: &ClassifiedPitch) -> Option<String> {
    match dim {
        SplitDim::Season => pitch.season.map(|y| y.to_string()),
        SplitDim::PitchFamily => Some(pitch.pitch_family.to_string()),
        SplitDim::PitchType => pitch.pitch_name.clone(),
        SplitDim::Stand => pitch.stand.clone(),
        SplitDim::Count => match (pitch.balls, pitch.strikes) {
            (Some(b), Some(s)) => Some(format!("{b}-{s}")),
            _ => None,
        },
        SplitDim::Zone => pitch.zone.map(|z| z.to_string()),
    }
}

/// Partition the plate-appearance and pitch sets by `dim` (a plate
/// appearance is keyed through its terminal pitch) and compute one full stat
/// line per distinct key in a single grouped pass. Rows are ordered by AB
/// descending, ties by key ascending with the null key sorting as the empty
/// string.
pub fn aggregate_by(
    pas: &[PlateAppearance],
    pitches: &[ClassifiedPitch],
    dim: SplitDim,
    weights: &WeightsTable,
) -> Vec<SplitLine> {
    type Partition<'a> = (Vec<&'a PlateAppearance>, Vec<&'a ClassifiedPitch>);
    let mut partitions: HashMap<Option<String>, Partition<'_>> = HashMap::new();

    for pa in pas {
        partitions
            .entry(split_key(dim, &pa.pitch))
            .or_default()
            .0
            .push(pa);
    }
    for pitch in pitches {
        partitions
            .entry(split_key(dim, pitch))
            .or_default()
            .1
            .push(pitch);
    }

    let mut rows: Vec<SplitLine> = partitions
        .into_iter()
        .map(|(key, (group_pas, group_pitches))| SplitLine {
            key,
            line: aggregate_grouped(&group_pas, &group_pitches, weights),
        })
        .collect();

    rows.sort_by(|a, b| {
        b.line
            .ab
            .cmp(&a.line.ab)
            .then_with(|| a.key.as_deref().unwrap_or("").cmp(b.key.as_deref().unwrap_or("")))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::classifier::classify_outcome;

    fn pa_with(tag: &str, stand: Option<&str>, family_name: Option<&str>) -> PlateAppearance {
        let pitch = ClassifiedPitch {
            season: Some(2024),
            stand: stand.map(str::to_string),
            pitch_name: family_name.map(str::to_string),
            pitch_family: family_name
                .map(crate::types::PitchFamily::from_name)
                .unwrap_or_default(),
            ..Default::default()
        };
        PlateAppearance {
            game_pk: 1,
            at_bat_number: 1,
            batter: 1,
            player_name: None,
            outcome: classify_outcome(tag),
            outcome_tag: tag.to_string(),
            pitch,
        }
    }

    #[test]
    fn rows_are_ordered_by_ab_then_key() {
        let pas = vec![
            pa_with("single", Some("R"), None),
            pa_with("field_out", Some("R"), None),
            pa_with("double", Some("L"), None),
        ];
        let rows = aggregate_by(&pas, &[], SplitDim::Stand, &WeightsTable::builtin());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key.as_deref(), Some("R"));
        assert_eq!(rows[0].line.ab, 2);
        assert_eq!(rows[1].key.as_deref(), Some("L"));
    }

    #[test]
    fn equal_ab_ties_break_on_key_ascending() {
        let pas = vec![
            pa_with("single", Some("R"), None),
            pa_with("double", Some("L"), None),
        ];
        let rows = aggregate_by(&pas, &[], SplitDim::Stand, &WeightsTable::builtin());
        assert_eq!(rows[0].key.as_deref(), Some("L"));
        assert_eq!(rows[1].key.as_deref(), Some("R"));
    }

    #[test]
    fn missing_key_rows_are_kept_under_the_null_key() {
        let pas = vec![
            pa_with("single", Some("R"), None),
            pa_with("walk", None, None),
        ];
        let rows = aggregate_by(&pas, &[], SplitDim::Stand, &WeightsTable::builtin());
        assert_eq!(rows.len(), 2);
        let null_row = rows.iter().find(|r| r.key.is_none()).unwrap();
        assert_eq!(null_row.line.pa, 1);
        assert_eq!(null_row.line.bb, 1);
    }

    #[test]
    fn null_key_sorts_before_named_keys_on_ties() {
        let pas = vec![
            pa_with("single", Some("R"), None),
            pa_with("double", None, None),
        ];
        let rows = aggregate_by(&pas, &[], SplitDim::Stand, &WeightsTable::builtin());
        assert!(rows[0].key.is_none());
        assert_eq!(rows[1].key.as_deref(), Some("R"));
    }

    #[test]
    fn pitch_family_split_keys_both_sets() {
        let pas = vec![pa_with("home_run", None, Some("Slider"))];
        let pitches = vec![
            ClassifiedPitch {
                pitch_family: crate::types::PitchFamily::Slider,
                is_swing: true,
                is_whiff: true,
                ..Default::default()
            },
            ClassifiedPitch {
                pitch_family: crate::types::PitchFamily::Fastball,
                is_swing: true,
                ..Default::default()
            },
        ];
        let rows = aggregate_by(&pas, &pitches, SplitDim::PitchFamily, &WeightsTable::builtin());
        let slider = rows.iter().find(|r| r.key.as_deref() == Some("slider")).unwrap();
        assert_eq!(slider.line.hr, 1);
        assert!((slider.line.whiff_swing_pct - 1.0).abs() < 1e-9);
        let fastball = rows.iter().find(|r| r.key.as_deref() == Some("fastball")).unwrap();
        assert_eq!(fastball.line.pa, 0);
        assert!((fastball.line.whiff_swing_pct - 0.0).abs() < 1e-9);
    }

    #[test]
    fn count_split_formats_balls_dash_strikes() {
        let pitch = ClassifiedPitch {
            balls: Some(3),
            strikes: Some(2),
            ..Default::default()
        };
        assert_eq!(split_key(SplitDim::Count, &pitch).as_deref(), Some("3-2"));
        assert_eq!(split_key(SplitDim::Count, &ClassifiedPitch::default()), None);
    }
}
