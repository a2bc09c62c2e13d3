use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::types::{PitchEvent, PlateAppearance};

use super::classifier::{classify_outcome, classify_pitch};

/// Collapse a pitch stream into one terminal record per plate appearance.
///
/// Groups by `(game_pk, at_bat_number, batter)` and keeps the row with the
/// highest `pitch_number`; on a tie the later row in the input wins. Input
/// order is otherwise irrelevant and the output is sorted by the group key.
///
/// Every row must carry the ordering/id fields; a missing or non-numeric
/// value is a `MalformedInput` error, never a silent drop.
pub fn reduce_to_plate_appearances(events: &[PitchEvent]) -> Result<Vec<PlateAppearance>> {
    let mut terminal: HashMap<(i64, u32, i64), (u32, &PitchEvent)> = HashMap::new();

    for event in events {
        let (Some(game_pk), Some(at_bat_number), Some(batter)) =
            (event.game_pk, event.at_bat_number, event.batter)
        else {
            return Err(AppError::MalformedInput(
                "pitch row is missing game_pk, at_bat_number or batter".to_string(),
            ));
        };
        let Some(pitch_number) = event.pitch_number else {
            return Err(AppError::MalformedInput(format!(
                "missing or non-numeric pitch_number in game {game_pk}, at-bat {at_bat_number}"
            )));
        };

        match terminal.entry((game_pk, at_bat_number, batter)) {
            Entry::Vacant(slot) => {
                slot.insert((pitch_number, event));
            }
            Entry::Occupied(mut slot) => {
                if pitch_number >= slot.get().0 {
                    slot.insert((pitch_number, event));
                }
            }
        }
    }

    let mut groups: Vec<_> = terminal.into_iter().collect();
    groups.sort_by_key(|(key, _)| *key);

    Ok(groups
        .into_iter()
        .map(|((game_pk, at_bat_number, batter), (_, event))| {
            let outcome_tag = event.events.clone().unwrap_or_default();
            PlateAppearance {
                game_pk,
                at_bat_number,
                batter,
                player_name: event.player_name.clone(),
                outcome: classify_outcome(&outcome_tag),
                outcome_tag,
                pitch: classify_pitch(event),
            }
        })
        .collect())
}
