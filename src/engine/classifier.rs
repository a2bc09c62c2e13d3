use crate::config::{BARREL_EV, BARREL_LA_MAX, BARREL_LA_MIN, HARD_HIT_EV, ZONE_HALF_WIDTH};
use crate::types::{ClassifiedPitch, OutcomeFlags, PitchEvent, PitchFamily};

/// Outcome tags that score as hits; total bases are 1/2/3/4 in this order.
pub const HIT_EVENTS: &[&str] = &["single", "double", "triple", "home_run"];

/// Outcome tags that count as official at-bats. Strikeouts are at-bats;
/// walks, HBP, sacrifices and interference are excluded below.
pub const AB_EVENTS: &[&str] = &[
    "single",
    "double",
    "triple",
    "home_run",
    "field_out",
    "force_out",
    "other_out",
    "grounded_into_double_play",
    "field_error",
    "double_play",
    "triple_play",
    "strikeout",
    "strikeout_double_play",
];

/// Outcome tags excluded from at-bats even if a future Savant export were to
/// overlap them with AB_EVENTS. Savant has emitted both interference spellings.
pub const NON_AB_EVENTS: &[&str] = &[
    "walk",
    "intent_walk",
    "hit_by_pitch",
    "sac_bunt",
    "sac_fly",
    "sac_fly_double_play",
    "catcher_interf",
    "catcher_interference",
];

pub const BB_EVENTS: &[&str] = &["walk", "intent_walk"];
pub const IBB_EVENTS: &[&str] = &["intent_walk"];
pub const SF_EVENTS: &[&str] = &["sac_fly", "sac_fly_double_play"];
pub const HBP_EVENTS: &[&str] = &["hit_by_pitch"];
pub const SO_EVENTS: &[&str] = &["strikeout", "strikeout_double_play"];

/// Classify a terminal outcome tag into the classic scoring categories.
/// Total over all inputs: an unrecognized tag sets no flags and the PA only
/// counts toward the PA total; the empty tag matches nothing.
pub fn classify_outcome(tag: &str) -> OutcomeFlags {
    let is_hit = HIT_EVENTS.contains(&tag);
    let total_bases = match tag {
        "single" => 1,
        "double" => 2,
        "triple" => 3,
        "home_run" => 4,
        _ => 0,
    };
    OutcomeFlags {
        is_at_bat: AB_EVENTS.contains(&tag) && !NON_AB_EVENTS.contains(&tag),
        is_hit,
        is_walk: BB_EVENTS.contains(&tag),
        is_intent_walk: IBB_EVENTS.contains(&tag),
        is_hbp: HBP_EVENTS.contains(&tag),
        is_sac_fly: SF_EVENTS.contains(&tag),
        is_strikeout: SO_EVENTS.contains(&tag),
        total_bases,
    }
}

/// Tag a single pitch with swing/zone/contact classification. Applies to
/// every pitch, terminal or not; missing fields classify as false.
pub fn classify_pitch(event: &PitchEvent) -> ClassifiedPitch {
    let result = event.pitch_result.as_deref().unwrap_or("");
    let description = event.description.as_deref().unwrap_or("");

    let is_ball_in_play = result == "X";
    // Any strike that was not called is a swing: swinging strikes, fouls,
    // foul tips, bunt attempts.
    let is_swing = is_ball_in_play || (result == "S" && !description.contains("called_strike"));
    let is_whiff = description.contains("swinging_strike") || description.contains("missed_bunt");

    let in_zone = match (event.plate_x, event.plate_z, event.sz_bot, event.sz_top) {
        (Some(x), Some(z), Some(bot), Some(top)) => {
            x.abs() <= ZONE_HALF_WIDTH && z >= bot && z <= top
        }
        _ => false,
    };

    let is_hard_hit = event.launch_speed.map_or(false, |ev| ev >= HARD_HIT_EV);
    let is_barrel_like = match (event.launch_speed, event.launch_angle) {
        (Some(ev), Some(la)) => ev >= BARREL_EV && (BARREL_LA_MIN..=BARREL_LA_MAX).contains(&la),
        _ => false,
    };

    ClassifiedPitch {
        season: event.season(),
        pitch_family: event
            .pitch_name
            .as_deref()
            .map_or(PitchFamily::Unknown, PitchFamily::from_name),
        pitch_name: event.pitch_name.clone(),
        stand: event.stand.clone(),
        balls: event.balls,
        strikes: event.strikes,
        zone: event.zone,
        plate_x: event.plate_x,
        plate_z: event.plate_z,
        sz_top: event.sz_top,
        sz_bot: event.sz_bot,
        launch_speed: event.launch_speed,
        launch_angle: event.launch_angle,
        estimated_woba: event.estimated_woba,
        estimated_ba: event.estimated_ba,
        estimated_slg: event.estimated_slg,
        in_zone,
        is_swing,
        is_whiff,
        is_ball_in_play,
        is_hard_hit,
        is_barrel_like,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pitch(result: &str, description: &str) -> PitchEvent {
        PitchEvent {
            pitch_result: Some(result.to_string()),
            description: Some(description.to_string()),
            ..Default::default()
        }
    }

    fn located(x: f64, z: f64, bot: f64, top: f64) -> PitchEvent {
        PitchEvent {
            plate_x: Some(x),
            plate_z: Some(z),
            sz_bot: Some(bot),
            sz_top: Some(top),
            ..Default::default()
        }
    }

    #[test]
    fn walk_is_not_an_at_bat() {
        let flags = classify_outcome("walk");
        assert!(!flags.is_at_bat);
        assert!(flags.is_walk);
        assert!(!flags.is_hit);
        assert_eq!(flags.total_bases, 0);
    }

    #[test]
    fn home_run_is_a_four_base_hit() {
        let flags = classify_outcome("home_run");
        assert!(flags.is_at_bat);
        assert!(flags.is_hit);
        assert_eq!(flags.total_bases, 4);
    }

    #[test]
    fn strikeout_counts_as_at_bat() {
        let flags = classify_outcome("strikeout");
        assert!(flags.is_at_bat);
        assert!(flags.is_strikeout);
        assert!(!flags.is_hit);

        let dp = classify_outcome("strikeout_double_play");
        assert!(dp.is_at_bat);
        assert!(dp.is_strikeout);
    }

    #[test]
    fn sacrifice_fly_is_excluded_from_at_bats() {
        let flags = classify_outcome("sac_fly");
        assert!(!flags.is_at_bat);
        assert!(flags.is_sac_fly);

        let dp = classify_outcome("sac_fly_double_play");
        assert!(!dp.is_at_bat);
        assert!(dp.is_sac_fly);
    }

    #[test]
    fn intent_walk_sets_both_walk_flags() {
        let flags = classify_outcome("intent_walk");
        assert!(flags.is_walk);
        assert!(flags.is_intent_walk);
        assert!(!flags.is_at_bat);
    }

    #[test]
    fn unknown_and_empty_tags_are_inert() {
        for tag in ["", "pickoff_1b", "game_advisory"] {
            let flags = classify_outcome(tag);
            assert_eq!(flags, OutcomeFlags::default(), "tag {tag:?}");
        }
    }

    #[test]
    fn called_strike_is_not_a_swing() {
        let p = classify_pitch(&pitch("S", "called_strike"));
        assert!(!p.is_swing);
        assert!(!p.is_whiff);
    }

    #[test]
    fn swinging_strike_is_swing_and_whiff() {
        let p = classify_pitch(&pitch("S", "swinging_strike"));
        assert!(p.is_swing);
        assert!(p.is_whiff);

        let blocked = classify_pitch(&pitch("S", "swinging_strike_blocked"));
        assert!(blocked.is_whiff);
    }

    #[test]
    fn foul_is_a_swing_but_not_a_whiff() {
        let p = classify_pitch(&pitch("S", "foul"));
        assert!(p.is_swing);
        assert!(!p.is_whiff);
        assert!(!p.is_ball_in_play);
    }

    #[test]
    fn ball_in_play_is_a_swing() {
        let p = classify_pitch(&pitch("X", "hit_into_play"));
        assert!(p.is_swing);
        assert!(p.is_ball_in_play);
        assert!(!p.is_whiff);
    }

    #[test]
    fn ball_is_neither_swing_nor_whiff() {
        let p = classify_pitch(&pitch("B", "ball"));
        assert!(!p.is_swing);
        assert!(!p.is_whiff);
        assert!(!p.is_ball_in_play);
    }

    #[test]
    fn zone_check_uses_batter_bounds() {
        assert!(classify_pitch(&located(0.0, 2.5, 1.5, 3.5)).in_zone);
        assert!(classify_pitch(&located(0.83, 1.5, 1.5, 3.5)).in_zone);
        assert!(!classify_pitch(&located(0.9, 2.5, 1.5, 3.5)).in_zone);
        assert!(!classify_pitch(&located(0.0, 3.6, 1.5, 3.5)).in_zone);
    }

    #[test]
    fn missing_coordinates_are_out_of_zone() {
        let p = classify_pitch(&PitchEvent {
            plate_x: Some(0.0),
            plate_z: Some(2.5),
            ..Default::default()
        });
        assert!(!p.in_zone);
    }

    #[test]
    fn hard_hit_and_barrel_thresholds() {
        let hit = |ev: f64, la: f64| PitchEvent {
            launch_speed: Some(ev),
            launch_angle: Some(la),
            ..Default::default()
        };
        assert!(classify_pitch(&hit(95.0, 10.0)).is_hard_hit);
        assert!(!classify_pitch(&hit(94.9, 10.0)).is_hard_hit);

        assert!(classify_pitch(&hit(98.0, 26.0)).is_barrel_like);
        assert!(classify_pitch(&hit(101.0, 30.0)).is_barrel_like);
        assert!(!classify_pitch(&hit(97.9, 28.0)).is_barrel_like);
        assert!(!classify_pitch(&hit(105.0, 31.0)).is_barrel_like);

        let no_la = classify_pitch(&PitchEvent {
            launch_speed: Some(110.0),
            ..Default::default()
        });
        assert!(!no_la.is_barrel_like);
    }

    #[test]
    fn pitch_family_mapping() {
        let named = |n: &str| PitchEvent {
            pitch_name: Some(n.to_string()),
            ..Default::default()
        };
        assert_eq!(classify_pitch(&named("4-Seam Fastball")).pitch_family, PitchFamily::Fastball);
        assert_eq!(classify_pitch(&named("Sweeper")).pitch_family, PitchFamily::Slider);
        assert_eq!(classify_pitch(&named("Eephus")).pitch_family, PitchFamily::Unknown);
        assert_eq!(classify_pitch(&PitchEvent::default()).pitch_family, PitchFamily::Unknown);
    }
}
