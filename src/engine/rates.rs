use crate::types::{ClassifiedPitch, PlateAppearance, SeasonLine};
use crate::weights::WeightsTable;

/// A rate with an empty denominator is a defined 0.0 — never NaN, never an
/// error. Every division in the aggregator goes through here.
pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

pub(crate) fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

pub(crate) fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut n = 0u32;
    for v in values {
        sum += v;
        n += 1;
    }
    ratio(sum, n as f64)
}

/// Compute the full stat line for one bucket of classified plate appearances
/// and pitches. Pure and order-independent; the empty bucket yields the
/// all-zero line. Identity fields come from the first plate appearance.
pub fn aggregate_rates(
    pas: &[PlateAppearance],
    pitches: &[ClassifiedPitch],
    weights: &WeightsTable,
) -> SeasonLine {
    let pa_refs: Vec<&PlateAppearance> = pas.iter().collect();
    let pitch_refs: Vec<&ClassifiedPitch> = pitches.iter().collect();
    aggregate_grouped(&pa_refs, &pitch_refs, weights)
}

/// Slice-of-refs variant shared with the split aggregator, so each partition
/// is aggregated in one pass without cloning its rows.
pub(crate) fn aggregate_grouped(
    pas: &[&PlateAppearance],
    pitches: &[&ClassifiedPitch],
    weights: &WeightsTable,
) -> SeasonLine {
    let mut line = SeasonLine::default();
    if let Some(first) = pas.first() {
        line.batter = first.batter;
        line.player_name = first.player_name.clone().unwrap_or_default();
        line.season = first.pitch.season.unwrap_or(0);
    }

    line.pa = pas.len() as u32;
    let mut tb = 0u32;
    for pa in pas {
        let o = &pa.outcome;
        line.ab += u32::from(o.is_at_bat);
        line.h += u32::from(o.is_hit);
        line.bb += u32::from(o.is_walk);
        line.ibb += u32::from(o.is_intent_walk);
        line.hbp += u32::from(o.is_hbp);
        line.sf += u32::from(o.is_sac_fly);
        line.so += u32::from(o.is_strikeout);
        match o.total_bases {
            1 => line.singles += 1,
            2 => line.doubles += 1,
            3 => line.triples += 1,
            4 => line.hr += 1,
            _ => {}
        }
        tb += u32::from(o.total_bases);
    }

    let pa_n = f64::from(line.pa);
    let ab = f64::from(line.ab);
    let h = f64::from(line.h);
    let bb = f64::from(line.bb);
    let hbp = f64::from(line.hbp);
    let sf = f64::from(line.sf);
    let so = f64::from(line.so);
    let hr = f64::from(line.hr);
    let tb = f64::from(tb);

    let avg = ratio(h, ab);
    let obp = ratio(h + bb + hbp, ab + bb + hbp + sf);
    let slg = ratio(tb, ab);
    line.avg = round3(avg);
    line.obp = round3(obp);
    line.slg = round3(slg);
    line.ops = round3(obp + slg);
    line.iso = round3(slg - avg);
    line.babip = round3(ratio(h - hr, ab - so - hr + sf));
    line.bb_pct = round3(ratio(bb, pa_n));
    line.k_pct = round3(ratio(so, pa_n));

    if let Some(w) = weights.for_season(line.season) {
        let ubb = f64::from(line.bb.saturating_sub(line.ibb));
        let num = w.w_bb * ubb
            + w.w_hbp * hbp
            + w.w_1b * f64::from(line.singles)
            + w.w_2b * f64::from(line.doubles)
            + w.w_3b * f64::from(line.triples)
            + w.w_hr * hr;
        let den = ab + ubb + sf + hbp;
        if den > 0.0 && line.pa > 0 {
            let woba = num / den;
            line.woba = round3(woba);
            let wraa_per_pa = (woba - w.league_woba) / w.scale;
            line.wrc_plus =
                round3((wraa_per_pa + w.league_runs_per_pa) / w.league_runs_per_pa * 100.0);
        }
    }

    let mut bip = 0u32;
    let mut hard = 0u32;
    let mut barrels = 0u32;
    let mut swings = 0u32;
    let mut whiffs = 0u32;
    let mut chases = 0u32;
    for p in pitches {
        if p.is_ball_in_play {
            bip += 1;
            hard += u32::from(p.is_hard_hit);
            barrels += u32::from(p.is_barrel_like);
        }
        if p.is_swing {
            swings += 1;
            whiffs += u32::from(p.is_whiff);
            chases += u32::from(!p.in_zone);
        }
    }
    line.hard_hit_pct = round3(ratio(f64::from(hard), f64::from(bip)));
    line.barrel_pct = round3(ratio(f64::from(barrels), f64::from(bip)));
    line.whiff_swing_pct = round3(ratio(f64::from(whiffs), f64::from(swings)));
    line.chase_pct = round3(ratio(f64::from(chases), f64::from(swings)));

    line.ev = round1(mean(pitches.iter().filter_map(|p| p.launch_speed)));
    line.la = round1(mean(pitches.iter().filter_map(|p| p.launch_angle)));
    line.xwoba = round3(mean(pitches.iter().filter_map(|p| p.estimated_woba)));
    line.xba = round3(mean(pitches.iter().filter_map(|p| p.estimated_ba)));
    line.xslg = round3(mean(pitches.iter().filter_map(|p| p.estimated_slg)));

    line
}
