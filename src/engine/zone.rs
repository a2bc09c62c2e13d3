use std::collections::BTreeMap;

use crate::config::{
    DEFAULT_SZ_BOT, DEFAULT_SZ_TOP, GRID9_X_MAX, GRID9_X_MIN, GRID9_Z_MAX, GRID9_Z_MIN,
    ZONE_HALF_WIDTH,
};
use crate::types::{ClassifiedPitch, GridCell, ZoneBinMode, ZoneGrid};

use super::rates::{ratio, round3};

#[derive(Debug, Default, Clone, Copy)]
struct CellAccum {
    count: u32,
    swings: u32,
    whiffs: u32,
    contacts: u32,
    xwoba_sum: f64,
    xwoba_n: u32,
}

impl CellAccum {
    fn add(&mut self, pitch: &ClassifiedPitch) {
        self.count += 1;
        self.swings += u32::from(pitch.is_swing);
        self.whiffs += u32::from(pitch.is_whiff);
        self.contacts += u32::from(pitch.is_ball_in_play);
        if let Some(x) = pitch.estimated_woba {
            self.xwoba_sum += x;
            self.xwoba_n += 1;
        }
    }

    fn cell(&self, row: usize, col: usize) -> GridCell {
        GridCell {
            row,
            col,
            count: self.count,
            swing_pct: round3(ratio(f64::from(self.swings), f64::from(self.count))),
            whiff_swing_pct: round3(ratio(f64::from(self.whiffs), f64::from(self.swings))),
            contact_pct: round3(ratio(f64::from(self.contacts), f64::from(self.count))),
            xwoba: round3(ratio(self.xwoba_sum, f64::from(self.xwoba_n))),
        }
    }
}

/// Bin index for a coordinate normalized into [0, 1]: floor(n * size)
/// clamped to the top bin so n == 1.0 lands inside the grid.
fn bin_index(normalized: f64, size: usize) -> usize {
    ((normalized * size as f64) as usize).min(size - 1)
}

/// Bin classified pitches into the requested grid. Pitches missing either
/// plate coordinate are skipped; everything else clamps into an edge cell,
/// so the cell-count total equals the number of located pitches.
pub fn bin_zone_grid(pitches: &[ClassifiedPitch], mode: ZoneBinMode) -> ZoneGrid {
    match mode {
        ZoneBinMode::BatterRelative5x5 => bin_batter_relative(pitches),
        ZoneBinMode::FixedBounds9x9 => bin_fixed_bounds(pitches),
    }
}

/// Coarse 5x5 summary view: vertical axis normalized against the batter's
/// own zone bounds per pitch, 1-indexed rows/cols, occupied cells only.
fn bin_batter_relative(pitches: &[ClassifiedPitch]) -> ZoneGrid {
    let size = ZoneBinMode::BatterRelative5x5.size();
    let mut occupied: BTreeMap<(usize, usize), CellAccum> = BTreeMap::new();

    for pitch in pitches {
        let (Some(x), Some(z)) = (pitch.plate_x, pitch.plate_z) else {
            continue;
        };
        let (bot, top) = match (pitch.sz_bot, pitch.sz_top) {
            (Some(b), Some(t)) if t > b => (b, t),
            _ => (DEFAULT_SZ_BOT, DEFAULT_SZ_TOP),
        };
        let nx = ((x + ZONE_HALF_WIDTH) / (2.0 * ZONE_HALF_WIDTH)).clamp(0.0, 1.0);
        let nz = ((z - bot) / (top - bot)).clamp(0.0, 1.0);
        let row = bin_index(nz, size) + 1;
        let col = bin_index(nx, size) + 1;
        occupied.entry((row, col)).or_default().add(pitch);
    }

    ZoneGrid {
        mode: ZoneBinMode::BatterRelative5x5,
        size,
        cells: occupied
            .into_iter()
            .map(|((row, col), accum)| accum.cell(row, col))
            .collect(),
    }
}

/// Dense 9x9 heatmap on fixed absolute plate bounds, 0-indexed, row-major,
/// empty cells zero-filled.
fn bin_fixed_bounds(pitches: &[ClassifiedPitch]) -> ZoneGrid {
    let size = ZoneBinMode::FixedBounds9x9.size();
    let mut accums = vec![CellAccum::default(); size * size];

    for pitch in pitches {
        let (Some(x), Some(z)) = (pitch.plate_x, pitch.plate_z) else {
            continue;
        };
        let nx = ((x - GRID9_X_MIN) / (GRID9_X_MAX - GRID9_X_MIN)).clamp(0.0, 1.0);
        let nz = ((z - GRID9_Z_MIN) / (GRID9_Z_MAX - GRID9_Z_MIN)).clamp(0.0, 1.0);
        let row = bin_index(nz, size);
        let col = bin_index(nx, size);
        accums[row * size + col].add(pitch);
    }

    ZoneGrid {
        mode: ZoneBinMode::FixedBounds9x9,
        size,
        cells: accums
            .iter()
            .enumerate()
            .map(|(i, accum)| accum.cell(i / size, i % size))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn located(x: f64, z: f64) -> ClassifiedPitch {
        ClassifiedPitch {
            plate_x: Some(x),
            plate_z: Some(z),
            ..Default::default()
        }
    }

    #[test]
    fn nine_by_nine_is_always_dense() {
        let grid = bin_zone_grid(&[], ZoneBinMode::FixedBounds9x9);
        assert_eq!(grid.size, 9);
        assert_eq!(grid.cells.len(), 81);
        assert!(grid.cells.iter().all(|c| c.count == 0));

        let grid = bin_zone_grid(&[located(0.0, 2.5)], ZoneBinMode::FixedBounds9x9);
        assert_eq!(grid.cells.len(), 81);
    }

    #[test]
    fn nine_by_nine_cell_total_matches_located_pitches() {
        let pitches = vec![
            located(0.0, 2.5),
            located(-3.0, 2.5), // far outside, clamps into column 0
            located(0.4, 9.0),  // far above, clamps into the top row
            ClassifiedPitch::default(), // no coordinates, skipped
            ClassifiedPitch {
                plate_x: Some(0.1),
                ..Default::default()
            },
        ];
        let grid = bin_zone_grid(&pitches, ZoneBinMode::FixedBounds9x9);
        let total: u32 = grid.cells.iter().map(|c| c.count).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn nine_by_nine_clamps_out_of_range_into_edge_cells() {
        let grid = bin_zone_grid(&[located(5.0, 0.0)], ZoneBinMode::FixedBounds9x9);
        let hit = grid.cells.iter().find(|c| c.count > 0).unwrap();
        assert_eq!((hit.row, hit.col), (0, 8));
    }

    #[test]
    fn nine_by_nine_center_pitch_lands_in_the_middle() {
        // x=0 → nx=0.5 → col 4; z=2.5 → nz=0.5 → row 4.
        let grid = bin_zone_grid(&[located(0.0, 2.5)], ZoneBinMode::FixedBounds9x9);
        let hit = grid.cells.iter().find(|c| c.count > 0).unwrap();
        assert_eq!((hit.row, hit.col), (4, 4));
    }

    #[test]
    fn five_by_five_is_sparse_and_one_indexed() {
        let mut pitch = located(0.0, 2.5);
        pitch.sz_bot = Some(1.5);
        pitch.sz_top = Some(3.5);
        let grid = bin_zone_grid(&[pitch], ZoneBinMode::BatterRelative5x5);
        assert_eq!(grid.size, 5);
        assert_eq!(grid.cells.len(), 1);
        // nx = 0.5 → bin 2 → col 3; nz = 0.5 → row 3.
        assert_eq!((grid.cells[0].row, grid.cells[0].col), (3, 3));
    }

    #[test]
    fn five_by_five_defaults_missing_zone_bounds() {
        // No sz bounds: defaults 1.5/3.5 put z=3.4 near the top, row 5.
        let grid = bin_zone_grid(&[located(0.0, 3.4)], ZoneBinMode::BatterRelative5x5);
        assert_eq!(grid.cells[0].row, 5);
    }

    #[test]
    fn five_by_five_normalizes_against_the_batter_zone() {
        // A tall zone moves the same absolute height into a lower row.
        let mut tall = located(0.0, 3.4);
        tall.sz_bot = Some(1.5);
        tall.sz_top = Some(5.3);
        let grid = bin_zone_grid(&[tall], ZoneBinMode::BatterRelative5x5);
        assert_eq!(grid.cells[0].row, 3);
    }

    #[test]
    fn cell_rates_and_whiff_guard() {
        let swinging = ClassifiedPitch {
            plate_x: Some(0.0),
            plate_z: Some(2.5),
            is_swing: true,
            is_whiff: true,
            estimated_woba: Some(0.4),
            ..Default::default()
        };
        let contact = ClassifiedPitch {
            plate_x: Some(0.0),
            plate_z: Some(2.5),
            is_swing: true,
            is_ball_in_play: true,
            estimated_woba: Some(0.2),
            ..Default::default()
        };
        let take = located(0.0, 2.5);
        let grid = bin_zone_grid(&[swinging, contact, take], ZoneBinMode::BatterRelative5x5);
        assert_eq!(grid.cells.len(), 1);
        let cell = &grid.cells[0];
        assert_eq!(cell.count, 3);
        assert!((cell.swing_pct - round3(2.0 / 3.0)).abs() < 1e-9);
        assert!((cell.whiff_swing_pct - 0.5).abs() < 1e-9);
        assert!((cell.contact_pct - round3(1.0 / 3.0)).abs() < 1e-9);
        assert!((cell.xwoba - 0.3).abs() < 1e-9);

        // A cell with takes only never divides by its zero swing count.
        let grid = bin_zone_grid(&[located(0.5, 2.0)], ZoneBinMode::BatterRelative5x5);
        assert!((grid.cells[0].whiff_swing_pct - 0.0).abs() < 1e-9);
    }
}
