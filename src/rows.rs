//! Row clearing: completed-row detection, the two-phase clear animation, row
//! collapse, and the score/speed progression it drives.

use crate::game::{Presenter, Snapshot};
use crate::grid::{CellState, Grid};
use std::io;
use std::time::Duration;
use tracing::info;

/// Gravity interval never drops below this.
pub const MIN_INTERVAL_MS: u64 = 50;
/// Interval reduction per cleared row.
pub const INTERVAL_STEP_MS: u64 = 10;
/// Points per row are `SCORE_SCALE / interval`.
const SCORE_SCALE: u64 = 1000;

/// Score and gravity speed. Only ever moves forward: score up, interval down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progression {
    pub score: u64,
    pub interval_ms: u64,
    pub rows_cleared: u32,
}

impl Progression {
    pub fn new(initial_interval_ms: u64) -> Self {
        Self {
            score: 0,
            interval_ms: initial_interval_ms.max(MIN_INTERVAL_MS),
            rows_cleared: 0,
        }
    }

    /// Credits one cleared row at the current speed, then speeds up.
    /// Returns the points awarded.
    pub fn record_clear(&mut self) -> u64 {
        let points = SCORE_SCALE / self.interval_ms;
        self.score += points;
        self.rows_cleared += 1;
        self.interval_ms = self
            .interval_ms
            .saturating_sub(INTERVAL_STEP_MS)
            .max(MIN_INTERVAL_MS);
        points
    }
}

fn is_complete(grid: &Grid, row: usize) -> bool {
    grid.row(row).iter().all(|c| c.state == CellState::Filled)
}

/// Indices of every fully `Filled` row, bottom first.
pub fn find_completed_rows(grid: &Grid) -> Vec<usize> {
    (0..grid.rows()).rev().filter(|&r| is_complete(grid, r)).collect()
}

/// Clears `row` in three observable steps: highlight, empty, collapse. Each of
/// the first two is presented and held for `delay`; the collapse is presented
/// once the score has been updated.
pub fn clear_row<P: Presenter + ?Sized>(
    grid: &mut Grid,
    progression: &mut Progression,
    row: usize,
    delay: Duration,
    presenter: &mut P,
) -> io::Result<u64> {
    grid.mark_row_clearing(row);
    presenter.present(&Snapshot::playing(grid, progression))?;
    presenter.hold(delay);

    grid.empty_row(row);
    presenter.present(&Snapshot::playing(grid, progression))?;
    presenter.hold(delay);

    grid.shift_filled_down_into(row);
    let points = progression.record_clear();
    info!(
        row,
        points,
        score = progression.score,
        interval_ms = progression.interval_ms,
        "row cleared"
    );
    presenter.present(&Snapshot::playing(grid, progression))?;
    Ok(points)
}

/// Clears completed rows one at a time, rescanning from the bottom after each
/// collapse since row indices shift. Returns how many rows were cleared.
pub fn clear_completed_rows<P: Presenter + ?Sized>(
    grid: &mut Grid,
    progression: &mut Progression,
    delay: Duration,
    presenter: &mut P,
) -> io::Result<u32> {
    let mut cleared = 0;
    while let Some(&row) = find_completed_rows(grid).first() {
        clear_row(grid, progression, row, delay, presenter)?;
        cleared += 1;
    }
    Ok(cleared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::tests::Recorder;
    use crate::grid::Palette;

    fn grid(rows: usize, cols: usize) -> Grid {
        Grid::new(rows, cols, Palette::default())
    }

    fn fill_row(g: &mut Grid, row: usize) {
        for col in 0..g.cols() {
            g.fill(row, col, 1);
        }
    }

    #[test]
    fn test_empty_grid_has_no_completed_rows() {
        assert!(find_completed_rows(&grid(20, 14)).is_empty());
    }

    #[test]
    fn test_single_full_row_found() {
        let mut g = grid(6, 4);
        fill_row(&mut g, 3);
        g.fill(5, 0, 0);
        g.fill(4, 1, 0);
        g.fill(4, 2, 0);
        assert_eq!(find_completed_rows(&g), vec![3]);
    }

    #[test]
    fn test_active_cells_do_not_complete_a_row() {
        let mut g = grid(6, 3);
        g.fill(5, 0, 0);
        g.fill(5, 1, 0);
        let form = crate::form::Form::new(crate::form::Shape::I, 0, 3, 1);
        // Vertical I covers column 2 on rows 3..=5.
        g.paint_active_projection(&form);
        assert!(find_completed_rows(&g).is_empty());
        g.lock_active_to_filled();
        assert_eq!(find_completed_rows(&g), vec![5]);
    }

    #[test]
    fn test_completed_rows_listed_bottom_first() {
        let mut g = grid(6, 3);
        fill_row(&mut g, 2);
        fill_row(&mut g, 5);
        assert_eq!(find_completed_rows(&g), vec![5, 2]);
    }

    #[test]
    fn test_clear_row_phases_are_presented() {
        let mut g = grid(5, 3);
        fill_row(&mut g, 4);
        g.fill(3, 0, 2);
        let mut p = Progression::new(500);
        let mut rec = Recorder::default();
        clear_row(&mut g, &mut p, 4, Duration::from_millis(50), &mut rec).unwrap();

        assert_eq!(rec.frames.len(), 3);
        assert!(rec.frames[0].row_states(4).iter().all(|s| *s == CellState::Clearing));
        assert!(rec.frames[1].row_states(4).iter().all(|s| *s == CellState::Empty));
        assert_eq!(rec.holds, vec![Duration::from_millis(50); 2]);
        // Row 3's cell fell into row 4.
        assert_eq!(g.get(4, 0).map(|c| c.state), Some(CellState::Filled));
        assert_eq!(g.get(4, 1).map(|c| c.state), Some(CellState::Empty));
        assert_eq!(g.count_state(CellState::Filled), 1);
    }

    #[test]
    fn test_clear_row_conserves_other_cells() {
        let mut g = grid(8, 4);
        fill_row(&mut g, 6);
        g.fill(7, 0, 0);
        g.fill(7, 3, 0);
        g.fill(5, 1, 0);
        g.fill(4, 1, 0);
        g.fill(4, 2, 0);
        let before = g.count_state(CellState::Filled);
        let mut p = Progression::new(500);
        clear_row(&mut g, &mut p, 6, Duration::ZERO, &mut Recorder::default()).unwrap();
        assert_eq!(g.count_state(CellState::Filled), before - 4);
        // Rows below the cleared one are untouched.
        assert_eq!(g.get(7, 0).map(|c| c.state), Some(CellState::Filled));
        assert_eq!(g.get(7, 3).map(|c| c.state), Some(CellState::Filled));
        // Every Filled cell in row 6 came from row 5.
        assert_eq!(g.get(6, 1).map(|c| c.state), Some(CellState::Filled));
        assert_eq!(g.get(5, 1).map(|c| c.state), Some(CellState::Filled));
        assert_eq!(g.get(5, 2).map(|c| c.state), Some(CellState::Filled));
        assert_eq!(g.get(4, 1).map(|c| c.state), Some(CellState::Empty));
    }

    #[test]
    fn test_stacked_full_rows_all_clear() {
        let mut g = grid(6, 3);
        fill_row(&mut g, 4);
        fill_row(&mut g, 5);
        g.fill(3, 1, 0);
        let mut p = Progression::new(500);
        let n = clear_completed_rows(&mut g, &mut p, Duration::ZERO, &mut Recorder::default())
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(g.count_state(CellState::Filled), 1);
        assert_eq!(g.get(5, 1).map(|c| c.state), Some(CellState::Filled));
        assert_eq!(p.score, 2 + 2);
        assert_eq!(p.interval_ms, 480);
        assert_eq!(p.rows_cleared, 2);
    }

    #[test]
    fn test_score_follows_interval_sum() {
        let mut p = Progression::new(500);
        let mut expected = 0;
        for _ in 0..60 {
            expected += 1000 / p.interval_ms;
            p.record_clear();
            assert!(p.interval_ms >= MIN_INTERVAL_MS);
        }
        assert_eq!(p.score, expected);
        assert_eq!(p.interval_ms, MIN_INTERVAL_MS);
        assert_eq!(p.rows_cleared, 60);
    }

    #[test]
    fn test_interval_floors_at_fifty() {
        let mut p = Progression::new(55);
        assert_eq!(p.record_clear(), 18);
        assert_eq!(p.interval_ms, 50);
        assert_eq!(p.record_clear(), 20);
        assert_eq!(p.interval_ms, 50);
    }

    #[test]
    fn test_interval_below_floor_starts_at_floor() {
        let mut p = Progression::new(20);
        assert_eq!(p.interval_ms, MIN_INTERVAL_MS);
        assert_eq!(p.record_clear(), 20);
        assert_eq!(p.interval_ms, MIN_INTERVAL_MS);
        assert_eq!(p.score, 20);
    }
}
