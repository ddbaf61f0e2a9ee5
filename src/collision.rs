//! Placement predicates: floor/stack collision and horizontal bounds.
//!
//! Both are pure and consult only `Filled` cells, so a form testing its own move
//! must have its `Active` projection cleared first.

use crate::form::Mask;
use crate::grid::{CellState, Grid};

/// False if any occupied mask cell at `(row, col)` would sit on or below the
/// floor, or on a `Filled` cell. Rows above the grid are accepted.
pub fn can_place(grid: &Grid, mask: &Mask, row: i32, col: i32) -> bool {
    let floor = grid.rows() as i32;
    mask.occupied().all(|(dr, dc)| {
        let r = row + dr as i32;
        let c = col + dc as i32;
        if r >= floor {
            return false;
        }
        !matches!(grid.get_signed(r, c), Some(cell) if cell.state == CellState::Filled)
    })
}

/// False if any occupied mask cell at column anchor `col` falls outside `0..cols`.
pub fn in_bounds(grid: &Grid, mask: &Mask, col: i32) -> bool {
    let cols = grid.cols() as i32;
    mask.occupied().all(|(_, dc)| {
        let c = col + dc as i32;
        (0..cols).contains(&c)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{MASK_SIZE, Shape};
    use crate::grid::Palette;
    use proptest::prelude::*;

    #[test]
    fn test_empty_grid_accepts_spawn_position() {
        let g = Grid::new(20, 14, Palette::default());
        for shape in Shape::ALL {
            assert!(can_place(&g, &shape.template(), 1, 0));
        }
    }

    #[test]
    fn test_floor_rejects() {
        let g = Grid::new(6, 5, Palette::default());
        let i = Shape::I.template();
        assert!(can_place(&g, &i, 3, 0));
        assert!(!can_place(&g, &i, 4, 0));
    }

    #[test]
    fn test_empty_mask_rows_may_hang_below_floor() {
        let g = Grid::new(6, 5, Palette::default());
        let horizontal = crate::form::rotate_clockwise(&Shape::I.template());
        // Horizontal I lives in mask row 1; anchor row 4 puts it on the last row.
        assert!(can_place(&g, &horizontal, 4, 0));
        assert!(!can_place(&g, &horizontal, 5, 0));
    }

    #[test]
    fn test_filled_cell_rejects() {
        let mut g = Grid::new(6, 5, Palette::default());
        g.fill(4, 2, 0);
        let t = Shape::T.template();
        // T bottom row covers columns 1..=3 at row anchor+2.
        assert!(!can_place(&g, &t, 2, 1));
        assert!(can_place(&g, &t, 1, 1));
    }

    #[test]
    fn test_above_grid_is_tolerated() {
        let g = Grid::new(6, 5, Palette::default());
        assert!(can_place(&g, &Shape::I.template(), -2, 0));
    }

    #[test]
    fn test_in_bounds_edges() {
        let g = Grid::new(6, 5, Palette::default());
        let i = Shape::I.template();
        // Column 1 of the mask is occupied, so anchors -1..=3 keep it on the grid.
        assert!(in_bounds(&g, &i, -1));
        assert!(!in_bounds(&g, &i, -2));
        assert!(in_bounds(&g, &i, 3));
        assert!(!in_bounds(&g, &i, 4));
        let t = Shape::T.template();
        assert!(in_bounds(&g, &t, 0));
        assert!(!in_bounds(&g, &t, -1));
        assert!(in_bounds(&g, &t, 2));
        assert!(!in_bounds(&g, &t, 3));
    }

    const ROWS: usize = 6;
    const COLS: usize = 5;

    fn arb_mask() -> impl Strategy<Value = Mask> {
        proptest::array::uniform3(proptest::array::uniform3(any::<bool>())).prop_map(Mask::new)
    }

    fn arb_filled() -> impl Strategy<Value = Vec<bool>> {
        proptest::collection::vec(proptest::bool::weighted(0.3), ROWS * COLS)
    }

    proptest! {
        #[test]
        fn prop_can_place_matches_definition(
            mask in arb_mask(),
            filled in arb_filled(),
            row in -3i32..8,
            col in -2i32..5,
        ) {
            let mut g = Grid::new(ROWS, COLS, Palette::default());
            for (i, f) in filled.iter().enumerate() {
                if *f {
                    g.fill(i / COLS, i % COLS, 0);
                }
            }
            let mut blocked = false;
            for dr in 0..MASK_SIZE {
                for dc in 0..MASK_SIZE {
                    if !mask.is_occupied(dr, dc) {
                        continue;
                    }
                    let r = row + dr as i32;
                    let c = col + dc as i32;
                    if r >= ROWS as i32 {
                        blocked = true;
                    } else if r >= 0
                        && (0..COLS as i32).contains(&c)
                        && filled[r as usize * COLS + c as usize]
                    {
                        blocked = true;
                    }
                }
            }
            prop_assert_eq!(can_place(&g, &mask, row, col), !blocked);
        }
    }
}
