//! Form lifecycle: spawning, shifting and rotating the active form.
//!
//! Every mutation follows the same pattern: clear the active projection, test the
//! candidate, commit or keep the old state, repaint.

use crate::collision::{can_place, in_bounds};
use crate::form::{FORM_COLORS, Form, MASK_SIZE, Rotation, Shape};
use crate::grid::{CellState, Grid};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

/// Row every new form is anchored at.
pub const SPAWN_ROW: i32 = 1;

/// The new form would overlap the stack: the game is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("spawn blocked: {shape:?} at row {row}, column {col} overlaps the stack")]
pub struct SpawnBlocked {
    pub shape: Shape,
    pub row: i32,
    pub col: i32,
}

/// Spawns a random shape and colour at a random column that keeps the whole
/// 3x3 box on the grid.
pub fn spawn<R: Rng + ?Sized>(grid: &Grid, rng: &mut R) -> Result<Form, SpawnBlocked> {
    let shape = Shape::from_index(rng.gen_range(0..Shape::ALL.len()));
    let color_index = rng.gen_range(0..FORM_COLORS);
    let max_col = grid.cols().saturating_sub(MASK_SIZE);
    let col = rng.gen_range(0..=max_col) as i32;
    spawn_at(grid, shape, color_index, col)
}

/// Deterministic half of [`spawn`]. The whole 3x3 box at the spawn anchor must be
/// free of `Filled` cells, not just the occupied mask cells.
pub fn spawn_at(
    grid: &Grid,
    shape: Shape,
    color_index: u8,
    col: i32,
) -> Result<Form, SpawnBlocked> {
    let form = Form::new(shape, color_index, SPAWN_ROW, col);
    let blocked = (0..MASK_SIZE as i32).any(|dr| {
        (0..MASK_SIZE as i32).any(|dc| {
            matches!(
                grid.get_signed(form.row + dr, form.col + dc),
                Some(cell) if cell.state == CellState::Filled
            )
        })
    });
    if blocked {
        info!(?shape, row = form.row, col, "spawn blocked");
        return Err(SpawnBlocked {
            shape,
            row: form.row,
            col,
        });
    }
    debug!(?shape, color_index = form.color_index, col, "spawned form");
    Ok(form)
}

/// Shifts the form by `(d_row, d_col)`. Returns false and leaves the anchor
/// untouched when the move leaves the field or hits the stack.
pub fn attempt_move(grid: &mut Grid, form: &mut Form, d_row: i32, d_col: i32) -> bool {
    grid.clear_active_projection();
    let row = form.row + d_row;
    let col = form.col + d_col;
    let ok = in_bounds(grid, &form.mask, col) && can_place(grid, &form.mask, row, col);
    if ok {
        form.row = row;
        form.col = col;
    }
    grid.paint_active_projection(form);
    ok
}

/// Rotates the mask in place around the fixed anchor. There is no wall kick:
/// a rotation that collides is rejected as a whole.
pub fn attempt_rotate(grid: &mut Grid, form: &mut Form, rotation: Rotation) -> bool {
    grid.clear_active_projection();
    let mask = rotation.apply(&form.mask);
    let ok = in_bounds(grid, &mask, form.col) && can_place(grid, &mask, form.row, form.col);
    if ok {
        form.mask = mask;
    }
    grid.paint_active_projection(form);
    ok
}
