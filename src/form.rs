//! Form catalog: 3x3 shape masks and the mirror/transpose rotation geometry.

/// Side length of every form mask.
pub const MASK_SIZE: usize = 3;

/// Number of palette entries a form can be coloured with.
pub const FORM_COLORS: u8 = 3;

/// 3x3 occupancy mask, `cells[row][col]`, row 0 at the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Mask {
    cells: [[bool; MASK_SIZE]; MASK_SIZE],
}

impl Mask {
    pub const fn new(cells: [[bool; MASK_SIZE]; MASK_SIZE]) -> Self {
        Self { cells }
    }

    #[cfg(test)]
    pub fn is_occupied(&self, row: usize, col: usize) -> bool {
        row < MASK_SIZE && col < MASK_SIZE && self.cells[row][col]
    }

    /// Mask-local `(row, col)` of every occupied cell, top to bottom.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..MASK_SIZE).flat_map(move |row| {
            (0..MASK_SIZE).filter_map(move |col| self.cells[row][col].then_some((row, col)))
        })
    }

    #[cfg(test)]
    pub fn count(&self) -> usize {
        self.occupied().count()
    }

    pub fn rows(&self) -> &[[bool; MASK_SIZE]; MASK_SIZE] {
        &self.cells
    }
}

const X: bool = true;
const O: bool = false;

/// The five canonical shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    T,
    S,
    Z,
    O,
    I,
}

impl Shape {
    pub const ALL: [Self; 5] = [Self::T, Self::S, Self::Z, Self::O, Self::I];

    /// Spawn orientation of the shape.
    pub const fn template(self) -> Mask {
        match self {
            Self::T => Mask::new([[O, O, O], [O, X, O], [X, X, X]]),
            Self::S => Mask::new([[X, O, O], [X, X, O], [O, X, O]]),
            Self::Z => Mask::new([[O, X, O], [X, X, O], [X, O, O]]),
            Self::O => Mask::new([[O, O, O], [X, X, O], [X, X, O]]),
            Self::I => Mask::new([[O, X, O], [O, X, O], [O, X, O]]),
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }
}

/// Reverses the row order of the mask.
pub fn mirror_vertical(mask: &Mask) -> Mask {
    let src = mask.rows();
    let mut out = [[false; MASK_SIZE]; MASK_SIZE];
    for (row, dst) in out.iter_mut().enumerate() {
        *dst = src[MASK_SIZE - 1 - row];
    }
    Mask::new(out)
}

/// Quarter turn clockwise inside the fixed 3x3 box: mirror, then transpose.
pub fn rotate_clockwise(mask: &Mask) -> Mask {
    let mirrored = mirror_vertical(mask);
    let src = mirrored.rows();
    let mut out = [[false; MASK_SIZE]; MASK_SIZE];
    for (row, dst) in out.iter_mut().enumerate() {
        for (col, cell) in dst.iter_mut().enumerate() {
            *cell = src[col][row];
        }
    }
    Mask::new(out)
}

/// Quarter turn counter-clockwise: mirror, then transpose across the anti-diagonal.
pub fn rotate_counter_clockwise(mask: &Mask) -> Mask {
    let mirrored = mirror_vertical(mask);
    let src = mirrored.rows();
    let last = MASK_SIZE - 1;
    let mut out = [[false; MASK_SIZE]; MASK_SIZE];
    for (row, dst) in out.iter_mut().enumerate() {
        for (col, cell) in dst.iter_mut().enumerate() {
            *cell = src[last - col][last - row];
        }
    }
    Mask::new(out)
}

/// Rotation direction requested by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    pub fn apply(self, mask: &Mask) -> Mask {
        match self {
            Self::Clockwise => rotate_clockwise(mask),
            Self::CounterClockwise => rotate_counter_clockwise(mask),
        }
    }
}

/// The falling form: current mask, palette colour and the grid position of the
/// mask's top-left cell. `row`/`col` are signed because an anchor may sit left of
/// column 0 while the occupied cells are still on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Form {
    pub shape: Shape,
    pub mask: Mask,
    pub color_index: u8,
    pub row: i32,
    pub col: i32,
}

impl Form {
    pub fn new(shape: Shape, color_index: u8, row: i32, col: i32) -> Self {
        Self {
            shape,
            mask: shape.template(),
            color_index: color_index % FORM_COLORS,
            row,
            col,
        }
    }

    /// Grid coordinates of every occupied mask cell at the current anchor.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.mask
            .occupied()
            .map(|(r, c)| (self.row + r as i32, self.col + c as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_mask() -> impl Strategy<Value = Mask> {
        proptest::array::uniform3(proptest::array::uniform3(any::<bool>())).prop_map(Mask::new)
    }

    #[test]
    fn test_templates_have_four_or_three_cells() {
        assert_eq!(Shape::T.template().count(), 4);
        assert_eq!(Shape::S.template().count(), 4);
        assert_eq!(Shape::Z.template().count(), 4);
        assert_eq!(Shape::O.template().count(), 4);
        assert_eq!(Shape::I.template().count(), 3);
    }

    #[test]
    fn test_mirror_reverses_rows() {
        let m = mirror_vertical(&Shape::T.template());
        assert_eq!(m, Mask::new([[X, X, X], [O, X, O], [O, O, O]]));
    }

    #[test]
    fn test_rotate_vertical_i_clockwise_is_horizontal() {
        let m = rotate_clockwise(&Shape::I.template());
        assert_eq!(m, Mask::new([[O, O, O], [X, X, X], [O, O, O]]));
    }

    #[test]
    fn test_rotate_t_clockwise() {
        // Flat side at the bottom turns to the left edge.
        let m = rotate_clockwise(&Shape::T.template());
        assert_eq!(m, Mask::new([[X, O, O], [X, X, O], [X, O, O]]));
    }

    #[test]
    fn test_rotate_t_counter_clockwise() {
        let m = rotate_counter_clockwise(&Shape::T.template());
        assert_eq!(m, Mask::new([[O, O, X], [O, X, X], [O, O, X]]));
    }

    #[test]
    fn test_o_variant_is_not_rotation_invariant() {
        // The square sits in the lower-left corner, so the fixed box moves it.
        let m = rotate_clockwise(&Shape::O.template());
        assert_ne!(m, Shape::O.template());
        assert_eq!(m.count(), 4);
    }

    #[test]
    fn test_form_cells_follow_anchor() {
        let form = Form::new(Shape::I, 4, 2, -1);
        assert_eq!(form.color_index, 1);
        let cells: Vec<_> = form.cells().collect();
        assert_eq!(cells, vec![(2, 0), (3, 0), (4, 0)]);
    }

    proptest! {
        #[test]
        fn prop_four_clockwise_turns_are_identity(mask in arb_mask()) {
            let mut m = mask;
            for _ in 0..4 {
                m = rotate_clockwise(&m);
            }
            prop_assert_eq!(m, mask);
        }

        #[test]
        fn prop_four_counter_clockwise_turns_are_identity(mask in arb_mask()) {
            let mut m = mask;
            for _ in 0..4 {
                m = rotate_counter_clockwise(&m);
            }
            prop_assert_eq!(m, mask);
        }

        #[test]
        fn prop_mirror_is_an_involution(mask in arb_mask()) {
            prop_assert_eq!(mirror_vertical(&mirror_vertical(&mask)), mask);
        }

        #[test]
        fn prop_clockwise_undoes_counter_clockwise(mask in arb_mask()) {
            prop_assert_eq!(rotate_clockwise(&rotate_counter_clockwise(&mask)), mask);
        }

        #[test]
        fn prop_rotation_preserves_cell_count(mask in arb_mask()) {
            prop_assert_eq!(rotate_clockwise(&mask).count(), mask.count());
            prop_assert_eq!(rotate_counter_clockwise(&mask).count(), mask.count());
        }
    }
}
