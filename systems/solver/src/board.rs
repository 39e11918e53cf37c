//! Immutable layout views the search runs over.

use sokogen_core::{CellCoord, Direction, Grid};

/// Orders box cells column first, then row, with a stable sort.
///
/// Two configurations holding the same boxes in any order canonicalize to the
/// same list, which makes the list usable as a history key.
pub fn canonicalize(boxes: &mut [CellCoord]) {
    boxes.sort_by_key(|cell| (cell.column(), cell.row()));
}

/// Walls, goals and the starting box configuration of one view of a grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Board {
    rows: u32,
    columns: u32,
    walls: Vec<bool>,
    goal_mask: Vec<bool>,
    goals: Vec<CellCoord>,
    boxes: Vec<CellCoord>,
}

impl Board {
    /// View of the grid as written: boxes on boxes, goals on goals.
    pub(crate) fn literal(grid: &Grid) -> Self {
        Self::with_roles(grid, grid.boxes(), grid.goals())
    }

    /// View with boxes and goals swapped, used by the pull search.
    pub(crate) fn inverted(grid: &Grid) -> Self {
        Self::with_roles(grid, grid.goals(), grid.boxes())
    }

    fn with_roles(grid: &Grid, mut boxes: Vec<CellCoord>, mut goals: Vec<CellCoord>) -> Self {
        let walls: Vec<bool> = grid.iter().map(|(_, tile)| tile.is_wall()).collect();
        let mut goal_mask = vec![false; walls.len()];
        let width = usize::try_from(grid.columns()).unwrap_or(0);
        for goal in &goals {
            if let Some(slot) = flat_index(width, *goal).and_then(|index| goal_mask.get_mut(index)) {
                *slot = true;
            }
        }
        canonicalize(&mut boxes);
        canonicalize(&mut goals);

        Self {
            rows: grid.rows(),
            columns: grid.columns(),
            walls,
            goal_mask,
            goals,
            boxes,
        }
    }

    pub(crate) const fn rows(&self) -> u32 {
        self.rows
    }

    pub(crate) const fn columns(&self) -> u32 {
        self.columns
    }

    /// Goal cells in canonical order.
    pub(crate) fn goals(&self) -> &[CellCoord] {
        &self.goals
    }

    /// Starting box cells in canonical order.
    pub(crate) fn boxes(&self) -> &[CellCoord] {
        &self.boxes
    }

    /// Cells outside the board count as walls.
    pub(crate) fn is_wall(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.walls.get(index).copied())
            .unwrap_or(true)
    }

    pub(crate) fn is_goal(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.goal_mask.get(index).copied())
            .unwrap_or(false)
    }

    /// Reports whether the keeper may stand on `cell` under the given box configuration.
    pub(crate) fn is_free(&self, cell: CellCoord, boxes: &[CellCoord]) -> bool {
        !self.is_wall(cell) && !boxes.contains(&cell)
    }

    /// In-bounds cell `steps` cells away in `direction`.
    pub(crate) fn step(&self, cell: CellCoord, direction: Direction, steps: u32) -> Option<CellCoord> {
        cell.offset(direction, steps)
            .filter(|next| next.row() < self.rows && next.column() < self.columns)
    }

    /// Reports whether every box in the configuration rests on a goal.
    pub(crate) fn is_solved(&self, boxes: &[CellCoord]) -> bool {
        boxes.iter().all(|cell| self.is_goal(*cell))
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.row() >= self.rows || cell.column() >= self.columns {
            return None;
        }
        flat_index(usize::try_from(self.columns).ok()?, cell)
    }
}

fn flat_index(width: usize, cell: CellCoord) -> Option<usize> {
    let row = usize::try_from(cell.row()).ok()?;
    let column = usize::try_from(cell.column()).ok()?;
    row.checked_mul(width)?.checked_add(column)
}
