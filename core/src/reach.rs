//! Flood-fill reachability shared by synthesis, placement and the solver.

use std::collections::VecDeque;

use crate::{CellCoord, Direction};

/// Dense reachability bitmap produced by breadth-first flood fills.
///
/// The map mirrors the grid dimensions and records every cell reached from
/// the seeds handed to [`ReachMap::flood`] or [`ReachMap::extend`]. Repeated
/// fills accumulate into the same bitmap, which lets callers remember several
/// disjoint regions under one key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReachMap {
    rows: u32,
    columns: u32,
    reached: Vec<bool>,
    count: usize,
}

impl ReachMap {
    /// Creates an empty map sized for a `rows` by `columns` grid.
    #[must_use]
    pub fn new(rows: u32, columns: u32) -> Self {
        let rows_usize = usize::try_from(rows).unwrap_or(0);
        let columns_usize = usize::try_from(columns).unwrap_or(0);
        let cell_count = rows_usize.checked_mul(columns_usize).unwrap_or(0);
        Self {
            rows,
            columns,
            reached: vec![false; cell_count],
            count: 0,
        }
    }

    /// Flood fills from `start` over every cell accepted by `is_open`.
    ///
    /// The start cell is included only when it is itself open.
    #[must_use]
    pub fn flood<F>(rows: u32, columns: u32, start: CellCoord, is_open: F) -> Self
    where
        F: FnMut(CellCoord) -> bool,
    {
        let mut map = Self::new(rows, columns);
        let _ = map.extend(start, is_open);
        map
    }

    /// Adds the region reachable from `start` to the bitmap.
    ///
    /// Returns the number of newly reached cells. Cells already present are
    /// not expanded again, so extending from inside a known region is a no-op.
    pub fn extend<F>(&mut self, start: CellCoord, mut is_open: F) -> usize
    where
        F: FnMut(CellCoord) -> bool,
    {
        let width = usize::try_from(self.columns).unwrap_or(0);
        let Some(start_index) = self.index(width, start) else {
            return 0;
        };
        if self.reached[start_index] || !is_open(start) {
            return 0;
        }

        let before = self.count;
        self.reached[start_index] = true;
        self.count += 1;

        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(cell) = queue.pop_front() {
            for neighbor in neighbors(cell, self.rows, self.columns) {
                let Some(neighbor_index) = self.index(width, neighbor) else {
                    continue;
                };

                if self.reached[neighbor_index] || !is_open(neighbor) {
                    continue;
                }

                self.reached[neighbor_index] = true;
                self.count += 1;
                queue.push_back(neighbor);
            }
        }

        self.count - before
    }

    /// Reports whether `cell` has been reached by any fill.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        let width = usize::try_from(self.columns).unwrap_or(0);
        self.index(width, cell)
            .and_then(|index| self.reached.get(index).copied())
            .unwrap_or(false)
    }

    /// Number of reached cells.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Reached cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let columns = self.columns;
        (0..self.rows)
            .flat_map(move |row| (0..columns).map(move |column| CellCoord::new(row, column)))
            .zip(self.reached.iter().copied())
            .filter_map(|(cell, reached)| reached.then_some(cell))
    }

    fn index(&self, width: usize, cell: CellCoord) -> Option<usize> {
        if cell.row() >= self.rows || cell.column() >= self.columns {
            return None;
        }
        let column = usize::try_from(cell.column()).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

/// In-bounds orthogonal neighbours of `cell`, in [`Direction::ALL`] order.
pub fn neighbors(cell: CellCoord, rows: u32, columns: u32) -> impl Iterator<Item = CellCoord> {
    let mut candidates = [None; 4];
    let mut count = 0;

    for direction in Direction::ALL {
        let Some(candidate) = cell.neighbor(direction) else {
            continue;
        };
        if candidate.row() < rows && candidate.column() < columns {
            candidates[count] = Some(candidate);
            count += 1;
        }
    }

    candidates.into_iter().take(count).flatten()
}
