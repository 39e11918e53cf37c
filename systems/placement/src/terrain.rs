//! Local terrain queries used while choosing goal and box cells.

use sokogen_core::{CellCoord, Direction, Grid};

/// Corner score reported for a cell that is itself a blockade.
pub const ENCLOSED: u32 = 4;

const CORNERS: [(Direction, Direction); 4] = [
    (Direction::North, Direction::West),
    (Direction::North, Direction::East),
    (Direction::South, Direction::West),
    (Direction::South, Direction::East),
];

/// Reports whether a possibly off-grid cell blocks movement.
///
/// `None` stands for a coordinate that fell off the top or left edge and is
/// always a blockade, as is any cell outside the grid, any wall and any box.
#[must_use]
pub fn is_blockade(grid: &Grid, cell: Option<CellCoord>) -> bool {
    cell.map_or(true, |cell| grid.is_blockade(cell))
}

/// Counts the diagonal corners of `cell` whose two orthogonal neighbours are both blockades.
///
/// A cell that is itself a blockade reports [`ENCLOSED`].
#[must_use]
pub fn corner_score(grid: &Grid, cell: Option<CellCoord>) -> u32 {
    let Some(cell) = cell.filter(|cell| !grid.is_blockade(*cell)) else {
        return ENCLOSED;
    };

    let enclosed = CORNERS
        .iter()
        .filter(|(first, second)| {
            is_blockade(grid, cell.neighbor(*first)) && is_blockade(grid, cell.neighbor(*second))
        })
        .count();
    u32::try_from(enclosed).unwrap_or(ENCLOSED)
}

/// Reports whether a keeper and a box fit in a line next to `cell` in some direction.
#[must_use]
pub fn is_reachable_goal(grid: &Grid, cell: CellCoord) -> bool {
    Direction::ALL.into_iter().any(|direction| {
        !is_blockade(grid, cell.offset(direction, 1)) && !is_blockade(grid, cell.offset(direction, 2))
    })
}

/// Reports whether some blockade lies strictly between two cells.
///
/// Both end points are excluded. The scan covers the bounding rectangle of the
/// two cells, which is the straight line between them when they share a row
/// or column.
#[must_use]
pub fn contains_blockade_between(grid: &Grid, a: CellCoord, b: CellCoord) -> bool {
    let rows = a.row().min(b.row())..=a.row().max(b.row());
    rows.flat_map(|row| {
        (a.column().min(b.column())..=a.column().max(b.column()))
            .map(move |column| CellCoord::new(row, column))
    })
    .filter(|cell| *cell != a && *cell != b)
    .any(|cell| grid.is_blockade(cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sokogen_core::decode;

    #[test]
    fn blockaded_cell_is_fully_enclosed() {
        let grid = decode("####\n#$ #\n####\n").expect("decodes");
        assert_eq!(corner_score(&grid, Some(CellCoord::new(0, 0))), ENCLOSED);
        assert_eq!(corner_score(&grid, Some(CellCoord::new(1, 1))), ENCLOSED);
        assert_eq!(corner_score(&grid, None), ENCLOSED);
    }

    #[test]
    fn corner_score_counts_blocked_corner_pairs() {
        let grid = decode("#####\n#   #\n#   #\n#   #\n#####\n").expect("decodes");
        assert_eq!(corner_score(&grid, Some(CellCoord::new(1, 1))), 1);
        assert_eq!(corner_score(&grid, Some(CellCoord::new(1, 2))), 0);
        assert_eq!(corner_score(&grid, Some(CellCoord::new(2, 2))), 0);

        let corridor = decode("#####\n#   #\n#####\n").expect("decodes");
        assert_eq!(corner_score(&corridor, Some(CellCoord::new(1, 2))), 0);
        assert_eq!(corner_score(&corridor, Some(CellCoord::new(1, 1))), 2);

        let pocket = decode("###\n# #\n###\n").expect("decodes");
        assert_eq!(corner_score(&pocket, Some(CellCoord::new(1, 1))), 4);
    }

    #[test]
    fn reachable_goal_needs_two_free_cells_in_line() {
        let grid = decode("#####\n#   #\n#####\n").expect("decodes");
        assert!(is_reachable_goal(&grid, CellCoord::new(1, 1)));
        assert!(!is_reachable_goal(&grid, CellCoord::new(1, 2)));

        let blocked = decode("#####\n# $ #\n#####\n").expect("decodes");
        assert!(!is_reachable_goal(&blocked, CellCoord::new(1, 1)));
    }

    #[test]
    fn blockade_scan_excludes_end_points() {
        let grid = decode("#######\n#$ # $#\n#######\n").expect("decodes");
        let left = CellCoord::new(1, 1);
        let right = CellCoord::new(1, 5);
        assert!(contains_blockade_between(&grid, left, right));
        assert!(!contains_blockade_between(&grid, left, CellCoord::new(1, 2)));
    }
}
