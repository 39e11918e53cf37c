#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the sokogen level generator.
//!
//! This crate defines the coordinate and occupancy vocabulary that connects
//! the pure systems. The synthesizer produces a walled [`Grid`], the placement
//! engine stamps goals, boxes and a keeper into it, the solver reads the grid
//! through the text [`encode`] boundary, and the simulator replays a
//! [`MovePath`] over a private copy of the grid to derive [`QualityMetrics`].
//!
//! Every system addresses cells through [`CellCoord`] (row, column) and moves
//! through [`Direction`]. There is no second coordinate convention anywhere in
//! the workspace.

mod codec;
mod reach;

pub use codec::{decode, decode_layout, encode, DecodeError, TileCode};
pub use reach::{neighbors, ReachMap};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Location of a single grid cell expressed as row and column coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell, growing downwards.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell, growing to the right.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column)
    }

    /// Reports whether both cells lie on the same row or the same column.
    #[must_use]
    pub fn is_axis_aligned_with(self, other: CellCoord) -> bool {
        self.row == other.row || self.column == other.column
    }

    /// Returns the cell `steps` cells away in `direction`.
    ///
    /// Yields `None` when the walk would leave the non-negative quadrant. Upper
    /// bounds are the caller's concern since they depend on the grid.
    #[must_use]
    pub fn offset(self, direction: Direction, steps: u32) -> Option<CellCoord> {
        let (row_delta, column_delta) = direction.delta();
        let row = shift(self.row, row_delta, steps)?;
        let column = shift(self.column, column_delta, steps)?;
        Some(CellCoord::new(row, column))
    }

    /// Returns the adjacent cell in `direction`, if it has non-negative coordinates.
    #[must_use]
    pub fn neighbor(self, direction: Direction) -> Option<CellCoord> {
        self.offset(direction, 1)
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

fn shift(value: u32, delta: i8, steps: u32) -> Option<u32> {
    match delta {
        0 => Some(value),
        d if d > 0 => value.checked_add(steps),
        _ => value.checked_sub(steps),
    }
}

/// Cardinal movement directions available to the keeper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Every direction in the canonical exploration order used by all searches.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Returns the direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Row and column deltas applied by a single step in this direction.
    #[must_use]
    pub const fn delta(self) -> (i8, i8) {
        match self {
            Self::North => (-1, 0),
            Self::East => (0, 1),
            Self::South => (1, 0),
            Self::West => (0, -1),
        }
    }

    /// Single-letter label used by the encoded move path (`U`, `R`, `D`, `L`).
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::North => 'U',
            Self::East => 'R',
            Self::South => 'D',
            Self::West => 'L',
        }
    }
}

/// Entity standing on a floor cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupant {
    /// Nothing occupies the cell.
    Empty,
    /// The keeper stands on the cell.
    Keeper,
    /// A box rests on the cell.
    Box,
}

/// Occupancy of a single grid cell.
///
/// Floor cells carry two orthogonal facts: what stands on them and whether
/// they are a goal. Walls carry neither. Conversion to the seven external
/// codes happens only at the serialization boundary, see [`TileCode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// Impassable wall.
    Wall,
    /// Walkable floor, possibly a goal, possibly occupied.
    Floor {
        /// Entity standing on the floor.
        occupant: Occupant,
        /// Whether the floor is a goal square.
        goal: bool,
    },
}

impl Tile {
    /// Plain, unoccupied floor.
    pub const FLOOR: Tile = Tile::Floor {
        occupant: Occupant::Empty,
        goal: false,
    };

    /// Unoccupied goal square.
    pub const GOAL: Tile = Tile::Floor {
        occupant: Occupant::Empty,
        goal: true,
    };

    /// Reports whether the tile is a wall.
    #[must_use]
    pub const fn is_wall(self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// Entity standing on the tile; walls always report [`Occupant::Empty`].
    #[must_use]
    pub const fn occupant(self) -> Occupant {
        match self {
            Tile::Wall => Occupant::Empty,
            Tile::Floor { occupant, .. } => occupant,
        }
    }

    /// Reports whether the tile is a goal square.
    #[must_use]
    pub const fn is_goal(self) -> bool {
        matches!(self, Tile::Floor { goal: true, .. })
    }

    /// Reports whether a box rests on the tile.
    #[must_use]
    pub const fn has_box(self) -> bool {
        matches!(
            self,
            Tile::Floor {
                occupant: Occupant::Box,
                ..
            }
        )
    }

    /// Reports whether the keeper stands on the tile.
    #[must_use]
    pub const fn has_keeper(self) -> bool {
        matches!(
            self,
            Tile::Floor {
                occupant: Occupant::Keeper,
                ..
            }
        )
    }

    /// Reports whether the tile blocks movement: a wall or a box.
    #[must_use]
    pub const fn is_blockade(self) -> bool {
        self.is_wall() || self.has_box()
    }

    /// Reports whether the keeper may walk onto the tile.
    #[must_use]
    pub const fn is_passable(self) -> bool {
        !self.is_blockade()
    }

    /// Returns the same tile with `occupant` standing on it. Walls are returned unchanged.
    #[must_use]
    pub const fn with_occupant(self, occupant: Occupant) -> Self {
        match self {
            Tile::Wall => Tile::Wall,
            Tile::Floor { goal, .. } => Tile::Floor { occupant, goal },
        }
    }

    /// Returns the same tile marked as a goal. Walls are returned unchanged.
    #[must_use]
    pub const fn with_goal(self) -> Self {
        match self {
            Tile::Wall => Tile::Wall,
            Tile::Floor { occupant, .. } => Tile::Floor {
                occupant,
                goal: true,
            },
        }
    }
}

/// Rectangular mapping from [`CellCoord`] to [`Tile`], stored row-major.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    rows: u32,
    columns: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Creates a grid of the requested size where every cell holds `tile`.
    #[must_use]
    pub fn filled(rows: u32, columns: u32, tile: Tile) -> Self {
        let capacity_u64 = u64::from(rows) * u64::from(columns);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            rows,
            columns,
            tiles: vec![tile; capacity],
        }
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Reports whether the cell lies within the grid bounds.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.row() < self.rows && cell.column() < self.columns
    }

    /// Tile stored at `cell`, or `None` when the cell lies outside the grid.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<Tile> {
        self.index(cell)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Overwrites the tile stored at `cell`. Out-of-bounds writes are ignored.
    pub fn set(&mut self, cell: CellCoord, tile: Tile) {
        debug_assert!(self.contains(cell), "write outside grid at {cell}");
        if let Some(slot) = self.index(cell).and_then(|index| self.tiles.get_mut(index)) {
            *slot = tile;
        }
    }

    /// Reports whether `cell` blocks movement. Cells outside the grid always do.
    #[must_use]
    pub fn is_blockade(&self, cell: CellCoord) -> bool {
        self.get(cell).map_or(true, Tile::is_blockade)
    }

    /// Returns the in-bounds cell `steps` cells away from `cell` in `direction`.
    #[must_use]
    pub fn step(&self, cell: CellCoord, direction: Direction, steps: u32) -> Option<CellCoord> {
        cell.offset(direction, steps)
            .filter(|candidate| self.contains(*candidate))
    }

    /// Iterator over every cell coordinate in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        (0..self.rows).flat_map(move |row| (0..columns).map(move |column| CellCoord::new(row, column)))
    }

    /// Iterator over every cell paired with its tile in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, Tile)> + '_ {
        self.cells().zip(self.tiles.iter().copied())
    }

    /// Cells whose tile satisfies `predicate`, in row-major order.
    #[must_use]
    pub fn cells_where<F>(&self, mut predicate: F) -> Vec<CellCoord>
    where
        F: FnMut(Tile) -> bool,
    {
        self.iter()
            .filter(|(_, tile)| predicate(*tile))
            .map(|(cell, _)| cell)
            .collect()
    }

    /// Location of the keeper, if one has been placed.
    #[must_use]
    pub fn keeper(&self) -> Option<CellCoord> {
        self.iter()
            .find(|(_, tile)| tile.has_keeper())
            .map(|(cell, _)| cell)
    }

    /// Locations of every box in row-major order.
    #[must_use]
    pub fn boxes(&self) -> Vec<CellCoord> {
        self.cells_where(Tile::has_box)
    }

    /// Locations of every goal in row-major order.
    #[must_use]
    pub fn goals(&self) -> Vec<CellCoord> {
        self.cells_where(Tile::is_goal)
    }

    /// Returns a copy of the grid surrounded by a one-cell wall border.
    #[must_use]
    pub fn bordered(&self) -> Grid {
        let mut bordered = Grid::filled(self.rows + 2, self.columns + 2, Tile::Wall);
        for (cell, tile) in self.iter() {
            bordered.set(CellCoord::new(cell.row() + 1, cell.column() + 1), tile);
        }
        bordered
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }
}

/// Identity of a box, equal to the index of the pair that placed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BoxId(u32);

impl BoxId {
    /// Creates a new box identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Immutable assignment of one goal cell to the box placed for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoalBoxPair {
    goal: CellCoord,
    box_cell: CellCoord,
}

impl GoalBoxPair {
    /// Creates a new pair.
    #[must_use]
    pub const fn new(goal: CellCoord, box_cell: CellCoord) -> Self {
        Self { goal, box_cell }
    }

    /// Goal the box is destined for.
    #[must_use]
    pub const fn goal(&self) -> CellCoord {
        self.goal
    }

    /// Cell where the box starts.
    #[must_use]
    pub const fn box_cell(&self) -> CellCoord {
        self.box_cell
    }
}

/// Structural difficulty signature derived from replaying a solution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Total keeper steps in the solution, pushes included.
    pub moves: u32,
    /// Steps that displaced a box.
    pub pushes: u32,
    /// Maximal runs of consecutive pushes in one direction.
    pub directional_pushes: u32,
    /// Pushes that moved a box farther from its goal along the pushed axis.
    pub reverse_pushes: u32,
    /// Pushes applied to a different box than the previous push.
    pub box_changes: u32,
    /// Goals with at least one blockaded corner.
    pub corner_goals: u32,
}

impl fmt::Display for QualityMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MOVES: {} | PUSHES: {} | DIR PUSHES: {} | REV PUSHES: {} | BOX CHANGES: {} | CORNER GOALS: {}",
            self.moves,
            self.pushes,
            self.directional_pushes,
            self.reverse_pushes,
            self.box_changes,
            self.corner_goals
        )
    }
}

/// Forward-play keeper move sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovePath {
    steps: Vec<Direction>,
}

impl MovePath {
    /// Wraps the provided forward-play steps.
    #[must_use]
    pub fn new(steps: Vec<Direction>) -> Self {
        Self { steps }
    }

    /// Steps in play order.
    #[must_use]
    pub fn steps(&self) -> &[Direction] {
        &self.steps
    }

    /// Number of steps in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Reports whether the path contains no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run-length encoding of the path, e.g. `"2R 1U 3L "`.
    ///
    /// Each run renders as its length followed by the direction letter and a
    /// trailing space.
    #[must_use]
    pub fn run_length_encoded(&self) -> String {
        let mut encoded = String::new();
        let mut runs = self.steps.iter().peekable();
        let mut count = 0_usize;
        while let Some(step) = runs.next() {
            count += 1;
            if runs.peek() == Some(&step) {
                continue;
            }
            encoded.push_str(&count.to_string());
            encoded.push(step.letter());
            encoded.push(' ');
            count = 0;
        }
        encoded
    }
}

impl fmt::Display for MovePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{}", step.letter())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, Direction, GoalBoxPair, Grid, MovePath, Occupant, QualityMetrics, Tile};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = CellCoord::new(1, 1);
        let destination = CellCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn offsets_refuse_negative_coordinates() {
        let corner = CellCoord::new(0, 1);
        assert_eq!(corner.neighbor(Direction::North), None);
        assert_eq!(corner.offset(Direction::West, 2), None);
        assert_eq!(corner.offset(Direction::South, 2), Some(CellCoord::new(2, 1)));
        assert_eq!(corner.neighbor(Direction::East), Some(CellCoord::new(0, 2)));
    }

    #[test]
    fn direction_symmetry_holds() {
        let origin = CellCoord::new(5, 5);
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            assert_ne!(direction.opposite(), direction);
            let away = origin.neighbor(direction).expect("interior cell");
            assert_eq!(away.neighbor(direction.opposite()), Some(origin));
            let (row, column) = direction.delta();
            let (back_row, back_column) = direction.opposite().delta();
            assert_eq!((row + back_row, column + back_column), (0, 0));
        }
    }

    #[test]
    fn removing_box_from_goal_leaves_goal() {
        let box_on_goal = Tile::GOAL.with_occupant(Occupant::Box);
        assert!(box_on_goal.has_box());
        assert!(box_on_goal.is_goal());
        assert_eq!(box_on_goal.with_occupant(Occupant::Empty), Tile::GOAL);
        assert_eq!(
            Tile::FLOOR.with_occupant(Occupant::Box).with_occupant(Occupant::Empty),
            Tile::FLOOR
        );
    }

    #[test]
    fn walls_ignore_occupant_and_goal_updates() {
        assert_eq!(Tile::Wall.with_occupant(Occupant::Keeper), Tile::Wall);
        assert_eq!(Tile::Wall.with_goal(), Tile::Wall);
        assert!(Tile::Wall.is_blockade());
        assert!(!Tile::Wall.is_passable());
    }

    #[test]
    fn keeper_tiles_are_passable_and_boxes_are_not() {
        assert!(Tile::FLOOR.with_occupant(Occupant::Keeper).is_passable());
        assert!(Tile::GOAL.with_occupant(Occupant::Keeper).is_passable());
        assert!(Tile::GOAL.with_occupant(Occupant::Box).is_blockade());
        assert!(Tile::GOAL.is_passable());
    }

    #[test]
    fn bordered_grid_wraps_walls_around_contents() {
        let grid = Grid::filled(2, 3, Tile::FLOOR);
        let bordered = grid.bordered();
        assert_eq!(bordered.rows(), 4);
        assert_eq!(bordered.columns(), 5);
        for (cell, tile) in bordered.iter() {
            let edge = cell.row() == 0
                || cell.column() == 0
                || cell.row() == bordered.rows() - 1
                || cell.column() == bordered.columns() - 1;
            assert_eq!(tile.is_wall(), edge, "unexpected tile at {cell}");
        }
    }

    #[test]
    fn out_of_bounds_cells_are_blockades() {
        let grid = Grid::filled(2, 2, Tile::FLOOR);
        assert!(grid.is_blockade(CellCoord::new(2, 0)));
        assert!(grid.is_blockade(CellCoord::new(0, 2)));
        assert!(!grid.is_blockade(CellCoord::new(1, 1)));
        assert_eq!(grid.step(CellCoord::new(1, 1), Direction::East, 1), None);
    }

    #[test]
    fn run_length_encoding_groups_repeated_steps() {
        let path = MovePath::new(vec![
            Direction::East,
            Direction::East,
            Direction::North,
            Direction::West,
            Direction::West,
            Direction::West,
        ]);
        assert_eq!(path.run_length_encoded(), "2R 1U 3L ");
        assert_eq!(path.to_string(), "RRULLL");
        assert_eq!(MovePath::default().run_length_encoded(), "");
    }

    #[test]
    fn metrics_render_stats_line() {
        let metrics = QualityMetrics {
            moves: 40,
            pushes: 12,
            directional_pushes: 7,
            reverse_pushes: 1,
            box_changes: 3,
            corner_goals: 2,
        };
        assert_eq!(
            metrics.to_string(),
            "MOVES: 40 | PUSHES: 12 | DIR PUSHES: 7 | REV PUSHES: 1 | BOX CHANGES: 3 | CORNER GOALS: 2"
        );
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn goal_box_pair_round_trips_through_bincode() {
        assert_round_trip(&GoalBoxPair::new(CellCoord::new(2, 3), CellCoord::new(5, 1)));
    }

    #[test]
    fn metrics_round_trip_through_bincode() {
        assert_round_trip(&QualityMetrics {
            moves: 9,
            pushes: 4,
            directional_pushes: 2,
            reverse_pushes: 0,
            box_changes: 1,
            corner_goals: 1,
        });
    }

    #[test]
    fn grid_round_trips_through_bincode() {
        let mut grid = Grid::filled(3, 3, Tile::FLOOR).bordered();
        grid.set(CellCoord::new(1, 1), Tile::GOAL.with_occupant(Occupant::Box));
        grid.set(CellCoord::new(2, 2), Tile::FLOOR.with_occupant(Occupant::Keeper));
        assert_round_trip(&grid);
    }
}
