#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic simulation system that replays a solution and scores it.

use log::{debug, trace};
use sokogen_core::{BoxId, CellCoord, Direction, GoalBoxPair, Grid, MovePath, Occupant, QualityMetrics};
use thiserror::Error;

/// Inputs the simulator cannot replay.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    /// The grid has no keeper.
    #[error("grid has no keeper")]
    MissingKeeper,
    /// A box sits on a cell that no pair accounts for.
    #[error("box at {cell} does not belong to any pair")]
    UntrackedBox {
        /// Cell holding the unknown box.
        cell: CellCoord,
    },
}

/// Final state of a replay together with the metrics it produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replay {
    grid: Grid,
    keeper: CellCoord,
    boxes: Vec<CellCoord>,
    metrics: QualityMetrics,
}

impl Replay {
    /// Grid after the last step.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Keeper location after the last step.
    #[must_use]
    pub const fn keeper(&self) -> CellCoord {
        self.keeper
    }

    /// Final cell of the box with the provided identity.
    #[must_use]
    pub fn box_cell(&self, id: BoxId) -> Option<CellCoord> {
        usize::try_from(id.get())
            .ok()
            .and_then(|index| self.boxes.get(index).copied())
    }

    /// Metrics counted during the replay. Corner goals are left at zero.
    #[must_use]
    pub const fn metrics(&self) -> QualityMetrics {
        self.metrics
    }

    /// Reports whether every box ended on a goal.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.grid
            .iter()
            .all(|(_, tile)| !tile.has_box() || tile.is_goal())
    }
}

/// Replays `path` on a copy of `grid`, tracking each box by its pair index.
///
/// A step into a wall, or into a box that cannot move, leaves the board
/// unchanged but still counts as a move.
pub fn simulate(
    grid: &Grid,
    path: &MovePath,
    pairs: &[GoalBoxPair],
) -> Result<Replay, SimulationError> {
    let mut grid = grid.clone();
    let mut keeper = grid.keeper().ok_or(SimulationError::MissingKeeper)?;
    let mut boxes: Vec<CellCoord> = pairs.iter().map(GoalBoxPair::box_cell).collect();
    if let Some(cell) = grid.boxes().into_iter().find(|cell| !boxes.contains(cell)) {
        return Err(SimulationError::UntrackedBox { cell });
    }

    let mut metrics = QualityMetrics {
        moves: u32::try_from(path.len()).unwrap_or(u32::MAX),
        ..QualityMetrics::default()
    };
    let mut previous_push: Option<Direction> = None;
    let mut previous_box: Option<BoxId> = None;

    for (index, &step) in path.steps().iter().enumerate() {
        let Some(target) = grid.step(keeper, step, 1) else {
            trace!("step {index} leaves the grid, skipped");
            continue;
        };
        let Some(tile) = grid.get(target) else {
            continue;
        };
        if tile.is_wall() {
            trace!("step {index} runs into a wall, skipped");
            continue;
        }

        if tile.has_box() {
            let Some(beyond) = grid
                .step(target, step, 1)
                .filter(|cell| !grid.is_blockade(*cell))
            else {
                trace!("step {index} pushes a blocked box, skipped");
                continue;
            };
            let slot = boxes
                .iter()
                .position(|cell| *cell == target)
                .ok_or(SimulationError::UntrackedBox { cell: target })?;
            let id = BoxId::new(u32::try_from(slot).unwrap_or(u32::MAX));

            move_occupant(&mut grid, target, beyond, Occupant::Box);
            metrics.pushes += 1;
            if previous_push != Some(step) {
                metrics.directional_pushes += 1;
            }
            if pairs
                .get(slot)
                .is_some_and(|pair| is_reverse_push(beyond, pair.goal(), step))
            {
                metrics.reverse_pushes += 1;
            }
            if previous_box.is_some_and(|previous| previous != id) {
                metrics.box_changes += 1;
            }

            boxes[slot] = beyond;
            previous_box = Some(id);
            previous_push = Some(step);
        } else {
            previous_push = None;
        }

        move_occupant(&mut grid, keeper, target, Occupant::Keeper);
        keeper = target;
    }

    debug!("replayed {} steps: {metrics}", path.len());
    Ok(Replay {
        grid,
        keeper,
        boxes,
        metrics,
    })
}

/// Reports whether a box pushed onto `landed` in `direction` moved farther from `goal` along that axis.
#[must_use]
pub fn is_reverse_push(landed: CellCoord, goal: CellCoord, direction: Direction) -> bool {
    match direction {
        Direction::North => landed.row() < goal.row(),
        Direction::South => landed.row() > goal.row(),
        Direction::West => landed.column() < goal.column(),
        Direction::East => landed.column() > goal.column(),
    }
}

fn move_occupant(grid: &mut Grid, from: CellCoord, to: CellCoord, occupant: Occupant) {
    if let Some(tile) = grid.get(from) {
        grid.set(from, tile.with_occupant(Occupant::Empty));
    }
    if let Some(tile) = grid.get(to) {
        grid.set(to, tile.with_occupant(occupant));
    }
}
