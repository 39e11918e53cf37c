#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure solvability system proving that a placed grid can be solved.
//!
//! The search runs backwards. Boxes start on the goals of an inverted view of
//! the grid and the keeper pulls them toward the starting box cells. A pull
//! never needs to look past its immediate neighbours, which keeps successor
//! generation simple. The pull history is translated into forward play once,
//! by [`forward_moves`], before it leaves this crate.

mod board;
mod search;

pub use board::canonicalize;
pub use search::{VisitedNodes, Walk};

use std::collections::HashSet;

use log::{debug, trace};
use sokogen_core::{decode, CellCoord, DecodeError, Direction, Grid, MovePath, ReachMap};
use thiserror::Error;

use crate::{
    board::Board,
    search::{find_box_path, ConfigurationHistory},
};

/// Tunable limits of the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolverConfig {
    /// Estimated bytes the configuration history may hold before its entries
    /// are folded into compact fingerprints.
    pub history_budget: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            history_budget: 1 << 30,
        }
    }
}

/// Boards the solver refuses to search.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolverError {
    /// The board text could not be parsed.
    #[error("board text is unreadable")]
    Layout(#[from] DecodeError),
    /// The board has no keeper.
    #[error("board has no keeper")]
    MissingKeeper,
    /// The board holds a different number of boxes and goals.
    #[error("board has {boxes} boxes but {goals} goals")]
    BoxGoalMismatch {
        /// Number of boxes on the board.
        boxes: usize,
        /// Number of goals on the board.
        goals: usize,
    },
}

/// Translates a chronological pull history into forward play.
///
/// Time runs the other way in forward play, so the list is reversed and every
/// step is replaced by its opposite.
#[must_use]
pub fn forward_moves(pull_moves: &[Direction]) -> Vec<Direction> {
    pull_moves
        .iter()
        .rev()
        .map(|direction| direction.opposite())
        .collect()
}

/// Best-first pull solver.
#[derive(Clone, Copy, Debug, Default)]
pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    /// Creates a solver with the provided limits.
    #[must_use]
    pub const fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Parses board text and solves it.
    pub fn solve_text(&self, text: &str) -> Result<Option<MovePath>, SolverError> {
        let grid = decode(text)?;
        self.solve(&grid)
    }

    /// Searches for a forward move sequence that puts every box on a goal.
    ///
    /// Returns `Ok(None)` when no keeper start candidate leads to a solution.
    /// A board whose boxes already rest on goals yields an empty path.
    pub fn solve(&self, grid: &Grid) -> Result<Option<MovePath>, SolverError> {
        let player = grid.keeper().ok_or(SolverError::MissingKeeper)?;
        let literal = Board::literal(grid);
        if literal.boxes().len() != literal.goals().len() {
            return Err(SolverError::BoxGoalMismatch {
                boxes: literal.boxes().len(),
                goals: literal.goals().len(),
            });
        }
        if literal.is_solved(literal.boxes()) {
            return Ok(Some(MovePath::default()));
        }

        let inverted = Board::inverted(grid);
        let end_positions = end_positions(&literal, player);
        let starts = start_candidates(&inverted);
        let mut visited = VisitedNodes::new(grid.rows(), grid.columns());
        let mut history = ConfigurationHistory::new(self.config.history_budget);

        for start in starts {
            let Some(found) = find_box_path(&inverted, start, &end_positions, &mut visited, &mut history) else {
                continue;
            };

            let Some(walk) = visited.bfs(
                found.player,
                |cell| inverted.is_free(cell, &found.boxes),
                |cell| cell == player,
            ) else {
                trace!("no walk back from {} to {player}", found.player);
                continue;
            };

            let mut pull_moves = found.pull_moves;
            pull_moves.extend(walk.into_steps());
            let path = MovePath::new(forward_moves(&pull_moves));
            debug!(
                "solved from start {start}: {} moves, {} history discards",
                path.len(),
                history.discards()
            );
            return Ok(Some(path));
        }

        debug!(
            "no solution across start candidates, {} history discards",
            history.discards()
        );
        Ok(None)
    }
}

/// Cells next to a box that the keeper can reach before moving anything.
fn end_positions(literal: &Board, player: CellCoord) -> HashSet<CellCoord> {
    let reach = ReachMap::flood(literal.rows(), literal.columns(), player, |cell| {
        literal.is_free(cell, literal.boxes())
    });

    literal
        .boxes()
        .iter()
        .flat_map(|cell| Direction::ALL.into_iter().filter_map(move |direction| cell.neighbor(direction)))
        .filter(|cell| reach.contains(*cell))
        .collect()
}

/// Free cells next to a goal, where forward play can finish.
fn start_candidates(inverted: &Board) -> Vec<CellCoord> {
    let mut candidates = Vec::new();
    for cell in inverted.boxes() {
        for direction in Direction::ALL {
            let Some(neighbor) = inverted.step(*cell, direction, 1) else {
                continue;
            };
            if inverted.is_free(neighbor, inverted.boxes()) && !candidates.contains(&neighbor) {
                candidates.push(neighbor);
            }
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_moves_reverse_and_flip_pulls() {
        let pulls = [Direction::North, Direction::North, Direction::East];
        assert_eq!(
            forward_moves(&pulls),
            vec![Direction::West, Direction::South, Direction::South]
        );
    }

    #[test]
    fn forward_translation_is_an_involution() {
        let pulls = vec![
            Direction::West,
            Direction::South,
            Direction::East,
            Direction::North,
            Direction::North,
        ];
        assert_eq!(forward_moves(&forward_moves(&pulls)), pulls);
    }

    #[test]
    fn single_push_corridor_is_solved() {
        let solver = Solver::default();
        let path = solver
            .solve_text("######\n#@$ .#\n######\n")
            .expect("valid board")
            .expect("solvable");
        assert_eq!(path.steps(), &[Direction::East, Direction::East]);
    }

    #[test]
    fn solved_board_yields_empty_path() {
        let path = Solver::default()
            .solve_text("#####\n#@* #\n#####\n")
            .expect("valid board")
            .expect("already solved");
        assert!(path.is_empty());
    }

    #[test]
    fn missing_keeper_is_rejected() {
        assert_eq!(
            Solver::default().solve_text("#####\n# $.#\n#####\n"),
            Err(SolverError::MissingKeeper)
        );
    }

    #[test]
    fn unequal_boxes_and_goals_are_rejected() {
        assert_eq!(
            Solver::default().solve_text("######\n#@$$.#\n######\n"),
            Err(SolverError::BoxGoalMismatch { boxes: 2, goals: 1 })
        );
    }

    #[test]
    fn empty_text_is_a_layout_error() {
        assert_eq!(
            Solver::default().solve_text(""),
            Err(SolverError::Layout(DecodeError::Empty))
        );
    }

    #[test]
    fn box_against_wall_is_unsolvable() {
        assert_eq!(
            Solver::default().solve_text("#####\n#$@.#\n#####\n"),
            Ok(None)
        );
    }

    #[test]
    fn exhausted_history_budget_still_ends_unsolvable_search() {
        let solver = Solver::new(SolverConfig { history_budget: 1 });
        assert_eq!(
            solver.solve_text("#######\n#$    #\n#  @  #\n#  $  #\n#   ..#\n#######\n"),
            Ok(None)
        );
    }
}
