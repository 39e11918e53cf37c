#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure placement system that stamps goal/box pairs and a keeper into a grid.
//!
//! Pairs are placed one at a time. Each round re-filters the goal pool, picks
//! a goal at random, explores the access range a box could be pulled through
//! from that goal and keeps only the box cells that are far enough away, not a
//! trivial straight push, and consistent with the territory validated for the
//! pairs placed before. Once every pair is placed, the keeper starts in a
//! randomly chosen connected region. A failure is reported as a value and the
//! grid is never repaired in place.

mod terrain;

pub use terrain::{
    contains_blockade_between, corner_score, is_blockade, is_reachable_goal, ENCLOSED,
};

use std::collections::{HashSet, VecDeque};

use log::{debug, trace};
use rand::Rng;
use sokogen_core::{CellCoord, Direction, GoalBoxPair, Grid, Occupant, ReachMap};
use thiserror::Error;

/// Tunable thresholds of the placement engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementConfig {
    /// Minimum Manhattan distance between a goal and its box.
    pub min_manhattan: u32,
    /// Number of farthest box candidates the final pick is drawn from.
    pub farthest_pick: usize,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            min_manhattan: 3,
            farthest_pick: 3,
        }
    }
}

/// Reasons placement gives up on a grid.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PlacementFailure {
    /// Every goal candidate was tried without finding a box cell.
    #[error("goal pool exhausted after placing {placed} of {requested} pairs")]
    GoalPoolExhausted {
        /// Pairs placed before the pool ran dry.
        placed: usize,
        /// Pairs requested by the caller.
        requested: usize,
    },
    /// No keeper region candidate remains.
    #[error("no keeper region left to try")]
    NoKeeperRegion,
}

/// Grid with every pair and the keeper stamped in, plus the remaining keeper candidates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    grid: Grid,
    pairs: Vec<GoalBoxPair>,
    corner_goals: u32,
    keeper: CellCoord,
    keeper_candidates: Vec<CellCoord>,
}

impl Placement {
    /// Grid holding goals, boxes and the keeper.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Placed pairs in placement order. The index of a pair is its box identity.
    #[must_use]
    pub fn pairs(&self) -> &[GoalBoxPair] {
        &self.pairs
    }

    /// Number of goals that had at least one blockaded corner when placed.
    #[must_use]
    pub const fn corner_goals(&self) -> u32 {
        self.corner_goals
    }

    /// Current keeper start.
    #[must_use]
    pub const fn keeper(&self) -> CellCoord {
        self.keeper
    }

    /// Keeper region representatives still available, ascending by corner score.
    #[must_use]
    pub fn keeper_candidates(&self) -> &[CellCoord] {
        &self.keeper_candidates
    }

    /// Removes the current keeper from the candidate pool and places it again.
    ///
    /// The old keeper tile is cleared and a new start is drawn uniformly from
    /// the remaining candidates.
    pub fn replace_keeper<R>(&mut self, rng: &mut R) -> Result<CellCoord, PlacementFailure>
    where
        R: Rng + ?Sized,
    {
        let previous = self.keeper;
        self.keeper_candidates.retain(|cell| *cell != previous);
        if let Some(tile) = self.grid.get(previous) {
            self.grid.set(previous, tile.with_occupant(Occupant::Empty));
        }

        let keeper = stamp_keeper(&mut self.grid, &self.keeper_candidates, rng)?;
        debug!(
            "keeper moved from {previous} to {keeper}, {} candidates left",
            self.keeper_candidates.len()
        );
        self.keeper = keeper;
        Ok(keeper)
    }

    /// Consumes the placement, yielding the stamped grid and the pairs.
    #[must_use]
    pub fn into_parts(self) -> (Grid, Vec<GoalBoxPair>) {
        (self.grid, self.pairs)
    }
}

/// Entity placement engine.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlacementEngine {
    config: PlacementConfig,
}

impl PlacementEngine {
    /// Creates a placement engine with the provided thresholds.
    #[must_use]
    pub const fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    /// Configuration the engine was created with.
    #[must_use]
    pub const fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Places `entities` goal/box pairs and a keeper into a copy of `grid`.
    pub fn place<R>(
        &self,
        grid: &Grid,
        entities: usize,
        rng: &mut R,
    ) -> Result<Placement, PlacementFailure>
    where
        R: Rng + ?Sized,
    {
        let mut grid = grid.clone();
        let passway_len = grid.cells_where(|tile| tile.is_passable()).len();
        let mut goal_pool = grid.cells_where(|tile| tile.is_passable());
        let mut claimed: HashSet<CellCoord> = HashSet::new();
        let mut pairs = Vec::with_capacity(entities);
        let mut corner_goals = 0;

        while pairs.len() < entities {
            goal_pool.retain(|cell| is_goal_candidate(&grid, *cell));

            let exhausted = PlacementFailure::GoalPoolExhausted {
                placed: pairs.len(),
                requested: entities,
            };
            let (goal, candidates) = loop {
                if goal_pool.is_empty() {
                    debug!("{exhausted}");
                    return Err(exhausted);
                }
                let goal = goal_pool[rng.gen_range(0..goal_pool.len())];
                let reachable = access_range(&grid, goal, passway_len);
                let candidates = self.filter_box_candidates(&grid, goal, reachable, &goal_pool, &claimed);
                if candidates.is_empty() {
                    trace!("goal {goal} has no box candidates");
                    goal_pool.retain(|cell| *cell != goal);
                    continue;
                }
                break (goal, candidates);
            };

            let limit = candidates.len().min(self.config.farthest_pick.max(1));
            let box_cell = candidates[rng.gen_range(0..limit)];

            if let Some(tile) = grid.get(goal) {
                grid.set(goal, tile.with_goal());
            }
            if let Some(tile) = grid.get(box_cell) {
                grid.set(box_cell, tile.with_occupant(Occupant::Box));
            }
            if corner_score(&grid, Some(goal)) > 0 {
                corner_goals += 1;
            }

            trace!("pair {} placed: goal {goal}, box {box_cell}", pairs.len());
            pairs.push(GoalBoxPair::new(goal, box_cell));
            claimed.extend(candidates);
        }

        let keeper_candidates = keeper_regions(&grid);
        let keeper = stamp_keeper(&mut grid, &keeper_candidates, rng)?;
        debug!(
            "placed {} pairs and keeper at {keeper} among {} regions",
            pairs.len(),
            keeper_candidates.len()
        );

        Ok(Placement {
            grid,
            pairs,
            corner_goals,
            keeper,
            keeper_candidates,
        })
    }

    /// Filters the access range of `goal` down to admissible box cells.
    ///
    /// The result is ordered by descending farthest-goal distance, with ties
    /// kept in discovery order. When `claimed` is non-empty only cells inside
    /// it survive.
    #[must_use]
    pub fn filter_box_candidates(
        &self,
        grid: &Grid,
        goal: CellCoord,
        reachable: Vec<CellCoord>,
        goal_pool: &[CellCoord],
        claimed: &HashSet<CellCoord>,
    ) -> Vec<CellCoord> {
        let mut scored: Vec<(CellCoord, u32)> = reachable
            .into_iter()
            .filter(|cell| self.admits_pair(grid, goal, *cell))
            .map(|cell| (cell, farthest_goal_distance(cell, goal_pool)))
            .collect();

        scored.sort_by(|left, right| right.1.cmp(&left.1));

        scored
            .into_iter()
            .filter(|(_, farthest)| *farthest >= self.config.min_manhattan)
            .map(|(cell, _)| cell)
            .filter(|cell| claimed.is_empty() || claimed.contains(cell))
            .collect()
    }

    /// Reports whether `box_cell` may be paired with `goal`.
    ///
    /// The box must lie at least the minimum Manhattan distance away and must
    /// not sit on the goal's row or column with a clear line between them.
    #[must_use]
    pub fn admits_pair(&self, grid: &Grid, goal: CellCoord, box_cell: CellCoord) -> bool {
        if goal.manhattan_distance(box_cell) < self.config.min_manhattan {
            return false;
        }
        !goal.is_axis_aligned_with(box_cell) || contains_blockade_between(grid, goal, box_cell)
    }
}

/// Breadth-first exploration of the cells a box could be pulled through from `goal`.
///
/// A neighbour is admitted when it is free, the cell two steps out in the
/// same direction has a corner score of zero, and it has not been admitted
/// before. Expansion stops once the frontier grows to `cap` cells.
#[must_use]
pub fn access_range(grid: &Grid, goal: CellCoord, cap: usize) -> Vec<CellCoord> {
    let mut admitted = Vec::new();
    let mut seen = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(goal);

    while queue.len() < cap {
        let Some(current) = queue.pop_front() else {
            break;
        };

        for direction in Direction::ALL {
            let access = current.offset(direction, 1);
            let outer = current.offset(direction, 2);
            let Some(access) = access.filter(|cell| !grid.is_blockade(*cell)) else {
                continue;
            };
            if corner_score(grid, outer) != 0 || seen.contains(&access) {
                continue;
            }
            let _ = seen.insert(access);
            admitted.push(access);
            queue.push_back(access);
        }
    }

    admitted
}

/// Representatives of every connected region of passable cells, ascending by corner score.
///
/// Regions are discovered in row-major order and each is represented by its
/// first cell. The sort is stable.
#[must_use]
pub fn keeper_regions(grid: &Grid) -> Vec<CellCoord> {
    let mut visited = ReachMap::new(grid.rows(), grid.columns());
    let mut representatives = Vec::new();

    for cell in grid.cells_where(|tile| tile.is_passable()) {
        if visited.contains(cell) {
            continue;
        }
        let _ = visited.extend(cell, |candidate| !grid.is_blockade(candidate));
        representatives.push(cell);
    }

    representatives.sort_by_key(|cell| corner_score(grid, Some(*cell)));
    representatives
}

fn is_goal_candidate(grid: &Grid, cell: CellCoord) -> bool {
    grid.get(cell)
        .is_some_and(|tile| tile.is_passable() && !tile.is_goal())
        && is_reachable_goal(grid, cell)
}

fn farthest_goal_distance(cell: CellCoord, goal_pool: &[CellCoord]) -> u32 {
    goal_pool
        .iter()
        .map(|goal| cell.manhattan_distance(*goal))
        .max()
        .unwrap_or(0)
}

fn stamp_keeper<R>(
    grid: &mut Grid,
    candidates: &[CellCoord],
    rng: &mut R,
) -> Result<CellCoord, PlacementFailure>
where
    R: Rng + ?Sized,
{
    if candidates.is_empty() {
        return Err(PlacementFailure::NoKeeperRegion);
    }
    let keeper = candidates[rng.gen_range(0..candidates.len())];
    if let Some(tile) = grid.get(keeper) {
        grid.set(keeper, tile.with_occupant(Occupant::Keeper));
    }
    Ok(keeper)
}
