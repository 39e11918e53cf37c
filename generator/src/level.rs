//! Accepted level artifact handed to presentation adapters.

use std::time::Duration;

use sokogen_core::{CellCoord, GoalBoxPair, Grid, MovePath, QualityMetrics};

/// A generated level whose solution has been proven by replay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    grid: Grid,
    keeper: CellCoord,
    pairs: Vec<GoalBoxPair>,
    path: MovePath,
    metrics: QualityMetrics,
    seed: u64,
    attempts: u32,
    elapsed: Duration,
}

impl Level {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        grid: Grid,
        keeper: CellCoord,
        pairs: Vec<GoalBoxPair>,
        path: MovePath,
        metrics: QualityMetrics,
        seed: u64,
        attempts: u32,
        elapsed: Duration,
    ) -> Self {
        Self {
            grid,
            keeper,
            pairs,
            path,
            metrics,
            seed,
            attempts,
            elapsed,
        }
    }

    /// Final grid with goals, boxes and the keeper stamped in.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Keeper start cell.
    #[must_use]
    pub const fn keeper(&self) -> CellCoord {
        self.keeper
    }

    /// Goal/box pairs in placement order.
    #[must_use]
    pub fn pairs(&self) -> &[GoalBoxPair] {
        &self.pairs
    }

    /// Number of goal/box pairs in the level.
    #[must_use]
    pub fn entities(&self) -> usize {
        self.pairs.len()
    }

    /// Forward move sequence that solves the level.
    #[must_use]
    pub const fn path(&self) -> &MovePath {
        &self.path
    }

    /// Difficulty signature of the solution, corner goals included.
    #[must_use]
    pub const fn metrics(&self) -> QualityMetrics {
        self.metrics
    }

    /// Seed that produced the level.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Synthesis attempts spent, the accepted one included.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Wall-clock time spent generating.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
