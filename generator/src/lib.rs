#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level orchestration that composes the pure systems into one accepted level.
//!
//! Generation is a single-threaded state machine. A grid is synthesized,
//! populated, proven solvable and finally replayed to score the solution. An
//! unsolvable keeper start sends the machine back to the solver with a new
//! keeper; every other failure starts over from synthesis. The wall-clock
//! budget is checked before each synthesis attempt, so a single solve is never
//! interrupted.

mod level;

pub use level::Level;

use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sokogen_core::{encode, Grid, MovePath};
use sokogen_system_placement::{Placement, PlacementConfig, PlacementEngine};
use sokogen_system_simulation::simulate;
use sokogen_system_solver::{Solver, SolverConfig};
use sokogen_system_synthesis::{SynthesisConfig, Synthesizer};
use thiserror::Error;

const DEFAULT_ENTITIES: usize = 6;
const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(600);

/// Configuration of a whole generation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Grid synthesis settings.
    pub synthesis: SynthesisConfig,
    /// Entity placement settings.
    pub placement: PlacementConfig,
    /// Solver limits.
    pub solver: SolverConfig,
    /// Smallest number of goal/box pairs per level.
    pub min_entities: usize,
    /// Largest number of goal/box pairs per level, inclusive.
    pub max_entities: usize,
    /// Wall-clock time after which generation gives up.
    pub time_budget: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            synthesis: SynthesisConfig::default(),
            placement: PlacementConfig::default(),
            solver: SolverConfig::default(),
            min_entities: DEFAULT_ENTITIES,
            max_entities: DEFAULT_ENTITIES,
            time_budget: DEFAULT_TIME_BUDGET,
        }
    }
}

/// Fatal generation outcomes.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// No level was accepted within the time budget.
    #[error("no level accepted after {attempts} attempts in {elapsed:?}")]
    TimeBudgetExceeded {
        /// Synthesis attempts started before giving up.
        attempts: u32,
        /// Wall-clock time spent.
        elapsed: Duration,
    },
}

/// Step of the generation state machine, carrying the work accepted so far.
#[derive(Debug)]
enum Stage {
    Synthesizing,
    Placing(Grid),
    Solving(Placement),
    Simulating { placement: Placement, path: MovePath },
    Accepted(Level),
}

impl Stage {
    const fn name(&self) -> &'static str {
        match self {
            Self::Synthesizing => "synthesizing",
            Self::Placing(_) => "placing",
            Self::Solving(_) => "solving",
            Self::Simulating { .. } => "simulating",
            Self::Accepted(_) => "accepted",
        }
    }
}

/// Orchestrates synthesis, placement, solving and simulation.
#[derive(Clone, Debug)]
pub struct Generator {
    config: GeneratorConfig,
    synthesizer: Synthesizer,
    placement: PlacementEngine,
    solver: Solver,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new(GeneratorConfig::default())
    }
}

impl Generator {
    /// Creates a generator with the provided configuration.
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            synthesizer: Synthesizer::new(config.synthesis),
            placement: PlacementEngine::new(config.placement),
            solver: Solver::new(config.solver),
        }
    }

    /// Creates a generator around a custom synthesizer.
    #[must_use]
    pub fn with_synthesizer(config: GeneratorConfig, synthesizer: Synthesizer) -> Self {
        Self {
            synthesizer,
            ..Self::new(config)
        }
    }

    /// Configuration the generator was created with.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates one level from `seed`.
    ///
    /// The same seed and configuration reproduce the same level as long as
    /// the time budget is not reached.
    pub fn generate(&self, seed: u64) -> Result<Level, GenerationError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let started = Instant::now();
        let mut attempts: u32 = 0;
        let mut stage = Stage::Synthesizing;

        loop {
            stage = match stage {
                Stage::Synthesizing => {
                    let elapsed = started.elapsed();
                    if elapsed >= self.config.time_budget {
                        warn!("time budget of {:?} exhausted", self.config.time_budget);
                        return Err(GenerationError::TimeBudgetExceeded { attempts, elapsed });
                    }
                    attempts = attempts.saturating_add(1);
                    match self.synthesizer.synthesize(&mut rng) {
                        Ok(grid) => Stage::Placing(grid),
                        Err(rejection) => {
                            debug!("attempt {attempts}: {rejection}");
                            Stage::Synthesizing
                        }
                    }
                }
                Stage::Placing(grid) => {
                    let entities = self.entity_count(&mut rng);
                    match self.placement.place(&grid, entities, &mut rng) {
                        Ok(placement) => Stage::Solving(placement),
                        Err(failure) => {
                            debug!("attempt {attempts}: {failure}");
                            Stage::Synthesizing
                        }
                    }
                }
                Stage::Solving(placement) => self.solve(placement, &mut rng, attempts),
                Stage::Simulating { placement, path } => {
                    self.simulate(placement, path, seed, attempts, started)
                }
                Stage::Accepted(level) => {
                    info!(
                        "accepted level after {} attempts in {:?}: {}",
                        level.attempts(),
                        level.elapsed(),
                        level.metrics()
                    );
                    return Ok(level);
                }
            };
            debug!("attempt {attempts}: entering {}", stage.name());
        }
    }

    fn entity_count<R>(&self, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let low = self.config.min_entities.max(1);
        let high = self.config.max_entities.max(low);
        rng.gen_range(low..=high)
    }

    fn solve<R>(&self, mut placement: Placement, rng: &mut R, attempts: u32) -> Stage
    where
        R: Rng + ?Sized,
    {
        match self.solver.solve_text(&encode(placement.grid())) {
            Ok(Some(path)) if path.is_empty() => {
                debug!("attempt {attempts}: placement is already solved");
                Stage::Synthesizing
            }
            Ok(Some(path)) => Stage::Simulating { placement, path },
            Ok(None) => match placement.replace_keeper(rng) {
                Ok(keeper) => {
                    debug!("attempt {attempts}: unsolvable, retrying keeper at {keeper}");
                    Stage::Solving(placement)
                }
                Err(failure) => {
                    debug!("attempt {attempts}: {failure}");
                    Stage::Synthesizing
                }
            },
            Err(error) => {
                warn!("attempt {attempts}: solver refused placement: {error}");
                Stage::Synthesizing
            }
        }
    }

    fn simulate(
        &self,
        placement: Placement,
        path: MovePath,
        seed: u64,
        attempts: u32,
        started: Instant,
    ) -> Stage {
        let replay = match simulate(placement.grid(), &path, placement.pairs()) {
            Ok(replay) => replay,
            Err(error) => {
                warn!("attempt {attempts}: replay failed: {error}");
                return Stage::Synthesizing;
            }
        };
        if !replay.is_solved() {
            warn!("attempt {attempts}: solution does not solve the placement");
            return Stage::Synthesizing;
        }

        let mut metrics = replay.metrics();
        metrics.corner_goals = placement.corner_goals();
        let keeper = placement.keeper();
        let (grid, pairs) = placement.into_parts();
        Stage::Accepted(Level::new(
            grid,
            keeper,
            pairs,
            path,
            metrics,
            seed,
            attempts,
            started.elapsed(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sokogen_system_synthesis::{SynthesisConfig, Template};

    fn open_room_generator() -> Generator {
        let template = Template::from_rows(&["     ", "     ", "     ", "     ", "     "])
            .expect("square template");
        let config = GeneratorConfig {
            synthesis: SynthesisConfig {
                division_size: 3,
                min_divisions: 2,
                max_divisions: 2,
            },
            min_entities: 1,
            max_entities: 1,
            time_budget: Duration::from_secs(30),
            ..GeneratorConfig::default()
        };
        Generator::with_synthesizer(
            config,
            Synthesizer::with_templates(config.synthesis, vec![template]),
        )
    }

    #[test]
    fn zero_budget_fails_before_any_attempt() {
        let config = GeneratorConfig {
            time_budget: Duration::ZERO,
            ..GeneratorConfig::default()
        };
        let error = Generator::new(config).generate(7).expect_err("no time to work");
        assert!(matches!(
            error,
            GenerationError::TimeBudgetExceeded { attempts: 0, .. }
        ));
    }

    #[test]
    fn entity_count_is_at_least_one() {
        let config = GeneratorConfig {
            min_entities: 0,
            max_entities: 0,
            ..GeneratorConfig::default()
        };
        let generator = Generator::new(config);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(generator.entity_count(&mut rng), 1);
    }

    #[test]
    fn open_room_yields_single_pair_level() {
        let level = open_room_generator().generate(11).expect("open room is solvable");
        assert_eq!(level.entities(), 1);
        assert_eq!(level.seed(), 11);
        assert!(level.attempts() >= 1);
        assert!(!level.path().is_empty());
        assert_eq!(level.grid().goals().len(), 1);
        assert_eq!(level.grid().boxes().len(), 1);
        assert_eq!(level.grid().keeper(), Some(level.keeper()));
    }
}
