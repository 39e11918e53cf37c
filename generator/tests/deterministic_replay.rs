use std::time::Duration;

use sokogen_core::{encode, CellCoord, GoalBoxPair, MovePath, QualityMetrics};
use sokogen_generator::{GenerationError, Generator, GeneratorConfig, Level};
use sokogen_system_simulation::simulate;
use sokogen_system_solver::Solver;
use sokogen_system_synthesis::check_connectivity;

fn small_config() -> GeneratorConfig {
    GeneratorConfig {
        min_entities: 2,
        max_entities: 2,
        time_budget: Duration::from_secs(120),
        ..GeneratorConfig::default()
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Snapshot {
    grid: String,
    keeper: CellCoord,
    pairs: Vec<GoalBoxPair>,
    path: MovePath,
    metrics: QualityMetrics,
    attempts: u32,
}

impl From<&Level> for Snapshot {
    fn from(level: &Level) -> Self {
        Self {
            grid: encode(level.grid()),
            keeper: level.keeper(),
            pairs: level.pairs().to_vec(),
            path: level.path().clone(),
            metrics: level.metrics(),
            attempts: level.attempts(),
        }
    }
}

#[test]
fn deterministic_replay_reproduces_the_level() {
    let generator = Generator::new(small_config());
    let first = generator.generate(2024).expect("level within budget");
    let second = generator.generate(2024).expect("level within budget");

    assert_eq!(Snapshot::from(&first), Snapshot::from(&second));
    assert_eq!(first.seed(), 2024);
}

#[test]
fn accepted_levels_hold_their_invariants() {
    let generator = Generator::new(small_config());

    for seed in 0..4 {
        let level = generator.generate(seed).expect("level within budget");
        let grid = level.grid();

        assert!(check_connectivity(grid).is_ok(), "seed {seed} disconnected");
        assert_eq!(level.entities(), 2);
        assert_eq!(grid.boxes().len(), level.entities());
        assert_eq!(grid.goals().len(), level.entities());
        assert_eq!(grid.keeper(), Some(level.keeper()));
        for pair in level.pairs() {
            assert!(pair.goal().manhattan_distance(pair.box_cell()) >= 3);
        }

        let replay = simulate(grid, level.path(), level.pairs()).expect("replays");
        assert!(replay.is_solved(), "seed {seed} path does not solve");
        assert_eq!(replay.metrics().moves, level.metrics().moves);
        assert_eq!(replay.metrics().pushes, level.metrics().pushes);
        assert!(level.metrics().pushes >= 1);
        assert!(level.metrics().directional_pushes <= level.metrics().pushes);
        assert!(level.metrics().corner_goals <= 2);

        let resolved = Solver::default()
            .solve(grid)
            .expect("valid board")
            .expect("solvable");
        assert!(!resolved.is_empty());
        let again = simulate(grid, &resolved, level.pairs()).expect("replays");
        assert!(again.is_solved());
    }
}

#[test]
fn exhausted_budget_is_fatal() {
    let config = GeneratorConfig {
        time_budget: Duration::ZERO,
        ..small_config()
    };
    let result = Generator::new(config).generate(1);
    assert!(matches!(
        result,
        Err(GenerationError::TimeBudgetExceeded { attempts: 0, .. })
    ));
}
