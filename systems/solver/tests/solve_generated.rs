use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sokogen_core::{decode, encode, CellCoord, Direction, GoalBoxPair};
use sokogen_system_placement::PlacementEngine;
use sokogen_system_simulation::simulate;
use sokogen_system_solver::{Solver, SolverConfig};
use sokogen_system_synthesis::Synthesizer;

const TWO_ROOM: &str = "\
#########
#       #
# @$  . #
#       #
#  $  . #
#       #
#########
";

#[test]
fn placed_levels_replay_to_a_solved_grid() {
    let synthesizer = Synthesizer::default();
    let engine = PlacementEngine::default();
    let solver = Solver::default();
    let mut solved = 0;

    for seed in 0..24 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let Ok(grid) = synthesizer.synthesize(&mut rng) else {
            continue;
        };
        let Ok(placement) = engine.place(&grid, 2, &mut rng) else {
            continue;
        };

        let result = solver
            .solve_text(&encode(placement.grid()))
            .expect("placement yields a valid board");
        let Some(path) = result else {
            continue;
        };

        let replay = simulate(placement.grid(), &path, placement.pairs()).expect("replays");
        assert!(replay.is_solved(), "seed {seed} did not replay to solved");
        solved += 1;
    }

    assert!(solved > 0, "no seed produced a solvable placement");
}

#[test]
fn text_and_grid_entry_points_agree() {
    let grid = decode(TWO_ROOM).expect("decodes");
    let solver = Solver::default();
    assert_eq!(
        solver.solve_text(TWO_ROOM).expect("valid"),
        solver.solve(&grid).expect("valid")
    );
}

#[test]
fn tiny_history_budget_still_finds_a_solution() {
    let grid = decode(TWO_ROOM).expect("decodes");
    let solver = Solver::new(SolverConfig { history_budget: 1 });
    let path = solver
        .solve(&grid)
        .expect("valid board")
        .expect("solvable without pruning");

    let pairs = [
        GoalBoxPair::new(CellCoord::new(2, 6), CellCoord::new(2, 3)),
        GoalBoxPair::new(CellCoord::new(4, 6), CellCoord::new(4, 3)),
    ];
    assert!(simulate(&grid, &path, &pairs).expect("replays").is_solved());
}

/// Unsolvable eleven by eleven board with six boxes whose pull space runs into
/// the millions of configurations.
const CROWDED_DEAD_END: &str = "\
###########
## ###@##.#
#   #   # #
##$### ## #
#   # $ $.#
#.      # #
#   #     #
# $    .$ #
#   ###$  #
#.#.##   ##
###########
";

#[test]
#[ignore = "exhausts a large pull space; run with --release --ignored"]
fn crowded_unsolvable_board_ends_without_a_solution() {
    assert_eq!(Solver::default().solve_text(CROWDED_DEAD_END), Ok(None));
}

#[test]
fn steps_and_their_opposites_return_to_the_origin() {
    let grid = decode(TWO_ROOM).expect("decodes");
    let origin = CellCoord::new(3, 4);
    for direction in Direction::ALL {
        assert_eq!(direction.opposite().opposite(), direction);
        let moved = grid.step(origin, direction, 1).expect("inside the grid");
        assert_eq!(grid.step(moved, direction.opposite(), 1), Some(origin));
    }
}
