#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure synthesis system that stamps rotated templates into a walled grid.
//!
//! The grid is divided into square divisions. Each division receives one
//! randomly chosen, randomly rotated template whose patch overhangs the
//! division by one cell on its leading edge, so neighbouring patches overlap.
//! A candidate is only accepted when every floor cell is connected; anything
//! else is rejected wholesale and the caller synthesizes again.

mod templates;

pub use templates::{standard_templates, Template, TRANSPARENT};

use log::trace;
use rand::Rng;
use sokogen_core::{CellCoord, Grid, ReachMap, Tile};
use thiserror::Error;

/// Tunable dimensions of synthesized grids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SynthesisConfig {
    /// Edge length of a single division in cells.
    pub division_size: u32,
    /// Smallest number of divisions per axis.
    pub min_divisions: u32,
    /// Largest number of divisions per axis, inclusive.
    pub max_divisions: u32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            division_size: 3,
            min_divisions: 3,
            max_divisions: 3,
        }
    }
}

/// Largest edge length, in cells and before the border is added, that synthesis will allocate.
pub const MAX_GRID_EDGE: u32 = 4096;

/// Reasons a synthesized candidate grid is discarded.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum SynthesisRejection {
    /// The stamped grid contains no floor at all.
    #[error("synthesized grid contains no floor")]
    NoFloor,
    /// Some floor cells cannot be reached from the others.
    #[error("only {reached} of {floor} floor cells are connected")]
    Disconnected {
        /// Floor cells reached by the flood fill.
        reached: usize,
        /// Total floor cells in the grid.
        floor: usize,
    },
    /// The drawn division count times the division size exceeds [`MAX_GRID_EDGE`].
    #[error("{divisions} divisions of {division_size} cells exceed the grid edge limit")]
    Oversized {
        /// Divisions drawn for the offending axis.
        divisions: u32,
        /// Edge length of one division.
        division_size: u32,
    },
}

/// Template grid synthesizer.
#[derive(Clone, Debug)]
pub struct Synthesizer {
    config: SynthesisConfig,
    templates: Vec<Template>,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(SynthesisConfig::default())
    }
}

impl Synthesizer {
    /// Creates a synthesizer backed by the built-in template library.
    #[must_use]
    pub fn new(config: SynthesisConfig) -> Self {
        Self::with_templates(config, standard_templates())
    }

    /// Creates a synthesizer backed by a caller-provided template library.
    #[must_use]
    pub fn with_templates(config: SynthesisConfig, templates: Vec<Template>) -> Self {
        Self { config, templates }
    }

    /// Configuration the synthesizer was created with.
    #[must_use]
    pub const fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Synthesizes one candidate grid.
    ///
    /// On success the returned grid is fully connected and wrapped in a
    /// one-cell wall border. A rejection carries no partial grid.
    pub fn synthesize<R>(&self, rng: &mut R) -> Result<Grid, SynthesisRejection>
    where
        R: Rng + ?Sized,
    {
        let size = self.config.division_size.max(1);
        let low = self.config.min_divisions.max(1);
        let high = self.config.max_divisions.max(low);
        let row_divisions = rng.gen_range(low..=high);
        let column_divisions = rng.gen_range(low..=high);

        let rows = grid_edge(row_divisions, size)?;
        let columns = grid_edge(column_divisions, size)?;
        let mut grid = Grid::filled(rows, columns, Tile::Wall);

        for division_row in 0..row_divisions {
            for division_column in 0..column_divisions {
                if self.templates.is_empty() {
                    continue;
                }
                let template = &self.templates[rng.gen_range(0..self.templates.len())];
                let turns = rng.gen_range(0..4);
                let origin_row = leading_edge(division_row, size);
                let origin_column = leading_edge(division_column, size);
                stamp(&mut grid, &template.rotated(turns), origin_row, origin_column);
            }
        }

        check_connectivity(&grid)?;
        trace!(
            "synthesized {}x{} grid from {} divisions",
            grid.rows(),
            grid.columns(),
            u64::from(row_divisions) * u64::from(column_divisions)
        );
        Ok(grid.bordered())
    }
}

fn grid_edge(divisions: u32, division_size: u32) -> Result<u32, SynthesisRejection> {
    divisions
        .checked_mul(division_size)
        .filter(|edge| *edge <= MAX_GRID_EDGE)
        .ok_or(SynthesisRejection::Oversized {
            divisions,
            division_size,
        })
}

/// Verifies that a flood fill from the first floor cell reaches every floor cell.
pub fn check_connectivity(grid: &Grid) -> Result<(), SynthesisRejection> {
    let floor = grid.cells_where(|tile| !tile.is_wall());
    let Some(&start) = floor.first() else {
        return Err(SynthesisRejection::NoFloor);
    };

    let reach = ReachMap::flood(grid.rows(), grid.columns(), start, |cell| {
        grid.get(cell).is_some_and(|tile| !tile.is_wall())
    });

    if reach.count() == floor.len() {
        Ok(())
    } else {
        Err(SynthesisRejection::Disconnected {
            reached: reach.count(),
            floor: floor.len(),
        })
    }
}

/// Stamps `template` with its top-left corner at the signed origin.
///
/// Transparent and out-of-bounds cells are skipped.
pub fn stamp(grid: &mut Grid, template: &Template, origin_row: i64, origin_column: i64) {
    for row in 0..template.size() {
        for column in 0..template.size() {
            let Some(tile) = template.cell(row, column) else {
                continue;
            };
            let Some(cell) = offset_cell(origin_row, origin_column, row, column) else {
                continue;
            };
            if grid.contains(cell) {
                grid.set(cell, tile);
            }
        }
    }
}

fn leading_edge(division: u32, size: u32) -> i64 {
    if division == 0 {
        -1
    } else {
        i64::from(division) * i64::from(size)
    }
}

fn offset_cell(origin_row: i64, origin_column: i64, row: usize, column: usize) -> Option<CellCoord> {
    let row = origin_row.checked_add(i64::try_from(row).ok()?)?;
    let column = origin_column.checked_add(i64::try_from(column).ok()?)?;
    Some(CellCoord::new(
        u32::try_from(row).ok()?,
        u32::try_from(column).ok()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_division_overhangs_by_one_cell() {
        assert_eq!(leading_edge(0, 3), -1);
        assert_eq!(leading_edge(1, 3), 3);
        assert_eq!(leading_edge(2, 3), 6);
    }

    #[test]
    fn stamp_skips_transparent_and_out_of_bounds_cells() {
        let mut grid = Grid::filled(3, 3, Tile::Wall);
        let template = Template::from_rows(&["???", "?  ", "?  "]).expect("square");

        stamp(&mut grid, &template, -1, -1);

        assert_eq!(grid.get(CellCoord::new(0, 0)), Some(Tile::FLOOR));
        assert_eq!(grid.get(CellCoord::new(1, 1)), Some(Tile::FLOOR));
        assert_eq!(grid.get(CellCoord::new(2, 2)), Some(Tile::Wall));
    }

    #[test]
    fn all_wall_grid_has_no_floor() {
        let grid = Grid::filled(4, 4, Tile::Wall);
        assert_eq!(check_connectivity(&grid), Err(SynthesisRejection::NoFloor));
    }
}
