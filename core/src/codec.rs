//! Text encoding of grids, one symbol per cell and one line per row.

use thiserror::Error;

use crate::{CellCoord, Grid, Occupant, Tile};

/// External single-value tile codes used by the text encoding.
///
/// Each code names one (occupant, goal) combination. Conversion to and from
/// [`Tile`] is lossless in both directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TileCode {
    /// Plain floor, `' '`.
    Floor = 0,
    /// Wall, `'#'`.
    Wall = 1,
    /// Keeper on plain floor, `'@'`.
    Keeper = 2,
    /// Box on plain floor, `'$'`.
    Box = 3,
    /// Empty goal, `'.'`.
    Goal = 4,
    /// Box resting on a goal, `'*'`.
    BoxOnGoal = 5,
    /// Keeper standing on a goal, `'+'`.
    KeeperOnGoal = 6,
}

impl TileCode {
    /// Symbol written by [`encode`].
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Floor => ' ',
            Self::Wall => '#',
            Self::Keeper => '@',
            Self::Box => '$',
            Self::Goal => '.',
            Self::BoxOnGoal => '*',
            Self::KeeperOnGoal => '+',
        }
    }

    /// Parses a symbol. Unrecognised symbols map to [`TileCode::Wall`].
    #[must_use]
    pub const fn from_symbol(symbol: char) -> Self {
        match symbol {
            ' ' => Self::Floor,
            '@' => Self::Keeper,
            '$' => Self::Box,
            '.' => Self::Goal,
            '*' => Self::BoxOnGoal,
            '+' => Self::KeeperOnGoal,
            _ => Self::Wall,
        }
    }
}

impl From<Tile> for TileCode {
    fn from(tile: Tile) -> Self {
        match tile {
            Tile::Wall => Self::Wall,
            Tile::Floor { occupant, goal } => match (occupant, goal) {
                (Occupant::Empty, false) => Self::Floor,
                (Occupant::Empty, true) => Self::Goal,
                (Occupant::Keeper, false) => Self::Keeper,
                (Occupant::Keeper, true) => Self::KeeperOnGoal,
                (Occupant::Box, false) => Self::Box,
                (Occupant::Box, true) => Self::BoxOnGoal,
            },
        }
    }
}

impl From<TileCode> for Tile {
    fn from(code: TileCode) -> Self {
        match code {
            TileCode::Wall => Tile::Wall,
            TileCode::Floor => Tile::FLOOR,
            TileCode::Goal => Tile::GOAL,
            TileCode::Keeper => Tile::FLOOR.with_occupant(Occupant::Keeper),
            TileCode::KeeperOnGoal => Tile::GOAL.with_occupant(Occupant::Keeper),
            TileCode::Box => Tile::FLOOR.with_occupant(Occupant::Box),
            TileCode::BoxOnGoal => Tile::GOAL.with_occupant(Occupant::Box),
        }
    }
}

/// Errors raised while decoding grid text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The input held no rows.
    #[error("grid text contains no rows")]
    Empty,
    /// The input exceeds the addressable grid size.
    #[error("grid text is too large ({rows} rows, {columns} columns)")]
    TooLarge {
        /// Number of rows in the input.
        rows: usize,
        /// Width of the widest row in the input.
        columns: usize,
    },
}

/// Renders `grid` as text, terminating every row with `'\n'`.
#[must_use]
pub fn encode(grid: &Grid) -> String {
    let columns = usize::try_from(grid.columns()).unwrap_or(0);
    let rows = usize::try_from(grid.rows()).unwrap_or(0);
    let mut text = String::with_capacity(rows * (columns + 1));
    for (cell, tile) in grid.iter() {
        text.push(TileCode::from(tile).symbol());
        if cell.column() + 1 == grid.columns() {
            text.push('\n');
        }
    }
    text
}

/// Parses text produced by [`encode`] back into a grid, preserving occupants.
///
/// Unknown symbols decode as walls and ragged rows are padded with walls up
/// to the widest row.
pub fn decode(text: &str) -> Result<Grid, DecodeError> {
    parse(text, Tile::from)
}

/// Parses grid text keeping only the wall, floor and goal layout.
///
/// Every occupant is discarded, so `'*'` and `'+'` both come back as a plain
/// goal and `'@'` and `'$'` as plain floor.
pub fn decode_layout(text: &str) -> Result<Grid, DecodeError> {
    parse(text, |code| Tile::from(code).with_occupant(Occupant::Empty))
}

fn parse<F>(text: &str, mut tile_for: F) -> Result<Grid, DecodeError>
where
    F: FnMut(TileCode) -> Tile,
{
    let lines: Vec<&str> = text.lines().collect();
    let width = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    if lines.is_empty() || width == 0 {
        return Err(DecodeError::Empty);
    }

    let too_large = || DecodeError::TooLarge {
        rows: lines.len(),
        columns: width,
    };
    let rows = u32::try_from(lines.len()).map_err(|_| too_large())?;
    let columns = u32::try_from(width).map_err(|_| too_large())?;

    let mut grid = Grid::filled(rows, columns, Tile::Wall);
    for (row, line) in (0..rows).zip(lines.iter()) {
        for (column, symbol) in (0..columns).zip(line.chars()) {
            grid.set(
                CellCoord::new(row, column),
                tile_for(TileCode::from_symbol(symbol)),
            );
        }
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODES: [TileCode; 7] = [
        TileCode::Floor,
        TileCode::Wall,
        TileCode::Keeper,
        TileCode::Box,
        TileCode::Goal,
        TileCode::BoxOnGoal,
        TileCode::KeeperOnGoal,
    ];

    const LEVEL: &str = "\
#######
#.@ # #
#$* $ #
#   $ #
# ..  #
#  *  #
#######
";

    #[test]
    fn tile_codes_map_to_distinct_tiles() {
        for code in CODES {
            assert_eq!(TileCode::from(Tile::from(code)), code);
            assert_eq!(TileCode::from_symbol(code.symbol()), code);
        }
        assert_eq!(TileCode::BoxOnGoal as u8, 5);
        assert_eq!(TileCode::KeeperOnGoal as u8, 6);
    }

    #[test]
    fn unknown_symbols_decode_as_walls() {
        assert_eq!(TileCode::from_symbol('x'), TileCode::Wall);
        let grid = decode("?  \n").expect("decodes");
        assert_eq!(grid.get(CellCoord::new(0, 0)), Some(Tile::Wall));
    }

    #[test]
    fn decode_reverses_encode() {
        let grid = decode(LEVEL).expect("decodes");
        assert_eq!(encode(&grid), LEVEL);
        assert_eq!(grid.keeper(), Some(CellCoord::new(1, 2)));
        assert_eq!(grid.boxes().len(), 5);
        assert_eq!(grid.goals().len(), 5);
    }

    #[test]
    fn layout_decoding_keeps_walls_floor_and_goals() {
        let lossless = decode(LEVEL).expect("decodes");
        let layout = decode_layout(&encode(&lossless)).expect("decodes");

        assert_eq!(layout.keeper(), None);
        assert!(layout.boxes().is_empty());
        for (cell, tile) in lossless.iter() {
            let restored = layout.get(cell).expect("same dimensions");
            assert_eq!(restored.is_wall(), tile.is_wall(), "wall mismatch at {cell}");
            assert_eq!(restored.is_goal(), tile.is_goal(), "goal mismatch at {cell}");
        }
        assert_eq!(layout.get(CellCoord::new(2, 2)), Some(Tile::GOAL));
    }

    #[test]
    fn ragged_rows_are_padded_with_walls() {
        let grid = decode("#  \n#\n").expect("decodes");
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.columns(), 3);
        assert_eq!(grid.get(CellCoord::new(1, 2)), Some(Tile::Wall));
        assert_eq!(grid.get(CellCoord::new(0, 2)), Some(Tile::FLOOR));
    }

    #[test]
    fn empty_text_is_rejected() {
        assert_eq!(decode(""), Err(DecodeError::Empty));
        assert_eq!(decode_layout("\n\n"), Err(DecodeError::Empty));
    }
}
