//! Square template patches stamped into each grid division.

use sokogen_core::Tile;

/// Symbol marking a template cell that leaves the underlying grid untouched.
pub const TRANSPARENT: char = '?';

const STANDARD: [[&str; 5]; 17] = [
    ["?????", "?   ?", "?   ?", "?   ?", "?????"],
    ["?????", "?#  ?", "?   ?", "?   ?", "?????"],
    ["?????", "?## ?", "?   ?", "?   ?", "?????"],
    ["?????", "?## ?", "?#  ?", "?   ?", "?????"],
    ["? ???", "?#  ?", "     ", "?  #?", "??? ?"],
    ["?????", "?   ?", "? # ?", "?   ?", "?????"],
    ["?????", "?#  ?", "?#   ", "?#  ?", "?????"],
    ["?? ??", "?# #?", "?   ?", "?# #?", "?? ??"],
    ["?????", "#####", "     ", "#####", "?????"],
    ["?????", "#####", "     ", "## ##", "?? ??"],
    ["?? ??", "## ##", "     ", "## ##", "?? ??"],
    ["?????", "?####", "?#   ", "?# # ", "?#   "],
    ["?????", "?###?", "?###?", "?###?", "?????"],
    ["?????", "?#  ?", "? # ?", "?  #?", "?????"],
    ["? ? ?", "     ", "?   ?", "     ", "? ? ?"],
    ["?????", "?####", "?#   ", "?# ##", "?? ??"],
    ["?????", "?# #?", "?# #?", "?   ?", "?????"],
];

/// Square patch of wall, floor and transparent cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    size: usize,
    cells: Vec<Option<Tile>>,
}

impl Template {
    /// Parses a template from equally sized rows.
    ///
    /// `'#'` is a wall, `' '` is floor and [`TRANSPARENT`] leaves the grid
    /// unchanged. Any other symbol is read as a wall. Returns `None` unless the
    /// rows form a non-empty square.
    #[must_use]
    pub fn from_rows(rows: &[&str]) -> Option<Self> {
        let size = rows.len();
        if size == 0 {
            return None;
        }

        let mut cells = Vec::with_capacity(size * size);
        for row in rows {
            if row.chars().count() != size {
                return None;
            }
            cells.extend(row.chars().map(|symbol| match symbol {
                TRANSPARENT => None,
                ' ' => Some(Tile::FLOOR),
                _ => Some(Tile::Wall),
            }));
        }

        Some(Self { size, cells })
    }

    /// Edge length of the square patch.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Tile stamped at the given offset, or `None` when the cell is transparent.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<Tile> {
        if row >= self.size || column >= self.size {
            return None;
        }
        self.cells.get(row * self.size + column).copied().flatten()
    }

    /// Returns the patch rotated 90 degrees clockwise.
    #[must_use]
    pub fn rotated_clockwise(&self) -> Self {
        let n = self.size;
        let mut cells = vec![None; n * n];
        for row in 0..n {
            for column in 0..n {
                cells[column * n + (n - 1 - row)] = self.cells[row * n + column];
            }
        }
        Self { size: n, cells }
    }

    /// Returns the patch rotated clockwise `turns` quarter turns.
    #[must_use]
    pub fn rotated(&self, turns: u32) -> Self {
        (0..turns % 4).fold(self.clone(), |template, _| template.rotated_clockwise())
    }
}

/// Built-in library of 5x5 templates.
#[must_use]
pub fn standard_templates() -> Vec<Template> {
    STANDARD
        .iter()
        .filter_map(|rows| Template::from_rows(rows))
        .collect()
}
