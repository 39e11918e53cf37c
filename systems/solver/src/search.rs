//! Local keeper walks and the best-first box configuration search.

use std::{
    cmp::Ordering,
    collections::{hash_map::DefaultHasher, BinaryHeap, HashMap, HashSet, VecDeque},
    hash::{Hash, Hasher},
    mem::size_of,
    rc::Rc,
};

use log::{trace, warn};
use sokogen_core::{CellCoord, Direction, ReachMap};

use crate::board::{canonicalize, Board};

/// Keeper walk produced by [`VisitedNodes::bfs`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Walk {
    end: CellCoord,
    steps: Vec<Direction>,
}

impl Walk {
    /// Cell the walk finishes on.
    #[must_use]
    pub const fn end(&self) -> CellCoord {
        self.end
    }

    /// Steps in walking order.
    #[must_use]
    pub fn steps(&self) -> &[Direction] {
        &self.steps
    }

    /// Consumes the walk, yielding its steps.
    #[must_use]
    pub fn into_steps(self) -> Vec<Direction> {
        self.steps
    }
}

/// Reusable visitation buffer for breadth-first keeper walks.
///
/// Every cell stores the direction it was entered from together with the
/// generation token of the walk that entered it. Starting a walk bumps the
/// token, so entries left behind by earlier walks read as unvisited and the
/// buffer never needs clearing.
#[derive(Clone, Debug)]
pub struct VisitedNodes {
    rows: u32,
    columns: u32,
    token: u32,
    tokens: Vec<u32>,
    arrivals: Vec<Option<Direction>>,
}

impl VisitedNodes {
    /// Creates a buffer covering a `rows` by `columns` board.
    #[must_use]
    pub fn new(rows: u32, columns: u32) -> Self {
        let rows_usize = usize::try_from(rows).unwrap_or(0);
        let columns_usize = usize::try_from(columns).unwrap_or(0);
        let cell_count = rows_usize.checked_mul(columns_usize).unwrap_or(0);
        Self {
            rows,
            columns,
            token: 0,
            tokens: vec![0; cell_count],
            arrivals: vec![None; cell_count],
        }
    }

    /// Token identifying the most recent walk.
    #[must_use]
    pub const fn token(&self) -> u32 {
        self.token
    }

    /// Shortest walk from `start` to the first cell accepted by `is_target`.
    ///
    /// The walk only crosses cells accepted by `is_free`, although a target
    /// cell may be entered even when it is not free. Neighbours are explored
    /// in [`Direction::ALL`] order, so ties resolve the same way every time.
    pub fn bfs<F, T>(&mut self, start: CellCoord, is_free: F, is_target: T) -> Option<Walk>
    where
        F: Fn(CellCoord) -> bool,
        T: Fn(CellCoord) -> bool,
    {
        self.begin();
        self.mark(start, None)?;

        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(cell) = queue.pop_front() {
            if is_target(cell) {
                return Some(self.walk_back(start, cell));
            }

            for direction in Direction::ALL {
                let Some(next) = cell.neighbor(direction) else {
                    continue;
                };
                if self.is_visited(next) || !(is_free(next) || is_target(next)) {
                    continue;
                }
                if self.mark(next, Some(direction)).is_some() {
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Marks every cell reachable from `start` through cells accepted by `is_free`.
    ///
    /// Returns the number of cells reached. Walks to any of them are then read
    /// back with [`VisitedNodes::walk_to`] until the next exploration starts.
    /// Cells are entered in the same order as [`VisitedNodes::bfs`] enters
    /// them, so both produce the same walks.
    pub fn explore<F>(&mut self, start: CellCoord, is_free: F) -> usize
    where
        F: Fn(CellCoord) -> bool,
    {
        self.begin();
        if self.mark(start, None).is_none() {
            return 0;
        }

        let mut reached = 1;
        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(cell) = queue.pop_front() {
            for direction in Direction::ALL {
                let Some(next) = cell.neighbor(direction) else {
                    continue;
                };
                if self.is_visited(next) || !is_free(next) {
                    continue;
                }
                if self.mark(next, Some(direction)).is_some() {
                    reached += 1;
                    queue.push_back(next);
                }
            }
        }

        reached
    }

    /// Walk from `start` to `target` recorded by the latest [`VisitedNodes::explore`].
    ///
    /// `start` must be the cell that exploration began on.
    #[must_use]
    pub fn walk_to(&self, start: CellCoord, target: CellCoord) -> Option<Walk> {
        self.is_visited(target)
            .then(|| self.walk_back(start, target))
    }

    fn begin(&mut self) {
        self.token = self.token.wrapping_add(1);
        if self.token == 0 {
            self.tokens.fill(0);
            self.token = 1;
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if cell.row() >= self.rows || cell.column() >= self.columns {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    fn mark(&mut self, cell: CellCoord, arrival: Option<Direction>) -> Option<()> {
        let index = self.index(cell)?;
        self.tokens[index] = self.token;
        self.arrivals[index] = arrival;
        Some(())
    }

    fn is_visited(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .is_some_and(|index| self.tokens[index] == self.token)
    }

    fn arrival(&self, cell: CellCoord) -> Option<Direction> {
        let index = self.index(cell)?;
        if self.tokens[index] != self.token {
            return None;
        }
        self.arrivals[index]
    }

    fn walk_back(&self, start: CellCoord, end: CellCoord) -> Walk {
        let mut steps = Vec::new();
        let mut cell = end;
        while cell != start {
            let Some(direction) = self.arrival(cell) else {
                break;
            };
            steps.push(direction);
            let Some(previous) = cell.neighbor(direction.opposite()) else {
                break;
            };
            cell = previous;
        }
        steps.reverse();
        Walk { end, steps }
    }
}

/// Estimated heap and table footprint of one history entry, excluding its bitmap.
const ENTRY_OVERHEAD: usize =
    size_of::<Vec<CellCoord>>() + size_of::<ReachMap>() + 2 * size_of::<u64>();

/// Keeper regions already explored per canonical box configuration.
///
/// Full entries are kept until their estimated size would exceed the byte
/// budget. At that point every entry is folded into a set of fingerprints,
/// one per explored region, and the entries are dropped. Fingerprints are
/// never dropped, so a configuration seen before a discard is still
/// rejected after it.
#[derive(Debug)]
pub(crate) struct ConfigurationHistory {
    entries: HashMap<Vec<CellCoord>, ReachMap>,
    fingerprints: HashSet<u64>,
    budget: usize,
    used: usize,
    discards: usize,
}

impl ConfigurationHistory {
    pub(crate) fn new(budget: usize) -> Self {
        Self {
            entries: HashMap::new(),
            fingerprints: HashSet::new(),
            budget,
            used: 0,
            discards: 0,
        }
    }

    /// Number of times the entries were folded into fingerprints.
    pub(crate) const fn discards(&self) -> usize {
        self.discards
    }

    /// Records the keeper region around `player` under `boxes`.
    ///
    /// Returns `false` when the keeper already stood in an explored region of
    /// the same configuration.
    pub(crate) fn admit(&mut self, board: &Board, boxes: &[CellCoord], player: CellCoord) -> bool {
        let is_free = |cell: CellCoord| board.is_free(cell, boxes);

        if self
            .entries
            .get(boxes)
            .is_some_and(|region| region.contains(player))
        {
            return false;
        }

        let mut flooded = None;
        if !self.fingerprints.is_empty() {
            let region = ReachMap::flood(board.rows(), board.columns(), player, is_free);
            if self
                .fingerprints
                .contains(&fingerprint(boxes, region.cells().next()))
            {
                return false;
            }
            flooded = Some(region);
        }

        if let Some(region) = self.entries.get_mut(boxes) {
            let _ = region.extend(player, is_free);
            return true;
        }

        let cost = entry_cost(boxes.len(), board);
        if !self.entries.is_empty() && self.used.saturating_add(cost) > self.budget {
            self.discard(board);
        }

        let region = flooded
            .unwrap_or_else(|| ReachMap::flood(board.rows(), board.columns(), player, is_free));
        let _ = self.entries.insert(boxes.to_vec(), region);
        self.used = self.used.saturating_add(cost);
        true
    }

    fn discard(&mut self, board: &Board) {
        warn!(
            "configuration history reached {} entries ({} bytes), folding into fingerprints",
            self.entries.len(),
            self.used
        );
        for (boxes, region) in self.entries.drain() {
            let mut folded = ReachMap::new(board.rows(), board.columns());
            for cell in region.cells() {
                if folded.extend(cell, |candidate| region.contains(candidate)) > 0 {
                    let _ = self.fingerprints.insert(fingerprint(&boxes, Some(cell)));
                }
            }
        }
        self.used = 0;
        self.discards += 1;
    }
}

/// Hash of a canonical box configuration and the top-left cell of a keeper region.
fn fingerprint(boxes: &[CellCoord], region_origin: Option<CellCoord>) -> u64 {
    let mut hasher = DefaultHasher::new();
    boxes.hash(&mut hasher);
    region_origin.hash(&mut hasher);
    hasher.finish()
}

fn entry_cost(box_count: usize, board: &Board) -> usize {
    let rows = usize::try_from(board.rows()).unwrap_or(usize::MAX);
    let columns = usize::try_from(board.columns()).unwrap_or(usize::MAX);
    ENTRY_OVERHEAD
        .saturating_add(box_count.saturating_mul(size_of::<CellCoord>()))
        .saturating_add(rows.saturating_mul(columns))
}

/// Terminal state reached by [`find_box_path`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FoundPath {
    pub(crate) boxes: Vec<CellCoord>,
    pub(crate) player: CellCoord,
    pub(crate) pull_moves: Vec<Direction>,
}

/// Search state. A node lives as long as the frontier or one of its
/// descendants still refers to it.
#[derive(Debug)]
struct SearchNode {
    boxes: Vec<CellCoord>,
    player: CellCoord,
    parent: Option<Rc<SearchNode>>,
    segment: Vec<Direction>,
}

impl Drop for SearchNode {
    // Unlinks the ancestor chain iteratively so long chains cannot overflow the stack.
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(node) = parent {
            match Rc::try_unwrap(node) {
                Ok(mut inner) => parent = inner.parent.take(),
                Err(_) => break,
            }
        }
    }
}

#[derive(Debug)]
struct FrontierEntry {
    heuristic: i64,
    sequence: u64,
    node: Rc<SearchNode>,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.heuristic == other.heuristic && self.sequence == other.sequence
    }
}

impl Eq for FrontierEntry {}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.heuristic
            .cmp(&other.heuristic)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Scores a configuration: ten per box on a goal, minus the distance to the nearest goal otherwise.
pub(crate) fn heuristic(boxes: &[CellCoord], goals: &[CellCoord]) -> i64 {
    boxes
        .iter()
        .map(|cell| {
            let nearest = goals
                .iter()
                .map(|goal| cell.manhattan_distance(*goal))
                .min()
                .unwrap_or(0);
            if nearest == 0 {
                10
            } else {
                -i64::from(nearest)
            }
        })
        .sum()
}

/// Best-first pull search from the board's box configuration toward its goals.
///
/// The keeper starts on `start`. A state is terminal once every box rests on
/// a goal and the keeper stands on one of `end_positions`. The pull moves of
/// the terminal state are returned in the order they were made. The walk to
/// the first pull is dropped since it has no forward counterpart.
pub(crate) fn find_box_path(
    board: &Board,
    start: CellCoord,
    end_positions: &HashSet<CellCoord>,
    visited: &mut VisitedNodes,
    history: &mut ConfigurationHistory,
) -> Option<FoundPath> {
    let root_boxes = board.boxes().to_vec();
    if !history.admit(board, &root_boxes, start) {
        trace!("start {start} lies in an explored region");
        return None;
    }

    let mut frontier = BinaryHeap::new();
    let mut sequence = 0_u64;
    frontier.push(FrontierEntry {
        heuristic: heuristic(&root_boxes, board.goals()),
        sequence,
        node: Rc::new(SearchNode {
            boxes: root_boxes,
            player: start,
            parent: None,
            segment: Vec::new(),
        }),
    });

    let mut expanded = 0_usize;
    while let Some(entry) = frontier.pop() {
        expanded += 1;
        let current = entry.node;
        if board.is_solved(&current.boxes) && end_positions.contains(&current.player) {
            trace!("terminal state after expanding {expanded} states");
            return Some(reconstruct(&current));
        }

        let is_root = current.parent.is_none();
        let _ = visited.explore(current.player, |cell| board.is_free(cell, &current.boxes));

        for (index, &box_cell) in current.boxes.iter().enumerate() {
            for direction in Direction::ALL {
                let Some(ahead) = board.step(box_cell, direction, 1) else {
                    continue;
                };
                let Some(beyond) = board.step(box_cell, direction, 2) else {
                    continue;
                };
                if !board.is_free(ahead, &current.boxes) || !board.is_free(beyond, &current.boxes) {
                    continue;
                }
                let Some(walk) = visited.walk_to(current.player, ahead) else {
                    continue;
                };

                let mut next_boxes = current.boxes.clone();
                next_boxes[index] = ahead;
                canonicalize(&mut next_boxes);

                if !history.admit(board, &next_boxes, beyond) {
                    continue;
                }

                let mut segment = if is_root {
                    Vec::new()
                } else {
                    walk.into_steps()
                };
                segment.push(direction);

                sequence += 1;
                frontier.push(FrontierEntry {
                    heuristic: heuristic(&next_boxes, board.goals()),
                    sequence,
                    node: Rc::new(SearchNode {
                        boxes: next_boxes,
                        player: beyond,
                        parent: Some(Rc::clone(&current)),
                        segment,
                    }),
                });
            }
        }
    }

    trace!("frontier exhausted after expanding {expanded} states from {start}");
    None
}

fn reconstruct(terminal: &Rc<SearchNode>) -> FoundPath {
    let mut segments = Vec::new();
    let mut cursor = Some(terminal);
    while let Some(node) = cursor {
        segments.push(&node.segment);
        cursor = node.parent.as_ref();
    }

    let pull_moves = segments
        .iter()
        .rev()
        .flat_map(|segment| segment.iter().copied())
        .collect();

    FoundPath {
        boxes: terminal.boxes.clone(),
        player: terminal.player,
        pull_moves,
    }
}
