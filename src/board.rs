//! Hex board representation and the connectivity oracle.
//!
//! The board is an NxN grid in row-major order. Red (player A) connects row 0
//! to row N-1; Blue (player B) connects column 0 to column N-1. Cells only
//! ever go from empty to owned: there is no API that clears a cell.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::{HEX_DIRECTIONS, MAX_SIZE, MIN_SIZE};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Player {
    /// Player A: top edge (row 0) to bottom edge (row N-1).
    Red,
    /// Player B: left edge (column 0) to right edge (column N-1).
    Blue,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::Red => Player::Blue,
            Player::Blue => Player::Red,
        }
    }

    /// Single-letter protocol code.
    pub fn letter(self) -> char {
        match self {
            Player::Red => 'R',
            Player::Blue => 'B',
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'R' => Some(Player::Red),
            'B' => Some(Player::Blue),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A cell is either empty or owned by one player.
pub type Cell = Option<Player>;

/// (row, column).
pub type Coord = (usize, usize);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board size {0} outside {MIN_SIZE}..={MAX_SIZE}")]
    BadSize(usize),
    #[error("row {row} has {len} cells, expected {expected}")]
    NotSquare { row: usize, len: usize, expected: usize },
    #[error("board is {actual}x{actual}, expected {expected}x{expected}")]
    WrongSize { actual: usize, expected: usize },
    #[error("unknown cell character {0:?}")]
    UnknownCell(char),
    #[error("coordinate ({0}, {1}) is off the board")]
    OutOfBounds(usize, usize),
    #[error("cell ({0}, {1}) is already taken")]
    Occupied(usize, usize),
    #[error("malformed coordinate {0:?}")]
    BadCoord(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    pub fn new(size: usize) -> Result<Self, BoardError> {
        check_size(size)?;
        Ok(Self {
            size,
            cells: vec![None; size * size],
        })
    }

    /// Build a board from rows, rejecting anything that is not square.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, BoardError> {
        let size = rows.len();
        check_size(size)?;
        let mut cells = Vec::with_capacity(size * size);
        for (row, line) in rows.into_iter().enumerate() {
            if line.len() != size {
                return Err(BoardError::NotSquare {
                    row,
                    len: line.len(),
                    expected: size,
                });
            }
            cells.extend(line);
        }
        Ok(Self { size, cells })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn idx(&self, (r, c): Coord) -> usize {
        r * self.size + c
    }

    #[inline]
    pub fn in_bounds(&self, (r, c): Coord) -> bool {
        r < self.size && c < self.size
    }

    /// Owner of a cell; `None` for empty or off-board coordinates.
    pub fn get(&self, coord: Coord) -> Cell {
        if !self.in_bounds(coord) {
            return None;
        }
        self.cells[self.idx(coord)]
    }

    #[inline]
    pub fn is_empty_at(&self, coord: Coord) -> bool {
        self.in_bounds(coord) && self.cells[self.idx(coord)].is_none()
    }

    /// Claim an empty cell.
    pub fn place(&mut self, coord: Coord, player: Player) -> Result<(), BoardError> {
        if !self.in_bounds(coord) {
            return Err(BoardError::OutOfBounds(coord.0, coord.1));
        }
        let i = self.idx(coord);
        if self.cells[i].is_some() {
            return Err(BoardError::Occupied(coord.0, coord.1));
        }
        self.cells[i] = Some(player);
        Ok(())
    }

    /// Copy of the board with `coord` claimed by `player`.
    ///
    /// Callers guarantee the cell is empty; search code only ever passes
    /// coordinates taken from [`Board::empty_cells`].
    pub(crate) fn with_stone(&self, coord: Coord, player: Player) -> Board {
        let mut next = self.clone();
        next.claim(coord, player);
        next
    }

    /// Claim a cell known to be empty and on the board.
    pub(crate) fn claim(&mut self, coord: Coord, player: Player) {
        let i = self.idx(coord);
        debug_assert!(self.cells[i].is_none());
        self.cells[i] = Some(player);
    }

    /// Fail unless the board is `expected`x`expected`.
    pub fn expect_size(&self, expected: usize) -> Result<(), BoardError> {
        if self.size != expected {
            return Err(BoardError::WrongSize {
                actual: self.size,
                expected,
            });
        }
        Ok(())
    }

    /// Empty cells in row-major order.
    ///
    /// Searches rely on this order for reproducible tie-breaking.
    pub fn empty_cells(&self) -> Vec<Coord> {
        self.coords().filter(|&c| self.is_empty_at(c)).collect()
    }

    /// All coordinates in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + use<> {
        let s = self.size;
        (0..s).flat_map(move |r| (0..s).map(move |c| (r, c)))
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn stone_count(&self, player: Player) -> usize {
        self.cells.iter().filter(|&&c| c == Some(player)).count()
    }

    /// Side to move assuming Red opened and nobody swapped.
    pub fn to_move(&self) -> Player {
        if self.stone_count(Player::Red) > self.stone_count(Player::Blue) {
            Player::Blue
        } else {
            Player::Red
        }
    }

    /// In-bounds hex neighbours of a cell.
    pub fn neighbors(&self, (r, c): Coord) -> impl Iterator<Item = Coord> + use<> {
        let s = self.size as isize;
        HEX_DIRECTIONS.into_iter().filter_map(move |(dr, dc)| {
            let nr = r as isize + dr;
            let nc = c as isize + dc;
            (nr >= 0 && nr < s && nc >= 0 && nc < s).then_some((nr as usize, nc as usize))
        })
    }

    /// Whether `coord` lies on `player`'s first edge (row 0 / column 0).
    pub fn on_near_edge(&self, (r, c): Coord, player: Player) -> bool {
        match player {
            Player::Red => r == 0,
            Player::Blue => c == 0,
        }
    }

    /// Whether `coord` lies on `player`'s second edge (row N-1 / column N-1).
    pub fn on_far_edge(&self, (r, c): Coord, player: Player) -> bool {
        let last = self.size - 1;
        match player {
            Player::Red => r == last,
            Player::Blue => c == last,
        }
    }

    /// The N cells of `player`'s near (`far == false`) or far edge.
    pub fn edge(&self, player: Player, far: bool) -> impl Iterator<Item = Coord> + use<> {
        let s = self.size;
        let line = if far { s - 1 } else { 0 };
        (0..s).map(move |k| match player {
            Player::Red => (line, k),
            Player::Blue => (k, line),
        })
    }

    /// Every cell of `player`'s chain containing `start`, found with an
    /// explicit stack. Empty when `start` is not owned by `player` or was
    /// already visited; sharing `visited` walks each chain at most once.
    pub(crate) fn collect_group(&self, start: Coord, player: Player, visited: &mut [bool]) -> Vec<Coord> {
        let mut out = Vec::new();
        if self.get(start) != Some(player) || visited[self.idx(start)] {
            return out;
        }
        let mut stack = vec![start];
        visited[self.idx(start)] = true;
        while let Some(cur) = stack.pop() {
            out.push(cur);
            for n in self.neighbors(cur) {
                let ni = self.idx(n);
                if !visited[ni] && self.cells[ni] == Some(player) {
                    visited[ni] = true;
                    stack.push(n);
                }
            }
        }
        out
    }

    /// Whether `player` has a chain joining their two edges.
    pub fn is_connected(&self, player: Player) -> bool {
        // No stone on either edge means no chain can span it.
        let near_owned = self.edge(player, false).any(|c| self.get(c) == Some(player));
        let far_owned = self.edge(player, true).any(|c| self.get(c) == Some(player));
        if !near_owned || !far_owned {
            return false;
        }

        let mut visited = vec![false; self.cells.len()];
        for start in self.edge(player, false) {
            let chain = self.collect_group(start, player, &mut visited);
            if chain.iter().any(|&c| self.on_far_edge(c, player)) {
                return true;
            }
        }
        false
    }

    /// The winner, if either player has completed a connection.
    pub fn check_connection(&self) -> Option<Player> {
        [Player::Red, Player::Blue]
            .into_iter()
            .find(|&p| self.is_connected(p))
    }

    /// Transpose the grid and swap owners. Maps a Red connection onto a Blue
    /// one and vice versa.
    pub fn mirror_transpose(&self) -> Board {
        let mut out = self.clone();
        for (r, c) in self.coords() {
            let j = out.idx((c, r));
            out.cells[j] = self.get((r, c)).map(Player::opponent);
        }
        out
    }

    /// Rows joined by `,`, cells as `0`, `R`, `B`.
    pub fn to_protocol_string(&self) -> String {
        (0..self.size)
            .map(|r| {
                (0..self.size)
                    .map(|c| cell_char(self.get((r, c)), '0'))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn check_size(size: usize) -> Result<(), BoardError> {
    if !(MIN_SIZE..=MAX_SIZE).contains(&size) {
        return Err(BoardError::BadSize(size));
    }
    Ok(())
}

fn cell_char(cell: Cell, empty: char) -> char {
    match cell {
        Some(p) => p.letter(),
        None => empty,
    }
}

/// Parse `"r,c"` into a coordinate.
pub fn parse_coord(s: &str) -> Result<Coord, BoardError> {
    let bad = || BoardError::BadCoord(s.to_string());
    let (r, c) = s.trim().split_once(',').ok_or_else(bad)?;
    let r = r.trim().parse().map_err(|_| bad())?;
    let c = c.trim().parse().map_err(|_| bad())?;
    Ok((r, c))
}

/// Render a coordinate as `"r,c"`.
pub fn str_coord((r, c): Coord) -> String {
    format!("{r},{c}")
}

impl FromStr for Board {
    type Err = BoardError;

    /// Rows separated by `,` or newlines; `0`/`.` empty, `R`/`B` owned.
    /// Whitespace inside a row is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut rows = Vec::new();
        for line in s.split([',', '\n']) {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut row = Vec::with_capacity(line.len());
            for ch in line.chars().filter(|ch| !ch.is_whitespace()) {
                let cell = match ch {
                    '0' | '.' => None,
                    other => Some(Player::from_letter(other).ok_or(BoardError::UnknownCell(other))?),
                };
                row.push(cell);
            }
            rows.push(row);
        }
        Board::from_rows(rows)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.size {
            write!(f, "{:indent$}", "", indent = r)?;
            for c in 0..self.size {
                write!(f, "{} ", cell_char(self.get((r, c)), '.'))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    #[test]
    fn test_neighbors_corner_and_center() {
        let b = Board::new(3).unwrap();
        let mut corner: Vec<_> = b.neighbors((0, 0)).collect();
        corner.sort();
        assert_eq!(corner, vec![(0, 1), (1, 0)]);

        let center: Vec<_> = b.neighbors((1, 1)).collect();
        assert_eq!(center.len(), 6);
        assert!(!center.contains(&(0, 0)));
        assert!(!center.contains(&(2, 2)));
    }

    #[test]
    fn test_empty_cells_row_major() {
        let b = board("R0B,000,0B0");
        assert_eq!(
            b.empty_cells(),
            vec![(0, 1), (1, 0), (1, 1), (1, 2), (2, 0), (2, 2)]
        );
    }

    #[test]
    fn test_place_rejects_occupied_and_out_of_bounds() {
        let mut b = Board::new(3).unwrap();
        b.place((1, 1), Player::Red).unwrap();
        assert_eq!(b.place((1, 1), Player::Blue), Err(BoardError::Occupied(1, 1)));
        assert_eq!(b.place((3, 0), Player::Blue), Err(BoardError::OutOfBounds(3, 0)));
        assert_eq!(b.get((1, 1)), Some(Player::Red));
    }

    #[test]
    fn test_parse_rejects_non_square() {
        assert!(matches!(
            "000,00,000".parse::<Board>(),
            Err(BoardError::NotSquare { row: 1, len: 2, expected: 3 })
        ));
        assert_eq!("0X0".parse::<Board>(), Err(BoardError::UnknownCell('X')));
        assert_eq!("".parse::<Board>(), Err(BoardError::BadSize(0)));
    }

    #[test]
    fn test_display_parses_back() {
        let b = board("R0B,0R0,B00");
        let again: Board = b.to_string().parse().unwrap();
        assert_eq!(b, again);
        assert_eq!(b.to_protocol_string(), "R0B,0R0,B00");
    }

    #[test]
    fn test_empty_board_has_no_winner() {
        assert_eq!(Board::new(5).unwrap().check_connection(), None);
    }

    #[test]
    fn test_red_column_wins() {
        let b = board("0R0,0R0,0R0");
        assert_eq!(b.check_connection(), Some(Player::Red));
    }

    #[test]
    fn test_red_diagonal_chain_uses_hex_adjacency() {
        // (0,2) -> (1,1) -> (2,0) is connected via the (+1,-1) offset.
        let b = board("00R,0R0,R00");
        assert_eq!(b.check_connection(), Some(Player::Red));

        // The other diagonal is not hex-adjacent.
        let b = board("R00,0R0,00R");
        assert_eq!(b.check_connection(), None);
    }

    #[test]
    fn test_blue_row_wins() {
        let b = board("000,BBB,000");
        assert_eq!(b.check_connection(), Some(Player::Blue));
    }

    #[test]
    fn test_check_connection_leaves_board_untouched() {
        let b = board("0R0,0R0,0R0");
        let before = b.clone();
        let _ = b.check_connection();
        assert_eq!(b, before);
    }

    #[test]
    fn test_mirror_transpose_relabels() {
        let b = board("R00,0B0,00R");
        let m = b.mirror_transpose();
        assert_eq!(m.get((0, 0)), Some(Player::Blue));
        assert_eq!(m.get((1, 1)), Some(Player::Red));
        assert_eq!(m.mirror_transpose(), b);
    }

    #[test]
    fn test_to_move_and_counts() {
        let b = board("R00,0B0,00R");
        assert_eq!(b.stone_count(Player::Red), 2);
        assert_eq!(b.to_move(), Player::Blue);
        assert!(!b.is_full());
    }

    #[test]
    fn test_parse_coord() {
        assert_eq!(parse_coord("3,4"), Ok((3, 4)));
        assert_eq!(parse_coord(" 10 , 0 "), Ok((10, 0)));
        assert!(parse_coord("3;4").is_err());
        assert_eq!(str_coord((2, 7)), "2,7");
    }
}
