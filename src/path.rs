//! Shortest-connection-distance search.
//!
//! Dijkstra over every cell the opponent does not own, plus two virtual
//! terminals for the player's edges. Stepping onto an empty cell costs one
//! move; stepping onto an own stone is free. The distance between the
//! terminals is the number of stones still needed to connect.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::board::{Board, Coord, Player};

/// Result of one shortest-path run.
struct Search {
    dist: Vec<usize>,
    prev: Vec<Option<usize>>,
    source: usize,
    sink: usize,
}

fn enter_cost(board: &Board, coord: Coord, player: Player) -> Option<usize> {
    match board.get(coord) {
        None => Some(1),
        Some(p) if p == player => Some(0),
        Some(_) => None,
    }
}

fn run(board: &Board, player: Player) -> Search {
    let n = board.size();
    let source = n * n;
    let sink = source + 1;
    let mut dist = vec![usize::MAX; n * n + 2];
    let mut prev = vec![None; n * n + 2];
    let mut frontier = BinaryHeap::new();

    dist[source] = 0;
    frontier.push(Reverse((0, source)));

    while let Some(Reverse((d, u))) = frontier.pop() {
        if d > dist[u] {
            continue; // stale entry
        }
        if u == sink {
            break;
        }

        let mut relax = |v: usize, w: usize, frontier: &mut BinaryHeap<Reverse<(usize, usize)>>| {
            let alt = d + w;
            if alt < dist[v] {
                dist[v] = alt;
                prev[v] = Some(u);
                frontier.push(Reverse((alt, v)));
            }
        };

        if u == source {
            for cell in board.edge(player, false) {
                if let Some(w) = enter_cost(board, cell, player) {
                    relax(cell.0 * n + cell.1, w, &mut frontier);
                }
            }
            continue;
        }

        let here = (u / n, u % n);
        for nb in board.neighbors(here) {
            if let Some(w) = enter_cost(board, nb, player) {
                relax(nb.0 * n + nb.1, w, &mut frontier);
            }
        }
        if board.on_far_edge(here, player) {
            relax(sink, 0, &mut frontier);
        }
    }

    Search {
        dist,
        prev,
        source,
        sink,
    }
}

/// Number of stones `player` still needs to connect their edges.
///
/// `None` when the opponent has already cut every route.
pub fn distance(board: &Board, player: Player) -> Option<usize> {
    let search = run(board, player);
    let d = search.dist[search.sink];
    (d != usize::MAX).then_some(d)
}

/// Empty cells on one shortest connection for `player`, ordered from the
/// near edge to the far edge.
///
/// `Some(vec![])` when already connected, `None` when no route exists. A
/// single returned cell is a win-in-one.
pub fn find_path(board: &Board, player: Player) -> Option<Vec<Coord>> {
    let search = run(board, player);
    if search.dist[search.sink] == usize::MAX {
        return None;
    }

    let n = board.size();
    let mut path = Vec::new();
    let mut cur = search.prev[search.sink];
    while let Some(u) = cur {
        if u == search.source {
            break;
        }
        let coord = (u / n, u % n);
        if board.is_empty_at(coord) {
            path.push(coord);
        }
        cur = search.prev[u];
    }
    path.reverse();
    Some(path)
}

/// The cell completing `player`'s connection this turn, if there is one.
pub fn winning_move(board: &Board, player: Player) -> Option<Coord> {
    match find_path(board, player) {
        Some(path) if path.len() == 1 => Some(path[0]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_board_needs_n_stones() {
        let b = Board::new(5).unwrap();
        assert_eq!(distance(&b, Player::Red), Some(5));
        assert_eq!(find_path(&b, Player::Blue).map(|p| p.len()), Some(5));
    }

    #[test]
    fn test_path_runs_near_to_far() {
        let b = Board::new(4).unwrap();
        let path = find_path(&b, Player::Red).unwrap();
        assert_eq!(path.first().map(|c| c.0), Some(0));
        assert_eq!(path.last().map(|c| c.0), Some(3));

        let path = find_path(&b, Player::Blue).unwrap();
        assert_eq!(path.first().map(|c| c.1), Some(0));
        assert_eq!(path.last().map(|c| c.1), Some(3));
    }

    #[test]
    fn test_own_stones_are_free() {
        let b = board("0R0,0R0,000");
        let path = find_path(&b, Player::Red).unwrap();
        assert_eq!(path.len(), 1);
        assert!(b.is_empty_at(path[0]));
        assert_eq!(path[0].0, 2);
    }

    #[test]
    fn test_single_winning_cell() {
        // Only (2,0) joins the Red chain to the bottom row.
        let b = board("R00,RB0,00B");
        assert_eq!(find_path(&b, Player::Red), Some(vec![(2, 0)]));
        assert_eq!(winning_move(&b, Player::Red), Some((2, 0)));
    }

    #[test]
    fn test_connected_player_needs_nothing() {
        let b = board("0R0,0R0,0R0");
        assert_eq!(find_path(&b, Player::Red), Some(vec![]));
        assert_eq!(distance(&b, Player::Red), Some(0));
        assert_eq!(winning_move(&b, Player::Red), None);
    }

    #[test]
    fn test_blocked_player_has_no_path() {
        let b = board("000,BBB,000");
        assert_eq!(find_path(&b, Player::Red), None);
        assert_eq!(distance(&b, Player::Red), None);
    }

    #[test]
    fn test_opponent_stones_are_avoided() {
        let b = board("0B0,0B0,000");
        let path = find_path(&b, Player::Red).unwrap();
        assert!(path.iter().all(|&c| b.get(c).is_none()));
        assert_eq!(path.len(), 3);
    }
}
