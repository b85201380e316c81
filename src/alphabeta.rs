//! Depth-bounded minimax with alpha-beta pruning.
//!
//! Scores are from Red's point of view: Red maximises, Blue minimises. A
//! decided position scores `±WIN_SCORE`; anything else at the horizon is
//! handed to the leaf [`Evaluator`]. Moves are tried in row-major order and
//! the first move reaching the best score is kept, so results are
//! reproducible for a deterministic evaluator.

use std::time::Instant;

use tracing::debug;

use crate::board::{Board, Coord, Player};
use crate::constants::WIN_SCORE;
use crate::evaluator::Evaluator;

/// Outcome of one search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Minimax value from Red's point of view.
    pub value: f64,
    /// Best move for the side to move; `None` when there is none.
    pub best: Option<Coord>,
    /// Positions visited.
    pub nodes: u64,
}

pub struct AlphaBeta<'e, E: Evaluator + ?Sized> {
    evaluator: &'e E,
    nodes: u64,
}

/// Convert a score for `player` into a score for Red.
#[inline]
fn for_red(player: Player, value: f64) -> f64 {
    match player {
        Player::Red => value,
        Player::Blue => -value,
    }
}

fn win_value(winner: Player) -> f64 {
    for_red(winner, WIN_SCORE)
}

impl<'e, E: Evaluator + ?Sized> AlphaBeta<'e, E> {
    pub fn new(evaluator: &'e E) -> Self {
        Self { evaluator, nodes: 0 }
    }

    /// Search `depth` plies from `board` with `player` to move.
    pub fn search(&mut self, board: &Board, player: Player, depth: u32) -> SearchResult {
        let start = Instant::now();
        self.nodes = 0;
        let (value, best) = self.alpha_beta(board, player, depth, f64::NEG_INFINITY, f64::INFINITY);
        debug!(
            depth,
            nodes = self.nodes,
            value,
            best = ?best,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "alpha-beta finished"
        );
        SearchResult {
            value,
            best,
            nodes: self.nodes,
        }
    }

    fn alpha_beta(
        &mut self,
        board: &Board,
        player: Player,
        depth: u32,
        mut alpha: f64,
        mut beta: f64,
    ) -> (f64, Option<Coord>) {
        self.nodes += 1;

        if let Some(winner) = board.check_connection() {
            return (win_value(winner), None);
        }
        let moves = board.empty_cells();
        if depth == 0 || moves.is_empty() {
            let value = for_red(player, self.evaluator.evaluate(board, player));
            return (value, None);
        }

        let maximising = player == Player::Red;
        let mut best_value = if maximising {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        let mut best_move = None;

        for mv in moves {
            let child = board.with_stone(mv, player);
            let (value, _) = self.alpha_beta(&child, player.opponent(), depth - 1, alpha, beta);

            if maximising {
                if best_move.is_none() || value > best_value {
                    best_value = value;
                    best_move = Some(mv);
                }
                alpha = alpha.max(value);
            } else {
                if best_move.is_none() || value < best_value {
                    best_value = value;
                    best_move = Some(mv);
                }
                beta = beta.min(value);
            }
            if alpha >= beta {
                break;
            }
        }

        (best_value, best_move)
    }
}

/// One-shot search with a borrowed evaluator.
pub fn search<E: Evaluator + ?Sized>(board: &Board, player: Player, depth: u32, evaluator: &E) -> SearchResult {
    AlphaBeta::new(evaluator).search(board, player, depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::PathEvaluator;

    fn flat(_: &Board, _: Player) -> f64 {
        0.0
    }

    #[test]
    fn test_takes_immediate_win() {
        let b: Board = "R00,RB0,00B".parse().unwrap();
        let result = search(&b, Player::Red, 1, &flat);
        assert_eq!(result.best, Some((2, 0)));
        assert_eq!(result.value, WIN_SCORE);
    }

    #[test]
    fn test_blue_blocks_forced_loss() {
        // Red threatens (2,0); Blue must take it.
        let b: Board = "R00,RB0,000".parse().unwrap();
        let result = search(&b, Player::Blue, 2, &flat);
        assert_eq!(result.best, Some((2, 0)));
    }

    #[test]
    fn test_decided_board_returns_no_move() {
        let b: Board = "0R0,0R0,0R0".parse().unwrap();
        let result = search(&b, Player::Blue, 3, &flat);
        assert_eq!(result.best, None);
        assert_eq!(result.value, WIN_SCORE);
    }

    #[test]
    fn test_depth_zero_uses_evaluator_orientation() {
        let b = Board::new(3).unwrap();
        let red_good = |_: &Board, p: Player| if p == Player::Red { 0.5 } else { -0.5 };
        assert_eq!(search(&b, Player::Red, 0, &red_good).value, 0.5);
        assert_eq!(search(&b, Player::Blue, 0, &red_good).value, 0.5);
    }

    #[test]
    fn test_ties_keep_first_move() {
        let b = Board::new(3).unwrap();
        let result = search(&b, Player::Red, 1, &flat);
        assert_eq!(result.best, Some((0, 0)));
    }

    #[test]
    fn test_pruning_visits_fewer_nodes_than_full_tree() {
        let b = Board::new(3).unwrap();
        let result = search(&b, Player::Red, 3, &PathEvaluator);
        // 1 + 9 + 9*8 + 9*8*7 positions without pruning.
        assert!(result.nodes < 1 + 9 + 72 + 504);
        assert!(result.best.is_some());
    }
}
