//! Leaf evaluators for alpha-beta.
//!
//! An evaluator scores a non-terminal board from one player's point of view,
//! in `[-1, 1]`: positive favours `player`. Evaluation cannot fail; anything
//! that would need to is a configuration problem caught before search.

use crate::board::{Board, Player};
use crate::path::distance;
use crate::resistance::bounded_evaluate;

pub trait Evaluator {
    fn evaluate(&self, board: &Board, player: Player) -> f64;
}

impl<F> Evaluator for F
where
    F: Fn(&Board, Player) -> f64,
{
    fn evaluate(&self, board: &Board, player: Player) -> f64 {
        self(board, player)
    }
}

/// Conductance ratio of the two resistor networks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResistanceEvaluator;

impl Evaluator for ResistanceEvaluator {
    fn evaluate(&self, board: &Board, player: Player) -> f64 {
        bounded_evaluate(board, player)
    }
}

/// Difference in stones still needed to connect, normalised by their sum.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEvaluator;

impl Evaluator for PathEvaluator {
    fn evaluate(&self, board: &Board, player: Player) -> f64 {
        match (distance(board, player), distance(board, player.opponent())) {
            (None, None) => 0.0,
            (None, Some(_)) => -1.0,
            (Some(_), None) => 1.0,
            (Some(0), Some(0)) => 0.0,
            (Some(mine), Some(theirs)) => {
                (theirs as f64 - mine as f64) / (theirs + mine) as f64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_an_evaluator() {
        let eval = |_: &Board, p: Player| if p == Player::Red { 0.25 } else { -0.25 };
        let b = Board::new(3).unwrap();
        assert_eq!(eval.evaluate(&b, Player::Red), 0.25);
    }

    #[test]
    fn test_path_evaluator_prefers_shorter_route() {
        let b: Board = "0R0,0R0,000".parse().unwrap();
        let red = PathEvaluator.evaluate(&b, Player::Red);
        assert!(red > 0.0);
        assert!((red + PathEvaluator.evaluate(&b, Player::Blue)).abs() < 1e-12);
    }

    #[test]
    fn test_path_evaluator_cut_off() {
        let b: Board = "000,BBB,000".parse().unwrap();
        assert_eq!(PathEvaluator.evaluate(&b, Player::Red), -1.0);
    }

    #[test]
    fn test_resistance_evaluator_in_range() {
        let b: Board = "R000,0B00,0000,000R".parse().unwrap();
        let v = ResistanceEvaluator.evaluate(&b, Player::Blue);
        assert!((-1.0..=1.0).contains(&v));
    }
}
