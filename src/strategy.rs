//! Move-selection strategies.
//!
//! Every search sits behind [`Strategy`] so the engine picks one by
//! configuration instead of branching on it.

use clap::ValueEnum;
use fastrand::Rng;

use crate::alphabeta;
use crate::board::{Board, Coord, Player};
use crate::evaluator::{Evaluator, PathEvaluator, ResistanceEvaluator};
use crate::mcts::{self, MctsConfig};
use crate::path::find_path;
use crate::resistance;

pub trait Strategy {
    fn name(&self) -> &'static str;

    /// Pick a cell for `player`. `None` when the strategy has nothing to
    /// offer; the engine falls back in that case.
    fn choose_move(&mut self, board: &Board, player: Player) -> Option<Coord>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StrategyKind {
    /// Decide per move from the clock and the number of empty cells.
    #[default]
    Auto,
    AlphaBeta,
    Mcts,
    /// Single-ply resistance ranking.
    Resistance,
    /// First cell of the shortest connection.
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EvaluatorKind {
    #[default]
    Resistance,
    Path,
}

impl EvaluatorKind {
    pub fn build(self) -> Box<dyn Evaluator> {
        match self {
            EvaluatorKind::Resistance => Box::new(ResistanceEvaluator),
            EvaluatorKind::Path => Box::new(PathEvaluator),
        }
    }
}

pub struct AlphaBetaStrategy {
    depth: u32,
    evaluator: Box<dyn Evaluator>,
}

impl AlphaBetaStrategy {
    pub fn new(depth: u32, evaluator: Box<dyn Evaluator>) -> Self {
        Self { depth, evaluator }
    }
}

impl Strategy for AlphaBetaStrategy {
    fn name(&self) -> &'static str {
        "alpha-beta"
    }

    fn choose_move(&mut self, board: &Board, player: Player) -> Option<Coord> {
        alphabeta::search(board, player, self.depth, self.evaluator.as_ref()).best
    }
}

pub struct MctsStrategy {
    config: MctsConfig,
    rng: Rng,
}

impl MctsStrategy {
    pub fn new(config: MctsConfig, rng: Rng) -> Self {
        Self { config, rng }
    }
}

impl Strategy for MctsStrategy {
    fn name(&self) -> &'static str {
        "mcts"
    }

    fn choose_move(&mut self, board: &Board, player: Player) -> Option<Coord> {
        mcts::search(board, player, &self.config, &mut self.rng).best
    }
}

#[derive(Debug, Default)]
pub struct ResistanceStrategy;

impl Strategy for ResistanceStrategy {
    fn name(&self) -> &'static str {
        "resistance"
    }

    fn choose_move(&mut self, board: &Board, player: Player) -> Option<Coord> {
        resistance::best_move(board, player)
    }
}

#[derive(Debug, Default)]
pub struct PathStrategy;

impl Strategy for PathStrategy {
    fn name(&self) -> &'static str {
        "path"
    }

    fn choose_move(&mut self, board: &Board, player: Player) -> Option<Coord> {
        find_path(board, player).and_then(|path| path.first().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    fn all_strategies() -> Vec<Box<dyn Strategy>> {
        vec![
            Box::new(AlphaBetaStrategy::new(2, EvaluatorKind::Path.build())),
            Box::new(MctsStrategy::new(MctsConfig::for_testing(), Rng::with_seed(9))),
            Box::new(ResistanceStrategy),
            Box::new(PathStrategy),
        ]
    }

    #[test]
    fn test_every_strategy_returns_an_empty_cell() {
        let b = board("R000,0B00,00R0,000B");
        for mut s in all_strategies() {
            let mv = s.choose_move(&b, Player::Red);
            assert!(mv.is_some_and(|c| b.is_empty_at(c)), "{} gave {mv:?}", s.name());
        }
    }

    #[test]
    fn test_every_strategy_finds_win_in_one() {
        let b = board("R00,RB0,00B");
        for mut s in all_strategies() {
            assert_eq!(s.choose_move(&b, Player::Red), Some((2, 0)), "{}", s.name());
        }
    }

    #[test]
    fn test_path_strategy_cut_off() {
        let b = board("000,BBB,000");
        assert_eq!(PathStrategy.choose_move(&b, Player::Red), None);
    }
}
