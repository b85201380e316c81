//! Move generation: win-in-one check, strategy dispatch and fallbacks.
//!
//! The engine owns the configuration, the random source and the game clock.
//! Each call to [`Engine::genmove`] builds a fresh [`Strategy`]; nothing
//! is carried between moves except the clock and the RNG state.

use std::time::{Duration, Instant};

use fastrand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::board::{Board, BoardError, Coord, Player};
use crate::constants::{AB_DEPTH, DEFAULT_SIZE, ENDGAME_EMPTY_CELLS, GAME_TIME, LOW_CLOCK};
use crate::mcts::MctsConfig;
use crate::path::{find_path, winning_move};
use crate::strategy::{
    AlphaBetaStrategy, EvaluatorKind, MctsStrategy, PathStrategy, ResistanceStrategy, Strategy,
    StrategyKind,
};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("position rejected: {0}")]
    Board(#[from] BoardError),
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Expected board size; `None` accepts any size.
    pub board_size: Option<usize>,

    pub strategy: StrategyKind,

    /// Leaf heuristic for alpha-beta.
    pub evaluator: EvaluatorKind,

    /// Alpha-beta depth in plies.
    pub depth: u32,

    /// MCTS settings. `time_budget` doubles as the per-move time limit.
    pub mcts: MctsConfig,

    /// Total clock for the whole game.
    pub game_time: Duration,

    /// Below this remaining clock, `Auto` switches to the path strategy.
    pub low_clock: Duration,

    /// At or below this many empty cells, `Auto` switches to alpha-beta.
    pub endgame_cells: usize,

    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            board_size: Some(DEFAULT_SIZE),
            strategy: StrategyKind::Auto,
            evaluator: EvaluatorKind::Resistance,
            depth: AB_DEPTH,
            mcts: MctsConfig::default(),
            game_time: GAME_TIME,
            low_clock: LOW_CLOCK,
            endgame_cells: ENDGAME_EMPTY_CELLS,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Any board size, capped MCTS, fixed seed.
    pub fn for_testing() -> Self {
        Self {
            board_size: None,
            mcts: MctsConfig::for_testing(),
            seed: Some(0),
            ..Self::default()
        }
    }

    pub fn with_board_size(mut self, size: usize) -> Self {
        self.board_size = Some(size);
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_evaluator(mut self, evaluator: EvaluatorKind) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_mcts(mut self, mcts: MctsConfig) -> Self {
        self.mcts = mcts;
        self
    }

    pub fn with_game_time(mut self, game_time: Duration) -> Self {
        self.game_time = game_time;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

pub struct Engine {
    config: EngineConfig,
    rng: Rng,
    clock_used: Duration,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => Rng::with_seed(seed),
            None => Rng::new(),
        };
        Self {
            config,
            rng,
            clock_used: Duration::ZERO,
        }
    }

    /// Game clock left after the engine's own thinking time.
    pub fn remaining_clock(&self) -> Duration {
        self.config.game_time.saturating_sub(self.clock_used)
    }

    /// Start a new game: restore the full clock and re-target the board size.
    pub fn new_game(&mut self, size: usize) {
        self.clock_used = Duration::ZERO;
        self.config.board_size = Some(size);
    }

    /// Strategy `Auto` resolves to for a position with `empty` free cells.
    pub fn resolve(&self, empty: usize, remaining: Duration) -> StrategyKind {
        match self.config.strategy {
            StrategyKind::Auto if remaining < self.config.low_clock => StrategyKind::Path,
            StrategyKind::Auto if empty <= self.config.endgame_cells => StrategyKind::AlphaBeta,
            StrategyKind::Auto => StrategyKind::Mcts,
            kind => kind,
        }
    }

    fn build(&mut self, kind: StrategyKind, remaining: Duration) -> Box<dyn Strategy> {
        match kind {
            StrategyKind::AlphaBeta => Box::new(AlphaBetaStrategy::new(
                self.config.depth,
                self.config.evaluator.build(),
            )),
            StrategyKind::Mcts => {
                let budget = self.config.mcts.time_budget.min(remaining);
                let config = self.config.mcts.clone().with_time_budget(budget);
                Box::new(MctsStrategy::new(config, Rng::with_seed(self.rng.u64(..))))
            }
            StrategyKind::Resistance => Box::new(ResistanceStrategy),
            StrategyKind::Path | StrategyKind::Auto => Box::new(PathStrategy),
        }
    }

    /// Choose a move for `player`. `Ok(None)` means the board is full.
    ///
    /// A one-move connection is always played. Otherwise the configured
    /// strategy decides; if it comes back empty-handed the first cell of the
    /// shortest path is used, then the first empty cell.
    pub fn genmove(
        &mut self,
        board: &Board,
        player: Player,
        remaining: Duration,
    ) -> Result<Option<Coord>, EngineError> {
        if let Some(expected) = self.config.board_size {
            board.expect_size(expected)?;
        }

        let empty = board.empty_cells();
        let Some(&first_empty) = empty.first() else {
            debug!("board is full, no move");
            return Ok(None);
        };

        let start = Instant::now();
        if let Some(mv) = winning_move(board, player) {
            info!(%player, mv = ?mv, "playing winning move");
            self.clock_used += start.elapsed();
            return Ok(Some(mv));
        }

        let kind = self.resolve(empty.len(), remaining);
        let mut strategy = self.build(kind, remaining);
        let chosen = strategy
            .choose_move(board, player)
            .filter(|&mv| board.is_empty_at(mv));

        let mv = chosen
            .or_else(|| find_path(board, player).and_then(|p| p.first().copied()))
            .unwrap_or(first_empty);

        let elapsed = start.elapsed();
        self.clock_used += elapsed;
        info!(
            %player,
            strategy = strategy.name(),
            fallback = chosen.is_none(),
            mv = ?mv,
            empty = empty.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            remaining_ms = self.remaining_clock().as_millis() as u64,
            "genmove"
        );
        Ok(Some(mv))
    }

    /// [`genmove`](Self::genmove) against the engine's own clock.
    pub fn genmove_clocked(&mut self, board: &Board, player: Player) -> Result<Option<Coord>, EngineError> {
        let remaining = self.remaining_clock();
        self.genmove(board, player, remaining)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(s: &str) -> Board {
        s.parse().unwrap()
    }

    fn engine(kind: StrategyKind) -> Engine {
        Engine::new(EngineConfig::for_testing().with_strategy(kind))
    }

    #[test]
    fn test_full_board_has_no_move() {
        let b = board("RBR,BRB,RRB");
        let mut e = engine(StrategyKind::Auto);
        assert_eq!(e.genmove(&b, Player::Blue, GAME_TIME).unwrap(), None);
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let mut e = Engine::new(EngineConfig::for_testing().with_board_size(5));
        let b = Board::new(3).unwrap();
        let err = e.genmove(&b, Player::Red, GAME_TIME).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Board(BoardError::WrongSize { actual: 3, expected: 5 })
        ));
    }

    #[test]
    fn test_forced_win_overrides_strategy() {
        let b = board("R00,RB0,00B");
        for kind in [StrategyKind::Mcts, StrategyKind::Resistance, StrategyKind::Path] {
            let mut e = engine(kind);
            assert_eq!(e.genmove(&b, Player::Red, GAME_TIME).unwrap(), Some((2, 0)));
        }
    }

    #[test]
    fn test_auto_resolution() {
        let e = engine(StrategyKind::Auto);
        assert_eq!(e.resolve(100, GAME_TIME), StrategyKind::Mcts);
        assert_eq!(e.resolve(ENDGAME_EMPTY_CELLS, GAME_TIME), StrategyKind::AlphaBeta);
        assert_eq!(e.resolve(100, Duration::from_secs(1)), StrategyKind::Path);
        assert_eq!(engine(StrategyKind::Mcts).resolve(3, Duration::ZERO), StrategyKind::Mcts);
    }

    #[test]
    fn test_cut_off_player_still_moves() {
        // Blue has no route left; path strategy returns nothing.
        let b = board("0R0,0R0,0R0");
        let mut e = engine(StrategyKind::Path);
        let mv = e.genmove(&b, Player::Blue, GAME_TIME).unwrap();
        assert_eq!(mv, Some((0, 0)));
    }

    #[test]
    fn test_moves_are_legal_for_every_strategy() {
        let b = board("R0000,0B000,00R00,000B0,00000");
        for kind in [
            StrategyKind::Auto,
            StrategyKind::AlphaBeta,
            StrategyKind::Mcts,
            StrategyKind::Resistance,
            StrategyKind::Path,
        ] {
            let mut e = Engine::new(
                EngineConfig::for_testing()
                    .with_strategy(kind)
                    .with_evaluator(EvaluatorKind::Path)
                    .with_depth(1),
            );
            let mv = e.genmove(&b, Player::Red, GAME_TIME).unwrap();
            assert!(mv.is_some_and(|c| b.is_empty_at(c)), "{kind:?} gave {mv:?}");
        }
    }

    #[test]
    fn test_clock_is_consumed() {
        let mut e = engine(StrategyKind::Path);
        let b = Board::new(4).unwrap();
        e.genmove_clocked(&b, Player::Red).unwrap();
        assert!(e.remaining_clock() <= GAME_TIME);
        e.new_game(4);
        assert_eq!(e.remaining_clock(), GAME_TIME);
    }
}
