//! Hex-Rust: a move-selection engine for the game of Hex.
//!
//! Given an NxN board and the side to move, the engine picks a cell. Red
//! connects top to bottom, Blue connects left to right.
//!
//! ## Modules
//!
//! - [`constants`] - Default board size, search budgets, hex neighbour offsets
//! - [`board`] - Board state, text codec and the connectivity oracle
//! - [`path`] - Shortest connection distance (moves still needed to win)
//! - [`linalg`] - Dense linear solver used by the resistance model
//! - [`resistance`] - Electrical-network evaluation and move ranking
//! - [`evaluator`] - Leaf heuristics for alpha-beta
//! - [`alphabeta`] - Depth-bounded minimax with alpha-beta pruning
//! - [`playout`] - Random board fills used as MCTS simulations
//! - [`mcts`] - Monte Carlo Tree Search with UCB1
//! - [`strategy`] - Interchangeable searches behind one trait
//! - [`engine`] - Win-in-one check, strategy dispatch, game clock
//! - [`protocol`] - Line protocol spoken with the game arbiter
//!
//! ## Example
//!
//! ```
//! use hex_rust::board::{Board, Player};
//! use hex_rust::engine::{Engine, EngineConfig};
//! use hex_rust::strategy::StrategyKind;
//!
//! // Red needs one more stone at (2,0) to join top and bottom.
//! let board: Board = "R00,RB0,00B".parse().unwrap();
//!
//! let config = EngineConfig::for_testing().with_strategy(StrategyKind::Mcts);
//! let mut engine = Engine::new(config);
//! let mv = engine.genmove_clocked(&board, Player::Red).unwrap();
//! assert_eq!(mv, Some((2, 0)));
//! ```

pub mod alphabeta;
pub mod board;
pub mod constants;
pub mod engine;
pub mod evaluator;
pub mod linalg;
pub mod mcts;
pub mod path;
pub mod playout;
pub mod protocol;
pub mod resistance;
pub mod strategy;
