//! Constants for board geometry, score bounds, and search parameters.
//!
//! Every value here is a default; the runtime knobs live in
//! [`EngineConfig`](crate::engine::EngineConfig) and can be overridden from
//! the command line.

use std::time::Duration;

// =============================================================================
// Board Geometry
// =============================================================================

/// Default board size (NxN). The arbiter plays on 11x11.
pub const DEFAULT_SIZE: usize = 11;

/// Smallest accepted board.
pub const MIN_SIZE: usize = 1;

/// Largest accepted board.
pub const MAX_SIZE: usize = 26;

/// Offsets (row, column) to the six hex neighbours of a cell.
///
/// Transposing each offset yields the same set, which is what makes the
/// connection test symmetric under the transpose-and-relabel mirror.
pub const HEX_DIRECTIONS: [(isize, isize); 6] = [(1, 0), (-1, 0), (0, 1), (0, -1), (-1, 1), (1, -1)];

// =============================================================================
// Scores
// =============================================================================

/// Saturating score of a decided position in alpha-beta (Red positive).
pub const WIN_SCORE: f64 = 1000.0;

/// Floor applied to the opponent's conductance in the raw resistance ratio.
pub const MIN_CONDUCTANCE: f64 = 1e-9;

// =============================================================================
// Alpha-Beta Parameters
// =============================================================================

/// Default search depth in plies.
pub const AB_DEPTH: u32 = 2;

// =============================================================================
// MCTS Parameters
// =============================================================================

/// UCB1 exploration constant.
pub const UCB_EXPLORATION: f64 = 1.5;

/// Default wall-clock budget for one search.
pub const MOVE_TIME: Duration = Duration::from_secs(5);

// =============================================================================
// Strategy Dispatch
// =============================================================================

/// Total clock for one game.
pub const GAME_TIME: Duration = Duration::from_secs(300);

/// Below this much remaining clock only the shortest-path strategy is used.
pub const LOW_CLOCK: Duration = Duration::from_secs(10);

/// At or below this many empty cells the automatic strategy switches to
/// alpha-beta.
pub const ENDGAME_EMPTY_CELLS: usize = 40;

// =============================================================================
// Protocol
// =============================================================================

/// Default arbiter address.
pub const ARBITER_HOST: &str = "127.0.0.1";

/// Default arbiter port.
pub const ARBITER_PORT: u16 = 1234;
