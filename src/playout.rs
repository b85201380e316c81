//! Random playouts for position evaluation.
//!
//! Rather than playing move by move with a win test after each stone, a
//! playout fills every empty cell at once: the cells are shuffled and dealt
//! alternately to the two players. A filled hex board always has exactly one
//! connection, and which one depends only on the final stone pattern, so a
//! single connection test at the end decides the game.

use fastrand::Rng;

use crate::board::{Board, Player};

/// Fill `board`'s empty cells in random order, alternating owners starting
/// with `first`, and report who is connected on the filled board.
pub fn random_fill(board: &Board, first: Player, rng: &mut Rng) -> Option<Player> {
    let mut cells = board.empty_cells();
    if cells.is_empty() {
        return board.check_connection();
    }
    rng.shuffle(&mut cells);

    let mut filled = board.clone();
    let mut owner = first;
    for cell in cells {
        filled.claim(cell, owner);
        owner = owner.opponent();
    }
    filled.check_connection()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_board_always_has_a_winner() {
        let mut rng = Rng::with_seed(7);
        let b = Board::new(5).unwrap();
        for _ in 0..50 {
            assert!(random_fill(&b, Player::Red, &mut rng).is_some());
        }
    }

    #[test]
    fn test_decided_board_keeps_its_winner() {
        let mut rng = Rng::with_seed(1);
        let b: Board = "0R0,0R0,0R0".parse().unwrap();
        for _ in 0..10 {
            assert_eq!(random_fill(&b, Player::Blue, &mut rng), Some(Player::Red));
        }
    }

    #[test]
    fn test_same_seed_same_outcomes() {
        let b: Board = "R000,0B00,0000,0000".parse().unwrap();
        let run = |seed| {
            let mut rng = Rng::with_seed(seed);
            (0..20)
                .map(|_| random_fill(&b, Player::Red, &mut rng))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_does_not_touch_input() {
        let mut rng = Rng::with_seed(3);
        let b = Board::new(3).unwrap();
        random_fill(&b, Player::Red, &mut rng);
        assert_eq!(b.empty_cells().len(), 9);
    }
}
