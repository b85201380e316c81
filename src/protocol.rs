//! Line protocol spoken with the game arbiter.
//!
//! Every message is one line of `;`-separated fields:
//!
//! - `START;<size>;<R|B>` - new game, our colour
//! - `CHANGE;<r,c|SWAP>;<board>;<R|B|END>` - last move, full board, side to move
//! - `END;...` - game over
//!
//! We answer with `<r>,<c>` or `SWAP`, and only when it is our turn. The
//! board sent with each `CHANGE` replaces whatever we tracked locally.
//!
//! ## Example
//!
//! ```ignore
//! use hex_rust::engine::Engine;
//! use hex_rust::protocol::{Session, SwapPolicy};
//! let mut session = Session::new(Engine::default(), SwapPolicy::Never);
//! session.run(std::io::stdin().lock(), std::io::stdout())?;
//! ```

use std::fmt;
use std::io::{self, BufRead, Write};

use clap::ValueEnum;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::board::{Board, BoardError, Coord, Player, parse_coord, str_coord};
use crate::engine::{Engine, EngineError};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message {0:?}")]
    Malformed(String),
    #[error("unknown colour {0:?}")]
    UnknownColour(String),
    #[error("CHANGE received before START")]
    NotStarted,
    #[error("no legal move left for {0}")]
    NoMove(Player),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// The move reported in a `CHANGE` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastMove {
    Swap,
    Cell(Coord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Start { size: usize, colour: Player },
    /// `next` is `None` once the arbiter declares the game over.
    Change {
        last: LastMove,
        board: Board,
        next: Option<Player>,
    },
    End,
}

impl Message {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let malformed = || ProtocolError::Malformed(line.to_string());
        let fields: Vec<&str> = line.trim().split(';').map(str::trim).collect();

        match fields.as_slice() {
            ["START", size, colour, ..] => Ok(Message::Start {
                size: size.parse().map_err(|_| malformed())?,
                colour: parse_colour(colour)?,
            }),
            ["CHANGE", last, board, next, ..] => {
                let last = if last.eq_ignore_ascii_case("SWAP") {
                    LastMove::Swap
                } else {
                    LastMove::Cell(parse_coord(last)?)
                };
                let next = if next.eq_ignore_ascii_case("END") {
                    None
                } else {
                    Some(parse_colour(next)?)
                };
                Ok(Message::Change {
                    last,
                    board: board.parse()?,
                    next,
                })
            }
            ["END", ..] => Ok(Message::End),
            _ => Err(malformed()),
        }
    }

    /// True when no further messages will follow.
    pub fn ends_game(&self) -> bool {
        matches!(self, Message::End | Message::Change { next: None, .. })
    }
}

fn parse_colour(s: &str) -> Result<Player, ProtocolError> {
    let mut chars = s.chars();
    match (chars.next().and_then(Player::from_letter), chars.next()) {
        (Some(player), None) => Ok(player),
        _ => Err(ProtocolError::UnknownColour(s.to_string())),
    }
}

/// What we send back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Move(Coord),
    Swap,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Move(coord) => f.write_str(&str_coord(*coord)),
            Reply::Swap => f.write_str("SWAP"),
        }
    }
}

/// When to take over the opponent's opening stone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SwapPolicy {
    #[default]
    Never,
    /// Swap when the opening stone is at least two cells from every edge.
    Central,
}

impl SwapPolicy {
    pub fn should_swap(self, size: usize, (r, c): Coord) -> bool {
        match self {
            SwapPolicy::Never => false,
            SwapPolicy::Central => {
                let central = |x: usize| x >= 2 && x + 2 < size;
                central(r) && central(c)
            }
        }
    }
}

/// One game against the arbiter.
pub struct Session {
    engine: Engine,
    swap: SwapPolicy,
    colour: Option<Player>,
    board: Option<Board>,
}

impl Session {
    pub fn new(engine: Engine, swap: SwapPolicy) -> Self {
        Self {
            engine,
            swap,
            colour: None,
            board: None,
        }
    }

    pub fn colour(&self) -> Option<Player> {
        self.colour
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    /// Read messages until the game ends or the input closes.
    pub fn run<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) -> Result<(), ProtocolError> {
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            debug!(line, "<- arbiter");

            let message = match Message::parse(line) {
                Ok(m) => m,
                Err(e) => {
                    warn!(error = %e, "ignoring message");
                    continue;
                }
            };
            let done = message.ends_game();

            if let Some(reply) = self.execute(message)? {
                debug!(%reply, "-> arbiter");
                writeln!(writer, "{reply}")?;
                writer.flush()?;
            }
            if done {
                info!("game over");
                break;
            }
        }
        Ok(())
    }

    /// Apply one message; returns the reply to send, if any.
    pub fn execute(&mut self, message: Message) -> Result<Option<Reply>, ProtocolError> {
        match message {
            Message::Start { size, colour } => {
                let board = Board::new(size)?;
                info!(size, %colour, "new game");
                self.engine.new_game(size);
                self.colour = Some(colour);
                self.board = Some(board);
                if colour == Player::Red {
                    return self.play(colour).map(Some);
                }
                Ok(None)
            }

            Message::Change { last, board, next } => {
                let colour = self.colour.ok_or(ProtocolError::NotStarted)?;
                let size = self.board.as_ref().map(Board::size).ok_or(ProtocolError::NotStarted)?;
                board.expect_size(size)?;

                let colour = match last {
                    LastMove::Swap => {
                        info!(from = %colour, to = %colour.opponent(), "colours swapped");
                        colour.opponent()
                    }
                    LastMove::Cell(_) => colour,
                };
                self.colour = Some(colour);
                let opening = board.stone_count(Player::Red) + board.stone_count(Player::Blue) == 1;
                self.board = Some(board);

                if next != Some(colour) {
                    return Ok(None);
                }
                if let LastMove::Cell(stone) = last {
                    if opening && self.swap.should_swap(size, stone) {
                        info!(stone = %str_coord(stone), "swapping");
                        return Ok(Some(Reply::Swap));
                    }
                }
                self.play(colour).map(Some)
            }

            Message::End => Ok(None),
        }
    }

    fn play(&mut self, colour: Player) -> Result<Reply, ProtocolError> {
        let board = self.board.as_mut().ok_or(ProtocolError::NotStarted)?;
        let mv = self
            .engine
            .genmove_clocked(board, colour)?
            .ok_or(ProtocolError::NoMove(colour))?;
        board.place(mv, colour)?;
        Ok(Reply::Move(mv))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::strategy::StrategyKind;

    fn session(swap: SwapPolicy) -> Session {
        let engine = Engine::new(EngineConfig::for_testing().with_strategy(StrategyKind::Path));
        Session::new(engine, swap)
    }

    #[test]
    fn test_parse_start() {
        let m = Message::parse("START;11;R").unwrap();
        assert_eq!(
            m,
            Message::Start {
                size: 11,
                colour: Player::Red
            }
        );
    }

    #[test]
    fn test_parse_change() {
        let m = Message::parse("CHANGE;1,2;000,00R,000;B\n").unwrap();
        let Message::Change { last, board, next } = m else {
            panic!("expected CHANGE");
        };
        assert_eq!(last, LastMove::Cell((1, 2)));
        assert_eq!(board.get((1, 2)), Some(Player::Red));
        assert_eq!(next, Some(Player::Blue));
    }

    #[test]
    fn test_parse_change_end_and_swap() {
        let m = Message::parse("CHANGE;SWAP;R00,000,000;END").unwrap();
        assert!(m.ends_game());
        assert!(matches!(m, Message::Change { last: LastMove::Swap, .. }));
        assert!(Message::parse("END;R").unwrap().ends_game());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Message::parse("HELLO"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(Message::parse("START;x;R"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(
            Message::parse("START;3;G"),
            Err(ProtocolError::UnknownColour(_))
        ));
        assert!(matches!(
            Message::parse("CHANGE;9;000,000,000;R"),
            Err(ProtocolError::Board(BoardError::BadCoord(_)))
        ));
    }

    #[test]
    fn test_red_opens() {
        let mut s = session(SwapPolicy::Never);
        let reply = s.execute(Message::parse("START;3;R").unwrap()).unwrap();
        assert!(matches!(reply, Some(Reply::Move(_))));
        assert_eq!(s.board().unwrap().stone_count(Player::Red), 1);
    }

    #[test]
    fn test_blue_waits_for_red() {
        let mut s = session(SwapPolicy::Never);
        assert_eq!(s.execute(Message::parse("START;3;B").unwrap()).unwrap(), None);
        let reply = s.execute(Message::parse("CHANGE;0,0;R00,000,000;B").unwrap()).unwrap();
        assert!(matches!(reply, Some(Reply::Move(mv)) if mv != (0, 0)));
    }

    #[test]
    fn test_change_before_start() {
        let mut s = session(SwapPolicy::Never);
        let err = s.execute(Message::parse("CHANGE;0,0;R00,000,000;B").unwrap()).unwrap_err();
        assert!(matches!(err, ProtocolError::NotStarted));
    }

    #[test]
    fn test_central_swap() {
        assert!(SwapPolicy::Central.should_swap(5, (2, 2)));
        assert!(!SwapPolicy::Central.should_swap(5, (1, 2)));
        assert!(!SwapPolicy::Central.should_swap(5, (2, 3)));
        assert!(!SwapPolicy::Never.should_swap(5, (2, 2)));

        let mut s = session(SwapPolicy::Central);
        s.execute(Message::parse("START;5;B").unwrap()).unwrap();
        let reply = s
            .execute(Message::parse("CHANGE;2,2;00000,00000,00R00,00000,00000;B").unwrap())
            .unwrap();
        assert_eq!(reply, Some(Reply::Swap));
    }

    #[test]
    fn test_swap_flips_colour() {
        let mut s = session(SwapPolicy::Never);
        s.execute(Message::parse("START;3;R").unwrap()).unwrap();
        let reply = s.execute(Message::parse("CHANGE;SWAP;0R0,000,000;B").unwrap()).unwrap();
        assert_eq!(s.colour(), Some(Player::Blue));
        assert!(matches!(reply, Some(Reply::Move(_))));
    }

    #[test]
    fn test_run_writes_replies() {
        let input = "START;3;R\nnonsense\nCHANGE;1,1;R00,0B0,000;R\nEND;R\n";
        let mut out = Vec::new();
        session(SwapPolicy::Never).run(input.as_bytes(), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| parse_coord(l).is_ok()));
    }
}
