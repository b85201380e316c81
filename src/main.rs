//! Hex-Rust: a Hex move-selection engine.
//!
//! ## Usage
//!
//! - `hex-rust connect` - Play one game against the arbiter over TCP
//! - `hex-rust stdio` - Speak the arbiter protocol on stdin/stdout
//! - `hex-rust genmove <board>` - Print one move for a board
//! - `hex-rust demo` - Self-play a game and print each position
//!
//! Logs go to stderr; stdout carries protocol replies only.

use std::io::{self, BufReader};
use std::net::TcpStream;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use hex_rust::board::{Board, Player, str_coord};
use hex_rust::constants::{AB_DEPTH, ARBITER_HOST, ARBITER_PORT, DEFAULT_SIZE, GAME_TIME, MOVE_TIME};
use hex_rust::engine::{Engine, EngineConfig};
use hex_rust::mcts::{BestChild, MctsConfig, NodePrior};
use hex_rust::protocol::{Session, SwapPolicy};
use hex_rust::strategy::{EvaluatorKind, StrategyKind};

/// Hex-Rust: a Hex move-selection engine
#[derive(Parser)]
#[command(name = "hex-rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    engine: EngineArgs,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the arbiter and play one game
    Connect {
        #[arg(long, default_value = ARBITER_HOST)]
        host: String,
        #[arg(long, default_value_t = ARBITER_PORT)]
        port: u16,
    },
    /// Speak the arbiter protocol on stdin/stdout
    Stdio,
    /// Print one move for a board given as comma-separated rows
    Genmove {
        board: String,
        /// Side to move (R or B); inferred from stone counts when omitted
        #[arg(long, value_parser = parse_player)]
        player: Option<Player>,
    },
    /// Self-play one game and print every position
    Demo,
}

#[derive(Args)]
struct EngineArgs {
    #[arg(long, global = true, default_value_t = DEFAULT_SIZE)]
    size: usize,

    #[arg(long, global = true, value_enum, default_value_t = StrategyKind::Auto)]
    strategy: StrategyKind,

    /// Leaf heuristic for alpha-beta
    #[arg(long, global = true, value_enum, default_value_t = EvaluatorKind::Resistance)]
    evaluator: EvaluatorKind,

    #[arg(long, global = true, default_value_t = AB_DEPTH)]
    depth: u32,

    /// MCTS thinking time per move
    #[arg(long, global = true, default_value_t = MOVE_TIME.as_millis() as u64)]
    move_time_ms: u64,

    /// Total clock for the game
    #[arg(long, global = true, default_value_t = GAME_TIME.as_millis() as u64)]
    game_time_ms: u64,

    #[arg(long, global = true)]
    seed: Option<u64>,

    #[arg(long, global = true, value_enum, default_value_t = BestChild::MostWins)]
    best_child: BestChild,

    #[arg(long, global = true, value_enum, default_value_t = NodePrior::Zero)]
    prior: NodePrior,

    /// Whether to swap the opponent's opening stone
    #[arg(long, global = true, value_enum, default_value_t = SwapPolicy::Never)]
    swap: SwapPolicy,
}

impl EngineArgs {
    fn config(&self) -> EngineConfig {
        let mcts = MctsConfig::default()
            .with_time_budget(Duration::from_millis(self.move_time_ms))
            .with_best_child(self.best_child)
            .with_prior(self.prior);
        let config = EngineConfig::default()
            .with_board_size(self.size)
            .with_strategy(self.strategy)
            .with_evaluator(self.evaluator)
            .with_depth(self.depth)
            .with_mcts(mcts)
            .with_game_time(Duration::from_millis(self.game_time_ms));
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

fn parse_player(s: &str) -> Result<Player, String> {
    let mut chars = s.chars();
    match (chars.next().and_then(Player::from_letter), chars.next()) {
        (Some(p), None) => Ok(p),
        _ => Err(format!("expected R or B, got {s:?}")),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level {level:?}"))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let config = cli.engine.config();
    let swap = cli.engine.swap;

    match cli.command {
        Some(Commands::Connect { host, port }) => {
            let stream = TcpStream::connect((host.as_str(), port))
                .with_context(|| format!("connecting to arbiter at {host}:{port}"))?;
            info!(%host, port, "connected");
            let reader = BufReader::new(stream.try_clone().context("cloning socket")?);
            Session::new(Engine::new(config), swap).run(reader, stream)?;
        }
        Some(Commands::Stdio) => {
            Session::new(Engine::new(config), swap).run(io::stdin().lock(), io::stdout())?;
        }
        Some(Commands::Genmove { board, player }) => {
            let board: Board = board.parse().context("parsing board")?;
            let player = player.unwrap_or_else(|| board.to_move());
            let config = EngineConfig {
                board_size: None,
                ..config
            };
            match Engine::new(config).genmove_clocked(&board, player)? {
                Some(mv) => println!("{}", str_coord(mv)),
                None => bail!("board is full"),
            }
        }
        Some(Commands::Demo) | None => run_demo(config)?,
    }
    Ok(())
}

fn run_demo(config: EngineConfig) -> Result<()> {
    let size = config.board_size.unwrap_or(DEFAULT_SIZE);
    println!("Hex-Rust self-play on {size}x{size}\n");

    let mut board = Board::new(size)?;
    let mut engine = Engine::new(config);
    let mut player = Player::Red;

    while board.check_connection().is_none() {
        let Some(mv) = engine.genmove_clocked(&board, player)? else {
            break;
        };
        board.place(mv, player)?;
        println!("{player} plays {}", str_coord(mv));
        player = player.opponent();
    }

    println!("\n{board}");
    match board.check_connection() {
        Some(winner) => println!("{winner} wins after {} stones", size * size - board.empty_cells().len()),
        None => println!("no winner"),
    }
    Ok(())
}
