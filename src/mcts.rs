//! Monte Carlo Tree Search with UCB1 selection.
//!
//! Each iteration works on its own copy of the board:
//! - Selection: descend by UCB1, unvisited children first, ties broken at
//!   random
//! - Expansion: a non-terminal leaf gets one child per empty cell
//! - Simulation: one random fill of the remaining cells (see [`playout`])
//! - Backpropagation: every node with a parent counts the visit, and a win
//!   when the playout winner is the player who made that node's move
//!
//! The tree lives in an arena and nodes refer to their parent by index. The
//! search is anytime: it stops between iterations once the clock runs out,
//! and the tree is dropped after the move is chosen.
//!
//! [`playout`]: crate::playout

use std::time::{Duration, Instant};

use clap::ValueEnum;
use fastrand::Rng;
use tracing::debug;

use crate::board::{Board, Coord, Player};
use crate::constants::{MOVE_TIME, UCB_EXPLORATION};
use crate::playout::random_fill;

/// Rule for picking the root child once the search stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BestChild {
    /// Highest raw win count.
    #[default]
    MostWins,
    /// Highest visit count.
    MostVisits,
}

/// Initial statistics of a freshly expanded node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum NodePrior {
    /// No wins, no visits: unvisited children are tried first.
    #[default]
    Zero,
    /// One win in two visits: every child starts at even odds.
    EvenOdds,
}

impl NodePrior {
    fn stats(self) -> (u32, u32) {
        match self {
            NodePrior::Zero => (0, 0),
            NodePrior::EvenOdds => (1, 2),
        }
    }
}

/// Configuration for one search.
#[derive(Debug, Clone)]
pub struct MctsConfig {
    /// UCB1 exploration constant.
    pub exploration: f64,

    /// Wall-clock budget. Checked between iterations only.
    pub time_budget: Duration,

    /// Optional cap on iterations, applied alongside the clock.
    pub max_iterations: Option<u64>,

    pub best_child: BestChild,

    pub prior: NodePrior,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration: UCB_EXPLORATION,
            time_budget: MOVE_TIME,
            max_iterations: None,
            best_child: BestChild::MostWins,
            prior: NodePrior::Zero,
        }
    }
}

impl MctsConfig {
    /// Small, iteration-capped config for tests.
    pub fn for_testing() -> Self {
        Self {
            time_budget: Duration::from_secs(30),
            max_iterations: Some(2000),
            ..Self::default()
        }
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    pub fn with_max_iterations(mut self, n: u64) -> Self {
        self.max_iterations = Some(n);
        self
    }

    pub fn with_best_child(mut self, rule: BestChild) -> Self {
        self.best_child = rule;
        self
    }

    pub fn with_prior(mut self, prior: NodePrior) -> Self {
        self.prior = prior;
        self
    }
}

/// Index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Move that led here from the parent; `None` at the root.
    pub mv: Option<Coord>,
    /// Player who made `mv`. Children are moves by the opponent.
    pub mover: Player,
    /// Parent index, used only for backpropagation.
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub visits: u32,
    /// Playouts won by `mover`.
    pub wins: u32,
}

impl Node {
    /// UCB1 priority; infinite for an unvisited node.
    pub fn ucb(&self, parent_visits: u32, exploration: f64) -> f64 {
        if self.visits == 0 {
            return f64::INFINITY;
        }
        let visits = self.visits as f64;
        let exploitation = self.wins as f64 / visits;
        let exploration_term = exploration * ((parent_visits as f64 + 1.0).ln() / visits).sqrt();
        exploitation + exploration_term
    }

    #[inline]
    pub fn winrate(&self) -> f64 {
        if self.visits > 0 {
            self.wins as f64 / self.visits as f64
        } else {
            0.0
        }
    }
}

/// Arena-allocated search tree. The root is a synthetic node whose mover is
/// the opponent of the side to move; its visit count tracks iterations.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
    prior: NodePrior,
}

impl Tree {
    pub fn new(to_move: Player, prior: NodePrior) -> Self {
        let root = Node {
            mv: None,
            mover: to_move.opponent(),
            parent: None,
            children: Vec::new(),
            visits: 0,
            wins: 0,
        };
        Self {
            nodes: vec![root],
            prior,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Add one child per empty cell of `board`, unless the position is
    /// already decided.
    pub fn expand(&mut self, id: NodeId, board: &Board) {
        if !self.get(id).children.is_empty() || board.check_connection().is_some() {
            return;
        }
        let mover = self.get(id).mover.opponent();
        let (wins, visits) = self.prior.stats();
        for mv in board.empty_cells() {
            let child = NodeId(self.nodes.len());
            self.nodes.push(Node {
                mv: Some(mv),
                mover,
                parent: Some(id),
                children: Vec::new(),
                visits,
                wins,
            });
            self.get_mut(id).children.push(child);
        }
    }

    /// Child with the highest UCB1 priority. Equal priorities are broken
    /// uniformly at random.
    pub fn select_child(&self, id: NodeId, exploration: f64, rng: &mut Rng) -> Option<NodeId> {
        let node = self.get(id);
        let mut best = f64::NEG_INFINITY;
        let mut tied: Vec<NodeId> = Vec::new();
        for &child in &node.children {
            let score = self.get(child).ucb(node.visits, exploration);
            if score > best {
                best = score;
                tied.clear();
                tied.push(child);
            } else if score == best {
                tied.push(child);
            }
        }
        match tied.len() {
            0 => node.children.first().copied(),
            1 => Some(tied[0]),
            n => Some(tied[rng.usize(..n)]),
        }
    }

    /// Record a playout outcome on `leaf` and each ancestor below the root.
    pub fn backpropagate(&mut self, leaf: NodeId, winner: Option<Player>) {
        let mut current = leaf;
        while let Some(parent) = self.get(current).parent {
            let node = self.get_mut(current);
            node.visits += 1;
            if winner == Some(node.mover) {
                node.wins += 1;
            }
            current = parent;
        }
    }

    /// Root child chosen by `rule`; the first in row-major order wins ties.
    pub fn best_child(&self, rule: BestChild) -> Option<NodeId> {
        let key = |n: &Node| match rule {
            BestChild::MostWins => n.wins,
            BestChild::MostVisits => n.visits,
        };
        let mut best: Option<NodeId> = None;
        for &child in &self.get(self.root()).children {
            if best.is_none_or(|b| key(self.get(child)) > key(self.get(b))) {
                best = Some(child);
            }
        }
        best
    }

    /// Log the root children's statistics.
    pub fn dump_children(&self) {
        for &child in &self.get(self.root()).children {
            let n = self.get(child);
            debug!(
                mv = ?n.mv,
                visits = n.visits,
                wins = n.wins,
                winrate = n.winrate(),
                "root child"
            );
        }
    }
}

/// Result of one search.
#[derive(Debug, Clone)]
pub struct MctsResult {
    /// Chosen move; `None` when the position has no legal move.
    pub best: Option<Coord>,
    pub iterations: u64,
    pub tree_size: usize,
    pub elapsed: Duration,
}

/// Run one iteration from the root: select, expand, simulate, backpropagate.
fn iterate(tree: &mut Tree, board: &Board, exploration: f64, rng: &mut Rng) {
    let mut work = board.clone();
    let mut node = tree.root();

    while let Some(child) = tree.select_child(node, exploration, rng) {
        node = child;
        let n = tree.get(node);
        if let Some(mv) = n.mv {
            work.claim(mv, n.mover);
        }
    }

    let winner = match work.check_connection() {
        Some(w) => Some(w),
        None => {
            tree.expand(node, &work);
            if let Some(child) = tree.select_child(node, exploration, rng) {
                node = child;
                let n = tree.get(node);
                if let Some(mv) = n.mv {
                    work.claim(mv, n.mover);
                }
            }
            random_fill(&work, tree.get(node).mover.opponent(), rng)
        }
    };

    tree.backpropagate(node, winner);
    tree.get_mut(tree.root()).visits += 1;
}

/// Search `board` with `player` to move until the budget runs out.
pub fn search(board: &Board, player: Player, config: &MctsConfig, rng: &mut Rng) -> MctsResult {
    let start = Instant::now();
    let mut tree = Tree::new(player, config.prior);
    tree.expand(tree.root(), board);

    let mut iterations = 0u64;
    if !tree.get(tree.root()).children.is_empty() {
        while start.elapsed() < config.time_budget
            && config.max_iterations.is_none_or(|cap| iterations < cap)
        {
            iterate(&mut tree, board, config.exploration, rng);
            iterations += 1;
        }
    }

    let best = tree
        .best_child(config.best_child)
        .and_then(|id| tree.get(id).mv);
    tree.dump_children();
    let elapsed = start.elapsed();
    debug!(
        iterations,
        tree_size = tree.len(),
        best = ?best,
        elapsed_ms = elapsed.as_millis() as u64,
        "mcts finished"
    );

    MctsResult {
        best,
        iterations,
        tree_size: tree.len(),
        elapsed,
    }
}
