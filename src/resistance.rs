//! Electrical-resistance heuristic.
//!
//! The board is modelled as a resistor network over its empty cells. Every
//! pair of adjacent empty cells is joined by a unit conductor. A chain of the
//! player's own stones conducts perfectly, so every pair of empty cells
//! bordering the same chain is joined as well. Cells on (or chained to) the
//! player's near edge are fed from a 1V source through a unit conductor;
//! cells on (or chained to) the far edge drain to ground the same way.
//!
//! Solving `G * V = I` gives the node voltages, and the total current drawn
//! from the source is the source-to-sink conductance: the higher it is, the
//! better connected the player.

use std::collections::BTreeSet;

use ndarray::{Array1, Array2};

use crate::board::{Board, Coord, Player};
use crate::constants::MIN_CONDUCTANCE;
use crate::linalg::solve_or_least_squares;

/// One player's conductance network for one board. Built and solved per
/// evaluation, then dropped.
pub struct ConductanceSystem {
    size: usize,
    /// Linear-system index -> cell.
    cells: Vec<Coord>,
    /// Conductance matrix (graph Laplacian plus terminal conductors).
    g: Array2<f64>,
    /// Injected current: 1 at source-fed cells.
    source: Array1<f64>,
    is_source: Vec<bool>,
    is_sink: Vec<bool>,
    edges: Vec<(usize, usize)>,
}

/// Solution of a [`ConductanceSystem`].
pub struct Solved<'a> {
    system: &'a ConductanceSystem,
    voltages: Array1<f64>,
}

impl ConductanceSystem {
    pub fn build(board: &Board, player: Player) -> Self {
        let n = board.size();
        let cells = board.empty_cells();
        let mut index_of = vec![None; n * n];
        for (i, &(r, c)) in cells.iter().enumerate() {
            index_of[r * n + c] = Some(i);
        }
        let index = |(r, c): Coord| index_of[r * n + c];

        let e = cells.len();
        let mut is_source = vec![false; e];
        let mut is_sink = vec![false; e];
        let mut edges = BTreeSet::new();

        for (i, &cell) in cells.iter().enumerate() {
            is_source[i] = board.on_near_edge(cell, player);
            is_sink[i] = board.on_far_edge(cell, player);
            for nb in board.neighbors(cell) {
                if let Some(j) = index(nb) {
                    edges.insert((i.min(j), i.max(j)));
                }
            }
        }

        // Merge each own chain into one conductor.
        let mut visited = vec![false; n * n];
        for start in board.coords() {
            let chain = board.collect_group(start, player, &mut visited);
            if chain.is_empty() {
                continue;
            }
            let touches_near = chain.iter().any(|&c| board.on_near_edge(c, player));
            let touches_far = chain.iter().any(|&c| board.on_far_edge(c, player));

            let border: BTreeSet<usize> = chain
                .iter()
                .flat_map(|&c| board.neighbors(c))
                .filter_map(index)
                .collect();
            for &i in &border {
                is_source[i] |= touches_near;
                is_sink[i] |= touches_far;
            }
            let border: Vec<usize> = border.into_iter().collect();
            for (k, &i) in border.iter().enumerate() {
                for &j in &border[k + 1..] {
                    edges.insert((i, j));
                }
            }
        }

        // A region with no route to either terminal carries no current and
        // would leave G singular, so its cells are pinned at 0V.
        let terminal: Vec<bool> = (0..e).map(|i| is_source[i] || is_sink[i]).collect();
        let live = reachable(&terminal, &edges);

        let mut g = Array2::zeros((e, e));
        let mut source = Array1::zeros(e);
        for i in (0..e).filter(|&i| !live[i]) {
            g[[i, i]] = 1.0;
        }
        for &(i, j) in edges.iter().filter(|&&(i, _)| live[i]) {
            g[[i, j]] -= 1.0;
            g[[j, i]] -= 1.0;
            g[[i, i]] += 1.0;
            g[[j, j]] += 1.0;
        }
        for i in 0..e {
            if is_source[i] {
                source[i] += 1.0;
                g[[i, i]] += 1.0;
            }
            if is_sink[i] {
                g[[i, i]] += 1.0;
            }
        }

        Self {
            size: n,
            cells,
            g,
            source,
            is_source,
            is_sink,
            edges: edges.into_iter().collect(),
        }
    }

    /// Number of unknowns (empty cells).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn solve(&self) -> Solved<'_> {
        Solved {
            system: self,
            voltages: solve_or_least_squares(&self.g, &self.source),
        }
    }
}

impl Solved<'_> {
    /// Total current leaving the 1V source, i.e. the source-to-sink
    /// conductance.
    pub fn conductance(&self) -> f64 {
        let sys = self.system;
        (0..sys.len())
            .filter(|&i| sys.is_source[i])
            .map(|i| 1.0 - self.voltages[i])
            .sum()
    }

    /// Current through each cell: half the absolute current on every
    /// conductor touching it, terminals included. Occupied cells carry zero.
    pub fn currents(&self) -> Array2<f64> {
        let sys = self.system;
        let v = &self.voltages;
        let mut out = Array2::zeros((sys.size, sys.size));
        for (i, &(r, c)) in sys.cells.iter().enumerate() {
            if sys.is_source[i] {
                out[[r, c]] += (1.0 - v[i]).abs() / 2.0;
            }
            if sys.is_sink[i] {
                out[[r, c]] += v[i].abs() / 2.0;
            }
        }
        for &(i, j) in &sys.edges {
            let flow = (v[i] - v[j]).abs() / 2.0;
            let (ri, ci) = sys.cells[i];
            let (rj, cj) = sys.cells[j];
            out[[ri, ci]] += flow;
            out[[rj, cj]] += flow;
        }
        out
    }
}

/// Nodes connected to a terminal node through `edges`.
fn reachable(terminal: &[bool], edges: &BTreeSet<(usize, usize)>) -> Vec<bool> {
    let mut adjacent = vec![Vec::new(); terminal.len()];
    for &(i, j) in edges {
        adjacent[i].push(j);
        adjacent[j].push(i);
    }
    let mut seen = terminal.to_vec();
    let mut stack: Vec<usize> = (0..terminal.len()).filter(|&i| terminal[i]).collect();
    while let Some(i) = stack.pop() {
        for &j in &adjacent[i] {
            if !seen[j] {
                seen[j] = true;
                stack.push(j);
            }
        }
    }
    seen
}

/// Source-to-sink conductance of `player`'s network.
pub fn conductance(board: &Board, player: Player) -> f64 {
    let system = ConductanceSystem::build(board, player);
    if system.is_empty() {
        return 0.0;
    }
    system.solve().conductance()
}

/// Per-cell current map for `player`.
pub fn current_map(board: &Board, player: Player) -> Array2<f64> {
    ConductanceSystem::build(board, player).solve().currents()
}

/// Connection strength of `player` relative to the opponent: C(self)/C(opp).
///
/// The opponent's conductance is floored at [`MIN_CONDUCTANCE`] so the
/// ratio stays finite when they are cut off.
pub fn evaluate(board: &Board, player: Player) -> f64 {
    let mine = conductance(board, player);
    let theirs = conductance(board, player.opponent());
    mine / theirs.max(MIN_CONDUCTANCE)
}

/// Map a pair of conductances onto [-1, 1]: positive when `mine` dominates.
pub fn bounded_score(mine: f64, theirs: f64) -> f64 {
    let raw = if mine <= 0.0 && theirs <= 0.0 {
        0.0
    } else if mine > theirs {
        1.0 - theirs / mine
    } else {
        mine / theirs - 1.0
    };
    raw.clamp(-1.0, 1.0)
}

/// [`evaluate`] folded into [-1, 1].
pub fn bounded_evaluate(board: &Board, player: Player) -> f64 {
    bounded_score(
        conductance(board, player),
        conductance(board, player.opponent()),
    )
}

/// Score every cell as a candidate move for `player`: the bounded
/// conductance score of the board after playing there. Occupied cells
/// score negative infinity.
///
/// This rebuilds and solves both networks once per empty cell.
pub fn rank(board: &Board, player: Player) -> Array2<f64> {
    let n = board.size();
    let mut scores = Array2::from_elem((n, n), f64::NEG_INFINITY);
    for cell in board.empty_cells() {
        let next = board.with_stone(cell, player);
        scores[[cell.0, cell.1]] = bounded_evaluate(&next, player);
    }
    scores
}

/// Highest-ranked empty cell; the first in row-major order wins ties.
pub fn best_move(board: &Board, player: Player) -> Option<Coord> {
    let scores = rank(board, player);
    let mut best: Option<(Coord, f64)> = None;
    for cell in board.empty_cells() {
        let s = scores[[cell.0, cell.1]];
        if best.is_none_or(|(_, b)| s > b) {
            best = Some((cell, s));
        }
    }
    best.map(|(c, _)| c)
}
