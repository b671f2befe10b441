use crate::error::AgentError;
use crate::game::{Cell, Grid, Player, Square, TicTacToe};

use super::agent::Agent;

/// Square ordering: centre, then corners, then edges, for better alpha-beta pruning.
const MOVE_ORDER: [Square; 9] = [
    (1, 1),
    (0, 0),
    (0, 2),
    (2, 0),
    (2, 2),
    (0, 1),
    (1, 0),
    (1, 2),
    (2, 1),
];

/// Score of a win found at depth 0. Each ply of depth costs one point.
const WIN_SCORE: i32 = 10;
const INFINITY: i32 = 1_000;

/// Outcome of one root search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchReport {
    /// Chosen square and its score; `None` when no candidate was playable.
    pub best: Option<(Square, i32)>,
    /// Positions evaluated below the root.
    pub nodes: u64,
}

/// Depth-bounded minimax (negamax form) with alpha-beta pruning for tic-tac-toe.
///
/// Wins score `10 - depth` for the agent and losses `-10 + depth`, so quicker
/// wins and slower losses are preferred. Depth cutoffs and full boards score 0.
pub struct MinimaxAgent {
    player: Player,
    max_depth: usize,
}

impl MinimaxAgent {
    pub fn new(player: Player, max_depth: usize) -> Self {
        MinimaxAgent { player, max_depth }
    }

    pub fn player(&self) -> Player {
        self.player
    }

    /// Best square among `legal` with its score, or `None` if nothing is legal.
    ///
    /// Ties keep the earliest square in centre/corner/edge order.
    pub fn best_move(&self, grid: &Grid, legal: &[Square]) -> Option<(Square, i32)> {
        self.search(grid, legal).best
    }

    /// Run the root search and report how many positions it evaluated.
    ///
    /// Squares of `legal` that are already occupied on `grid` are skipped.
    pub fn search(&self, grid: &Grid, legal: &[Square]) -> SearchReport {
        let ordered: Vec<Square> = ordered_moves(legal)
            .into_iter()
            .filter(|&square| grid.get(square) == Cell::Empty)
            .collect();
        let mut board = *grid;
        let mut nodes = 0;
        let mut best: Option<(Square, i32)> = None;
        let mut alpha = -INFINITY;

        for square in ordered {
            board.set(square, self.player.to_cell());
            let score = -self.negamax(
                &mut board,
                1,
                self.player.other(),
                -INFINITY,
                -alpha,
                &mut nodes,
            );
            board.set(square, Cell::Empty);

            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((square, score));
            }
            alpha = alpha.max(score);
        }

        SearchReport { best, nodes }
    }

    /// Value of `board` for `to_move`, who is about to play at `depth`.
    fn negamax(
        &self,
        board: &mut Grid,
        depth: usize,
        to_move: Player,
        mut alpha: i32,
        beta: i32,
        nodes: &mut u64,
    ) -> i32 {
        *nodes += 1;
        let depth_score = WIN_SCORE - depth as i32;
        if board.has_line(to_move.other()) {
            return -depth_score;
        }
        if board.has_line(to_move) {
            return depth_score;
        }

        let empty = board.empty_squares();
        if empty.is_empty() || depth >= self.max_depth {
            return 0;
        }

        let mut best = -INFINITY;
        for square in ordered_moves(&empty) {
            board.set(square, to_move.to_cell());
            let score = -self.negamax(board, depth + 1, to_move.other(), -beta, -alpha, nodes);
            board.set(square, Cell::Empty);

            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }

        best
    }
}

fn ordered_moves(candidates: &[Square]) -> Vec<Square> {
    MOVE_ORDER
        .iter()
        .filter(|square| candidates.contains(square))
        .copied()
        .collect()
}

impl Agent<TicTacToe> for MinimaxAgent {
    fn act(&mut self, state: &Grid, legal: &[Square]) -> Result<Square, AgentError> {
        self.best_move(state, legal)
            .map(|(square, _)| square)
            .ok_or(AgentError::NoLegalActions)
    }

    fn name(&self) -> &str {
        "Minimax"
    }
}
