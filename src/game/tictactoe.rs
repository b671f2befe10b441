use std::fmt;

use log::warn;

use crate::error::EnvError;

use super::env::{DRAW_REWARD, INVALID_MOVE_PENALTY, WIN_REWARD};
use super::{Cell, Environment, InvalidMove, Outcome, Player, StepInfo, StepResult, TurnBased};

pub const SIZE: usize = 3;

/// (row, col) of a tic-tac-toe square.
pub type Square = (usize, usize);

const LINES: [[Square; 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Grid {
    cells: [[Cell; SIZE]; SIZE],
}

impl Grid {
    pub fn new() -> Self {
        Grid::default()
    }

    pub fn from_cells(cells: [[Cell; SIZE]; SIZE]) -> Self {
        Grid { cells }
    }

    pub fn get(&self, (row, col): Square) -> Cell {
        self.cells[row][col]
    }

    pub fn set(&mut self, (row, col): Square, cell: Cell) {
        self.cells[row][col] = cell;
    }

    pub fn cells(&self) -> &[[Cell; SIZE]; SIZE] {
        &self.cells
    }

    /// Empty squares in row-major order.
    pub fn empty_squares(&self) -> Vec<Square> {
        (0..SIZE)
            .flat_map(|row| (0..SIZE).map(move |col| (row, col)))
            .filter(|&sq| self.get(sq) == Cell::Empty)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(|&c| c != Cell::Empty)
    }

    /// Whether `player` owns a full row, column or diagonal.
    pub fn has_line(&self, player: Player) -> bool {
        let cell = player.to_cell();
        LINES
            .iter()
            .any(|line| line.iter().all(|&sq| self.get(sq) == cell))
    }

    pub fn winner(&self) -> Option<Player> {
        [Player::X, Player::O]
            .into_iter()
            .find(|&p| self.has_line(p))
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  0 1 2")?;
        for (row, cells) in self.cells.iter().enumerate() {
            write!(f, "{row}")?;
            for cell in cells {
                write!(f, " {}", cell.to_char())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// 3x3 three-in-a-row game. X moves first.
#[derive(Debug, Clone, PartialEq)]
pub struct TicTacToe {
    grid: Grid,
    current_player: Player,
    outcome: Option<Outcome>,
}

impl TicTacToe {
    pub fn new() -> Self {
        TicTacToe {
            grid: Grid::new(),
            current_player: Player::X,
            outcome: None,
        }
    }

    /// Resume from an arbitrary position with `to_move` on turn.
    pub fn from_position(grid: Grid, to_move: Player) -> Self {
        let outcome = match grid.winner() {
            Some(p) => Some(Outcome::Winner(p)),
            None if grid.is_full() => Some(Outcome::Draw),
            None => None,
        };
        TicTacToe {
            grid,
            current_player: to_move,
            outcome,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for TicTacToe {
    type State = Grid;
    type Action = Square;

    fn reset(&mut self) -> Grid {
        *self = TicTacToe::new();
        self.grid
    }

    fn step(&mut self, square: Square) -> Result<StepResult<Grid>, EnvError> {
        if self.outcome.is_some() {
            warn!("step called on a finished tic-tac-toe episode");
            return Err(EnvError::EpisodeFinished);
        }

        let mover = self.current_player;
        let (row, col) = square;
        let invalid = if row >= SIZE || col >= SIZE {
            Some(InvalidMove::OutOfRange)
        } else if self.grid.get(square) != Cell::Empty {
            Some(InvalidMove::Occupied)
        } else {
            None
        };

        if let Some(reason) = invalid {
            let winner = mover.other();
            warn!(
                "invalid tic-tac-toe move {:?} by {}: {:?}, {} wins",
                square,
                mover.name(),
                reason,
                winner.name()
            );
            self.outcome = Some(Outcome::Winner(winner));
            return Ok(StepResult {
                state: self.grid,
                reward: INVALID_MOVE_PENALTY,
                terminal: true,
                info: StepInfo::Invalid { reason, winner },
            });
        }

        self.grid.set(square, mover.to_cell());

        let (reward, info) = if self.grid.has_line(mover) {
            self.outcome = Some(Outcome::Winner(mover));
            (WIN_REWARD, StepInfo::Finished(Outcome::Winner(mover)))
        } else if self.grid.is_full() {
            self.outcome = Some(Outcome::Draw);
            (DRAW_REWARD, StepInfo::Finished(Outcome::Draw))
        } else {
            self.current_player = mover.other();
            (0.0, StepInfo::Ongoing)
        };

        Ok(StepResult {
            state: self.grid,
            reward,
            terminal: self.outcome.is_some(),
            info,
        })
    }

    fn legal_actions(&self, state: &Grid) -> Vec<Square> {
        state.empty_squares()
    }

    fn state(&self) -> Grid {
        self.grid
    }

    fn is_done(&self) -> bool {
        self.outcome.is_some()
    }

    fn render(&self) -> String {
        self.grid.to_string()
    }
}

impl TurnBased for TicTacToe {
    fn current_player(&self) -> Player {
        self.current_player
    }

    fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }
}
