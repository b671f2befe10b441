use log::warn;

use crate::error::EnvError;

use super::board::DropError;
use super::env::{DRAW_REWARD, INVALID_MOVE_PENALTY, WIN_REWARD};
use super::{
    Board, Cell, Environment, InvalidMove, Outcome, Player, StepInfo, StepResult, TurnBased,
};

/// Four-in-a-row drop game on a 6x7 board. X moves first.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectFour {
    board: Board,
    current_player: Player,
    outcome: Option<Outcome>,
}

impl ConnectFour {
    pub fn new() -> Self {
        ConnectFour {
            board: Board::new(),
            current_player: Player::X,
            outcome: None,
        }
    }

    /// Resume from an arbitrary position with `to_move` on turn.
    ///
    /// A position that already holds a line or a full board starts terminal.
    pub fn from_position(board: Board, to_move: Player) -> Self {
        let outcome = if board.has_line(Cell::X) {
            Some(Outcome::Winner(Player::X))
        } else if board.has_line(Cell::O) {
            Some(Outcome::Winner(Player::O))
        } else if board.is_full() {
            Some(Outcome::Draw)
        } else {
            None
        };
        ConnectFour {
            board,
            current_player: to_move,
            outcome,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    fn reject(&mut self, reason: InvalidMove) -> StepResult<Board> {
        let winner = self.current_player.other();
        warn!(
            "invalid connect-four move by {}: {:?}, {} wins",
            self.current_player.name(),
            reason,
            winner.name()
        );
        self.outcome = Some(Outcome::Winner(winner));
        StepResult {
            state: self.board,
            reward: INVALID_MOVE_PENALTY,
            terminal: true,
            info: StepInfo::Invalid { reason, winner },
        }
    }
}

impl Default for ConnectFour {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for ConnectFour {
    type State = Board;
    type Action = usize;

    fn reset(&mut self) -> Board {
        *self = ConnectFour::new();
        self.board
    }

    fn step(&mut self, column: usize) -> Result<StepResult<Board>, EnvError> {
        if self.outcome.is_some() {
            warn!("step called on a finished connect-four episode");
            return Err(EnvError::EpisodeFinished);
        }

        let mover = self.current_player;
        let row = match self.board.drop_piece(column, mover.to_cell()) {
            Ok(row) => row,
            Err(DropError::InvalidColumn) => return Ok(self.reject(InvalidMove::OutOfRange)),
            Err(DropError::ColumnFull) => return Ok(self.reject(InvalidMove::ColumnFull)),
        };

        let (reward, info) = if self.board.check_win(row, column) {
            self.outcome = Some(Outcome::Winner(mover));
            (WIN_REWARD, StepInfo::Finished(Outcome::Winner(mover)))
        } else if self.board.is_full() {
            self.outcome = Some(Outcome::Draw);
            (DRAW_REWARD, StepInfo::Finished(Outcome::Draw))
        } else {
            self.current_player = mover.other();
            (0.0, StepInfo::Ongoing)
        };

        Ok(StepResult {
            state: self.board,
            reward,
            terminal: self.outcome.is_some(),
            info,
        })
    }

    fn legal_actions(&self, state: &Board) -> Vec<usize> {
        state.open_columns()
    }

    fn state(&self) -> Board {
        self.board
    }

    fn is_done(&self) -> bool {
        self.outcome.is_some()
    }

    fn render(&self) -> String {
        self.board.to_string()
    }
}

impl TurnBased for ConnectFour {
    fn current_player(&self) -> Player {
        self.current_player
    }

    fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{COLS, ROWS};

    #[test]
    fn test_initial_state() {
        let env = ConnectFour::new();
        assert_eq!(env.current_player(), Player::X);
        assert!(!env.is_done());
        assert_eq!(env.legal_actions(&env.state()).len(), 7);
    }

    #[test]
    fn test_step_switches_player() {
        let mut env = ConnectFour::new();
        let result = env.step(3).unwrap();

        assert_eq!(env.current_player(), Player::O);
        assert_eq!(result.state.get(5, 3), Cell::X);
        assert_eq!(result.reward, 0.0);
        assert!(!result.terminal);
        assert_eq!(result.info, StepInfo::Ongoing);
    }

    #[test]
    fn test_returned_state_is_a_copy() {
        let mut env = ConnectFour::new();
        let mut snapshot = env.step(0).unwrap().state;
        snapshot.drop_piece(1, Cell::O).unwrap();
        assert_eq!(env.state().get(5, 1), Cell::Empty);
    }

    #[test]
    fn test_vertical_win_rewards_mover() {
        let mut env = ConnectFour::new();
        for _ in 0..3 {
            env.step(0).unwrap(); // X
            env.step(1).unwrap(); // O
        }
        let result = env.step(0).unwrap();
        assert!(result.terminal);
        assert_eq!(result.reward, WIN_REWARD);
        assert_eq!(result.info, StepInfo::Finished(Outcome::Winner(Player::X)));
        assert_eq!(env.outcome(), Some(Outcome::Winner(Player::X)));
    }

    #[test]
    fn test_full_column_ends_episode_for_opponent() {
        let mut env = ConnectFour::new();
        for _ in 0..ROWS {
            env.step(2).unwrap();
        }
        assert!(!env.is_done());
        assert_eq!(env.current_player(), Player::X);

        let result = env.step(2).unwrap();
        assert!(result.terminal);
        assert_eq!(result.reward, INVALID_MOVE_PENALTY);
        assert_eq!(
            result.info,
            StepInfo::Invalid {
                reason: InvalidMove::ColumnFull,
                winner: Player::O
            }
        );
        assert_eq!(env.outcome(), Some(Outcome::Winner(Player::O)));
    }

    #[test]
    fn test_out_of_range_column_is_invalid() {
        let mut env = ConnectFour::new();
        let result = env.step(9).unwrap();
        assert!(result.terminal);
        assert_eq!(result.info.winner(), Some(Player::O));
        assert!(result.info.is_invalid());
    }

    #[test]
    fn test_step_after_terminal_is_error() {
        let mut env = ConnectFour::new();
        env.step(42).unwrap();
        assert_eq!(env.step(0), Err(EnvError::EpisodeFinished));

        env.reset();
        assert!(env.step(0).is_ok());
    }

    #[test]
    fn test_from_position_detects_finished_board() {
        let mut board = Board::new();
        for col in 0..4 {
            board.drop_piece(col, Cell::O).unwrap();
        }
        let env = ConnectFour::from_position(board, Player::X);
        assert!(env.is_done());
        assert_eq!(env.outcome(), Some(Outcome::Winner(Player::O)));
    }

    #[test]
    fn test_draw_on_full_board() {
        // Vertical pairs alternating by column never line up four in any direction.
        let mut cells = [[Cell::Empty; COLS]; ROWS];
        for height in 0..ROWS {
            for col in 0..COLS {
                if height == ROWS - 1 && col == 6 {
                    continue;
                }
                cells[ROWS - 1 - height][col] = if (height / 2 + col) % 2 == 0 {
                    Cell::X
                } else {
                    Cell::O
                };
            }
        }
        let board = Board::from_cells(cells);
        assert!(!board.has_line(Cell::X));
        assert!(!board.has_line(Cell::O));

        let mut env = ConnectFour::from_position(board, Player::X);
        assert_eq!(env.legal_actions(&env.state()), vec![6]);
        let result = env.step(6).unwrap();
        assert!(result.terminal);
        assert_eq!(result.info, StepInfo::Finished(Outcome::Draw));
        assert_eq!(result.reward, DRAW_REWARD);
        assert!(env.legal_actions(&result.state).is_empty());
    }
}
