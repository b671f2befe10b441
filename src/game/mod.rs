//! Turn-based environments: the environment contract, the tic-tac-toe and
//! connect-four boards, and the obstacle-dodging arcade game.

mod arcade;
mod board;
mod connect_four;
mod env;
mod player;
mod tictactoe;

pub use arcade::{
    ArcadeConfig, ArcadeGame, ArcadeLayout, Move, COLLISION_REWARD, GOAL_REWARD, STEP_PENALTY,
};
pub use board::{Board, DropError, COLS, ROWS};
pub use connect_four::ConnectFour;
pub use env::{
    Environment, InvalidMove, Outcome, StepInfo, StepResult, TurnBased, DRAW_REWARD,
    INVALID_MOVE_PENALTY, WIN_REWARD,
};
pub use player::{Cell, Player};
pub use tictactoe::{Grid, Square, TicTacToe};
