use std::fmt::Debug;

use crate::error::EnvError;

use super::Player;

/// Reward for the move that wins a board game.
pub const WIN_REWARD: f32 = 1.0;
/// Reward for the move that fills the board without a winner.
pub const DRAW_REWARD: f32 = 0.0;
/// Penalty for a structurally invalid move. The episode ends and the
/// opponent is credited with the win.
pub const INVALID_MOVE_PENALTY: f32 = -10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Winner(Player),
    Draw,
}

/// Why a move was rejected by the rules of a board game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidMove {
    Occupied,
    OutOfRange,
    ColumnFull,
}

/// Side information attached to every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepInfo {
    #[default]
    Ongoing,
    Finished(Outcome),
    Invalid {
        reason: InvalidMove,
        winner: Player,
    },
    Collision,
    Goal,
    Timeout,
}

impl StepInfo {
    /// Game outcome carried by this step, if the step ended a board game.
    pub fn outcome(&self) -> Option<Outcome> {
        match *self {
            StepInfo::Finished(outcome) => Some(outcome),
            StepInfo::Invalid { winner, .. } => Some(Outcome::Winner(winner)),
            _ => None,
        }
    }

    pub fn winner(&self) -> Option<Player> {
        match self.outcome() {
            Some(Outcome::Winner(player)) => Some(player),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, StepInfo::Invalid { .. })
    }
}

/// Result of applying one action to an environment.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult<S> {
    pub state: S,
    pub reward: f32,
    pub terminal: bool,
    pub info: StepInfo,
}

/// Contract shared by every environment an agent can be run against.
///
/// States handed out are always copies; mutating them never affects the
/// environment.
pub trait Environment {
    type State: Clone + Debug;
    type Action: Copy + PartialEq + Debug;

    /// Start a new episode and return its initial state.
    fn reset(&mut self) -> Self::State;

    /// Apply `action`. Fails with [`EnvError::EpisodeFinished`] once the
    /// episode is over; callers must `reset` before stepping again.
    fn step(&mut self, action: Self::Action) -> Result<StepResult<Self::State>, EnvError>;

    /// Actions that are physically possible in `state`.
    fn legal_actions(&self, state: &Self::State) -> Vec<Self::Action>;

    /// Copy of the current state.
    fn state(&self) -> Self::State;

    fn is_done(&self) -> bool;

    /// Human-readable dump of the current state for debugging.
    fn render(&self) -> String;
}

/// Two-player, alternating-turn environments.
pub trait TurnBased: Environment {
    /// Player whose move it is.
    fn current_player(&self) -> Player;

    /// Final result once the episode is over.
    fn outcome(&self) -> Option<Outcome>;
}
