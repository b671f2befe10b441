mod dqn;
mod mcts;

pub use dqn::{DqnAgent, DqnConfig};
pub use mcts::{ChildStats, MctsAgent, MctsConfig, MctsTree};
