//! # ML Game Agents
//!
//! Minimax, Monte-Carlo tree search and DQN agents playing tic-tac-toe,
//! connect four and a small obstacle-dodging arcade game. The DQN value
//! network is built on the Burn ML framework.
//!
//! ## Modules
//!
//! - [`game`]: Environment contract and the three environments
//! - [`ai`]: Agent trait, minimax, MCTS, DQN, value network, feature encoding
//! - [`training`]: Replay buffer, episode and match drivers, metrics
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod config;
pub mod error;
pub mod game;
pub mod training;
