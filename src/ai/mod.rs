//! Agents: the shared [`Agent`] interface, baseline and search agents, and the
//! learned DQN agent with its value network and feature encodings.

mod agent;
pub mod algorithms;
mod minimax;
pub mod networks;
mod random;
pub mod state_encoding;

pub use agent::{Agent, AgentState, EnvTransition, Transition};
pub use algorithms::{ChildStats, DqnAgent, DqnConfig, MctsAgent, MctsConfig, MctsTree};
pub use minimax::{MinimaxAgent, SearchReport};
pub use networks::{ValueNetwork, ValueNetworkConfig};
pub use random::RandomAgent;
pub use state_encoding::FeatureEncoding;
