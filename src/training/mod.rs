//! Training infrastructure: replay buffer, episode and match drivers, and
//! rolling metrics.

pub mod episode;
pub mod metrics;
pub mod replay_buffer;

pub use episode::{
    build_self_play_transitions, play_match, play_self_play_episode, run_episode,
    EpisodeSummary, MatchResult, SelfPlayTrace,
};
pub use metrics::{MatchTally, TrainingMetrics};
pub use replay_buffer::ReplayBuffer;
