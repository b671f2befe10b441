use std::collections::VecDeque;

use crate::game::{Outcome, Player};

/// Rolling-window tracker for episode rewards and training losses.
pub struct TrainingMetrics {
    episode_rewards: VecDeque<f32>,
    losses: VecDeque<f32>,
    capacity: usize,
    total_episodes: usize, // lifetime count, never capped
    best_average: Option<f32>,
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_rewards: VecDeque::with_capacity(capacity),
            losses: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
            best_average: None,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_episode(&mut self, total_reward: f32) {
        self.total_episodes += 1;
        push_capped(&mut self.episode_rewards, total_reward, self.capacity);
    }

    pub fn record_loss(&mut self, loss: f32) {
        push_capped(&mut self.losses, loss, self.capacity);
    }

    /// Average reward over the last N episodes.
    pub fn average_reward(&self, last_n: usize) -> f32 {
        mean_of_last(&self.episode_rewards, last_n)
    }

    /// Average loss over the last N updates.
    pub fn average_loss(&self, last_n: usize) -> f32 {
        mean_of_last(&self.losses, last_n)
    }

    /// Record the current `last_n` average as the best if it beats every
    /// previous one. Returns whether it did.
    pub fn update_best(&mut self, last_n: usize) -> bool {
        if self.episode_rewards.is_empty() {
            return false;
        }
        let average = self.average_reward(last_n);
        if self.best_average.map_or(true, |best| average > best) {
            self.best_average = Some(average);
            true
        } else {
            false
        }
    }

    pub fn best_average(&self) -> Option<f32> {
        self.best_average
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn push_capped(values: &mut VecDeque<f32>, value: f32, capacity: usize) {
    values.push_back(value);
    if values.len() > capacity {
        values.pop_front();
    }
}

fn mean_of_last(values: &VecDeque<f32>, last_n: usize) -> f32 {
    let n = values.len().min(last_n);
    if n == 0 {
        return 0.0;
    }
    let sum: f32 = values.iter().rev().take(n).sum();
    sum / n as f32
}

/// Win/draw tally for a series of games between two agents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchTally {
    pub first_wins: usize,
    pub second_wins: usize,
    pub draws: usize,
}

impl MatchTally {
    /// Count one game; `first_player` is the side the first agent played.
    pub fn record(&mut self, outcome: Outcome, first_player: Player) {
        match outcome {
            Outcome::Winner(winner) if winner == first_player => self.first_wins += 1,
            Outcome::Winner(_) => self.second_wins += 1,
            Outcome::Draw => self.draws += 1,
        }
    }

    pub fn games(&self) -> usize {
        self.first_wins + self.second_wins + self.draws
    }

    /// Share of games won by the first agent.
    pub fn win_rate(&self) -> f32 {
        if self.games() == 0 {
            return 0.0;
        }
        self.first_wins as f32 / self.games() as f32
    }

    pub fn draw_rate(&self) -> f32 {
        if self.games() == 0 {
            return 0.0;
        }
        self.draws as f32 / self.games() as f32
    }
}
