use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ConfigError, EnvError};

use super::{Environment, StepInfo, StepResult};

/// Per-step shaping penalty.
pub const STEP_PENALTY: f32 = -0.01;
pub const COLLISION_REWARD: f32 = -1.0;
pub const GOAL_REWARD: f32 = 1.0;

/// Arcade field dimensions and episode limits.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ArcadeConfig {
    pub width: usize,
    pub height: usize,
    pub obstacles: usize,
    /// `None` disables timeout termination.
    pub max_steps: Option<usize>,
}

impl Default for ArcadeConfig {
    fn default() -> Self {
        ArcadeConfig {
            width: 10,
            height: 12,
            obstacles: 3,
            max_steps: None,
        }
    }
}

impl ArcadeConfig {
    /// Length of the observation vector: player x, goal (x, y), obstacles (x, y).
    pub fn state_size(&self) -> usize {
        3 + 2 * self.obstacles
    }

    /// Reject fields that cannot form a playable, normalizable field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 2 || self.height < 2 {
            return Err(ConfigError::Validation(format!(
                "arcade.width and arcade.height must be >= 2, got {}x{}",
                self.width, self.height
            )));
        }
        if self.max_steps == Some(0) {
            return Err(ConfigError::Validation(
                "arcade.max_steps must be > 0 when set".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Left,
    Stay,
    Right,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Left, Move::Stay, Move::Right];
}

/// Explicit placement of every object on the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcadeLayout {
    pub player_x: usize,
    pub goal: (usize, usize),
    pub obstacles: Vec<(usize, usize)>,
}

impl ArcadeLayout {
    /// Check that the layout fits `config`: one entry per configured obstacle
    /// and every coordinate inside the field.
    pub fn validate(&self, config: &ArcadeConfig) -> Result<(), ConfigError> {
        if self.obstacles.len() != config.obstacles {
            return Err(ConfigError::Validation(format!(
                "layout has {} obstacles, config expects {}",
                self.obstacles.len(),
                config.obstacles
            )));
        }
        let inside = |(x, y): (usize, usize)| x < config.width && y < config.height;
        if self.player_x >= config.width {
            return Err(ConfigError::Validation(format!(
                "layout player_x {} is outside a field of width {}",
                self.player_x, config.width
            )));
        }
        if !inside(self.goal) {
            return Err(ConfigError::Validation(format!(
                "layout goal {:?} is outside the field",
                self.goal
            )));
        }
        if let Some(&obstacle) = self.obstacles.iter().find(|&&o| !inside(o)) {
            return Err(ConfigError::Validation(format!(
                "layout obstacle {obstacle:?} is outside the field"
            )));
        }
        Ok(())
    }
}

/// Dodge falling obstacles and catch the falling goal marker.
///
/// The player lives on the bottom row. Obstacles fall one row per step and
/// respawn near the top in a random column once they leave the field; the goal
/// falls every second step and respawns at the top.
#[derive(Debug, Clone)]
pub struct ArcadeGame {
    config: ArcadeConfig,
    player_x: usize,
    goal_x: usize,
    goal_y: usize,
    obstacles: Vec<(usize, usize)>,
    done: bool,
    steps: usize,
    rng: StdRng,
}

impl ArcadeGame {
    /// Fails when `config` does not pass [`ArcadeConfig::validate`].
    pub fn new(config: ArcadeConfig) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    pub fn with_seed(config: ArcadeConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: ArcadeConfig, rng: StdRng) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut game = ArcadeGame {
            player_x: 0,
            goal_x: 0,
            goal_y: 0,
            obstacles: Vec::new(),
            done: false,
            steps: 0,
            config,
            rng,
        };
        game.reset();
        Ok(game)
    }

    /// Start an episode from a fixed layout. Obstacle respawns stay random.
    pub fn from_layout(
        config: ArcadeConfig,
        layout: ArcadeLayout,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        layout.validate(&config)?;
        let mut game = Self::with_seed(config, seed)?;
        game.player_x = layout.player_x;
        game.goal_x = layout.goal.0;
        game.goal_y = layout.goal.1;
        game.obstacles = layout.obstacles;
        Ok(game)
    }

    pub fn config(&self) -> &ArcadeConfig {
        &self.config
    }

    pub fn player_x(&self) -> usize {
        self.player_x
    }

    pub fn goal(&self) -> (usize, usize) {
        (self.goal_x, self.goal_y)
    }

    pub fn obstacles(&self) -> &[(usize, usize)] {
        &self.obstacles
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    fn bottom(&self) -> usize {
        self.config.height - 1
    }

    fn random_column(&mut self) -> usize {
        self.rng.random_range(0..self.config.width)
    }

    fn observation(&self) -> Vec<f32> {
        let x_scale = (self.config.width - 1) as f32;
        let y_scale = (self.config.height - 1) as f32;
        let mut features = Vec::with_capacity(self.config.state_size());
        features.push(self.player_x as f32 / x_scale);
        features.push(self.goal_x as f32 / x_scale);
        features.push(self.goal_y as f32 / y_scale);
        for &(x, y) in &self.obstacles {
            features.push(x as f32 / x_scale);
            features.push(y as f32 / y_scale);
        }
        features
    }

    fn advance_obstacles(&mut self) {
        let height = self.config.height;
        for i in 0..self.obstacles.len() {
            let (x, y) = self.obstacles[i];
            self.obstacles[i] = if y + 1 >= height {
                (self.random_column(), 1)
            } else {
                (x, y + 1)
            };
        }
    }

    fn advance_goal(&mut self) {
        if self.steps % 2 != 0 {
            return;
        }
        self.goal_y += 1;
        if self.goal_y >= self.config.height {
            self.goal_x = self.random_column();
            self.goal_y = 0;
        }
    }

    fn finish(&mut self, reward: f32, info: StepInfo) -> StepResult<Vec<f32>> {
        self.done = true;
        debug!(
            "arcade episode ended after {} steps: {:?} (reward {reward})",
            self.steps, info
        );
        StepResult {
            state: self.observation(),
            reward,
            terminal: true,
            info,
        }
    }
}

impl Environment for ArcadeGame {
    type State = Vec<f32>;
    type Action = Move;

    fn reset(&mut self) -> Vec<f32> {
        let width = self.config.width;
        self.player_x = width / 2;
        self.goal_x = self.random_column();
        self.goal_y = 0;
        let upper = (self.config.height / 2).max(1);
        self.obstacles = (0..self.config.obstacles)
            .map(|_| {
                (
                    self.rng.random_range(0..width),
                    self.rng.random_range(1..=upper),
                )
            })
            .collect();
        self.done = false;
        self.steps = 0;
        self.observation()
    }

    fn step(&mut self, action: Move) -> Result<StepResult<Vec<f32>>, EnvError> {
        if self.done {
            warn!("step called on a finished arcade episode");
            return Err(EnvError::EpisodeFinished);
        }

        match action {
            Move::Left => self.player_x = self.player_x.saturating_sub(1),
            Move::Stay => {}
            Move::Right => self.player_x = (self.player_x + 1).min(self.config.width - 1),
        }

        self.advance_obstacles();
        self.advance_goal();

        let bottom = self.bottom();
        if self
            .obstacles
            .iter()
            .any(|&(x, y)| y == bottom && x == self.player_x)
        {
            return Ok(self.finish(COLLISION_REWARD, StepInfo::Collision));
        }

        if self.goal_y == bottom && self.goal_x == self.player_x {
            return Ok(self.finish(GOAL_REWARD, StepInfo::Goal));
        }

        self.steps += 1;
        if self.config.max_steps.is_some_and(|limit| self.steps >= limit) {
            return Ok(self.finish(0.0, StepInfo::Timeout));
        }

        Ok(StepResult {
            state: self.observation(),
            reward: STEP_PENALTY,
            terminal: false,
            info: StepInfo::Ongoing,
        })
    }

    fn legal_actions(&self, _state: &Vec<f32>) -> Vec<Move> {
        Move::ALL.to_vec()
    }

    fn state(&self) -> Vec<f32> {
        self.observation()
    }

    fn is_done(&self) -> bool {
        self.done
    }

    fn render(&self) -> String {
        let mut rows = vec![vec!['.'; self.config.width]; self.config.height];
        for &(x, y) in &self.obstacles {
            if y < self.config.height && x < self.config.width {
                rows[y][x] = '#';
            }
        }
        if self.goal_y < self.config.height && self.goal_x < self.config.width {
            rows[self.goal_y][self.goal_x] = 'G';
        }
        let bottom = self.bottom();
        rows[bottom][self.player_x] = 'P';
        rows.into_iter()
            .map(|row| row.into_iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
