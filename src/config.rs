use std::path::Path;

use log::warn;

use crate::ai::{DqnConfig, MctsConfig};
use crate::error::ConfigError;
use crate::game::ArcadeConfig;

/// Minimax search settings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MinimaxConfig {
    pub max_depth: usize,
}

impl Default for MinimaxConfig {
    fn default() -> Self {
        MinimaxConfig { max_depth: 9 }
    }
}

/// Episode loop settings for the DQN trainer.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub episodes: usize,
    /// Step cap per episode; also the arcade timeout when none is configured.
    pub max_steps: usize,
    /// Episodes averaged for progress reports and best-model selection.
    pub log_window: usize,
    /// Episodes between periodic agent snapshots.
    pub checkpoint_interval: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            episodes: 500,
            max_steps: 300,
            log_window: 25,
            checkpoint_interval: 100,
        }
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dqn: DqnConfig,
    pub mcts: MctsConfig,
    pub minimax: MinimaxConfig,
    pub arcade: ArcadeConfig,
    pub training: TrainingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!("config file '{}' not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // DQN
        if self.dqn.learning_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "dqn.learning_rate must be > 0".into(),
            ));
        }
        if self.dqn.batch_size == 0 {
            return Err(ConfigError::Validation(
                "dqn.batch_size must be > 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.dqn.gamma) {
            return Err(ConfigError::Validation(
                "dqn.gamma must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.dqn.epsilon_start) {
            return Err(ConfigError::Validation(
                "dqn.epsilon_start must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.dqn.epsilon_min) {
            return Err(ConfigError::Validation(
                "dqn.epsilon_min must be in [0, 1]".into(),
            ));
        }
        if self.dqn.epsilon_min > self.dqn.epsilon_start {
            return Err(ConfigError::Validation(
                "dqn.epsilon_min must be <= dqn.epsilon_start".into(),
            ));
        }
        if self.dqn.epsilon_decay <= 0.0 || self.dqn.epsilon_decay > 1.0 {
            return Err(ConfigError::Validation(
                "dqn.epsilon_decay must be in (0, 1]".into(),
            ));
        }
        if self.dqn.buffer_size < self.dqn.batch_size {
            return Err(ConfigError::Validation(
                "dqn.buffer_size must be >= dqn.batch_size".into(),
            ));
        }
        if self.dqn.target_update == 0 {
            return Err(ConfigError::Validation(
                "dqn.target_update must be > 0".into(),
            ));
        }
        if self.dqn.hidden_size == 0 {
            return Err(ConfigError::Validation(
                "dqn.hidden_size must be > 0".into(),
            ));
        }

        // MCTS
        if self.mcts.num_simulations == 0 {
            return Err(ConfigError::Validation(
                "mcts.num_simulations must be >= 1".into(),
            ));
        }
        if self.mcts.exploration <= 0.0 {
            return Err(ConfigError::Validation(
                "mcts.exploration must be > 0".into(),
            ));
        }
        if self.mcts.rollout_depth_limit == 0 {
            return Err(ConfigError::Validation(
                "mcts.rollout_depth_limit must be >= 1".into(),
            ));
        }

        if self.minimax.max_depth == 0 {
            return Err(ConfigError::Validation(
                "minimax.max_depth must be >= 1".into(),
            ));
        }

        // Arcade
        self.arcade.validate()?;

        // Training
        if self.training.episodes == 0 {
            return Err(ConfigError::Validation(
                "training.episodes must be > 0".into(),
            ));
        }
        if self.training.max_steps == 0 {
            return Err(ConfigError::Validation(
                "training.max_steps must be > 0".into(),
            ));
        }
        if self.training.log_window == 0 {
            return Err(ConfigError::Validation(
                "training.log_window must be > 0".into(),
            ));
        }
        if self.training.checkpoint_interval == 0 {
            return Err(ConfigError::Validation(
                "training.checkpoint_interval must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Every section at its default values, as TOML. Printed by `train --print-config`.
    pub fn default_toml() -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&AppConfig::default())?)
    }
}
