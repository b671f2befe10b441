use std::path::PathBuf;

/// Errors raised by environments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvError {
    #[error("episode is already finished; call reset before stepping again")]
    EpisodeFinished,
}

/// Errors raised by agents.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("no legal actions to choose from")]
    NoLegalActions,

    #[error("agent state is missing required field '{0}'")]
    MissingParameters(&'static str),

    #[error("failed to (de)serialize agent state: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to record network parameters: {0}")]
    Record(String),
}

/// Errors raised by the replay buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("requested {requested} transitions but only {available} are stored")]
    InsufficientData { requested: usize, available: usize },
}

/// Errors raised while driving an episode or match.
#[derive(Debug, thiserror::Error)]
pub enum EpisodeError {
    #[error("environment error: {0}")]
    Env(#[from] EnvError),

    #[error("agent error: {0}")]
    Agent(#[from] AgentError),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
