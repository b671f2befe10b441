use crate::error::AgentError;
use crate::game::Environment;

/// A single step of experience for learning agents.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S, A> {
    pub state: S,
    pub action: A,
    pub reward: f32,
    pub next_state: S,
    pub done: bool,
}

/// Transition type for environment `E`.
pub type EnvTransition<E> = Transition<<E as Environment>::State, <E as Environment>::Action>;

/// Opaque serialized agent state. The byte layout is owned by the agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentState {
    pub data: Vec<u8>,
}

impl AgentState {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Universal interface for agents playing environment `E`.
///
/// Agents receive state snapshots and never mutate caller-owned state.
pub trait Agent<E: Environment> {
    /// Choose one of `legal_actions` for `state`.
    fn act(&mut self, state: &E::State, legal_actions: &[E::Action])
        -> Result<E::Action, AgentError>;

    /// Return the agent's display name.
    fn name(&self) -> &str;

    /// Feed an optional transition and run one learning step.
    /// Returns the training loss when a step was taken.
    fn train(&mut self, _transition: Option<EnvTransition<E>>) -> Option<f32> {
        None
    }

    /// Serialize the agent's learned state.
    fn save(&self) -> Result<AgentState, AgentError> {
        Ok(AgentState::default())
    }

    /// Restore state previously produced by [`Agent::save`].
    fn load(&mut self, _state: &AgentState) -> Result<(), AgentError> {
        Ok(())
    }
}
