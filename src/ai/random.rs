use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::error::AgentError;
use crate::game::Environment;

use super::agent::Agent;

/// An agent that selects uniformly at random from legal actions.
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    pub fn new() -> Self {
        RandomAgent {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        RandomAgent {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Environment> Agent<E> for RandomAgent {
    fn act(&mut self, _state: &E::State, legal: &[E::Action]) -> Result<E::Action, AgentError> {
        legal
            .choose(&mut self.rng)
            .copied()
            .ok_or(AgentError::NoLegalActions)
    }

    fn name(&self) -> &str {
        "Random"
    }
}
