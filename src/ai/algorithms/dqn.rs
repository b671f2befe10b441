use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder, RecorderError};
use burn::tensor::TensorData;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::ai::agent::{Agent, AgentState, EnvTransition};
use crate::ai::networks::{ValueNetwork, ValueNetworkConfig};
use crate::ai::state_encoding::{action_mask, encode_state, encode_states_batch, FeatureEncoding};
use crate::error::AgentError;
use crate::training::ReplayBuffer;

type InferBackend = NdArray;
type TrainBackend = Autodiff<InferBackend>;
type Device = <TrainBackend as Backend>::Device;
type AdamOptimizer = OptimizerAdaptor<burn::optim::Adam, ValueNetwork<TrainBackend>, TrainBackend>;

/// DQN hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub learning_rate: f64,
    pub gamma: f32,
    pub epsilon_start: f32,
    /// Multiplier applied to epsilon after every training step.
    pub epsilon_decay: f32,
    pub epsilon_min: f32,
    pub buffer_size: usize,
    pub batch_size: usize,
    /// Training steps between hard target-network syncs.
    pub target_update: usize,
    pub hidden_size: usize,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            learning_rate: 1e-3,
            gamma: 0.99,
            epsilon_start: 1.0,
            epsilon_decay: 0.995,
            epsilon_min: 0.01,
            buffer_size: 100_000,
            batch_size: 64,
            target_update: 1000,
            hidden_size: 128,
        }
    }
}

/// Serialized form of a [`DqnAgent`].
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct SavedAgent {
    #[serde(default)]
    policy: Option<Vec<u8>>,
    #[serde(default)]
    target: Option<Vec<u8>>,
    #[serde(default)]
    optimizer: Option<Vec<u8>>,
    #[serde(default)]
    epsilon: Option<f32>,
    #[serde(default)]
    step_count: Option<usize>,
}

/// DQN agent with online + target networks, replay buffer, and Adam optimizer.
///
/// The target network is only ever a `valid()` snapshot of the online
/// network, refreshed every `target_update` training steps.
pub struct DqnAgent<E: FeatureEncoding> {
    q_network: ValueNetwork<TrainBackend>,
    target_network: ValueNetwork<InferBackend>,
    optimizer: AdamOptimizer,
    replay_buffer: ReplayBuffer<EnvTransition<E>>,
    network_config: ValueNetworkConfig,
    config: DqnConfig,
    device: Device,
    epsilon: f32,
    step_count: usize,
    rng: StdRng,
}

impl<E: FeatureEncoding> DqnAgent<E> {
    /// Build an agent sized for `env`'s observations and action space.
    pub fn new(env: &E, config: DqnConfig) -> Self {
        Self::build(env, config, StdRng::from_os_rng())
    }

    pub fn with_seed(env: &E, config: DqnConfig, seed: u64) -> Self {
        Self::build(env, config, StdRng::seed_from_u64(seed))
    }

    fn build(env: &E, config: DqnConfig, rng: StdRng) -> Self {
        let device = Device::default();
        let network_config = ValueNetworkConfig::new(env.observation_size(), E::ACTION_COUNT)
            .with_hidden_size(config.hidden_size);
        let q_network: ValueNetwork<TrainBackend> = network_config.init(&device);
        let target_network = q_network.valid();

        DqnAgent {
            q_network,
            target_network,
            optimizer: AdamConfig::new().init(),
            replay_buffer: ReplayBuffer::new(config.buffer_size),
            network_config,
            epsilon: config.epsilon_start,
            config,
            device,
            step_count: 0,
            rng,
        }
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Set epsilon directly (e.g. 0.0 for pure greedy evaluation).
    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon;
    }

    /// Number of gradient steps taken so far.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn buffer_len(&self) -> usize {
        self.replay_buffer.len()
    }

    /// Online network Q-values for every action index.
    pub fn q_values(&self, state: &E::State) -> Result<Vec<f32>, AgentError> {
        let input = encode_state::<InferBackend, E>(state, &self.device);
        tensor_values(self.q_network.valid().forward(input))
    }

    /// Target network Q-values for every action index.
    pub fn target_q_values(&self, state: &E::State) -> Result<Vec<f32>, AgentError> {
        let input = encode_state::<InferBackend, E>(state, &self.device);
        tensor_values(self.target_network.forward(input))
    }

    fn greedy_action(
        &self,
        state: &E::State,
        legal: &[E::Action],
    ) -> Result<E::Action, AgentError> {
        let q_values = self.q_values(state)?;

        let mut masked = vec![f32::NEG_INFINITY; E::ACTION_COUNT];
        for &action in legal {
            let index = E::action_index(action);
            if let Some(&q) = q_values.get(index) {
                masked[index] = q;
            }
        }

        // First index wins ties.
        let mut best: Option<(usize, f32)> = None;
        for (index, &q) in masked.iter().enumerate() {
            if q > f32::NEG_INFINITY && best.map_or(true, |(_, best_q)| q > best_q) {
                best = Some((index, q));
            }
        }

        best.and_then(|(index, _)| E::action_from_index(index))
            .ok_or(AgentError::NoLegalActions)
    }

    /// One gradient update from a sampled minibatch. `None` when the buffer
    /// cannot fill a batch yet.
    fn train_step(&mut self) -> Option<f32> {
        let batch_size = self.config.batch_size;
        if batch_size == 0 || self.replay_buffer.len() < batch_size {
            return None;
        }

        let (states, next_states, mask, rewards, dones) = {
            let batch = match self.replay_buffer.sample(batch_size, &mut self.rng) {
                Ok(batch) => batch,
                Err(err) => {
                    debug!("skipping dqn update: {err}");
                    return None;
                }
            };
            let states: Vec<&E::State> = batch.iter().map(|t| &t.state).collect();
            let next_states: Vec<&E::State> = batch.iter().map(|t| &t.next_state).collect();
            let actions: Vec<E::Action> = batch.iter().map(|t| t.action).collect();
            (
                encode_states_batch::<TrainBackend, E>(&states, &self.device),
                encode_states_batch::<InferBackend, E>(&next_states, &self.device),
                action_mask::<TrainBackend, E>(&actions, &self.device),
                batch.iter().map(|t| t.reward).collect::<Vec<f32>>(),
                batch.iter().map(|t| t.done).collect::<Vec<bool>>(),
            )
        };

        // Q(s, a) = sum(q_all * mask, dim=1) -> [B, 1]
        let q_all = self.q_network.forward(states);
        let q_taken = (q_all * mask).sum_dim(1);

        // Bootstrapped targets from the target network, max over all actions.
        let next_max = match tensor_values(self.target_network.forward(next_states).max_dim(1)) {
            Ok(values) => values,
            Err(err) => {
                warn!("skipping dqn update: {err}");
                return None;
            }
        };
        let target_data: Vec<f32> = (0..batch_size)
            .map(|i| {
                let continuation = if dones[i] { 0.0 } else { 1.0 };
                rewards[i] + continuation * self.config.gamma * next_max[i]
            })
            .collect();
        let targets = Tensor::<TrainBackend, 1>::from_data(
            TensorData::from(target_data.as_slice()),
            &self.device,
        )
        .reshape([batch_size, 1]);

        // MSE loss
        let diff = q_taken - targets;
        let loss = (diff.clone() * diff).mean();
        let loss_val = loss
            .clone()
            .into_data()
            .to_vec::<f32>()
            .ok()
            .and_then(|v| v.first().copied())
            .unwrap_or(f32::NAN);

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.q_network);
        self.q_network = self
            .optimizer
            .step(self.config.learning_rate, self.q_network.clone(), grads);

        self.step_count += 1;
        if self.config.target_update > 0 && self.step_count % self.config.target_update == 0 {
            self.target_network = self.q_network.valid();
            debug!("dqn target network synced at step {}", self.step_count);
        }

        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);

        Some(loss_val)
    }

    fn recorder() -> BinBytesRecorder<FullPrecisionSettings> {
        BinBytesRecorder::<FullPrecisionSettings>::default()
    }
}

impl<E: FeatureEncoding> Agent<E> for DqnAgent<E> {
    /// Epsilon-greedy over the online network, restricted to `legal`.
    fn act(&mut self, state: &E::State, legal: &[E::Action]) -> Result<E::Action, AgentError> {
        if legal.is_empty() {
            return Err(AgentError::NoLegalActions);
        }

        if self.rng.random::<f32>() < self.epsilon {
            return legal
                .choose(&mut self.rng)
                .copied()
                .ok_or(AgentError::NoLegalActions);
        }

        self.greedy_action(state, legal)
    }

    fn name(&self) -> &str {
        "DQN"
    }

    fn train(&mut self, transition: Option<EnvTransition<E>>) -> Option<f32> {
        if let Some(transition) = transition {
            self.replay_buffer.push(transition);
        }
        self.train_step()
    }

    fn save(&self) -> Result<AgentState, AgentError> {
        let recorder = Self::recorder();
        let policy = Recorder::<TrainBackend>::record(
            &recorder,
            self.q_network.clone().into_record(),
            (),
        )
        .map_err(record_error)?;
        let target = Recorder::<InferBackend>::record(
            &recorder,
            self.target_network.clone().into_record(),
            (),
        )
        .map_err(record_error)?;
        let optimizer = Recorder::<TrainBackend>::record(&recorder, self.optimizer.to_record(), ())
            .map_err(record_error)?;

        let saved = SavedAgent {
            policy: Some(policy),
            target: Some(target),
            optimizer: Some(optimizer),
            epsilon: Some(self.epsilon),
            step_count: Some(self.step_count),
        };
        Ok(AgentState {
            data: serde_json::to_vec(&saved)?,
        })
    }

    /// Restore a blob from [`Agent::save`]. The online parameters are
    /// mandatory; every other field falls back to the current value.
    fn load(&mut self, state: &AgentState) -> Result<(), AgentError> {
        let saved: SavedAgent = serde_json::from_slice(&state.data)?;
        let recorder = Self::recorder();

        let policy_bytes = saved.policy.ok_or(AgentError::MissingParameters("policy"))?;
        let policy_record = Recorder::<TrainBackend>::load(&recorder, policy_bytes, &self.device)
            .map_err(record_error)?;
        let q_network = self
            .network_config
            .init::<TrainBackend>(&self.device)
            .load_record(policy_record);

        let target_network = match saved.target {
            Some(bytes) => {
                let record = Recorder::<InferBackend>::load(&recorder, bytes, &self.device)
                    .map_err(record_error)?;
                self.network_config
                    .init::<InferBackend>(&self.device)
                    .load_record(record)
            }
            None => {
                warn!("dqn state has no target parameters; copying the policy network");
                q_network.valid()
            }
        };

        let fresh: AdamOptimizer = AdamConfig::new().init();
        let optimizer = match saved.optimizer {
            Some(bytes) => {
                let record = Recorder::<TrainBackend>::load(&recorder, bytes, &self.device)
                    .map_err(record_error)?;
                fresh.load_record(record)
            }
            None => {
                warn!("dqn state has no optimizer state; starting a fresh optimizer");
                fresh
            }
        };

        self.q_network = q_network;
        self.target_network = target_network;
        self.optimizer = optimizer;

        match saved.epsilon {
            Some(epsilon) => self.epsilon = epsilon,
            None => warn!("dqn state has no epsilon; keeping {}", self.epsilon),
        }
        match saved.step_count {
            Some(steps) => self.step_count = steps,
            None => warn!("dqn state has no step count; keeping {}", self.step_count),
        }
        Ok(())
    }
}

fn tensor_values<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> Result<Vec<f32>, AgentError> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .map_err(|err| AgentError::Record(format!("{err:?}")))
}

fn record_error(err: RecorderError) -> AgentError {
    AgentError::Record(err.to_string())
}
