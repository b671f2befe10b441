use log::debug;

use crate::ai::{Agent, Transition};
use crate::error::EpisodeError;
use crate::game::{Environment, Outcome, Player, StepInfo, TurnBased};

/// Totals for one single-agent episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub total_reward: f32,
    pub steps: usize,
    /// Whether the environment reached a terminal state before the step cap.
    pub terminal: bool,
    /// Info of the final step taken.
    pub last_info: StepInfo,
    /// Losses reported by the agent's training steps.
    pub losses: Vec<f32>,
}

impl EpisodeSummary {
    pub fn mean_loss(&self) -> Option<f32> {
        if self.losses.is_empty() {
            None
        } else {
            Some(self.losses.iter().sum::<f32>() / self.losses.len() as f32)
        }
    }
}

/// Play one episode of `env` with `agent`, for at most `max_steps` steps.
///
/// With `learn` set, every transition is fed to [`Agent::train`].
pub fn run_episode<E, A>(
    env: &mut E,
    agent: &mut A,
    max_steps: usize,
    learn: bool,
) -> Result<EpisodeSummary, EpisodeError>
where
    E: Environment,
    A: Agent<E> + ?Sized,
{
    let mut state = env.reset();
    let mut summary = EpisodeSummary {
        total_reward: 0.0,
        steps: 0,
        terminal: false,
        last_info: StepInfo::Ongoing,
        losses: Vec::new(),
    };

    while summary.steps < max_steps {
        let legal = env.legal_actions(&state);
        let action = agent.act(&state, &legal)?;
        let result = env.step(action)?;

        summary.steps += 1;
        summary.total_reward += result.reward;
        summary.last_info = result.info;
        summary.terminal = result.terminal;

        if learn {
            let transition = Transition {
                state,
                action,
                reward: result.reward,
                next_state: result.state.clone(),
                done: result.terminal,
            };
            if let Some(loss) = agent.train(Some(transition)) {
                summary.losses.push(loss);
            }
        }

        state = result.state;
        if result.terminal {
            break;
        }
    }

    Ok(summary)
}

/// Result of a two-agent game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub outcome: Outcome,
    pub moves: usize,
    /// The game ended on an invalid move by the loser.
    pub forfeit: bool,
}

/// Play one game of `env`, `first` as X and `second` as O.
pub fn play_match<E: TurnBased>(
    env: &mut E,
    first: &mut dyn Agent<E>,
    second: &mut dyn Agent<E>,
) -> Result<MatchResult, EpisodeError> {
    let mut state = env.reset();
    let mut moves = 0;

    loop {
        let legal = env.legal_actions(&state);
        let agent: &mut dyn Agent<E> = match env.current_player() {
            Player::X => &mut *first,
            Player::O => &mut *second,
        };
        let action = agent.act(&state, &legal)?;
        let result = env.step(action)?;
        moves += 1;

        if let Some(outcome) = env.outcome() {
            debug!("match finished after {moves} moves: {outcome:?}\n{}", env.render());
            return Ok(MatchResult {
                outcome,
                moves,
                forfeit: result.info.is_invalid(),
            });
        }
        state = result.state;
    }
}

/// Moves and transitions recorded from one self-play game.
pub struct SelfPlayTrace<S, A> {
    pub transitions: Vec<Transition<S, A>>,
    pub outcome: Outcome,
}

/// Play one game with `agent` controlling both sides.
pub fn play_self_play_episode<E: TurnBased>(
    env: &mut E,
    agent: &mut dyn Agent<E>,
) -> Result<SelfPlayTrace<E::State, E::Action>, EpisodeError> {
    let mut state = env.reset();
    let mut move_records = Vec::new();

    loop {
        let player = env.current_player();
        let legal = env.legal_actions(&state);
        let action = agent.act(&state, &legal)?;
        move_records.push((state, action, player));
        let result = env.step(action)?;
        state = result.state;

        if let Some(outcome) = env.outcome() {
            let transitions = build_self_play_transitions(&move_records, &state, outcome);
            return Ok(SelfPlayTrace {
                transitions,
                outcome,
            });
        }
    }
}

/// Build transitions with sparse rewards from self-play move records.
///
/// The final move and the one before it receive the game result from their
/// mover's perspective (+1 win, -1 loss, 0 draw); every earlier move gets 0.
pub fn build_self_play_transitions<S: Clone, A: Copy>(
    move_records: &[(S, A, Player)],
    final_state: &S,
    outcome: Outcome,
) -> Vec<Transition<S, A>> {
    let game_length = move_records.len();
    let result_for = |player: Player| match outcome {
        Outcome::Winner(winner) if winner == player => 1.0,
        Outcome::Winner(_) => -1.0,
        Outcome::Draw => 0.0,
    };

    move_records
        .iter()
        .enumerate()
        .map(|(i, (state, action, player))| {
            let is_last = i + 1 == game_length;
            let next_state = if is_last {
                final_state.clone()
            } else {
                move_records[i + 1].0.clone()
            };
            let reward = if i + 2 >= game_length {
                result_for(*player)
            } else {
                0.0
            };
            Transition {
                state: state.clone(),
                action: *action,
                reward,
                next_state,
                done: is_last,
            }
        })
        .collect()
}
