use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use ml_game_agents::ai::{Agent, AgentState, DqnAgent};
use ml_game_agents::config::AppConfig;
use ml_game_agents::game::ArcadeGame;
use ml_game_agents::training::{run_episode, TrainingMetrics};

/// Train a DQN agent on the arcade game.
#[derive(Parser)]
#[command(name = "train", about = "Train a DQN agent on the arcade game")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override number of training episodes
    #[arg(long)]
    episodes: Option<usize>,

    /// Override the per-episode step cap
    #[arg(long)]
    max_steps: Option<usize>,

    /// Override learning rate
    #[arg(long)]
    lr: Option<f64>,

    /// Directory for saved agent states
    #[arg(long, default_value = "checkpoints")]
    checkpoint_dir: PathBuf,

    /// Resume from a previously saved agent state
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Seed for the environment and agent
    #[arg(long)]
    seed: Option<u64>,

    /// Greedy evaluation episodes after training
    #[arg(long, default_value_t = 10)]
    eval_episodes: usize,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", AppConfig::default_toml()?);
        return Ok(());
    }

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(episodes) = cli.episodes {
        app_config.training.episodes = episodes;
    }
    if let Some(max_steps) = cli.max_steps {
        app_config.training.max_steps = max_steps;
    }
    if let Some(lr) = cli.lr {
        app_config.dqn.learning_rate = lr;
    }
    app_config.validate().context("validating configuration")?;

    let training = app_config.training.clone();
    let mut arcade_config = app_config.arcade.clone();
    if arcade_config.max_steps.is_none() {
        arcade_config.max_steps = Some(training.max_steps);
    }

    let (mut env, mut agent) = match cli.seed {
        Some(seed) => {
            let env = ArcadeGame::with_seed(arcade_config, seed)
                .context("building the arcade environment")?;
            let agent = DqnAgent::with_seed(&env, app_config.dqn.clone(), seed);
            (env, agent)
        }
        None => {
            let env =
                ArcadeGame::new(arcade_config).context("building the arcade environment")?;
            let agent = DqnAgent::new(&env, app_config.dqn.clone());
            (env, agent)
        }
    };

    if let Some(path) = &cli.resume {
        let data = std::fs::read(path)
            .with_context(|| format!("reading agent state from {}", path.display()))?;
        agent
            .load(&AgentState { data })
            .with_context(|| format!("restoring agent state from {}", path.display()))?;
        println!(
            "Resumed from {} (epsilon {:.3}, {} steps)",
            path.display(),
            agent.epsilon(),
            agent.step_count()
        );
    }

    std::fs::create_dir_all(&cli.checkpoint_dir)
        .with_context(|| format!("creating {}", cli.checkpoint_dir.display()))?;

    let mut metrics = TrainingMetrics::with_capacity(training.log_window.max(100));
    let window = training.log_window;

    println!(
        "Starting DQN arcade training for {} episodes (max {} steps each)...",
        training.episodes, training.max_steps
    );
    println!("-------------------------------------------");

    for episode in 1..=training.episodes {
        let summary = run_episode(&mut env, &mut agent, training.max_steps, true)
            .with_context(|| format!("running episode {episode}"))?;
        metrics.record_episode(summary.total_reward);
        if let Some(loss) = summary.mean_loss() {
            metrics.record_loss(loss);
        }

        if episode % window == 0 {
            println!(
                "Episode {}/{} | avg_reward({}): {:.3} | epsilon: {:.3} | loss: {:.4}",
                episode,
                training.episodes,
                window,
                metrics.average_reward(window),
                agent.epsilon(),
                metrics.average_loss(window),
            );
            if metrics.update_best(window) {
                let path = save_agent(&agent, &cli.checkpoint_dir, "dqn_arcade_best.json")?;
                println!("  >> New best average, saved {}", path.display());
            }
        }

        if episode % training.checkpoint_interval == 0 {
            let name = format!("dqn_arcade_ep{episode}.json");
            let path = save_agent(&agent, &cli.checkpoint_dir, &name)?;
            println!("  >> Checkpoint saved: {}", path.display());
        }
    }

    let final_path = save_agent(&agent, &cli.checkpoint_dir, "dqn_arcade_final.json")?;
    println!("-------------------------------------------");
    println!(
        "Training complete. Total episodes: {} | training steps: {}",
        metrics.total_episodes(),
        agent.step_count()
    );
    println!("Final agent state saved to {}", final_path.display());

    if cli.eval_episodes > 0 {
        let average = evaluate(&mut env, &mut agent, cli.eval_episodes, training.max_steps)?;
        println!(
            "Greedy eval ({} episodes): {:.3} average reward",
            cli.eval_episodes, average
        );
    }

    Ok(())
}

fn save_agent(agent: &DqnAgent<ArcadeGame>, dir: &Path, name: &str) -> Result<PathBuf> {
    let blob = agent.save().context("serializing agent state")?;
    let path = dir.join(name);
    std::fs::write(&path, &blob.data)
        .with_context(|| format!("writing agent state to {}", path.display()))?;
    info!("wrote {} bytes to {}", blob.data.len(), path.display());
    Ok(path)
}

/// Average reward of greedy episodes without learning.
fn evaluate(
    env: &mut ArcadeGame,
    agent: &mut DqnAgent<ArcadeGame>,
    episodes: usize,
    max_steps: usize,
) -> Result<f32> {
    let saved_epsilon = agent.epsilon();
    agent.set_epsilon(0.0);

    let mut total = 0.0;
    for _ in 0..episodes {
        let summary = run_episode(env, agent, max_steps, false)?;
        total += summary.total_reward;
    }

    agent.set_epsilon(saved_epsilon); // restore
    Ok(total / episodes as f32)
}
