use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use ml_game_agents::ai::{
    Agent, AgentState, DqnAgent, FeatureEncoding, MctsAgent, MinimaxAgent, RandomAgent,
};
use ml_game_agents::config::AppConfig;
use ml_game_agents::game::{ConnectFour, Player, TicTacToe, TurnBased};
use ml_game_agents::training::{play_match, MatchTally};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Game {
    Tictactoe,
    ConnectFour,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum AgentKind {
    Minimax,
    Mcts,
    Dqn,
    Random,
}

/// Pit two agents against each other on a board game.
#[derive(Parser)]
#[command(name = "ml_game_agents", about = "Run matches between game-playing agents")]
struct Cli {
    /// Game to play
    #[arg(long, value_enum, default_value = "tictactoe")]
    game: Game,

    /// Agent playing X in the first game
    #[arg(long, value_enum, default_value = "minimax")]
    first: AgentKind,

    /// Agent playing O in the first game
    #[arg(long, value_enum, default_value = "random")]
    second: AgentKind,

    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Swap sides after every game
    #[arg(long)]
    alternate: bool,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Saved DQN agent state used by `dqn` agents
    #[arg(long)]
    dqn_state: Option<PathBuf>,

    /// Base seed for stochastic agents
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final board of every game
    #[arg(long)]
    show_boards: bool,
}

/// Everything needed to build an agent for one game.
struct AgentSpec<'a> {
    kind: AgentKind,
    player: Player,
    seed: Option<u64>,
    config: &'a AppConfig,
    dqn_state: Option<&'a Path>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    match cli.game {
        Game::Tictactoe => run_series(&cli, &config, TicTacToe::new(), tictactoe_agent),
        Game::ConnectFour => run_series(&cli, &config, ConnectFour::new(), connect_four_agent),
    }
}

fn run_series<E>(
    cli: &Cli,
    config: &AppConfig,
    mut env: E,
    build: fn(&E, AgentSpec) -> Result<Box<dyn Agent<E>>>,
) -> Result<()>
where
    E: TurnBased,
{
    let mut tally = MatchTally::default();
    let mut total_moves = 0;
    let mut names = (String::new(), String::new());

    for game in 0..cli.games {
        let first_player = if cli.alternate && game % 2 == 1 {
            Player::O
        } else {
            Player::X
        };
        let seed = cli.seed.map(|s| s.wrapping_add(game as u64 * 2));
        let spec = |kind, player, seed| AgentSpec {
            kind,
            player,
            seed,
            config,
            dqn_state: cli.dqn_state.as_deref(),
        };
        let mut first = build(&env, spec(cli.first, first_player, seed))?;
        let mut second = build(
            &env,
            spec(cli.second, first_player.other(), seed.map(|s| s.wrapping_add(1))),
        )?;
        names = (first.name().to_string(), second.name().to_string());

        let result = match first_player {
            Player::X => play_match(&mut env, first.as_mut(), second.as_mut()),
            Player::O => play_match(&mut env, second.as_mut(), first.as_mut()),
        }
        .with_context(|| format!("playing game {}", game + 1))?;

        tally.record(result.outcome, first_player);
        total_moves += result.moves;

        println!(
            "Game {}/{}: {} as {} | {:?} in {} moves{}",
            game + 1,
            cli.games,
            names.0,
            first_player.name(),
            result.outcome,
            result.moves,
            if result.forfeit { " (forfeit)" } else { "" }
        );
        if cli.show_boards {
            println!("{}", env.render());
        }
    }

    println!("-------------------------------------------");
    println!(
        "{} wins: {} | {} wins: {} | draws: {}",
        names.0, tally.first_wins, names.1, tally.second_wins, tally.draws
    );
    if tally.games() > 0 {
        println!(
            "{} win rate: {:.1}% | draw rate: {:.1}% | avg moves: {:.1}",
            names.0,
            tally.win_rate() * 100.0,
            tally.draw_rate() * 100.0,
            total_moves as f32 / tally.games() as f32
        );
    }
    Ok(())
}

fn tictactoe_agent(env: &TicTacToe, spec: AgentSpec) -> Result<Box<dyn Agent<TicTacToe>>> {
    let agent: Box<dyn Agent<TicTacToe>> = match spec.kind {
        AgentKind::Minimax => Box::new(MinimaxAgent::new(
            spec.player,
            spec.config.minimax.max_depth,
        )),
        AgentKind::Random => Box::new(random_agent(spec.seed)),
        AgentKind::Dqn => Box::new(dqn_agent(env, &spec)?),
        AgentKind::Mcts => bail!("mcts only plays connect four"),
    };
    Ok(agent)
}

fn connect_four_agent(env: &ConnectFour, spec: AgentSpec) -> Result<Box<dyn Agent<ConnectFour>>> {
    let agent: Box<dyn Agent<ConnectFour>> = match spec.kind {
        AgentKind::Mcts => {
            let mcts = spec.config.mcts.clone();
            Box::new(match spec.seed {
                Some(seed) => MctsAgent::with_seed(spec.player, mcts, seed),
                None => MctsAgent::new(spec.player, mcts),
            })
        }
        AgentKind::Random => Box::new(random_agent(spec.seed)),
        AgentKind::Dqn => Box::new(dqn_agent(env, &spec)?),
        AgentKind::Minimax => bail!("minimax only plays tic-tac-toe"),
    };
    Ok(agent)
}

fn random_agent(seed: Option<u64>) -> RandomAgent {
    match seed {
        Some(seed) => RandomAgent::with_seed(seed),
        None => RandomAgent::new(),
    }
}

/// Greedy DQN agent, restored from `--dqn-state` when given.
fn dqn_agent<E>(env: &E, spec: &AgentSpec) -> Result<DqnAgent<E>>
where
    E: FeatureEncoding,
{
    let config = spec.config.dqn.clone();
    let mut agent = match spec.seed {
        Some(seed) => DqnAgent::with_seed(env, config, seed),
        None => DqnAgent::new(env, config),
    };
    if let Some(path) = spec.dqn_state {
        let data = std::fs::read(path)
            .with_context(|| format!("reading agent state from {}", path.display()))?;
        agent
            .load(&AgentState { data })
            .with_context(|| format!("restoring agent state from {}", path.display()))?;
    }
    agent.set_epsilon(0.0);
    Ok(agent)
}
