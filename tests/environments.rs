use ml_game_agents::ai::{Agent, RandomAgent};
use ml_game_agents::error::EnvError;
use ml_game_agents::game::{
    ArcadeConfig, ArcadeGame, ArcadeLayout, Board, Cell, ConnectFour, Environment, Move, Outcome,
    Player, StepInfo, TicTacToe, TurnBased, COLLISION_REWARD, GOAL_REWARD, ROWS, STEP_PENALTY,
};

#[test]
fn connect_four_horizontal_win_on_fourth_disc() {
    let mut env = ConnectFour::new();
    // X: 0, 1, 2, 3 on consecutive own turns; O stacks column 6.
    for &(col, player) in &[
        (0, Player::X),
        (6, Player::O),
        (1, Player::X),
        (6, Player::O),
        (2, Player::X),
        (6, Player::O),
    ] {
        assert_eq!(env.current_player(), player);
        let result = env.step(col).unwrap();
        assert!(!result.terminal);
        assert_eq!(result.info, StepInfo::Ongoing);
    }

    let result = env.step(3).unwrap();
    assert!(result.terminal);
    assert_eq!(result.reward, 1.0);
    assert_eq!(result.info, StepInfo::Finished(Outcome::Winner(Player::X)));
    assert_eq!(result.state.get(ROWS - 1, 3), Cell::X);
    assert_eq!(result.state.landing_row(3), Some(ROWS - 2));
    assert_eq!(env.outcome(), Some(Outcome::Winner(Player::X)));
}

#[test]
fn arcade_standing_still_ends_only_on_alignment() {
    for seed in 0..20 {
        let config = ArcadeConfig::default();
        let mut env = ArcadeGame::with_seed(config.clone(), seed).unwrap();
        env.reset();
        let player_x = env.player_x();
        let bottom = config.height - 1;

        for _ in 0..200 {
            let result = env.step(Move::Stay).unwrap();
            assert_eq!(env.player_x(), player_x);
            if !result.terminal {
                assert_eq!(result.reward, STEP_PENALTY);
                continue;
            }
            match result.info {
                StepInfo::Collision => {
                    assert_eq!(result.reward, COLLISION_REWARD);
                    assert!(env.obstacles().contains(&(player_x, bottom)));
                }
                StepInfo::Goal => {
                    assert_eq!(result.reward, GOAL_REWARD);
                    assert_eq!(env.goal(), (player_x, bottom));
                }
                other => panic!("unexpected terminal info {other:?} without a timeout"),
            }
            break;
        }
    }
}

#[test]
fn arcade_without_obstacles_never_collides() {
    let config = ArcadeConfig {
        obstacles: 0,
        ..Default::default()
    };
    let layout = ArcadeLayout {
        player_x: 0,
        goal: (9, 0),
        obstacles: Vec::new(),
    };
    let mut env = ArcadeGame::from_layout(config, layout, 5).unwrap();

    let mut finished = None;
    for step in 0..200 {
        let result = env.step(Move::Stay).unwrap();
        if result.terminal {
            finished = Some((step, result.info));
            break;
        }
    }

    match finished {
        None => {}
        Some((_, info)) => {
            assert_eq!(info, StepInfo::Goal);
            assert_eq!(env.goal().0, 0);
        }
    }
}

#[test]
fn legal_actions_track_the_board() {
    for seed in 0..30 {
        let mut agent = RandomAgent::with_seed(seed);

        let mut c4 = ConnectFour::new();
        let mut board: Board = c4.reset();
        while !c4.is_done() {
            let legal = c4.legal_actions(&board);
            assert_eq!(legal.is_empty(), board.is_full());
            assert!(legal.iter().all(|&col| !board.is_column_full(col)));
            let action = Agent::<ConnectFour>::act(&mut agent, &board, &legal).unwrap();
            board = c4.step(action).unwrap().state;
        }

        let mut ttt = TicTacToe::new();
        let mut grid = ttt.reset();
        while !ttt.is_done() {
            let legal = ttt.legal_actions(&grid);
            assert_eq!(legal.is_empty(), grid.is_full());
            assert!(legal.iter().all(|&square| grid.get(square) == Cell::Empty));
            let action = Agent::<TicTacToe>::act(&mut agent, &grid, &legal).unwrap();
            grid = ttt.step(action).unwrap().state;
        }
        let final_legal = ttt.legal_actions(&grid);
        if ttt.outcome() == Some(Outcome::Draw) {
            assert!(final_legal.is_empty());
        }
    }
}

#[test]
fn every_environment_rejects_terminal_reentry() {
    let mut ttt = TicTacToe::new();
    for square in [(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)] {
        ttt.step(square).unwrap();
    }
    assert!(ttt.is_done());
    assert_eq!(ttt.step((2, 2)), Err(EnvError::EpisodeFinished));

    let mut c4 = ConnectFour::new();
    c4.step(0).unwrap();
    let invalid = c4.step(7).unwrap();
    assert!(invalid.terminal);
    assert_eq!(invalid.info.winner(), Some(Player::X));
    assert_eq!(c4.step(1), Err(EnvError::EpisodeFinished));

    let config = ArcadeConfig {
        max_steps: Some(1),
        ..Default::default()
    };
    let layout = ArcadeLayout {
        player_x: 5,
        goal: (0, 0),
        obstacles: vec![(9, 1), (8, 1), (7, 1)],
    };
    let mut arcade = ArcadeGame::from_layout(config, layout, 0).unwrap();
    let result = arcade.step(Move::Stay).unwrap();
    assert_eq!(result.info, StepInfo::Timeout);
    assert_eq!(result.reward, 0.0);
    assert_eq!(arcade.step(Move::Stay), Err(EnvError::EpisodeFinished));

    arcade.reset();
    assert!(!arcade.is_done());
}

#[test]
fn reset_starts_a_fresh_episode() {
    let mut env = ConnectFour::new();
    env.step(3).unwrap();
    let state = env.reset();
    assert_eq!(state, Board::new());
    assert_eq!(env.current_player(), Player::X);
    assert_eq!(env.outcome(), None);
}
