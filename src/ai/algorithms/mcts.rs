use log::debug;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::SeedableRng;

use crate::ai::agent::Agent;
use crate::error::AgentError;
use crate::game::{Board, ConnectFour, Environment, Outcome, Player, TurnBased};

// Config

/// MCTS hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Number of select/expand/rollout/backup iterations per move.
    pub num_simulations: usize,
    /// Exploration constant C in UCB1.
    pub exploration: f64,
    /// Random playouts stop after this many moves and score as a draw.
    pub rollout_depth_limit: usize,
}

impl Default for MctsConfig {
    fn default() -> Self {
        MctsConfig {
            num_simulations: 1000,
            exploration: 1.41,
            rollout_depth_limit: 100,
        }
    }
}

/// Rollout value for a win of the searching player.
const WIN: f64 = 1.0;
/// Rollout value for a draw, and for a playout cut off by the depth limit.
const DRAW: f64 = 0.5;
const LOSS: f64 = 0.0;

// Search tree

struct MctsNode {
    /// Position after `action` was played, with the next player on turn.
    env: ConnectFour,
    /// Player who moved into this node; `None` for the root.
    mover: Option<Player>,
    parent: Option<usize>,
    action: Option<usize>,
    children: Vec<usize>,
    untried: Vec<usize>,
    visits: u32,
    /// Accumulated result from `mover`'s perspective.
    wins: f64,
}

/// Visit statistics of one root child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildStats {
    pub action: usize,
    pub visits: u32,
    pub wins: f64,
}

/// Search tree owned by one `search` call. Nodes refer to each other by index.
pub struct MctsTree {
    nodes: Vec<MctsNode>,
    root_player: Player,
}

impl MctsTree {
    fn new(root: ConnectFour, root_actions: Vec<usize>) -> Self {
        let root_player = root.current_player();
        let untried = if root.is_done() { Vec::new() } else { root_actions };
        MctsTree {
            nodes: vec![MctsNode {
                env: root,
                mover: None,
                parent: None,
                action: None,
                children: Vec::new(),
                untried,
                visits: 0,
                wins: 0.0,
            }],
            root_player,
        }
    }

    pub fn root_player(&self) -> Player {
        self.root_player
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root_visits(&self) -> u32 {
        self.nodes[0].visits
    }

    /// Statistics for every expanded root child, in expansion order.
    pub fn root_children(&self) -> Vec<ChildStats> {
        self.nodes[0]
            .children
            .iter()
            .map(|&ci| {
                let child = &self.nodes[ci];
                ChildStats {
                    action: child.action.unwrap_or_default(),
                    visits: child.visits,
                    wins: child.wins,
                }
            })
            .collect()
    }

    /// Root child with the most visits; the first one found wins ties.
    pub fn best_action(&self) -> Option<usize> {
        let mut best: Option<ChildStats> = None;
        for child in self.root_children() {
            if best.map_or(true, |b| child.visits > b.visits) {
                best = Some(child);
            }
        }
        best.map(|c| c.action)
    }

    /// UCB1 score of `child`. Unvisited children always come first.
    fn ucb1(&self, child: usize, exploration: f64) -> f64 {
        let node = &self.nodes[child];
        if node.visits == 0 {
            return f64::INFINITY;
        }
        let parent_visits = node
            .parent
            .map(|p| self.nodes[p].visits)
            .unwrap_or(node.visits) as f64;
        let visits = node.visits as f64;
        node.wins / visits + exploration * (parent_visits.ln() / visits).sqrt()
    }

    fn select_child(&self, node_idx: usize, exploration: f64) -> usize {
        let children = &self.nodes[node_idx].children;
        let mut best = children[0];
        let mut best_score = f64::NEG_INFINITY;
        for &child in children {
            let score = self.ucb1(child, exploration);
            if score > best_score {
                best_score = score;
                best = child;
            }
        }
        best
    }

    fn add_child(
        &mut self,
        parent: usize,
        action: usize,
        env: ConnectFour,
        untried: Vec<usize>,
    ) -> usize {
        let idx = self.nodes.len();
        let mover = self.nodes[parent].env.current_player();
        self.nodes.push(MctsNode {
            env,
            mover: Some(mover),
            parent: Some(parent),
            action: Some(action),
            children: Vec::new(),
            untried,
            visits: 0,
            wins: 0.0,
        });
        self.nodes[parent].children.push(idx);
        idx
    }

    /// Walk from `leaf` to the root, flipping the result at every level.
    ///
    /// `root_result` is from the root player's perspective; each node stores
    /// it from the perspective of the player who moved into it.
    fn backpropagate(&mut self, leaf: usize, root_result: f64) {
        let mut value = match self.nodes[leaf].mover {
            Some(player) if player == self.root_player => root_result,
            _ => 1.0 - root_result,
        };
        let mut current = Some(leaf);
        while let Some(idx) = current {
            let node = &mut self.nodes[idx];
            node.visits += 1;
            node.wins += value;
            value = 1.0 - value;
            current = node.parent;
        }
    }
}

// Agent

/// Monte-Carlo tree search for connect four with UCB1 selection and random
/// rollouts.
pub struct MctsAgent {
    player: Player,
    config: MctsConfig,
    rng: StdRng,
}

impl MctsAgent {
    pub fn new(player: Player, config: MctsConfig) -> Self {
        MctsAgent {
            player,
            config,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(player: Player, config: MctsConfig, seed: u64) -> Self {
        MctsAgent {
            player,
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn player(&self) -> Player {
        self.player
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// Build a search tree for `board` with this agent's player on turn.
    pub fn search(&mut self, board: &Board, legal: &[usize]) -> MctsTree {
        let mut root_actions: Vec<usize> = legal
            .iter()
            .copied()
            .filter(|&col| !board.is_column_full(col))
            .collect();
        root_actions.sort_unstable();
        root_actions.dedup();
        let mut tree = MctsTree::new(
            ConnectFour::from_position(*board, self.player),
            self.shuffled(root_actions),
        );

        for _ in 0..self.config.num_simulations {
            self.run_simulation(&mut tree);
        }

        debug!(
            "mcts: {} simulations, {} nodes, root children {:?}",
            self.config.num_simulations,
            tree.node_count(),
            tree.root_children()
                .iter()
                .map(|c| (c.action, c.visits))
                .collect::<Vec<_>>()
        );
        tree
    }

    fn shuffled(&mut self, mut actions: Vec<usize>) -> Vec<usize> {
        actions.shuffle(&mut self.rng);
        actions
    }

    /// One select / expand / rollout / backup iteration.
    fn run_simulation(&mut self, tree: &mut MctsTree) {
        let exploration = self.config.exploration;

        // Selection
        let mut current = 0;
        while tree.nodes[current].untried.is_empty() && !tree.nodes[current].children.is_empty()
        {
            current = tree.select_child(current, exploration);
        }

        // Expansion
        if let Some(action) = tree.nodes[current].untried.pop() {
            let mut sandbox = tree.nodes[current].env.clone();
            if sandbox.step(action).is_ok() {
                let untried = if sandbox.is_done() {
                    Vec::new()
                } else {
                    let open = sandbox.legal_actions(&sandbox.state());
                    self.shuffled(open)
                };
                current = tree.add_child(current, action, sandbox, untried);
            }
        }

        // Simulation
        let result = self.rollout(tree.nodes[current].env.clone(), tree.root_player);

        // Backpropagation
        tree.backpropagate(current, result);
    }

    /// Random playout from `env`, scored for `root_player`.
    fn rollout(&mut self, mut env: ConnectFour, root_player: Player) -> f64 {
        let mut steps = 0;
        while !env.is_done() && steps < self.config.rollout_depth_limit {
            let legal = env.legal_actions(&env.state());
            let Some(&action) = legal.choose(&mut self.rng) else {
                break;
            };
            if env.step(action).is_err() {
                break;
            }
            steps += 1;
        }

        match env.outcome() {
            Some(Outcome::Winner(winner)) if winner == root_player => WIN,
            Some(Outcome::Winner(_)) => LOSS,
            Some(Outcome::Draw) | None => DRAW,
        }
    }
}

impl Agent<ConnectFour> for MctsAgent {
    fn act(&mut self, state: &Board, legal: &[usize]) -> Result<usize, AgentError> {
        if legal.is_empty() {
            return Err(AgentError::NoLegalActions);
        }

        let tree = self.search(state, legal);
        match tree.best_action() {
            Some(action) => Ok(action),
            None => {
                debug!("mcts expanded no children, falling back to a random move");
                legal
                    .choose(&mut self.rng)
                    .copied()
                    .ok_or(AgentError::NoLegalActions)
            }
        }
    }

    fn name(&self) -> &str {
        "MCTS"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Cell;

    fn config(num_simulations: usize) -> MctsConfig {
        MctsConfig {
            num_simulations,
            ..Default::default()
        }
    }

    fn play(columns: &[usize]) -> ConnectFour {
        let mut env = ConnectFour::new();
        for &col in columns {
            env.step(col).unwrap();
        }
        env
    }

    #[test]
    fn root_child_visits_sum_to_budget() {
        for budget in [1, 7, 50, 300] {
            let mut agent = MctsAgent::with_seed(Player::X, config(budget), 1);
            let board = Board::new();
            let tree = agent.search(&board, &board.open_columns());
            let total: u32 = tree.root_children().iter().map(|c| c.visits).sum();
            assert_eq!(total as usize, budget);
            assert_eq!(tree.root_visits() as usize, budget);
        }
    }

    #[test]
    fn every_root_action_is_tried_once_before_reuse() {
        let mut agent = MctsAgent::with_seed(Player::X, config(7), 2);
        let board = Board::new();
        let tree = agent.search(&board, &board.open_columns());
        let mut actions: Vec<usize> = tree.root_children().iter().map(|c| c.action).collect();
        actions.sort_unstable();
        assert_eq!(actions, vec![0, 1, 2, 3, 4, 5, 6]);
        assert!(tree.root_children().iter().all(|c| c.visits == 1));
    }

    #[test]
    fn parent_visits_cover_children() {
        let mut agent = MctsAgent::with_seed(Player::O, config(400), 3);
        let env = play(&[3, 3, 2]);
        let tree = agent.search(env.board(), &env.legal_actions(&env.state()));
        for node in &tree.nodes {
            let child_visits: u32 = node.children.iter().map(|&c| tree.nodes[c].visits).sum();
            assert!(node.visits >= child_visits);
            assert!(node.wins >= 0.0 && node.wins <= node.visits as f64);
            if let Some(parent) = node.parent {
                assert!(tree.nodes[parent].children.len() <= 7);
            }
        }
    }

    #[test]
    fn takes_immediate_win() {
        // X holds columns 0..3 on the bottom row and is on turn.
        let env = play(&[0, 0, 1, 1, 2, 2]);
        let mut agent = MctsAgent::with_seed(Player::X, config(500), 4);
        let action = agent
            .act(env.board(), &env.legal_actions(&env.state()))
            .unwrap();
        assert_eq!(action, 3);
    }

    #[test]
    fn blocks_opponent_win() {
        let env = play(&[0, 6, 1, 6, 2]);
        assert_eq!(env.current_player(), Player::O);
        let mut agent = MctsAgent::with_seed(Player::O, config(3000), 5);
        let action = agent
            .act(env.board(), &env.legal_actions(&env.state()))
            .unwrap();
        assert_eq!(action, 3);
    }

    #[test]
    fn zero_budget_falls_back_to_random_legal_move() {
        let mut agent = MctsAgent::with_seed(Player::X, config(0), 6);
        let board = Board::new();
        for _ in 0..20 {
            let action = agent.act(&board, &[2, 4]).unwrap();
            assert!(action == 2 || action == 4);
        }
    }

    #[test]
    fn full_columns_are_never_chosen() {
        let mut env = ConnectFour::new();
        for _ in 0..6 {
            env.step(3).unwrap();
        }
        let mut agent = MctsAgent::with_seed(env.current_player(), config(200), 7);
        let tree = agent.search(env.board(), &[0, 1, 2, 3, 4, 5, 6]);
        assert!(tree.root_children().iter().all(|c| c.action != 3));
        assert_eq!(tree.root_children().len(), 6);
    }

    #[test]
    fn repeated_legal_columns_expand_once() {
        let mut agent = MctsAgent::with_seed(Player::X, config(40), 10);
        let board = Board::new();
        let tree = agent.search(&board, &[2, 2, 5, 2, 5]);
        let mut actions: Vec<usize> = tree.root_children().iter().map(|c| c.action).collect();
        actions.sort_unstable();
        assert_eq!(actions, vec![2, 5]);
        assert_eq!(tree.root_visits(), 40);
    }

    #[test]
    fn finished_position_falls_back() {
        let mut board = Board::new();
        for col in 0..4 {
            board.drop_piece(col, Cell::O).unwrap();
        }
        let mut agent = MctsAgent::with_seed(Player::X, config(50), 8);
        let tree = agent.search(&board, &board.open_columns());
        assert_eq!(tree.node_count(), 1);
        let action = agent.act(&board, &board.open_columns()).unwrap();
        assert!(board.open_columns().contains(&action));
    }

    #[test]
    fn no_legal_actions_is_an_error() {
        let mut agent = MctsAgent::with_seed(Player::X, config(10), 9);
        assert!(matches!(
            agent.act(&Board::new(), &[]),
            Err(AgentError::NoLegalActions)
        ));
    }

    #[test]
    fn rollout_scores_from_root_perspective() {
        let mut agent = MctsAgent::with_seed(Player::X, config(1), 10);
        let x_won = play(&[0, 1, 0, 1, 0, 1, 0]);
        assert_eq!(agent.rollout(x_won.clone(), Player::X), WIN);
        assert_eq!(agent.rollout(x_won, Player::O), LOSS);

        let mut cut = MctsAgent::with_seed(
            Player::X,
            MctsConfig {
                rollout_depth_limit: 0,
                ..config(1)
            },
            11,
        );
        assert_eq!(cut.rollout(ConnectFour::new(), Player::X), DRAW);
    }
}
