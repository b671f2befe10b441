use burn::prelude::*;
use burn::tensor::TensorData;

use crate::game::{
    ArcadeGame, Board, ConnectFour, Environment, Grid, Move, Square, TicTacToe, COLS, ROWS,
};

/// Maps an environment's states and actions onto the flat feature vectors and
/// action indices consumed by value networks.
pub trait FeatureEncoding: Environment {
    /// Size of the discrete action space.
    const ACTION_COUNT: usize;

    /// Length of the vectors produced by [`FeatureEncoding::encode_state`].
    fn observation_size(&self) -> usize;

    fn encode_state(state: &Self::State) -> Vec<f32>;

    fn action_index(action: Self::Action) -> usize;

    /// Inverse of [`FeatureEncoding::action_index`]; `None` when out of range.
    fn action_from_index(index: usize) -> Option<Self::Action>;
}

// Tic-tac-toe

impl FeatureEncoding for TicTacToe {
    const ACTION_COUNT: usize = 9;

    fn observation_size(&self) -> usize {
        9
    }

    /// One value per square, row-major: X = 1, O = -1, empty = 0.
    fn encode_state(state: &Grid) -> Vec<f32> {
        state
            .cells()
            .iter()
            .flat_map(|row| row.iter().map(|cell| cell.value()))
            .collect()
    }

    fn action_index((row, col): Square) -> usize {
        row * 3 + col
    }

    fn action_from_index(index: usize) -> Option<Square> {
        (index < 9).then_some((index / 3, index % 3))
    }
}

// Connect four

impl FeatureEncoding for ConnectFour {
    const ACTION_COUNT: usize = COLS;

    fn observation_size(&self) -> usize {
        ROWS * COLS
    }

    /// One value per cell, top row first: X = 1, O = -1, empty = 0.
    fn encode_state(state: &Board) -> Vec<f32> {
        state
            .cells()
            .iter()
            .flat_map(|row| row.iter().map(|cell| cell.value()))
            .collect()
    }

    fn action_index(column: usize) -> usize {
        column
    }

    fn action_from_index(index: usize) -> Option<usize> {
        (index < COLS).then_some(index)
    }
}

// Arcade

impl FeatureEncoding for ArcadeGame {
    const ACTION_COUNT: usize = 3;

    fn observation_size(&self) -> usize {
        self.config().state_size()
    }

    /// Arcade observations are already normalized feature vectors.
    fn encode_state(state: &Vec<f32>) -> Vec<f32> {
        state.clone()
    }

    fn action_index(action: Move) -> usize {
        match action {
            Move::Left => 0,
            Move::Stay => 1,
            Move::Right => 2,
        }
    }

    fn action_from_index(index: usize) -> Option<Move> {
        Move::ALL.get(index).copied()
    }
}

// Tensors

/// Encode a single state as a tensor of shape [1, observation_size].
pub fn encode_state<B: Backend, E: FeatureEncoding>(
    state: &E::State,
    device: &B::Device,
) -> Tensor<B, 2> {
    let data = E::encode_state(state);
    let width = data.len();
    Tensor::<B, 1>::from_data(TensorData::from(data.as_slice()), device).reshape([1, width])
}

/// Encode several states as a batched tensor of shape [batch, observation_size].
pub fn encode_states_batch<B: Backend, E: FeatureEncoding>(
    states: &[&E::State],
    device: &B::Device,
) -> Tensor<B, 2> {
    let batch_size = states.len();
    let mut flat = Vec::new();
    for state in states {
        flat.extend(E::encode_state(state));
    }
    let width = flat.len() / batch_size.max(1);
    Tensor::<B, 1>::from_data(TensorData::from(flat.as_slice()), device)
        .reshape([batch_size, width])
}

/// One-hot rows of width `E::ACTION_COUNT`, shape [batch, actions].
pub fn action_mask<B: Backend, E: FeatureEncoding>(
    actions: &[E::Action],
    device: &B::Device,
) -> Tensor<B, 2> {
    let width = E::ACTION_COUNT;
    let mut data = vec![0.0f32; actions.len() * width];
    for (i, &action) in actions.iter().enumerate() {
        data[i * width + E::action_index(action)] = 1.0;
    }
    Tensor::<B, 1>::from_data(TensorData::from(data.as_slice()), device)
        .reshape([actions.len(), width])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ArcadeConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_tictactoe_encoding_values() {
        let mut env = TicTacToe::new();
        env.step((1, 1)).unwrap();
        let state = env.step((0, 2)).unwrap().state;

        let encoded = TicTacToe::encode_state(&state);
        assert_eq!(encoded.len(), env.observation_size());
        assert_eq!(encoded[4], 1.0);
        assert_eq!(encoded[2], -1.0);
        assert_eq!(encoded.iter().filter(|&&v| v == 0.0).count(), 7);
    }

    #[test]
    fn test_tictactoe_action_indices() {
        for index in 0..TicTacToe::ACTION_COUNT {
            let square = TicTacToe::action_from_index(index).unwrap();
            assert_eq!(TicTacToe::action_index(square), index);
        }
        assert_eq!(TicTacToe::action_index((2, 1)), 7);
        assert_eq!(TicTacToe::action_from_index(9), None);
    }

    #[test]
    fn test_connect_four_encoding_after_one_move() {
        let mut env = ConnectFour::new();
        let state = env.step(3).unwrap().state;
        let encoded = ConnectFour::encode_state(&state);

        assert_eq!(encoded.len(), 42);
        assert_eq!(encoded[5 * COLS + 3], 1.0);
        assert_eq!(encoded.iter().sum::<f32>(), 1.0);
        assert_eq!(ConnectFour::action_from_index(7), None);
    }

    #[test]
    fn test_arcade_encoding_passthrough() {
        let mut env = ArcadeGame::with_seed(ArcadeConfig::default(), 1).unwrap();
        let state = env.reset();
        assert_eq!(ArcadeGame::encode_state(&state), state);
        assert_eq!(env.observation_size(), state.len());
        assert_eq!(ArcadeGame::action_from_index(2), Some(Move::Right));
        assert_eq!(ArcadeGame::action_index(Move::Stay), 1);
        assert_eq!(ArcadeGame::action_from_index(3), None);
    }

    #[test]
    fn test_encode_state_shape() {
        let device = Default::default();
        let tensor = encode_state::<TestBackend, ConnectFour>(&Board::new(), &device);
        assert_eq!(tensor.dims(), [1, 42]);
    }

    #[test]
    fn test_encode_batch_shape_and_order() {
        let device = Default::default();
        let mut env = TicTacToe::new();
        let empty = env.reset();
        let after = env.step((0, 0)).unwrap().state;

        let batch = encode_states_batch::<TestBackend, TicTacToe>(&[&empty, &after], &device);
        assert_eq!(batch.dims(), [2, 9]);

        let data: Vec<f32> = batch.into_data().to_vec().unwrap();
        assert_eq!(data[0], 0.0);
        assert_eq!(data[9], 1.0);
    }

    #[test]
    fn test_action_mask_one_hot() {
        let device = Default::default();
        let mask = action_mask::<TestBackend, ArcadeGame>(&[Move::Right, Move::Left], &device);
        assert_eq!(mask.dims(), [2, 3]);
        let data: Vec<f32> = mask.into_data().to_vec().unwrap();
        assert_eq!(data, vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
    }
}
