mod value_network;

pub use value_network::{ValueNetwork, ValueNetworkConfig};
