pub use crate::error::{IoError, ModelError};
pub use crate::neural_network::activation::Activation;
pub use crate::neural_network::initializer::Initializer;
pub use crate::neural_network::layer::normalized_linear::NormalizedLinear;
pub use crate::neural_network::layer::recurrent_layer::{
    LSTMState, MultiplicativeLSTMCell, MultiplicativeLSTMConfig, StateLayout, StateSize,
};
pub use crate::neural_network::parameter_store::ParameterStore;
pub use crate::neural_network::Tensor;
pub use crate::traits::RecurrentCell;
