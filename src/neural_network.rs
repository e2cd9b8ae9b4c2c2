/// Module that contains the hidden activation functions
pub mod activation;
/// Module that contains weight initializers
pub mod initializer;
/// Module that contains the weight-normalized linear map and the recurrent cells
pub mod layer;
/// Module that contains the named parameter store owned by each cell
pub mod parameter_store;

pub use activation::*;
pub use initializer::*;
pub use layer::*;
pub use parameter_store::*;

use ndarray::ArrayD;

/// Type alias for n-dimensional arrays used as tensors in the neural network
pub type Tensor = ArrayD<f32>;

pub use crate::traits::RecurrentCell;
