use crate::error::ModelError;
use crate::neural_network::activation::{Activation, sigmoid};
use crate::neural_network::initializer::Initializer;
use crate::neural_network::layer::normalized_linear::NormalizedLinear;
use crate::neural_network::parameter_store::ParameterStore;
use crate::neural_network::Tensor;
use crate::traits::RecurrentCell;
use ndarray::{Array2, ArrayBase, ArrayView2, ArrayViewD, Axis, Data, Ix1, Ix2, concatenate, s};

/// Applies the stable sigmoid to every element of a 2D array
///
/// This is used by every gate of the multiplicative LSTM.
#[inline]
fn apply_sigmoid<S: Data<Elem = f32>>(arr: &ArrayBase<S, Ix2>) -> Array2<f32> {
    arr.mapv(sigmoid)
}

/// Runs two closures, on the rayon pool when `parallel` is set
#[inline]
fn join_if<A, B, RA, RB>(parallel: bool, a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    if parallel {
        rayon::join(a, b)
    } else {
        (a(), b())
    }
}

/// Input validation functions for recurrent cells
mod input_validation_function;
/// Recurrent state representation shared by LSTM-style cells
pub mod lstm_state;
/// Multiplicative LSTM cell
pub mod multiplicative_lstm;

pub use lstm_state::{LSTMState, StateLayout, StateSize};
pub use multiplicative_lstm::{MultiplicativeLSTMCell, MultiplicativeLSTMConfig};
