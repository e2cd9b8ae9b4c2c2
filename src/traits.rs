use crate::error::ModelError;
use crate::neural_network::layer::recurrent_layer::{LSTMState, StateSize};
use ndarray::{Array2, ArrayViewD};

/// Defines the interface a sequence-unrolling driver uses to run a recurrent cell.
///
/// A cell is a pure per-step function of (input, state). It does not keep the state
/// between calls: the driver creates the initial state, passes it to `step`, and feeds
/// the returned state into the next call. Cells are `Send + Sync` so the same cell can
/// serve several sequences at once.
pub trait RecurrentCell: Send + Sync {
    /// Returns the feature widths of the recurrent state.
    ///
    /// # Returns
    ///
    /// * `StateSize` - Tuple widths `(cell, hidden)` or the total flat width
    fn state_size(&self) -> StateSize;

    /// Returns the width of the output produced by each step.
    fn output_size(&self) -> usize;

    /// Runs one time step.
    ///
    /// # Parameters
    ///
    /// - `input` - Input for this step with shape (batch, features)
    /// - `state` - State returned by the previous step (or an initial state)
    ///
    /// # Returns
    ///
    /// - `Ok((output, state))` - Output with shape (batch, output_size) and the next state
    /// - `Err(ModelError)` - If the input or state shapes are invalid
    fn step(
        &self,
        input: ArrayViewD<'_, f32>,
        state: &LSTMState,
    ) -> Result<(Array2<f32>, LSTMState), ModelError>;

    /// Returns an all-zero state for `batch_size` sequences.
    fn zero_state(&self, batch_size: usize) -> LSTMState {
        self.state_size().zeros(batch_size)
    }

    /// Returns the type name of the cell (e.g. "MultiplicativeLSTM").
    fn cell_type(&self) -> &str {
        "Unknown"
    }
}
