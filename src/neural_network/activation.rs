use ndarray::{Array2, Axis};
use rayon::prelude::*;

/// Rows above which softmax normalizes rows in parallel
const SOFTMAX_PARALLEL_ROWS: usize = 8;

/// Hidden activation applied to the cell output, supporting Tanh, Sigmoid, ReLU, Softmax and Linear
///
/// `Tanh` is the default and the activation the multiplicative LSTM is usually run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Tanh,
    Sigmoid,
    ReLU,
    Softmax,
    Linear,
}

impl Activation {
    /// Applies the activation to every element (or every row, for Softmax) of `z`
    ///
    /// # Parameters
    ///
    /// - `z` - Pre-activation values with shape (batch, units)
    ///
    /// # Returns
    ///
    /// * `Array2<f32>` - A new array with the activation applied
    pub fn apply(&self, z: &Array2<f32>) -> Array2<f32> {
        let mut result = z.clone();
        match self {
            Activation::Tanh => result.par_mapv_inplace(|x| x.tanh()),
            Activation::Sigmoid => result.par_mapv_inplace(sigmoid),
            Activation::ReLU => result.par_mapv_inplace(|x| if x > 0.0 { x } else { 0.0 }),
            Activation::Linear => {}
            Activation::Softmax => {
                if result.nrows() > SOFTMAX_PARALLEL_ROWS {
                    result
                        .axis_iter_mut(Axis(0))
                        .into_par_iter()
                        .for_each(|mut row| {
                            let max_val = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
                            row.mapv_inplace(|x| (x - max_val).exp());
                            let sum = row.sum();
                            row.mapv_inplace(|x| x / sum);
                        });
                } else {
                    for mut row in result.outer_iter_mut() {
                        let max_val = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
                        row.mapv_inplace(|x| (x - max_val).exp());
                        let sum = row.sum();
                        row.mapv_inplace(|x| x / sum);
                    }
                }
            }
        }
        result
    }

    /// Returns the name of the activation as printed by the cell summary
    pub fn name(&self) -> &'static str {
        match self {
            Activation::Tanh => "tanh",
            Activation::Sigmoid => "sigmoid",
            Activation::ReLU => "relu",
            Activation::Softmax => "softmax",
            Activation::Linear => "linear",
        }
    }
}

/// Numerically stable logistic sigmoid for a single value
///
/// The input is clamped to [-500, 500] before exponentiation.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    let clipped_x = x.clamp(-500.0, 500.0);
    1.0 / (1.0 + (-clipped_x).exp())
}
