use crate::error::ModelError;
use crate::neural_network::Tensor;
use nalgebra::DMatrix;
use ndarray::{Array2, ArrayD, IxDyn};
use ndarray_rand::RandomExt;
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::{Normal, StandardNormal};

/// Weight initializer used when the parameter store creates a parameter
///
/// # Variants
///
/// - `Orthogonal` - Random matrix with orthonormal rows (or columns when the matrix is tall), multiplied by `scale`
/// - `Normal` - Independent samples from a normal distribution
/// - `Constant` - Every element set to the same value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Initializer {
    Orthogonal { scale: f32 },
    Normal { mean: f32, std_dev: f32 },
    Constant(f32),
}

impl Default for Initializer {
    /// Orthogonal initialization with a scale of 1.0
    fn default() -> Self {
        Initializer::Orthogonal { scale: 1.0 }
    }
}

impl Initializer {
    /// Creates an orthogonal initializer with the given scale
    pub fn orthogonal(scale: f32) -> Self {
        Initializer::Orthogonal { scale }
    }

    /// Produces a new tensor of the given shape
    ///
    /// # Parameters
    ///
    /// - `shape` - Target shape, every dimension must be greater than 0
    /// - `rng` - Random source, the result is deterministic for a seeded generator
    ///
    /// # Returns
    ///
    /// - `Ok(Tensor)` - The initialized tensor
    /// - `Err(ModelError::ArgumentError)` - If the shape is empty, has a zero dimension, or the distribution is invalid
    pub fn initialize<R: Rng + ?Sized>(
        &self,
        shape: &[usize],
        rng: &mut R,
    ) -> Result<Tensor, ModelError> {
        validate_shape(shape)?;
        match *self {
            Initializer::Orthogonal { scale } => orthogonal(shape, scale, rng),
            Initializer::Normal { mean, std_dev } => {
                let dist = Normal::new(mean, std_dev).map_err(|e| {
                    ModelError::ArgumentError(format!(
                        "invalid normal initializer (mean {}, std_dev {}): {}",
                        mean, std_dev, e
                    ))
                })?;
                Ok(ArrayD::random_using(IxDyn(shape), dist, rng))
            }
            Initializer::Constant(value) => Ok(ArrayD::from_elem(IxDyn(shape), value)),
        }
    }
}

/// Generates an orthogonal tensor of the given shape
///
/// The shape is flattened to `(shape[0], product of the remaining dimensions)`, a
/// standard-normal matrix of that size is decomposed with SVD, and whichever of `U`
/// and `Vᵀ` has the flattened shape is scaled and reshaped back. For a flattened
/// shape `(m, n)` with `m <= n` the rows are orthonormal, so `q · qᵀ = scale² · I`.
///
/// # Parameters
///
/// - `shape` - Target shape; a 1-D shape `[n]` is treated as `(n, 1)`
/// - `scale` - Multiplier applied to the orthonormal factor
/// - `rng` - Random source for the underlying normal matrix
///
/// # Returns
///
/// - `Ok(Tensor)` - The orthogonal tensor
/// - `Err(ModelError::ArgumentError)` - If the shape is empty or contains a zero
/// - `Err(ModelError::ProcessingError)` - If the decomposition fails to produce singular vectors
pub fn orthogonal<R: Rng + ?Sized>(
    shape: &[usize],
    scale: f32,
    rng: &mut R,
) -> Result<Tensor, ModelError> {
    validate_shape(shape)?;

    let rows = shape[0];
    let cols: usize = shape[1..].iter().product();

    let a: Array2<f64> = Array2::random_using((rows, cols), StandardNormal, rng);
    let matrix = DMatrix::from_fn(rows, cols, |i, j| a[[i, j]]);

    let svd = matrix.svd(true, true);
    let u = svd.u.ok_or_else(|| {
        ModelError::ProcessingError("SVD did not produce left singular vectors".to_string())
    })?;
    let v_t = svd.v_t.ok_or_else(|| {
        ModelError::ProcessingError("SVD did not produce right singular vectors".to_string())
    })?;
    let q = if u.shape() == (rows, cols) { u } else { v_t };

    let scale = scale as f64;
    let q = &q;
    let flat: Vec<f32> = (0..rows)
        .flat_map(move |i| (0..cols).map(move |j| (scale * q[(i, j)]) as f32))
        .collect();

    Ok(ArrayD::from_shape_vec(IxDyn(shape), flat)?)
}

fn validate_shape(shape: &[usize]) -> Result<(), ModelError> {
    if shape.is_empty() {
        return Err(ModelError::ArgumentError(
            "initializer shape must have at least one dimension".to_string(),
        ));
    }
    if shape.contains(&0) {
        return Err(ModelError::ArgumentError(format!(
            "initializer shape must not contain zero dimensions: {:?}",
            shape
        )));
    }
    Ok(())
}
