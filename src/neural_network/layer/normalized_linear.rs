use crate::error::ModelError;
use crate::neural_network::initializer::Initializer;
use crate::neural_network::parameter_store::ParameterStore;
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewD, Axis, Ix1, Ix2, concatenate};

/// Weight-normalized affine map over one or more concatenated inputs
///
/// The weight matrix is parametrized as a direction matrix `V` and a per-column scale
/// `g`. The realized weight is `W[:, k] = g[k] · V[:, k] / ‖V[:, k]‖₂`, and the output is
/// `concat(inputs) · W + b`.
///
/// The map itself holds no values. All parameters live in a [`ParameterStore`] under
/// the map's scope, so two maps with the same scope share parameters and calling
/// `forward` repeatedly (once per time step) reuses what the first call created.
///
/// # Parameters created under `scope`
///
/// - `{scope}/direction` - Direction matrix with shape (total input width, output_size)
/// - `{scope}/scale` - Scale vector with shape (output_size), initialized to 1.0
/// - `{scope}/bias` - Bias vector with shape (output_size), initialized to `bias_start` (only when `bias` is set)
///
/// # Example
/// ```rust
/// use mlstm::neural_network::{NormalizedLinear, ParameterStore};
/// use ndarray::Array2;
///
/// let store = ParameterStore::new(Some(7));
/// let linear = NormalizedLinear::new("proj", 5, true);
/// let a = Array2::<f32>::ones((2, 3));
/// let b = Array2::<f32>::ones((2, 4));
///
/// let y = linear
///     .forward(&store, &[a.view().into_dyn(), b.view().into_dyn()])
///     .unwrap();
/// assert_eq!(y.shape(), &[2, 5]);
/// assert_eq!(store.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLinear {
    scope: String,
    output_size: usize,
    bias: bool,
    bias_start: f32,
    initializer: Initializer,
}

impl NormalizedLinear {
    /// Creates a map writing its parameters under `scope`
    ///
    /// The bias starts at 0.0 and the direction matrix uses the default orthogonal initializer.
    ///
    /// # Parameters
    ///
    /// - `scope` - Name prefix of the parameters owned by this map
    /// - `output_size` - Width of the output
    /// - `bias` - Whether a bias vector is added
    pub fn new(scope: &str, output_size: usize, bias: bool) -> Self {
        Self {
            scope: scope.to_string(),
            output_size,
            bias,
            bias_start: 0.0,
            initializer: Initializer::default(),
        }
    }

    /// Sets the initial value of the bias vector
    pub fn with_bias_start(mut self, bias_start: f32) -> Self {
        self.bias_start = bias_start;
        self
    }

    /// Sets the initializer used for the direction matrix
    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = initializer;
        self
    }

    get_field_as_ref!(get_scope, scope, &str);
    get_field!(get_output_size, output_size, usize);
    get_field!(get_bias, bias, bool);
    get_field!(get_bias_start, bias_start, f32);

    /// Name of the direction matrix in the parameter store
    pub fn direction_name(&self) -> String {
        format!("{}/direction", self.scope)
    }

    /// Name of the scale vector in the parameter store
    pub fn scale_name(&self) -> String {
        format!("{}/scale", self.scope)
    }

    /// Name of the bias vector in the parameter store
    pub fn bias_name(&self) -> String {
        format!("{}/bias", self.scope)
    }

    /// Creates the parameters for an input of total width `input_width` without running the map
    ///
    /// # Returns
    ///
    /// - `Ok(())` - All parameters exist with the expected shapes
    /// - `Err(ModelError::ArgumentError)` - If `input_width` or the output size is 0
    /// - `Err(ModelError::ParameterShapeMismatch)` - If the scope already holds parameters of another shape
    pub fn build(&self, store: &ParameterStore, input_width: usize) -> Result<(), ModelError> {
        if input_width == 0 {
            return Err(ModelError::ArgumentError(
                "Linear expects a non-zero input width".to_string(),
            ));
        }
        self.validate_output_size()?;
        store.get_or_create(
            &self.direction_name(),
            &[input_width, self.output_size],
            &self.initializer,
        )?;
        store.get_or_create(
            &self.scale_name(),
            &[self.output_size],
            &Initializer::Constant(1.0),
        )?;
        if self.bias {
            store.get_or_create(
                &self.bias_name(),
                &[self.output_size],
                &Initializer::Constant(self.bias_start),
            )?;
        }
        Ok(())
    }

    /// Applies the map to the concatenation of `inputs`
    ///
    /// # Parameters
    ///
    /// - `store` - Store holding (or receiving) the parameters of this map
    /// - `inputs` - Non-empty list of (batch, features) tensors sharing the batch dimension
    ///
    /// # Returns
    ///
    /// - `Ok(Array2<f32>)` - Output with shape (batch, output_size)
    /// - `Err(ModelError::ArgumentError)` - If `inputs` is empty, an input is not 2D, an input has no features, or batch sizes differ
    /// - `Err(ModelError::ParameterShapeMismatch)` - If the total input width differs from the one the parameters were created for
    pub fn forward(
        &self,
        store: &ParameterStore,
        inputs: &[ArrayViewD<'_, f32>],
    ) -> Result<Array2<f32>, ModelError> {
        let total_arg_size = validate_linear_inputs(inputs)?;
        self.validate_output_size()?;

        let views = inputs
            .iter()
            .map(|input| input.view().into_dimensionality::<Ix2>())
            .collect::<Result<Vec<_>, _>>()?;

        let direction = store.get_or_create(
            &self.direction_name(),
            &[total_arg_size, self.output_size],
            &self.initializer,
        )?;
        let scale = store.get_or_create(
            &self.scale_name(),
            &[self.output_size],
            &Initializer::Constant(1.0),
        )?;
        let direction = direction.view().into_dimensionality::<Ix2>()?;
        let scale = scale.view().into_dimensionality::<Ix1>()?;
        let weight = normalized_weight(&direction, &scale);

        let res = if views.len() == 1 {
            views[0].dot(&weight)
        } else {
            concatenate(Axis(1), &views)?.dot(&weight)
        };
        if !self.bias {
            return Ok(res);
        }

        let bias = store.get_or_create(
            &self.bias_name(),
            &[self.output_size],
            &Initializer::Constant(self.bias_start),
        )?;
        let bias = bias.view().into_dimensionality::<Ix1>()?;
        Ok(res + &bias)
    }

    fn validate_output_size(&self) -> Result<(), ModelError> {
        if self.output_size == 0 {
            return Err(ModelError::ArgumentError(format!(
                "Linear `{}` must have an output size greater than 0",
                self.scope
            )));
        }
        Ok(())
    }
}

/// Realizes a weight-normalized matrix from its direction and scale
///
/// Each column of `direction` is divided by its Euclidean norm and multiplied by the
/// matching entry of `scale`. A zero column produces non-finite values.
///
/// # Parameters
///
/// - `direction` - Direction matrix with shape (input width, output width)
/// - `scale` - Per-column scale with length equal to the output width
///
/// # Returns
///
/// * `Array2<f32>` - The realized weight matrix with the same shape as `direction`
pub fn normalized_weight(direction: &ArrayView2<f32>, scale: &ArrayView1<f32>) -> Array2<f32> {
    let inv_norms = direction.map_axis(Axis(0), |col| 1.0 / col.dot(&col).sqrt());
    let scaled_norms = scale * &inv_norms;
    direction * &scaled_norms
}

/// Checks the arguments of a linear map and returns the total feature width
fn validate_linear_inputs(inputs: &[ArrayViewD<'_, f32>]) -> Result<usize, ModelError> {
    if inputs.is_empty() {
        return Err(ModelError::ArgumentError(
            "`inputs` must be specified".to_string(),
        ));
    }

    let shapes: Vec<&[usize]> = inputs.iter().map(|input| input.shape()).collect();
    let mut total_arg_size = 0;
    for shape in &shapes {
        if shape.len() != 2 {
            return Err(ModelError::ArgumentError(format!(
                "Linear is expecting 2D arguments: {:?}",
                shapes
            )));
        }
        if shape[1] == 0 {
            return Err(ModelError::ArgumentError(format!(
                "Linear expects shape[1] of arguments: {:?}",
                shapes
            )));
        }
        total_arg_size += shape[1];
    }

    let batch = shapes[0][0];
    if shapes.iter().any(|shape| shape[0] != batch) {
        return Err(ModelError::ArgumentError(format!(
            "Linear expects arguments with the same batch size: {:?}",
            shapes
        )));
    }

    Ok(total_arg_size)
}
