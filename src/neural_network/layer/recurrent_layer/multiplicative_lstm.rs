use super::*;
use crate::error::IoError;
use crate::neural_network::layer::serialize_weight::{SerializableParameter, SerializableParameters};
use super::input_validation_function::*;
use ahash::AHashSet;
use serde_json::{from_reader, to_writer_pretty};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use tracing::{info, trace};

/// Threshold for using parallel computation in the multiplicative LSTM cell.
/// When batch_size * units < this value, gate activations are computed sequentially.
/// When batch_size * units >= this value, pairs of gates are activated with `rayon::join`.
const MLSTM_PARALLEL_THRESHOLD: usize = 1024;

/// Scope of the linear map producing the multiplicative term
const MULTIPLICATIVE_SCOPE: &str = "multiplicative_weight";
/// Scope of the linear map producing the four gate pre-activations
const LSTM_SCOPE: &str = "lstm_weight";
const FORGET_DIAG: &str = "w_f_diag";
const INPUT_DIAG: &str = "w_i_diag";
const OUTPUT_DIAG: &str = "w_o_diag";
const PROJECTION: &str = "w_proj";

/// Name written to and expected in saved parameter files
const CELL_TYPE: &str = "MultiplicativeLSTM";

/// Construction-time configuration of a [`MultiplicativeLSTMCell`]
///
/// Only `num_units` is required. Everything else has a default and is set with the
/// `with_*` methods before calling [`build`](MultiplicativeLSTMConfig::build).
///
/// # Fields
///
/// - `num_units` - Number of units in the cell (width of the cell state)
/// - `use_peepholes` - Enables diagonal connections from the cell state into the forget, input and output gates (default false)
/// - `cell_clip` - If set, the cell state is clipped to `[-cell_clip, cell_clip]` before the output activation
/// - `initializer` - Initializer for direction matrices, peephole diagonals and the projection matrix (default orthogonal, scale 1.0)
/// - `num_proj` - If set, the hidden state is projected to this width
/// - `proj_clip` - If set (and `num_proj` is set), the projected hidden state is clipped to `[-proj_clip, proj_clip]`
/// - `forget_bias` - Added to the forget gate pre-activation (default 1.0)
/// - `state_layout` - Tuple or flat state (default tuple)
/// - `activation` - Hidden activation (default tanh)
/// - `random_seed` - Optional seed for parameter initialization
#[derive(Debug, Clone, PartialEq)]
pub struct MultiplicativeLSTMConfig {
    num_units: usize,
    use_peepholes: bool,
    cell_clip: Option<f32>,
    initializer: Initializer,
    num_proj: Option<usize>,
    proj_clip: Option<f32>,
    forget_bias: f32,
    state_layout: StateLayout,
    activation: Activation,
    random_seed: Option<u64>,
}

impl MultiplicativeLSTMConfig {
    /// Creates a configuration with `num_units` units and every other option at its default
    pub fn new(num_units: usize) -> Self {
        Self {
            num_units,
            use_peepholes: false,
            cell_clip: None,
            initializer: Initializer::default(),
            num_proj: None,
            proj_clip: None,
            forget_bias: 1.0,
            state_layout: StateLayout::Tuple,
            activation: Activation::Tanh,
            random_seed: None,
        }
    }

    pub fn with_peepholes(mut self, use_peepholes: bool) -> Self {
        self.use_peepholes = use_peepholes;
        self
    }

    pub fn with_cell_clip(mut self, cell_clip: f32) -> Self {
        self.cell_clip = Some(cell_clip);
        self
    }

    pub fn with_initializer(mut self, initializer: Initializer) -> Self {
        self.initializer = initializer;
        self
    }

    pub fn with_num_proj(mut self, num_proj: usize) -> Self {
        self.num_proj = Some(num_proj);
        self
    }

    pub fn with_proj_clip(mut self, proj_clip: f32) -> Self {
        self.proj_clip = Some(proj_clip);
        self
    }

    pub fn with_forget_bias(mut self, forget_bias: f32) -> Self {
        self.forget_bias = forget_bias;
        self
    }

    pub fn with_state_layout(mut self, state_layout: StateLayout) -> Self {
        self.state_layout = state_layout;
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_random_seed(mut self, random_seed: u64) -> Self {
        self.random_seed = Some(random_seed);
        self
    }

    get_field!(get_num_units, num_units, usize);
    get_field!(get_use_peepholes, use_peepholes, bool);
    get_field!(get_cell_clip, cell_clip, Option<f32>);
    get_field!(get_initializer, initializer, Initializer);
    get_field!(get_num_proj, num_proj, Option<usize>);
    get_field!(get_proj_clip, proj_clip, Option<f32>);
    get_field!(get_forget_bias, forget_bias, f32);
    get_field!(get_state_layout, state_layout, StateLayout);
    get_field!(get_activation, activation, Activation);
    get_field!(get_random_seed, random_seed, Option<u64>);

    /// Validates the configuration and creates the cell
    ///
    /// # Returns
    ///
    /// - `Ok(MultiplicativeLSTMCell)` - A cell with an empty parameter store
    /// - `Err(ModelError::ArgumentError)` - If `num_units` or `num_proj` is 0, a clip bound is not positive, or `forget_bias` is not finite
    pub fn build(self) -> Result<MultiplicativeLSTMCell, ModelError> {
        validate_dimension_greater_than_zero(self.num_units, "num_units")?;
        if let Some(num_proj) = self.num_proj {
            validate_dimension_greater_than_zero(num_proj, "num_proj")?;
        }
        validate_clip(self.cell_clip, "cell_clip")?;
        validate_clip(self.proj_clip, "proj_clip")?;
        validate_forget_bias(self.forget_bias)?;

        let multiplicative_linear =
            NormalizedLinear::new(MULTIPLICATIVE_SCOPE, 2 * self.num_units, true)
                .with_initializer(self.initializer);
        let gate_linear = NormalizedLinear::new(LSTM_SCOPE, 4 * self.num_units, true)
            .with_initializer(self.initializer);
        let store = ParameterStore::new(self.random_seed);

        Ok(MultiplicativeLSTMCell {
            config: self,
            multiplicative_linear,
            gate_linear,
            store,
        })
    }
}

/// Multiplicative LSTM cell (Krause et al., "Multiplicative LSTM for sequence modelling", 2017)
///
/// A single-step recurrent cell. Before the gates are computed, the input is modulated
/// by the previous hidden state through an elementwise product, instead of the two
/// being added inside each gate.
///
/// # Mathematical Operations
///
/// For input x and previous state (c_prev, h_prev), with L(·) a weight-normalized
/// linear map with bias:
/// 1. Wx, Wh = split(L_m(\[x, h_prev\]), 2)
/// 2. m = Wx ⊙ Wh
/// 3. i, j, f, o = split(L_g(\[x, m\]), 4)
/// 4. c = c_prev ⊙ σ(f + forget_bias) + σ(i) ⊙ j
/// 5. c = clip(c, -cell_clip, cell_clip)  (if cell_clip is set)
/// 6. h = act(c ⊙ o)
/// 7. h = h · W_proj, then clip(h, -proj_clip, proj_clip)  (if num_proj is set)
///
/// With peepholes the forget and input gates see `w_f ⊙ c_prev` and `w_i ⊙ c_prev`, and
/// step 6 becomes `h = σ(o + w_o ⊙ c) ⊙ act(c ⊙ (o + w_o ⊙ c))`.
///
/// Step 6 multiplies the cell state by the raw output gate pre-activation inside the
/// activation. This is not the textbook `σ(o) ⊙ tanh(c)` and is kept as is.
///
/// Parameters are created on the first [`step`](RecurrentCell::step) (or by
/// [`build`](MultiplicativeLSTMCell::build)) and reused by every later step. The cell
/// does not keep the recurrent state; the caller passes it in and receives the next one.
///
/// # Example
/// ```rust
/// use mlstm::prelude::*;
/// use ndarray::Array2;
///
/// let cell = MultiplicativeLSTMConfig::new(4)
///     .with_random_seed(42)
///     .build()
///     .unwrap();
///
/// let x = Array2::<f32>::ones((2, 3));
/// let state = cell.zero_state(2);
/// let (output, next_state) = cell.step(x.view().into_dyn(), &state).unwrap();
///
/// assert_eq!(output.shape(), &[2, 4]);
/// assert_eq!(next_state.batch_size(), 2);
/// ```
pub struct MultiplicativeLSTMCell {
    config: MultiplicativeLSTMConfig,
    multiplicative_linear: NormalizedLinear,
    gate_linear: NormalizedLinear,
    store: ParameterStore,
}

/// Peephole diagonals as stored in the parameter store
struct PeepholeWeights {
    forget: Arc<Tensor>,
    input: Arc<Tensor>,
    output: Arc<Tensor>,
}

impl MultiplicativeLSTMCell {
    /// Creates a cell with `num_units` units and the default configuration
    ///
    /// # Returns
    ///
    /// - `Ok(MultiplicativeLSTMCell)` - The new cell
    /// - `Err(ModelError::ArgumentError)` - If `num_units` is 0
    pub fn new(num_units: usize) -> Result<Self, ModelError> {
        MultiplicativeLSTMConfig::new(num_units).build()
    }

    /// The configuration the cell was built with
    pub fn config(&self) -> &MultiplicativeLSTMConfig {
        &self.config
    }

    /// The store holding this cell's parameters
    pub fn parameters(&self) -> &ParameterStore {
        &self.store
    }

    /// Width of the hidden state, equal to `num_proj` when projecting and `num_units` otherwise
    pub fn hidden_width(&self) -> usize {
        self.config.num_proj.unwrap_or(self.config.num_units)
    }

    /// Returns `true` once the parameters of both linear maps exist
    pub fn is_built(&self) -> bool {
        self.store
            .contains(&self.multiplicative_linear.direction_name())
            && self.store.contains(&self.gate_linear.direction_name())
    }

    /// Creates every parameter for inputs of width `input_size` without running a step
    ///
    /// Calling this is optional; the first step creates whatever is missing. Calling it
    /// again with the same width does nothing.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - All parameters exist
    /// - `Err(ModelError::ShapeInferenceError)` - If `input_size` is 0
    /// - `Err(ModelError::ParameterShapeMismatch)` - If the cell was already built for another input width
    pub fn build(&self, input_size: usize) -> Result<(), ModelError> {
        if input_size == 0 {
            return Err(ModelError::ShapeInferenceError(
                "input size must be greater than 0".to_string(),
            ));
        }
        self.multiplicative_linear
            .build(&self.store, input_size + self.hidden_width())?;
        self.gate_linear
            .build(&self.store, input_size + self.config.num_units)?;
        if self.config.use_peepholes {
            self.peephole_weights()?;
        }
        if let Some(num_proj) = self.config.num_proj {
            self.projection_weight(num_proj)?;
        }
        Ok(())
    }

    /// Total number of trainable scalars created so far
    pub fn param_count(&self) -> usize {
        self.store.param_count()
    }

    /// Prints the parameters of the cell with their shapes and sizes
    pub fn summary(&self) {
        let col1_width = 34;
        let col2_width = 18;
        println!("Cell: \"{}\"", CELL_TYPE);
        println!("Activation: {}", self.config.activation.name());
        println!(
            "{:<col1_width$} {:<col2_width$} {}",
            "Parameter",
            "Shape",
            "Count",
            col1_width = col1_width,
            col2_width = col2_width
        );
        println!("{}", "=".repeat(col1_width + col2_width + 8));
        for (name, value) in self.store.snapshot() {
            println!(
                "{:<col1_width$} {:<col2_width$} {}",
                name,
                format!("{:?}", value.shape()),
                value.len(),
                col1_width = col1_width,
                col2_width = col2_width
            );
        }
        println!("{}", "=".repeat(col1_width + col2_width + 8));
        println!(" Total params: {}", self.param_count());
    }

    /// Saves every created parameter to a JSON file at `path`
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Parameters successfully written
    /// - `Err(IoError::StdIoError)` - File creation or write operation failed
    /// - `Err(IoError::JsonError)` - Serialization to JSON failed
    pub fn save_to_path(&self, path: &str) -> Result<(), IoError> {
        let serializable = SerializableParameters::from_store(&self.store, CELL_TYPE);

        let file = File::create(path).map_err(IoError::StdIoError)?;
        let mut writer = BufWriter::new(file);
        to_writer_pretty(&mut writer, &serializable).map_err(IoError::JsonError)?;
        writer.flush().map_err(IoError::StdIoError)?;

        info!(
            path,
            parameters = serializable.parameters.len(),
            "saved cell parameters"
        );
        Ok(())
    }

    /// Loads parameters from a JSON file written by [`save_to_path`](Self::save_to_path)
    ///
    /// Parameters that already exist are overwritten and must keep their shape; missing
    /// ones are inserted, so a fresh cell can be restored before its first step. The file
    /// must hold only parameters this configuration uses, with shapes that follow from it.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Parameters successfully loaded
    /// - `Err(IoError::StdIoError)` - File not found or read operation failed
    /// - `Err(IoError::JsonError)` - Deserialization from JSON failed
    /// - `Err(IoError::ModelError)` - The file belongs to another cell type or configuration, or a shape does not match
    pub fn load_from_path(&self, path: &str) -> Result<(), IoError> {
        let reader = IoError::load_in_buf_reader(path)?;
        let serializable: SerializableParameters =
            from_reader(reader).map_err(IoError::JsonError)?;

        if serializable.cell_type != CELL_TYPE {
            return Err(IoError::ModelError(ModelError::ArgumentError(format!(
                "file holds parameters of a `{}` cell, expected `{}`",
                serializable.cell_type, CELL_TYPE
            ))));
        }
        self.validate_loaded_parameters(&serializable.parameters)?;
        serializable.apply_to_store(&self.store)?;

        info!(
            path,
            parameters = serializable.parameters.len(),
            "loaded cell parameters"
        );
        Ok(())
    }

    /// Checks that loaded parameters are exactly the ones this configuration would create
    ///
    /// Names the configuration does not use are rejected, and every shape must follow
    /// from `num_units`, `num_proj` and a single input width shared by both linear maps.
    fn validate_loaded_parameters(
        &self,
        parameters: &[SerializableParameter],
    ) -> Result<(), ModelError> {
        let num_units = self.config.num_units;
        let hidden_width = self.hidden_width();
        let mut seen = AHashSet::new();
        let mut input_size: Option<(usize, &str)> = None;

        for parameter in parameters {
            let name = parameter.name.as_str();
            if !seen.insert(name) {
                return Err(ModelError::ArgumentError(format!(
                    "parameter `{}` appears more than once",
                    name
                )));
            }

            let mismatch = |expected: Vec<usize>| ModelError::ParameterShapeMismatch {
                name: name.to_string(),
                expected,
                found: parameter.shape.clone(),
            };
            let expect = |expected: Vec<usize>| {
                if parameter.shape == expected {
                    Ok(())
                } else {
                    Err(mismatch(expected))
                }
            };

            // (output width, width of the recurrent part of the input) for each direction
            let direction = match name {
                n if n == self.multiplicative_linear.direction_name() => {
                    Some((2 * num_units, hidden_width))
                }
                n if n == self.gate_linear.direction_name() => Some((4 * num_units, num_units)),
                n if n == self.multiplicative_linear.scale_name()
                    || n == self.multiplicative_linear.bias_name() =>
                {
                    expect(vec![2 * num_units])?;
                    None
                }
                n if n == self.gate_linear.scale_name() || n == self.gate_linear.bias_name() => {
                    expect(vec![4 * num_units])?;
                    None
                }
                FORGET_DIAG | INPUT_DIAG | OUTPUT_DIAG if self.config.use_peepholes => {
                    expect(vec![num_units])?;
                    None
                }
                PROJECTION if self.config.num_proj.is_some() => {
                    expect(vec![num_units, hidden_width])?;
                    None
                }
                _ => {
                    return Err(ModelError::ArgumentError(format!(
                        "parameter `{}` is not used by this cell configuration",
                        name
                    )));
                }
            };

            if let Some((output_width, recurrent_width)) = direction {
                let rows = match parameter.shape.as_slice() {
                    [rows, cols] if *cols == output_width && *rows > recurrent_width => *rows,
                    [rows, _] if *rows > recurrent_width => {
                        return Err(mismatch(vec![*rows, output_width]));
                    }
                    _ => return Err(mismatch(vec![recurrent_width + 1, output_width])),
                };
                let inferred = rows - recurrent_width;
                match input_size {
                    Some((expected, other)) if expected != inferred => {
                        return Err(ModelError::ShapeInferenceError(format!(
                            "`{}` implies input size {} but `{}` implies input size {}",
                            other, expected, name, inferred
                        )));
                    }
                    Some(_) => {}
                    None => input_size = Some((inferred, name)),
                }
            }
        }
        Ok(())
    }

    fn peephole_weights(&self) -> Result<PeepholeWeights, ModelError> {
        let shape = [self.config.num_units];
        let initializer = &self.config.initializer;
        Ok(PeepholeWeights {
            forget: self.store.get_or_create(FORGET_DIAG, &shape, initializer)?,
            input: self.store.get_or_create(INPUT_DIAG, &shape, initializer)?,
            output: self.store.get_or_create(OUTPUT_DIAG, &shape, initializer)?,
        })
    }

    fn projection_weight(&self, num_proj: usize) -> Result<Arc<Tensor>, ModelError> {
        self.store.get_or_create(
            PROJECTION,
            &[self.config.num_units, num_proj],
            &self.config.initializer,
        )
    }
}

impl RecurrentCell for MultiplicativeLSTMCell {
    fn state_size(&self) -> StateSize {
        match self.config.state_layout {
            StateLayout::Tuple => StateSize::Tuple {
                cell: self.config.num_units,
                hidden: self.hidden_width(),
            },
            StateLayout::Flat => StateSize::Flat(self.config.num_units + self.hidden_width()),
        }
    }

    fn output_size(&self) -> usize {
        self.hidden_width()
    }

    fn step(
        &self,
        input: ArrayViewD<'_, f32>,
        state: &LSTMState,
    ) -> Result<(Array2<f32>, LSTMState), ModelError> {
        let input_size = infer_input_size(&input)?;
        let num_units = self.config.num_units;
        let (c_prev, h_prev) = state.split(num_units, self.hidden_width())?;
        let x = input.into_dimensionality::<Ix2>()?;

        let batch = x.nrows();
        if c_prev.nrows() != batch {
            return Err(ModelError::ShapeInferenceError(format!(
                "input has batch size {} but state has batch size {}",
                batch,
                c_prev.nrows()
            )));
        }
        trace!(batch, input_size, num_units, "multiplicative lstm step");

        let concat = self
            .multiplicative_linear
            .forward(&self.store, &[x.view().into_dyn(), h_prev.view().into_dyn()])?;
        let (wx, wh) = concat.view().split_at(Axis(1), num_units);
        let m = &wx * &wh;

        let lstm_matrix = self
            .gate_linear
            .forward(&self.store, &[x.view().into_dyn(), m.view().into_dyn()])?;
        let i = lstm_matrix.slice(s![.., ..num_units]);
        let j = lstm_matrix.slice(s![.., num_units..2 * num_units]);
        let f = lstm_matrix.slice(s![.., 2 * num_units..3 * num_units]);
        let o = lstm_matrix.slice(s![.., 3 * num_units..]);

        let peepholes = if self.config.use_peepholes {
            Some(self.peephole_weights()?)
        } else {
            None
        };

        let forget_bias = self.config.forget_bias;
        let activation = self.config.activation;
        let use_parallel = batch * num_units >= MLSTM_PARALLEL_THRESHOLD;

        let mut c = match &peepholes {
            Some(diag) => {
                let w_f = diag.forget.view().into_dimensionality::<Ix1>()?;
                let w_i = diag.input.view().into_dimensionality::<Ix1>()?;
                let (forget_gate, input_gate) = join_if(
                    use_parallel,
                    || apply_sigmoid(&(&f + forget_bias + &(&c_prev * &w_f))),
                    || apply_sigmoid(&(&i + &(&c_prev * &w_i))),
                );
                &c_prev * &forget_gate + &(&input_gate * &j)
            }
            None => {
                let (forget_gate, input_gate) = join_if(
                    use_parallel,
                    || apply_sigmoid(&(&f + forget_bias)),
                    || apply_sigmoid(&i),
                );
                &c_prev * &forget_gate + &(&input_gate * &j)
            }
        };

        if let Some(cell_clip) = self.config.cell_clip {
            c.mapv_inplace(|v| v.clamp(-cell_clip, cell_clip));
        }

        // the raw output gate scales c inside the activation, in both branches
        let h = match &peepholes {
            Some(diag) => {
                let w_o = diag.output.view().into_dimensionality::<Ix1>()?;
                let o_peep = &o + &(&c * &w_o);
                let (output_gate, activated) = join_if(
                    use_parallel,
                    || apply_sigmoid(&o_peep),
                    || activation.apply(&(&c * &o_peep)),
                );
                output_gate * &activated
            }
            None => activation.apply(&(&c * &o)),
        };

        let h = match self.config.num_proj {
            Some(num_proj) => {
                let w_proj = self.projection_weight(num_proj)?;
                let w_proj = w_proj.view().into_dimensionality::<Ix2>()?;
                let mut projected = h.dot(&w_proj);
                if let Some(proj_clip) = self.config.proj_clip {
                    projected.mapv_inplace(|v| v.clamp(-proj_clip, proj_clip));
                }
                projected
            }
            None => h,
        };

        let new_state = LSTMState::join(c, h.clone(), self.config.state_layout)?;
        Ok((h, new_state))
    }

    fn cell_type(&self) -> &str {
        CELL_TYPE
    }
}
