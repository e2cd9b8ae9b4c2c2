/// A macro that generates a getter method for any field.
///
/// This macro creates a public getter method that returns the value of the specified
/// field. The generated method includes documentation describing the field being accessed.
///
/// # Parameters
///
/// - `$method_name` - The name of the getter method (e.g., get_num_units)
/// - `$field_name` - The name of the field to access (e.g., num_units)
/// - `$return_type` - The return type of the getter method
macro_rules! get_field {
    ($method_name:ident, $field_name:ident, $return_type:ty) => {
        #[doc = concat!("Gets the `", stringify!($field_name), "` field.\n\n")]
        #[doc = "# Returns\n\n"]
        #[doc = concat!("* `", stringify!($return_type), "` - The value of the `", stringify!($field_name), "` field")]
        pub fn $method_name(&self) -> $return_type {
            self.$field_name
        }
    };
}

/// A macro that generates a public getter method returning a reference to a field.
///
/// # Parameters
///
/// - `$method_name` - The identifier for the generated getter method name
/// - `$field_name` - The identifier of the struct field to access
/// - `$return_type` - The type expression for the return value (typically a reference type like `&str`)
macro_rules! get_field_as_ref {
    ($method_name:ident, $field_name:ident, $return_type:ty) => {
        #[doc = concat!("Gets the `", stringify!($field_name), "` field.\n\n")]
        #[doc = "# Returns\n\n"]
        #[doc = concat!("* `", stringify!($return_type), "` - The value of the `", stringify!($field_name), "` field as a reference")]
        pub fn $method_name(&self) -> $return_type {
            self.$field_name.as_ref()
        }
    };
}

/// Error types returned by cells, linear maps, initializers and parameter persistence.
pub mod error;

pub use error::{IoError, ModelError};

/// Components for building the multiplicative LSTM cell.
///
/// # Core Components
///
/// - **MultiplicativeLSTMCell**: single-step recurrent cell where the previous hidden state
///   modulates the input multiplicatively before the gates, with optional peepholes,
///   cell clipping and output projection
/// - **NormalizedLinear**: weight-normalized affine map over concatenated inputs
/// - **ParameterStore**: named parameters created on first use and shared by every later step
/// - **Initializer**: orthogonal, normal and constant initialization
/// - **LSTMState**: tuple or flat recurrent state with `split`/`join`
///
/// # Examples
/// ```rust
/// use mlstm::neural_network::*;
/// use ndarray::Array2;
///
/// let cell = MultiplicativeLSTMConfig::new(8)
///     .with_peepholes(true)
///     .with_num_proj(4)
///     .with_proj_clip(1.0)
///     .with_random_seed(1)
///     .build()
///     .unwrap();
///
/// // Drive the cell over a short sequence
/// let mut state = cell.zero_state(3);
/// for _ in 0..5 {
///     let x = Array2::<f32>::ones((3, 6));
///     let (output, next) = cell.step(x.view().into_dyn(), &state).unwrap();
///     assert_eq!(output.shape(), &[3, 4]);
///     state = next;
/// }
///
/// cell.summary();
/// ```
pub mod neural_network;

/// A convenience module that re-exports the most commonly used types and traits from this crate.
///
/// # Examples
/// ```rust
/// use mlstm::prelude::*;
///
/// let cell = MultiplicativeLSTMCell::new(4).unwrap();
/// assert_eq!(cell.output_size(), 4);
/// ```
pub mod prelude;

/// Traits shared by recurrent cells.
pub mod traits;
