/// Weight-normalized linear map shared by the recurrent cells
pub mod normalized_linear;
/// Recurrent cells and their state
pub mod recurrent_layer;
/// Serializable forms of stored parameters
pub mod serialize_weight;

pub use normalized_linear::{NormalizedLinear, normalized_weight};
pub use recurrent_layer::*;
pub use serialize_weight::{SerializableParameter, SerializableParameters};
