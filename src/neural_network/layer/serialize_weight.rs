use crate::error::ModelError;
use crate::neural_network::parameter_store::ParameterStore;
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Serializable representation of a single stored parameter
///
/// # Fields
///
/// - `name` - Scoped name of the parameter in the store
/// - `shape` - Shape of the parameter
/// - `values` - Values in row-major order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableParameter {
    pub name: String,
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
}

/// Serializable representation of all parameters of a cell
///
/// # Fields
///
/// - `cell_type` - Type of the cell that produced the parameters
/// - `parameters` - Parameters in creation order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableParameters {
    pub cell_type: String,
    pub parameters: Vec<SerializableParameter>,
}

impl SerializableParameters {
    /// Copies every parameter of `store` into a serializable form
    pub fn from_store(store: &ParameterStore, cell_type: &str) -> Self {
        let parameters = store
            .snapshot()
            .into_iter()
            .map(|(name, value)| SerializableParameter {
                name,
                shape: value.shape().to_vec(),
                values: value.iter().cloned().collect(),
            })
            .collect();

        Self {
            cell_type: cell_type.to_string(),
            parameters,
        }
    }

    /// Writes every parameter into `store`
    ///
    /// All entries are decoded first and then written in one batch, so a file with a bad
    /// entry leaves the store untouched.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - All parameters were stored
    /// - `Err(ModelError::ArgumentError)` - If an entry's values do not fit its shape
    /// - `Err(ModelError::ParameterShapeMismatch)` - If an existing parameter has another shape
    pub fn apply_to_store(&self, store: &ParameterStore) -> Result<(), ModelError> {
        let mut decoded = Vec::with_capacity(self.parameters.len());
        for parameter in &self.parameters {
            let value = ArrayD::from_shape_vec(IxDyn(&parameter.shape), parameter.values.clone())
                .map_err(|e| {
                    ModelError::ArgumentError(format!(
                        "parameter `{}` does not fit shape {:?}: {}",
                        parameter.name, parameter.shape, e
                    ))
                })?;
            decoded.push((parameter.name.clone(), value));
        }

        let created = store.assign_all(decoded)?;
        if created > 0 {
            warn!(created, "loaded parameters that had not been created yet");
        }
        Ok(())
    }
}
