use super::*;

/// Validates that a unit count is greater than 0
///
/// # Parameters
///
/// - `value` - The dimension value to validate
/// - `name` - The name of the dimension for error messages
///
/// # Returns
///
/// * `Ok(())` if validation passes
/// * `Err(ModelError::ArgumentError)` if validation fails
pub(super) fn validate_dimension_greater_than_zero(
    value: usize,
    name: &str,
) -> Result<(), ModelError> {
    if value == 0 {
        return Err(ModelError::ArgumentError(format!(
            "{} must be greater than 0",
            name
        )));
    }
    Ok(())
}

/// Validates an optional clipping bound
///
/// A bound must be a positive finite number when present.
pub(super) fn validate_clip(value: Option<f32>, name: &str) -> Result<(), ModelError> {
    if let Some(clip) = value {
        if !clip.is_finite() || clip <= 0.0 {
            return Err(ModelError::ArgumentError(format!(
                "{} must be a positive finite number, got {}",
                name, clip
            )));
        }
    }
    Ok(())
}

/// Validates that the forget bias is a finite number
pub(super) fn validate_forget_bias(value: f32) -> Result<(), ModelError> {
    if !value.is_finite() {
        return Err(ModelError::ArgumentError(format!(
            "forget_bias must be finite, got {}",
            value
        )));
    }
    Ok(())
}

/// Determines the feature width of a cell input
///
/// # Returns
///
/// * `Ok(usize)` - The input width
/// * `Err(ModelError::ShapeInferenceError)` - If the input is not 2D or has no features
pub(super) fn infer_input_size(input: &ArrayViewD<'_, f32>) -> Result<usize, ModelError> {
    if input.ndim() != 2 || input.shape()[1] == 0 {
        return Err(ModelError::ShapeInferenceError(format!(
            "Could not infer input size from input shape {:?}",
            input.shape()
        )));
    }
    Ok(input.shape()[1])
}
