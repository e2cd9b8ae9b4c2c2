use std::fs::File;
use std::io::BufReader;

/// Error types that can occur while building or stepping a recurrent cell
///
/// # Variants
///
/// - `ArgumentError` - Indicates that the arguments given to a linear map, initializer or configuration are invalid
/// - `ShapeInferenceError` - Indicates that the cell could not determine the input or state widths
/// - `ParameterShapeMismatch` - Indicates that a stored parameter was requested with a different shape than it was created with
/// - `ProcessingError` - Indicates that there is something wrong while processing
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    ArgumentError(String),
    ShapeInferenceError(String),
    ParameterShapeMismatch {
        name: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    ProcessingError(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::ArgumentError(msg) => write!(f, "Argument error: {}", msg),
            ModelError::ShapeInferenceError(msg) => write!(f, "Shape inference error: {}", msg),
            ModelError::ParameterShapeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "Parameter `{}` already exists with shape {:?}, requested shape {:?}",
                name, found, expected
            ),
            ModelError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

/// Implements the standard error trait for ModelError
impl std::error::Error for ModelError {}

impl From<ndarray::ShapeError> for ModelError {
    fn from(e: ndarray::ShapeError) -> Self {
        ModelError::ProcessingError(e.to_string())
    }
}

/// Input/Output error types that can occur while saving or loading cell parameters
///
/// # Variants
///
/// - `StdIoError` - Wraps standard I/O errors from file system operations (reading, writing, file access)
/// - `JsonError` - Wraps JSON serialization/deserialization errors
/// - `ModelError` - The file was read but its contents do not fit the cell
#[derive(Debug)]
pub enum IoError {
    StdIoError(std::io::Error),
    JsonError(serde_json::Error),
    ModelError(ModelError),
}

impl IoError {
    pub fn load_in_buf_reader(path: &str) -> Result<BufReader<File>, IoError> {
        let file = File::open(path).map_err(IoError::StdIoError)?;
        Ok(BufReader::new(file))
    }
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoError::StdIoError(e) => write!(f, "IO error: {}", e),
            IoError::JsonError(e) => write!(f, "JSON error: {}", e),
            IoError::ModelError(e) => write!(f, "Model error: {}", e),
        }
    }
}

impl std::error::Error for IoError {}

impl From<ModelError> for IoError {
    fn from(e: ModelError) -> Self {
        IoError::ModelError(e)
    }
}
