use ort::Error as OrtError;
use std::fmt;

/// Represents the different types of errors that can occur while running the prediction pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A categorical value was never seen when its encoder was fitted
    UnknownCategory { field: String, value: String },
    /// The feature vector does not match what the scaler or model was fitted on
    ShapeMismatch(String),
    /// The classifier failed to produce a class index
    ModelInference(String),
    /// The predicted class index is outside the target encoder's classes
    UnknownClass { index: usize, num_classes: usize },
    /// A numeric input is outside its allowed range
    Validation(String),
    /// An artifact could not be read, parsed or checked at load time
    Artifact(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCategory { field, value } => {
                write!(f, "Unknown category: '{}' was not seen when fitting the encoder for {}", value, field)
            }
            Self::ShapeMismatch(msg) => write!(f, "Shape mismatch: {}", msg),
            Self::ModelInference(msg) => write!(f, "Model inference error: {}", msg),
            Self::UnknownClass { index, num_classes } => {
                write!(f, "Unknown class: index {} is outside the {} fitted classes", index, num_classes)
            }
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
            Self::Artifact(msg) => write!(f, "Artifact error: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<OrtError> for PipelineError {
    fn from(err: OrtError) -> Self {
        PipelineError::Artifact(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Artifact(format!("Malformed artifact: {}", err))
    }
}
