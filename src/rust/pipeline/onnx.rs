use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array2, ArrayView1};
use ort::session::Session;
use ort::value::{Tensor, ValueType};

use super::error::PipelineError;
use super::model::ClassifierModel;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// A classifier exported to ONNX, run with ONNX Runtime.
///
/// The graph is expected to:
/// - Accept one float input of shape [batch_size, n_features]
/// - Emit the predicted label as its first output, an int64 tensor of shape [batch_size]
#[derive(Debug)]
pub struct OnnxModel {
    session: Session,
    input_name: String,
    n_features: usize,
}

impl OnnxModel {
    /// Loads and validates an ONNX classifier.
    ///
    /// `expected_features` is used when the graph declares a dynamic feature dimension.
    pub fn load(
        path: &Path,
        config: &RuntimeConfig,
        expected_features: usize,
    ) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::Artifact(format!("Model file not found: {}", path.display())));
        }

        let session = create_session_builder(config)?.commit_from_file(path)?;
        Self::validate_model(&session)?;

        let input = &session.inputs[0];
        let declared = match &input.input_type {
            ValueType::Tensor { dimensions, .. } => dimensions.get(1).copied(),
            _ => None,
        };
        let n_features = match declared {
            Some(d) if d > 0 => d as usize,
            _ => expected_features,
        };
        let input_name = input.name.clone();
        log::info!("ONNX model loaded: input '{}' with {} features", input_name, n_features);

        Ok(Self {
            session,
            input_name,
            n_features,
        })
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), PipelineError> {
        if session.inputs.len() != 1 {
            return Err(PipelineError::Artifact(format!(
                "Model must have exactly 1 input (the feature matrix), found {}",
                session.inputs.len()
            )));
        }
        if session.outputs.is_empty() {
            return Err(PipelineError::Artifact("Model must have at least 1 output for labels".into()));
        }
        Ok(())
    }
}

impl ClassifierModel for OnnxModel {
    fn predict(&self, features: ArrayView1<'_, f32>) -> Result<usize, PipelineError> {
        if features.len() != self.n_features {
            return Err(PipelineError::ShapeMismatch(format!(
                "ONNX model expects {} features, got {}",
                self.n_features,
                features.len()
            )));
        }

        let input_array = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| PipelineError::ModelInference(format!("Failed to create input array: {}", e)))?;
        let input_dyn = input_array.into_dyn();
        let input_view = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input_view)
                .map_err(|e| PipelineError::ModelInference(format!("Failed to create input tensor: {}", e)))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| PipelineError::ModelInference(format!("Failed to run model: {}", e)))?;
        let labels = outputs[0]
            .try_extract_tensor::<i64>()
            .map_err(|e| PipelineError::ModelInference(format!("Failed to extract label tensor: {}", e)))?;

        let label = labels
            .iter()
            .next()
            .copied()
            .ok_or_else(|| PipelineError::ModelInference("Model returned no label".into()))?;
        usize::try_from(label)
            .map_err(|_| PipelineError::ModelInference(format!("Model returned negative label {}", label)))
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> Option<usize> {
        None
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}
