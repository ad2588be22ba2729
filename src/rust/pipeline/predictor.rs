use std::fmt;
use std::path::Path;
use std::sync::Arc;

use log::{debug, error};

use super::artifacts::Artifacts;
use super::error::PipelineError;
use super::features::{FeatureRecord, FEATURE_NAMES};
use super::input::RawInput;
use super::PipelineInfo;

/// The decoded class name, e.g. "Introvert".
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PersonalityLabel(String);

impl PersonalityLabel {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The label as it is shown to the user
    pub fn shouted(&self) -> String {
        self.0.to_uppercase()
    }
}

impl fmt::Display for PersonalityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one successful pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Class index emitted by the classifier
    pub class_index: usize,
    /// Class name decoded by the target encoder
    pub label: PersonalityLabel,
    /// The assembled (unscaled) features the prediction was made from
    pub features: FeatureRecord,
}

/// What the user sees after submitting the form.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Label(PersonalityLabel),
    Error(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(label) => write!(f, "You are likely an {}", label.shouted()),
            Self::Error(msg) => write!(f, "An error occurred during prediction: {}", msg),
        }
    }
}

/// Runs the inference pipeline against a shared set of artifacts.
///
/// # Thread Safety
///
/// `Predictor` is `Send + Sync` and cheap to clone: every clone shares the
/// same read-only `Artifacts`. Each call to `predict` builds its own
/// feature record and keeps no state between calls.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use persona_predict::{Predictor, RawInput};
///
/// let predictor = Predictor::from_dir("artifacts")?;
/// let prediction = predictor.predict(&RawInput::default())?;
/// println!("You are likely an {}", prediction.label.shouted());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Predictor {
    artifacts: Arc<Artifacts>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Predictor>();
    }
};

impl Predictor {
    pub fn new(artifacts: Arc<Artifacts>) -> Self {
        Self { artifacts }
    }

    /// Loads the artifacts in `dir` and wraps them in a predictor.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, PipelineError> {
        Ok(Self::new(Arc::new(Artifacts::load(dir)?)))
    }

    pub fn artifacts(&self) -> &Arc<Artifacts> {
        &self.artifacts
    }

    /// Returns information about the loaded artifacts
    pub fn info(&self) -> PipelineInfo {
        let artifacts = &self.artifacts;
        PipelineInfo {
            source_dir: artifacts.source_dir.clone(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            scaler_kind: artifacts.scaler.kind(),
            model_kind: artifacts.model.kind(),
            class_labels: artifacts.target_encoder.classes().to_vec(),
        }
    }

    /// Runs validation, feature assembly, scaling, inference and label decoding.
    ///
    /// # Errors
    /// - `Validation` if a numeric answer is out of range
    /// - `UnknownCategory` if a categorical answer is unknown to its encoder
    /// - `ShapeMismatch` if the features do not fit the scaler or classifier
    /// - `ModelInference` if the classifier fails
    /// - `UnknownClass` if the classifier emits an index the target encoder cannot decode
    pub fn predict(&self, input: &RawInput) -> Result<Prediction, PipelineError> {
        input.validate()?;

        let features = FeatureRecord::assemble(input, &self.artifacts.encoders)?;
        let scaled = self.artifacts.scaler.transform(&features)?;
        let class_index = self.artifacts.model.predict(scaled.view())?;
        debug!("Predicted class index {}", class_index);

        let target = &self.artifacts.target_encoder;
        let label = target
            .inverse_transform(class_index)
            .ok_or(PipelineError::UnknownClass {
                index: class_index,
                num_classes: target.num_classes(),
            })?;

        Ok(Prediction {
            class_index,
            label: PersonalityLabel(label.to_string()),
            features,
        })
    }

    /// Handles one form submission, turning any pipeline error into a message.
    pub fn respond(&self, input: &RawInput) -> Outcome {
        match self.predict(input) {
            Ok(prediction) => Outcome::Label(prediction.label),
            Err(e) => {
                error!("Prediction failed: {}", e);
                Outcome::Error(e.to_string())
            }
        }
    }
}
