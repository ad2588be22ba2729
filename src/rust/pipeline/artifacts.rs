use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};

use super::encoder::{CategoricalEncoders, LabelEncoder};
use super::error::PipelineError;
use super::features::{FEATURE_NAMES, NUM_FEATURES};
use super::model::{ClassifierModel, SvmModel};
use super::onnx::OnnxModel;
use super::scaler::FittedScaler;
use crate::runtime::RuntimeConfig;

pub const SCALER_FILE: &str = "scaler.json";
pub const LABEL_ENCODERS_FILE: &str = "label_encoders.json";
pub const TARGET_ENCODER_FILE: &str = "target_encoder.json";
pub const SVM_MODEL_FILE: &str = "svm_model.json";
pub const ONNX_MODEL_FILE: &str = "svm_model.onnx";

/// The pre-fitted objects the pipeline depends on.
///
/// Built once at startup and never mutated; share it behind an `Arc`.
#[derive(Debug)]
pub struct Artifacts {
    pub(crate) scaler: FittedScaler,
    pub(crate) encoders: CategoricalEncoders,
    pub(crate) target_encoder: LabelEncoder,
    pub(crate) model: Box<dyn ClassifierModel>,
    pub(crate) source_dir: Option<PathBuf>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Artifacts>();
    }
};

impl Artifacts {
    /// Creates a new ArtifactsBuilder for fluent construction
    pub fn builder() -> ArtifactsBuilder {
        ArtifactsBuilder::new()
    }

    /// Loads all four artifacts from `dir` with the default runtime configuration.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, PipelineError> {
        Self::builder().from_dir(dir)?.build()
    }

    pub fn scaler(&self) -> &FittedScaler {
        &self.scaler
    }

    pub fn encoders(&self) -> &CategoricalEncoders {
        &self.encoders
    }

    pub fn target_encoder(&self) -> &LabelEncoder {
        &self.target_encoder
    }

    pub fn model(&self) -> &dyn ClassifierModel {
        self.model.as_ref()
    }

    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }
}

/// A builder for assembling `Artifacts` from files or in-memory parts.
#[derive(Default, Debug)]
pub struct ArtifactsBuilder {
    scaler: Option<FittedScaler>,
    encoders: Option<CategoricalEncoders>,
    target_encoder: Option<LabelEncoder>,
    model: Option<Box<dyn ClassifierModel>>,
    source_dir: Option<PathBuf>,
    runtime_config: RuntimeConfig,
}

impl ArtifactsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration used when an ONNX classifier is loaded.
    /// Must be called before `from_dir` or `with_model_file` to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    pub fn with_scaler(mut self, scaler: FittedScaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    pub fn with_encoders(mut self, encoders: CategoricalEncoders) -> Self {
        self.encoders = Some(encoders);
        self
    }

    pub fn with_target_encoder(mut self, target_encoder: LabelEncoder) -> Self {
        self.target_encoder = Some(target_encoder);
        self
    }

    pub fn with_model(mut self, model: impl ClassifierModel + 'static) -> Self {
        self.model = Some(Box::new(model));
        self
    }

    /// Loads every artifact from `dir`.
    ///
    /// The classifier is read from `svm_model.json` when present, otherwise
    /// from `svm_model.onnx`.
    ///
    /// # Errors
    /// - `Artifact` if any file is missing, unreadable or malformed
    pub fn from_dir(self, dir: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(PipelineError::Artifact(format!(
                "Artifact directory not found: {}",
                dir.display()
            )));
        }
        info!("Loading artifacts from {:?}", dir);

        let model_path = [SVM_MODEL_FILE, ONNX_MODEL_FILE]
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
            .ok_or_else(|| {
                PipelineError::Artifact(format!(
                    "No classifier found in {} (expected {} or {})",
                    dir.display(),
                    SVM_MODEL_FILE,
                    ONNX_MODEL_FILE
                ))
            })?;

        let mut builder = self
            .with_scaler_file(dir.join(SCALER_FILE))?
            .with_encoders_file(dir.join(LABEL_ENCODERS_FILE))?
            .with_target_encoder_file(dir.join(TARGET_ENCODER_FILE))?
            .with_model_file(model_path)?;
        builder.source_dir = Some(dir.to_path_buf());
        Ok(builder)
    }

    pub fn with_scaler_file(self, path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let scaler: FittedScaler = serde_json::from_str(&read_artifact(path.as_ref())?)?;
        info!("Scaler loaded ({:?}, {} features)", scaler.kind(), scaler.n_features());
        Ok(self.with_scaler(scaler))
    }

    pub fn with_encoders_file(self, path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let columns: HashMap<String, LabelEncoder> = serde_json::from_str(&read_artifact(path.as_ref())?)?;
        let encoders = CategoricalEncoders::from_columns(columns)?;
        info!("Categorical encoders loaded");
        Ok(self.with_encoders(encoders))
    }

    pub fn with_target_encoder_file(self, path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let encoder: LabelEncoder = serde_json::from_str(&read_artifact(path.as_ref())?)?;
        info!("Target encoder loaded with classes {:?}", encoder.classes());
        Ok(self.with_target_encoder(encoder))
    }

    /// Loads the classifier, choosing the format from the file extension.
    pub fn with_model_file(mut self, path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let model: Box<dyn ClassifierModel> = match path.extension().and_then(|e| e.to_str()) {
            Some("onnx") => Box::new(OnnxModel::load(path, &self.runtime_config, NUM_FEATURES)?),
            Some("json") => Box::new(SvmModel::from_json(&read_artifact(path)?)?),
            _ => {
                return Err(PipelineError::Artifact(format!(
                    "Unsupported classifier format: {}",
                    path.display()
                )))
            }
        };
        info!("Classifier loaded ({}, {} features)", model.kind(), model.n_features());
        self.model = Some(model);
        Ok(self)
    }

    /// Checks that the parts fit together and returns the final `Artifacts`.
    ///
    /// # Errors
    /// - `Artifact` if a part is missing or the target encoder has fewer than two classes
    /// - `ShapeMismatch` if the scaler or classifier disagree with the feature schema,
    ///   or the classifier can emit more classes than the target encoder knows
    pub fn build(self) -> Result<Artifacts, PipelineError> {
        let scaler = self
            .scaler
            .ok_or_else(|| PipelineError::Artifact("Scaler must be set".into()))?;
        let encoders = self
            .encoders
            .ok_or_else(|| PipelineError::Artifact("Categorical encoders must be set".into()))?;
        let target_encoder = self
            .target_encoder
            .ok_or_else(|| PipelineError::Artifact("Target encoder must be set".into()))?;
        let model = self
            .model
            .ok_or_else(|| PipelineError::Artifact("Classifier must be set".into()))?;

        scaler.check_schema(&FEATURE_NAMES)?;

        if model.n_features() != NUM_FEATURES {
            return Err(PipelineError::ShapeMismatch(format!(
                "Classifier was trained on {} features, pipeline produces {}",
                model.n_features(),
                NUM_FEATURES
            )));
        }
        if target_encoder.num_classes() < 2 {
            return Err(PipelineError::Artifact(format!(
                "Target encoder needs at least 2 classes, found {}",
                target_encoder.num_classes()
            )));
        }
        if let Some(n) = model.n_classes() {
            if n > target_encoder.num_classes() {
                return Err(PipelineError::ShapeMismatch(format!(
                    "Classifier emits {} classes but the target encoder knows {}",
                    n,
                    target_encoder.num_classes()
                )));
            }
        }

        Ok(Artifacts {
            scaler,
            encoders,
            target_encoder,
            model,
            source_dir: self.source_dir,
        })
    }
}

fn read_artifact(path: &Path) -> Result<String, PipelineError> {
    fs::read_to_string(path).map_err(|e| {
        error!("Failed to read artifact {:?}: {}", path, e);
        PipelineError::Artifact(format!("Failed to read {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::scaler::ScalerKind;

    fn linear_model(width: usize) -> SvmModel {
        let json = format!(
            r#"{{"kernel": "linear", "support_vectors": [{:?}], "dual_coef": [1.0], "intercept": 0.0}}"#,
            vec![1.0f32; width]
        );
        SvmModel::from_json(&json).unwrap()
    }

    fn parts() -> ArtifactsBuilder {
        let yes_no = LabelEncoder::new(vec!["No", "Yes"]).unwrap();
        Artifacts::builder()
            .with_scaler(FittedScaler::new(ScalerKind::Standard, vec![0.0; 7], vec![1.0; 7]).unwrap())
            .with_encoders(CategoricalEncoders::new(yes_no.clone(), yes_no))
            .with_target_encoder(LabelEncoder::new(vec!["Extrovert", "Introvert"]).unwrap())
    }

    #[test]
    fn test_build_from_parts() {
        let artifacts = parts().with_model(linear_model(7)).build().unwrap();
        assert_eq!(artifacts.model().kind(), "svm");
        assert!(artifacts.source_dir().is_none());
    }

    #[test]
    fn test_missing_part() {
        let err = parts().build().unwrap_err();
        assert_eq!(err, PipelineError::Artifact("Classifier must be set".into()));
    }

    #[test]
    fn test_model_width_mismatch() {
        let err = parts().with_model(linear_model(6)).build().unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch(_)));
    }

    #[test]
    fn test_single_class_target_rejected() {
        let err = parts()
            .with_target_encoder(LabelEncoder::new(vec!["Introvert"]).unwrap())
            .with_model(linear_model(7))
            .build()
            .unwrap_err();
        assert!(matches!(err, PipelineError::Artifact(_)));
    }

    #[test]
    fn test_missing_directory() {
        let err = Artifacts::load("/nonexistent/persona-artifacts").unwrap_err();
        assert!(matches!(err, PipelineError::Artifact(_)));
    }

    #[test]
    fn test_unsupported_model_extension() {
        let err = Artifacts::builder().with_model_file("model.pkl").unwrap_err();
        assert!(err.to_string().contains("Unsupported classifier format"));
    }
}
