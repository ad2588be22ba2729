use std::path::PathBuf;

mod error;
mod input;
mod encoder;
mod features;
mod scaler;
mod model;
mod onnx;
pub mod artifacts;
mod predictor;

pub use error::PipelineError;
pub use input::{
    RawInput, ANSWERS, FRIENDS_SIZE_RANGE, GOING_OUTSIDE_RANGE, POST_FREQ_RANGE,
    SOCIAL_EVENTS_RANGE, TIME_ALONE_RANGE,
};
pub use encoder::{CategoricalEncoders, CategoricalField, LabelEncoder};
pub use features::{FeatureRecord, FEATURE_NAMES, NUM_FEATURES};
pub use scaler::{FittedScaler, ScalerKind};
pub use model::{ClassifierModel, Kernel, SvmModel};
pub use onnx::OnnxModel;
pub use artifacts::{Artifacts, ArtifactsBuilder};
pub use predictor::{Outcome, PersonalityLabel, Prediction, Predictor};

/// Information about the artifacts a predictor was built from
#[derive(Debug, Clone)]
pub struct PipelineInfo {
    /// Directory the artifacts were loaded from, if any
    pub source_dir: Option<PathBuf>,
    /// Feature columns in the order they are fed to the scaler
    pub feature_names: Vec<String>,
    /// Kind of the fitted scaler
    pub scaler_kind: ScalerKind,
    /// Kind of the classifier ("svm" or "onnx")
    pub model_kind: &'static str,
    /// Labels of the target classes, indexed by class
    pub class_labels: Vec<String>,
}
