//! Introvert/extrovert prediction from seven behavioral traits.
//!
//! A prediction runs one synchronous pipeline over artifacts that were fitted
//! elsewhere: the answers are assembled into a fixed-order feature vector,
//! scaled, classified and decoded back into a class name.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use persona_predict::{Predictor, RawInput};
//!
//! let predictor = Predictor::from_dir("artifacts")?;
//!
//! let answers = RawInput {
//!     time_alone: 8,
//!     social_events: 1,
//!     friends_size: 3,
//!     post_freq: 1,
//!     stage_fear: "Yes".into(),
//!     going_outside: 1,
//!     drained_social: "Yes".into(),
//! };
//! let prediction = predictor.predict(&answers)?;
//! println!("You are likely an {}", prediction.label.shouted());
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Artifacts are loaded once and never mutated. A `Predictor` can be cloned
//! or wrapped in `Arc` and used from many threads at once:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use persona_predict::{Predictor, RawInput};
//! use std::thread;
//!
//! let predictor = Predictor::from_dir("artifacts")?;
//!
//! let mut handles = vec![];
//! for friends in [0, 10, 20] {
//!     let predictor = predictor.clone();
//!     handles.push(thread::spawn(move || {
//!         let input = RawInput { friends_size: friends, ..RawInput::default() };
//!         predictor.respond(&input).to_string()
//!     }));
//! }
//!
//! for handle in handles {
//!     println!("{}", handle.join().unwrap());
//! }
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
mod runtime;
pub mod artifact_manager;

pub use pipeline::{
    Artifacts, ArtifactsBuilder, CategoricalEncoders, CategoricalField, ClassifierModel,
    FeatureRecord, FittedScaler, Kernel, LabelEncoder, OnnxModel, Outcome, PersonalityLabel,
    PipelineError, PipelineInfo, Prediction, Predictor, RawInput, ScalerKind, SvmModel,
    FEATURE_NAMES, NUM_FEATURES,
};
pub use runtime::{RuntimeConfig, create_session_builder};
pub use artifact_manager::{ArtifactManager, ArtifactError, FileStatus, Manifest, ManifestEntry};
