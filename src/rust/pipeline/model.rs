use std::fmt::Debug;

use ndarray::{Array1, Array2, ArrayView1};
use serde::Deserialize;

use super::error::PipelineError;

/// A trained decision function mapping a scaled feature vector to a class index.
///
/// Implementations are shared read-only across requests, so `predict` takes
/// `&self` and must not keep per-call state.
pub trait ClassifierModel: Debug + Send + Sync {
    /// Predicts the class index for one scaled feature vector.
    ///
    /// # Errors
    /// - `ShapeMismatch` if the vector width differs from `n_features()`
    /// - `ModelInference` for any failure inside the model
    fn predict(&self, features: ArrayView1<'_, f32>) -> Result<usize, PipelineError>;

    /// Number of features the model was trained on
    fn n_features(&self) -> usize;

    /// Number of classes the model can emit, when the artifact records it
    fn n_classes(&self) -> Option<usize>;

    /// Short name for logs and `PipelineInfo`
    fn kind(&self) -> &'static str;
}

/// Kernel function of a support-vector classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kernel {
    Linear,
    Rbf,
    Poly,
    Sigmoid,
}

impl Kernel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Rbf => "rbf",
            Self::Poly => "poly",
            Self::Sigmoid => "sigmoid",
        }
    }
}

#[derive(Debug, Deserialize)]
struct SvmArtifact {
    kernel: Kernel,
    #[serde(default)]
    gamma: Option<f32>,
    #[serde(default)]
    coef0: f32,
    #[serde(default = "default_degree")]
    degree: i32,
    support_vectors: Vec<Vec<f32>>,
    dual_coef: Vec<f32>,
    intercept: f32,
}

fn default_degree() -> i32 {
    3
}

/// A binary support-vector classifier.
///
/// The decision value is `sum(dual_coef[i] * K(sv[i], x)) + intercept`; the
/// predicted class index is 1 when it is zero or positive and 0 otherwise,
/// matching libsvm's vote on a tie.
#[derive(Debug, Clone)]
pub struct SvmModel {
    kernel: Kernel,
    gamma: f32,
    coef0: f32,
    degree: i32,
    support_vectors: Array2<f32>,
    dual_coef: Array1<f32>,
    intercept: f32,
}

impl SvmModel {
    /// Parses a JSON SVM artifact.
    ///
    /// Every kernel except `linear` needs an explicit `gamma`: the value the
    /// model was fitted with depends on the training data and cannot be derived here.
    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        let artifact: SvmArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: SvmArtifact) -> Result<Self, PipelineError> {
        let n_vectors = artifact.support_vectors.len();
        if n_vectors == 0 {
            return Err(PipelineError::Artifact("SVM has no support vectors".into()));
        }
        if artifact.dual_coef.len() != n_vectors {
            return Err(PipelineError::Artifact(format!(
                "SVM has {} support vectors but {} dual coefficients",
                n_vectors,
                artifact.dual_coef.len()
            )));
        }

        let n_features = artifact.support_vectors[0].len();
        if n_features == 0 {
            return Err(PipelineError::Artifact("SVM support vectors are empty".into()));
        }
        if let Some(pos) = artifact.support_vectors.iter().position(|sv| sv.len() != n_features) {
            return Err(PipelineError::Artifact(format!(
                "Support vector {} has {} values, expected {}",
                pos,
                artifact.support_vectors[pos].len(),
                n_features
            )));
        }

        let flat: Vec<f32> = artifact.support_vectors.into_iter().flatten().collect();
        let support_vectors = Array2::from_shape_vec((n_vectors, n_features), flat)
            .map_err(|e| PipelineError::Artifact(format!("Failed to shape support vectors: {}", e)))?;

        let gamma = match (artifact.kernel, artifact.gamma) {
            (Kernel::Linear, _) => 0.0,
            (_, Some(gamma)) if gamma.is_finite() => gamma,
            (kernel, Some(gamma)) => {
                return Err(PipelineError::Artifact(format!(
                    "SVM kernel {} has a non-finite gamma ({})",
                    kernel.name(),
                    gamma
                )))
            }
            (kernel, None) => {
                return Err(PipelineError::Artifact(format!(
                    "SVM kernel {} requires gamma",
                    kernel.name()
                )))
            }
        };

        Ok(Self {
            kernel: artifact.kernel,
            gamma,
            coef0: artifact.coef0,
            degree: artifact.degree,
            support_vectors,
            dual_coef: Array1::from(artifact.dual_coef),
            intercept: artifact.intercept,
        })
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors.nrows()
    }

    fn kernel_value(&self, sv: ArrayView1<'_, f32>, x: ArrayView1<'_, f32>) -> f32 {
        match self.kernel {
            Kernel::Linear => sv.dot(&x),
            Kernel::Rbf => {
                let dist: f32 = sv.iter().zip(x.iter()).map(|(a, b)| (a - b) * (a - b)).sum();
                (-self.gamma * dist).exp()
            }
            Kernel::Poly => (self.gamma * sv.dot(&x) + self.coef0).powi(self.degree),
            Kernel::Sigmoid => (self.gamma * sv.dot(&x) + self.coef0).tanh(),
        }
    }

    /// Signed distance of `features` from the separating surface.
    pub fn decision_function(&self, features: ArrayView1<'_, f32>) -> Result<f32, PipelineError> {
        if features.len() != self.n_features() {
            return Err(PipelineError::ShapeMismatch(format!(
                "SVM expects {} features, got {}",
                self.n_features(),
                features.len()
            )));
        }

        let decision = self
            .support_vectors
            .outer_iter()
            .zip(self.dual_coef.iter())
            .map(|(sv, coef)| coef * self.kernel_value(sv, features))
            .sum::<f32>()
            + self.intercept;

        if !decision.is_finite() {
            return Err(PipelineError::ModelInference(format!(
                "SVM decision value is not finite ({})",
                decision
            )));
        }
        Ok(decision)
    }
}

impl ClassifierModel for SvmModel {
    fn predict(&self, features: ArrayView1<'_, f32>) -> Result<usize, PipelineError> {
        let decision = self.decision_function(features)?;
        log::debug!("SVM decision value: {}", decision);
        Ok(if decision >= 0.0 { 1 } else { 0 })
    }

    fn n_features(&self) -> usize {
        self.support_vectors.ncols()
    }

    fn n_classes(&self) -> Option<usize> {
        Some(2)
    }

    fn kind(&self) -> &'static str {
        "svm"
    }
}
