use ndarray::Array1;
use serde::Deserialize;

use super::error::PipelineError;
use super::features::FeatureRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    /// offset = fitted mean, scale = fitted standard deviation
    Standard,
    /// offset = fitted minimum, scale = fitted data range
    MinMax,
}

#[derive(Debug, Deserialize)]
struct ScalerArtifact {
    kind: ScalerKind,
    #[serde(alias = "mean", alias = "data_min")]
    offset: Vec<f32>,
    #[serde(alias = "std", alias = "data_range")]
    scale: Vec<f32>,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
}

/// A per-feature linear normalization fitted at training time.
///
/// Each feature is transformed as `(x - offset) / scale`. Parameters are
/// validated on every construction path, deserialization included.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ScalerArtifact")]
pub struct FittedScaler {
    kind: ScalerKind,
    offset: Vec<f32>,
    scale: Vec<f32>,
    feature_names: Option<Vec<String>>,
}

impl TryFrom<ScalerArtifact> for FittedScaler {
    type Error = PipelineError;

    fn try_from(artifact: ScalerArtifact) -> Result<Self, Self::Error> {
        Self {
            kind: artifact.kind,
            offset: artifact.offset,
            scale: artifact.scale,
            feature_names: artifact.feature_names,
        }
        .finish()
    }
}

impl FittedScaler {
    pub fn new(kind: ScalerKind, offset: Vec<f32>, scale: Vec<f32>) -> Result<Self, PipelineError> {
        Self {
            kind,
            offset,
            scale,
            feature_names: None,
        }
        .finish()
    }

    /// Records the column names the scaler was fitted on.
    pub fn with_feature_names(mut self, names: Vec<impl Into<String>>) -> Self {
        self.feature_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Validates the parameters and replaces zero scales with 1.0.
    fn finish(mut self) -> Result<Self, PipelineError> {
        if self.offset.is_empty() {
            return Err(PipelineError::Artifact("Scaler has no features".into()));
        }
        if self.offset.len() != self.scale.len() {
            return Err(PipelineError::Artifact(format!(
                "Scaler offset has {} values but scale has {}",
                self.offset.len(),
                self.scale.len()
            )));
        }
        if self.offset.iter().chain(self.scale.iter()).any(|v| !v.is_finite()) {
            return Err(PipelineError::Artifact("Scaler parameters must be finite".into()));
        }
        for s in self.scale.iter_mut() {
            if *s == 0.0 {
                *s = 1.0;
            }
        }
        Ok(self)
    }

    pub fn kind(&self) -> ScalerKind {
        self.kind
    }

    pub fn n_features(&self) -> usize {
        self.offset.len()
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Checks that the scaler was fitted on `expected` columns in the same order.
    ///
    /// Scalers without recorded feature names are only checked for width.
    ///
    /// # Errors
    /// - `ShapeMismatch` on a width difference or the first column out of place
    pub fn check_schema(&self, expected: &[&str]) -> Result<(), PipelineError> {
        if self.n_features() != expected.len() {
            return Err(PipelineError::ShapeMismatch(format!(
                "Scaler was fitted on {} features, pipeline produces {}",
                self.n_features(),
                expected.len()
            )));
        }
        if let Some(names) = &self.feature_names {
            if names.len() != expected.len() {
                return Err(PipelineError::ShapeMismatch(format!(
                    "Scaler lists {} feature names, pipeline produces {}",
                    names.len(),
                    expected.len()
                )));
            }
            if let Some((i, (fitted, ours))) = names
                .iter()
                .zip(expected.iter())
                .enumerate()
                .find(|(_, (fitted, ours))| fitted.as_str() != **ours)
            {
                return Err(PipelineError::ShapeMismatch(format!(
                    "Feature {} is '{}' in the scaler but '{}' in the pipeline",
                    i, fitted, ours
                )));
            }
        }
        Ok(())
    }

    /// Scales a feature record.
    ///
    /// # Errors
    /// - `ShapeMismatch` if the record length differs from the fitted width
    pub fn transform(&self, record: &FeatureRecord) -> Result<Array1<f32>, PipelineError> {
        if record.len() != self.n_features() {
            return Err(PipelineError::ShapeMismatch(format!(
                "Expected {} features, got {}",
                self.n_features(),
                record.len()
            )));
        }

        let scaled: Array1<f32> = record
            .view()
            .iter()
            .zip(self.offset.iter().zip(self.scale.iter()))
            .map(|(x, (offset, scale))| (x - offset) / scale)
            .collect();
        log::debug!("Scaled features: {:?}", scaled);
        Ok(scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(values: Vec<f32>) -> FeatureRecord {
        FeatureRecord::from_values(Array1::from(values))
    }

    #[test]
    fn test_standard_scaling() {
        let scaler = FittedScaler::new(ScalerKind::Standard, vec![1.0, 10.0], vec![2.0, 5.0]).unwrap();
        let scaled = scaler.transform(&record(vec![3.0, 0.0])).unwrap();
        assert_eq!(scaled.to_vec(), vec![1.0, -2.0]);
    }

    #[test]
    fn test_min_max_json_aliases() {
        let json = r#"{"kind": "min_max", "data_min": [0.0, 2.0], "data_range": [10.0, 4.0]}"#;
        let scaler: FittedScaler = serde_json::from_str(json).unwrap();
        assert_eq!(scaler.kind(), ScalerKind::MinMax);
        let scaled = scaler.transform(&record(vec![5.0, 6.0])).unwrap();
        assert_eq!(scaled.to_vec(), vec![0.5, 1.0]);
    }

    #[test]
    fn test_zero_scale_passes_through_centered() {
        let scaler = FittedScaler::new(ScalerKind::Standard, vec![4.0], vec![0.0]).unwrap();
        let scaled = scaler.transform(&record(vec![6.0])).unwrap();
        assert_eq!(scaled.to_vec(), vec![2.0]);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(FittedScaler::new(ScalerKind::Standard, vec![1.0, 2.0], vec![1.0]).is_err());
        assert!(FittedScaler::new(ScalerKind::Standard, vec![f32::NAN], vec![1.0]).is_err());
        assert!(FittedScaler::new(ScalerKind::Standard, vec![], vec![]).is_err());
    }

    #[test]
    fn test_deserialization_validates() {
        let mismatched = r#"{"kind": "standard", "mean": [0.0, 1.0], "std": [1.0]}"#;
        assert!(serde_json::from_str::<FittedScaler>(mismatched).is_err());

        let empty = r#"{"kind": "standard", "mean": [], "std": []}"#;
        assert!(serde_json::from_str::<FittedScaler>(empty).is_err());

        // Zero scales are fixed up before the scaler reaches the builder
        let constant = r#"{"kind": "standard", "mean": [4.0], "std": [0.0]}"#;
        let scaler: FittedScaler = serde_json::from_str(constant).unwrap();
        let scaled = scaler.transform(&record(vec![6.0])).unwrap();
        assert_eq!(scaled.to_vec(), vec![2.0]);
    }

    #[test]
    fn test_length_mismatch() {
        let scaler = FittedScaler::new(ScalerKind::Standard, vec![0.0; 3], vec![1.0; 3]).unwrap();
        let err = scaler.transform(&record(vec![1.0, 2.0])).unwrap_err();
        assert!(matches!(err, PipelineError::ShapeMismatch(_)));
    }

    #[test]
    fn test_schema_order_checked() {
        let scaler = FittedScaler::new(ScalerKind::Standard, vec![0.0; 2], vec![1.0; 2])
            .unwrap()
            .with_feature_names(vec!["b", "a"]);
        assert!(scaler.check_schema(&["b", "a"]).is_ok());
        let err = scaler.check_schema(&["a", "b"]).unwrap_err();
        assert!(err.to_string().contains("Feature 0"));
        assert!(scaler.check_schema(&["a"]).is_err());
    }
}
