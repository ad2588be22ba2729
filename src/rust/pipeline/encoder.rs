use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Deserialize;

use super::error::PipelineError;

/// A fitted mapping between category names and integer codes.
///
/// The code of a class is its position in `classes`, which is the order the
/// encoder was fitted with (sorted).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "EncoderArtifact")]
pub struct LabelEncoder {
    classes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EncoderArtifact {
    classes: Vec<String>,
}

impl TryFrom<EncoderArtifact> for LabelEncoder {
    type Error = PipelineError;

    fn try_from(artifact: EncoderArtifact) -> Result<Self, Self::Error> {
        Self::new(artifact.classes)
    }
}

impl LabelEncoder {
    pub fn new(classes: Vec<impl Into<String>>) -> Result<Self, PipelineError> {
        let encoder = Self {
            classes: classes.into_iter().map(Into::into).collect(),
        };
        encoder.validate()?;
        Ok(encoder)
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.classes.is_empty() {
            return Err(PipelineError::Artifact("Label encoder has no classes".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.classes.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(PipelineError::Artifact(format!("Label encoder lists '{}' twice", dup)));
        }
        Ok(())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Returns the code of `value`, or `None` if it was never seen during fitting.
    pub fn transform(&self, value: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == value)
    }

    /// Returns the class name for `code`, or `None` if it is out of range.
    pub fn inverse_transform(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }
}

/// The categorical questions that need an encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoricalField {
    StageFear,
    DrainedAfterSocializing,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 2] = [Self::StageFear, Self::DrainedAfterSocializing];

    /// Column name the encoder was fitted under.
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::StageFear => "Stage_fear",
            Self::DrainedAfterSocializing => "Drained_after_socializing",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// One fitted encoder per categorical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoricalEncoders {
    stage_fear: LabelEncoder,
    drained_after_socializing: LabelEncoder,
}

impl CategoricalEncoders {
    pub fn new(stage_fear: LabelEncoder, drained_after_socializing: LabelEncoder) -> Self {
        Self {
            stage_fear,
            drained_after_socializing,
        }
    }

    /// Builds the fixed mapping from encoders keyed by column name.
    ///
    /// Every field in `CategoricalField::ALL` must be present. Extra columns are
    /// ignored with a warning.
    pub fn from_columns(mut columns: HashMap<String, LabelEncoder>) -> Result<Self, PipelineError> {
        let mut take = |field: CategoricalField| {
            columns.remove(field.column_name()).ok_or_else(|| {
                PipelineError::Artifact(format!("Label encoders are missing column '{}'", field))
            })
        };

        let stage_fear = take(CategoricalField::StageFear)?;
        let drained_after_socializing = take(CategoricalField::DrainedAfterSocializing)?;

        for extra in columns.keys() {
            log::warn!("Ignoring label encoder for unused column '{}'", extra);
        }

        Ok(Self::new(stage_fear, drained_after_socializing))
    }

    pub fn get(&self, field: CategoricalField) -> &LabelEncoder {
        match field {
            CategoricalField::StageFear => &self.stage_fear,
            CategoricalField::DrainedAfterSocializing => &self.drained_after_socializing,
        }
    }

    /// Encodes `value` for `field`.
    ///
    /// # Errors
    /// - `UnknownCategory` if the encoder for `field` never saw `value`
    pub fn encode(&self, field: CategoricalField, value: &str) -> Result<usize, PipelineError> {
        self.get(field)
            .transform(value)
            .ok_or_else(|| PipelineError::UnknownCategory {
                field: field.column_name().to_string(),
                value: value.to_string(),
            })
    }
}
