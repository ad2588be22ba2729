use ndarray::{Array1, ArrayView1};

use super::encoder::{CategoricalEncoders, CategoricalField};
use super::error::PipelineError;
use super::input::RawInput;

/// Column order the scaler and classifier were fitted with.
///
/// Changing this order without refitting the artifacts silently corrupts
/// predictions; scalers that carry their fitted feature names are checked
/// against it.
pub const FEATURE_NAMES: [&str; NUM_FEATURES] = [
    "Time_spent_Alone",
    "Stage_fear",
    "Social_event_attendance",
    "Going_outside",
    "Drained_after_socializing",
    "Friends_circle_size",
    "Post_frequency",
];

pub const NUM_FEATURES: usize = 7;

/// A model-ready numeric vector in `FEATURE_NAMES` order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    values: Array1<f32>,
}

impl FeatureRecord {
    /// Assembles the feature vector for one questionnaire answer set.
    ///
    /// # Errors
    /// - `UnknownCategory` if either categorical answer is outside its encoder's classes
    pub fn assemble(input: &RawInput, encoders: &CategoricalEncoders) -> Result<Self, PipelineError> {
        let stage_fear = encoders.encode(CategoricalField::StageFear, &input.stage_fear)?;
        let drained = encoders.encode(CategoricalField::DrainedAfterSocializing, &input.drained_social)?;

        let values = Array1::from(vec![
            input.time_alone as f32,
            stage_fear as f32,
            input.social_events as f32,
            input.going_outside as f32,
            drained as f32,
            input.friends_size as f32,
            input.post_freq as f32,
        ]);
        log::debug!("Assembled features: {:?}", values);

        Ok(Self { values })
    }

    pub fn from_values(values: Array1<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn view(&self) -> ArrayView1<'_, f32> {
        self.values.view()
    }

    /// Value of the named feature, if it is part of the schema.
    pub fn get(&self, name: &str) -> Option<f32> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .and_then(|i| self.values.get(i).copied())
    }

    /// Pairs each schema name with its value.
    pub fn named(&self) -> Vec<(&'static str, f32)> {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encoder::LabelEncoder;

    fn encoders() -> CategoricalEncoders {
        CategoricalEncoders::new(
            LabelEncoder::new(vec!["No", "Yes"]).unwrap(),
            LabelEncoder::new(vec!["No", "Yes"]).unwrap(),
        )
    }

    #[test]
    fn test_assembly_follows_schema_order() {
        let input = RawInput {
            time_alone: 1,
            social_events: 2,
            friends_size: 3,
            post_freq: 4,
            stage_fear: "Yes".into(),
            going_outside: 5,
            drained_social: "No".into(),
        };
        let record = FeatureRecord::assemble(&input, &encoders()).unwrap();

        assert_eq!(record.len(), NUM_FEATURES);
        assert_eq!(
            record.named(),
            vec![
                ("Time_spent_Alone", 1.0),
                ("Stage_fear", 1.0),
                ("Social_event_attendance", 2.0),
                ("Going_outside", 5.0),
                ("Drained_after_socializing", 0.0),
                ("Friends_circle_size", 3.0),
                ("Post_frequency", 4.0),
            ]
        );
        assert_eq!(record.get("Friends_circle_size"), Some(3.0));
        assert_eq!(record.get("Age"), None);
    }

    #[test]
    fn test_unknown_category_fails_assembly() {
        let input = RawInput {
            stage_fear: "Sometimes".into(),
            ..RawInput::default()
        };
        let err = FeatureRecord::assemble(&input, &encoders()).unwrap_err();
        assert!(matches!(err, PipelineError::UnknownCategory { .. }));
    }
}
