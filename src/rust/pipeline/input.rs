use std::ops::RangeInclusive;

use super::error::PipelineError;

/// The answers the form offers for each categorical question, in display order.
pub const ANSWERS: [&str; 2] = ["Yes", "No"];

pub const TIME_ALONE_RANGE: RangeInclusive<u32> = 0..=10;
pub const SOCIAL_EVENTS_RANGE: RangeInclusive<u32> = 0..=10;
pub const FRIENDS_SIZE_RANGE: RangeInclusive<u32> = 0..=20;
pub const POST_FREQ_RANGE: RangeInclusive<u32> = 0..=10;
pub const GOING_OUTSIDE_RANGE: RangeInclusive<u32> = 0..=7;

/// One set of answers to the behavioral questionnaire.
///
/// Numeric answers are bounded by the ranges above. Categorical answers are
/// kept as free strings: the fitted encoders decide whether a value is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput {
    /// Hours per day spent alone
    pub time_alone: u32,
    /// Social events attended per week
    pub social_events: u32,
    /// Size of the friends circle
    pub friends_size: u32,
    /// Social media posts per week
    pub post_freq: u32,
    /// Whether the person has stage fear
    pub stage_fear: String,
    /// Days per week spent going outside
    pub going_outside: u32,
    /// Whether socializing leaves the person drained
    pub drained_social: String,
}

impl Default for RawInput {
    fn default() -> Self {
        Self {
            time_alone: 3,
            social_events: 3,
            friends_size: 10,
            post_freq: 5,
            stage_fear: ANSWERS[0].to_string(),
            going_outside: 3,
            drained_social: ANSWERS[0].to_string(),
        }
    }
}

impl RawInput {
    /// Checks every numeric answer against its allowed range.
    ///
    /// # Errors
    /// - `Validation` naming the first field that is out of range
    pub fn validate(&self) -> Result<(), PipelineError> {
        let checks = [
            ("time_alone", self.time_alone, TIME_ALONE_RANGE),
            ("social_events", self.social_events, SOCIAL_EVENTS_RANGE),
            ("friends_size", self.friends_size, FRIENDS_SIZE_RANGE),
            ("post_freq", self.post_freq, POST_FREQ_RANGE),
            ("going_outside", self.going_outside, GOING_OUTSIDE_RANGE),
        ];

        for (name, value, range) in checks {
            if !range.contains(&value) {
                return Err(PipelineError::Validation(format!(
                    "{} must be between {} and {}, got {}",
                    name,
                    range.start(),
                    range.end(),
                    value
                )));
            }
        }
        Ok(())
    }
}
