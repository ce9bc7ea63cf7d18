use serde::{Deserialize, Serialize};

/// One day's vital-sign record for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Unique identifier, assigned by the store on creation
    pub id: i64,

    /// Owner of the record
    pub user_id: i64,

    /// Epoch milliseconds at which the record was last saved
    pub timestamp_millis: i64,

    /// Body weight in kilograms
    pub weight_kg: Option<f32>,

    /// Height in centimeters
    pub height_cm: Option<f32>,

    /// Heart rate in beats per minute
    pub heart_rate_bpm: Option<i32>,

    /// Systolic blood pressure (the higher number)
    pub systolic: Option<i32>,

    /// Diastolic blood pressure (the lower number)
    pub diastolic: Option<i32>,

    /// Hours slept the preceding night
    pub sleep_hours: Option<f32>,

    /// Whether the record has been run through the evaluator
    pub analyzed: bool,
}

/// Vitals captured from the daily entry flow.
///
/// Every measurement is optional; whatever is present is evaluated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyVitalsInput {
    /// Owner of the record
    pub user_id: i64,

    /// Body weight in kilograms
    pub weight_kg: Option<f32>,

    /// Height in centimeters
    pub height_cm: Option<f32>,

    /// Heart rate in beats per minute
    pub heart_rate_bpm: Option<i32>,

    /// Systolic blood pressure
    pub systolic: Option<i32>,

    /// Diastolic blood pressure
    pub diastolic: Option<i32>,

    /// Hours slept the preceding night
    pub sleep_hours: Option<f32>,
}

/// Abnormality result computed from one health record.
///
/// Transient: embedded into feedback at creation time, never persisted as its
/// own entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbnormalityVerdict {
    /// True when at least one rule fired
    pub is_abnormal: bool,

    /// Human-readable reason tags, in rule order
    pub reasons: Vec<String>,
}

impl AbnormalityVerdict {
    /// Build a verdict from the accumulated reason tags
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            is_abnormal: !reasons.is_empty(),
            reasons,
        }
    }

    /// Joined reason tags, in the form stored on feedback entries
    pub fn abnormal_type(&self) -> Option<String> {
        if self.reasons.is_empty() {
            None
        } else {
            Some(self.reasons.join(", "))
        }
    }
}

/// A stored record together with its evaluation outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedRecord {
    /// The persisted record
    pub record: HealthRecord,

    /// Abnormality verdict for the record
    pub verdict: AbnormalityVerdict,

    /// Wellness score on a 0-100 scale
    pub score: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_from_empty_reasons_is_normal() {
        let verdict = AbnormalityVerdict::from_reasons(Vec::new());
        assert!(!verdict.is_abnormal);
        assert_eq!(verdict.abnormal_type(), None);
    }

    #[test]
    fn test_abnormal_type_joins_tags_in_order() {
        let verdict = AbnormalityVerdict::from_reasons(vec![
            "Abnormal Heart Rate".to_string(),
            "Abnormal Sleep Duration".to_string(),
        ]);
        assert!(verdict.is_abnormal);
        assert_eq!(
            verdict.abnormal_type().as_deref(),
            Some("Abnormal Heart Rate, Abnormal Sleep Duration")
        );
    }
}
