//! Vital-sign evaluation rules.
//!
//! Every rule is evaluated independently and reasons accumulate; nothing
//! short-circuits. The functions are deterministic and perform no I/O.

use crate::entities::health_record::{AbnormalityVerdict, HealthRecord};

/// Reason tag for a heart rate outside [60, 100] bpm
pub const ABNORMAL_HEART_RATE: &str = "Abnormal Heart Rate";

/// Reason tag for systolic > 140, diastolic > 90 or diastolic < 60
pub const ABNORMAL_BLOOD_PRESSURE: &str = "Abnormal Blood Pressure";

/// Reason tag for sleep outside [6, 9] hours
pub const ABNORMAL_SLEEP_DURATION: &str = "Abnormal Sleep Duration";

/// Reason tag for weight outside ±15% of the reference weight
pub const ABNORMAL_WEIGHT: &str = "Abnormal weight";

/// Default reference weight in kilograms for the weight rule
pub const DEFAULT_REFERENCE_WEIGHT_KG: f32 = 65.0;

/// Tunable parameters of the evaluator
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationConfig {
    /// Reference weight for the ±15% band; `None` disables the weight rule
    pub reference_weight_kg: Option<f32>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            reference_weight_kg: Some(DEFAULT_REFERENCE_WEIGHT_KG),
        }
    }
}

/// Evaluate a health record against the abnormality rules.
///
/// Rules only fire on measurements that are present; the blood pressure rule
/// needs both systolic and diastolic.
pub fn evaluate(record: &HealthRecord, config: &EvaluationConfig) -> AbnormalityVerdict {
    let mut reasons = Vec::new();

    if let Some(heart_rate) = record.heart_rate_bpm {
        if !(60..=100).contains(&heart_rate) {
            reasons.push(ABNORMAL_HEART_RATE.to_string());
        }
    }

    if let (Some(systolic), Some(diastolic)) = (record.systolic, record.diastolic) {
        if systolic > 140 || diastolic > 90 || diastolic < 60 {
            reasons.push(ABNORMAL_BLOOD_PRESSURE.to_string());
        }
    }

    if let Some(sleep) = record.sleep_hours {
        if !(6.0..=9.0).contains(&sleep) {
            reasons.push(ABNORMAL_SLEEP_DURATION.to_string());
        }
    }

    if let (Some(weight), Some(reference)) = (record.weight_kg, config.reference_weight_kg) {
        if weight < reference * 0.85 || weight > reference * 1.15 {
            reasons.push(ABNORMAL_WEIGHT.to_string());
        }
    }

    AbnormalityVerdict::from_reasons(reasons)
}

/// Wellness score on a 0-100 scale: 100 minus a fixed deduction per fired rule
pub fn wellness_score(verdict: &AbnormalityVerdict) -> u8 {
    let deductions: u32 = verdict
        .reasons
        .iter()
        .map(|tag| match tag.as_str() {
            ABNORMAL_HEART_RATE => 15,
            ABNORMAL_BLOOD_PRESSURE => 15,
            ABNORMAL_SLEEP_DURATION => 10,
            ABNORMAL_WEIGHT => 10,
            _ => 0,
        })
        .sum();

    100u32.saturating_sub(deductions) as u8
}

/// Body mass index from weight in kilograms and height in centimeters.
/// `None` when either input is non-positive.
pub fn bmi(weight_kg: f32, height_cm: f32) -> Option<f32> {
    if weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }
    let height_m = height_cm / 100.0;
    Some(weight_kg / (height_m * height_m))
}

/// BMI formatted to two decimal places, or the "-" sentinel when the inputs
/// are missing or invalid
pub fn format_bmi(weight_kg: Option<f32>, height_cm: Option<f32>) -> String {
    match (weight_kg, height_cm) {
        (Some(weight), Some(height)) => match bmi(weight, height) {
            Some(value) => format!("{:.2}", value),
            None => "-".to_string(),
        },
        _ => "-".to_string(),
    }
}
