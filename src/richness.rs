//! Data-richness scoring for activity records
//!
//! Scores how much auxiliary data a record carries so that, among a set of
//! duplicates, the richest record can be chosen as canonical. Weighted
//! presence only: missing fields contribute 0, the score never errors and
//! adding a signal never lowers it.

use crate::models::Activity;

/// Weight for a present heart rate signal (stream or average)
const WEIGHT_HEART_RATE: f64 = 0.40;
/// Weight for a GPS track
const WEIGHT_GPS: f64 = 0.20;
/// Weight for power-meter data
const WEIGHT_POWER: f64 = 0.20;
/// Weight for per-second resolution data
const WEIGHT_PER_SECOND: f64 = 0.10;
/// Weight for device metadata
const WEIGHT_DEVICE: f64 = 0.10;
/// Bonus for non-zero calorie data
const BONUS_CALORIES: f64 = 0.05;
/// Bonus for non-zero elevation gain
const BONUS_ELEVATION: f64 = 0.05;

/// Scores an activity's data completeness in [0.0, 1.0]
pub struct RichnessScorer;

impl RichnessScorer {
    /// Additive weighted-presence score, capped at 1.0
    pub fn score(activity: &Activity) -> f64 {
        let mut score = 0.0;

        if activity.has_heart_rate() {
            score += WEIGHT_HEART_RATE;
        }
        if activity.has_gps {
            score += WEIGHT_GPS;
        }
        if activity.has_power {
            score += WEIGHT_POWER;
        }
        if activity.per_second_data {
            score += WEIGHT_PER_SECOND;
        }
        if activity
            .device_name
            .as_ref()
            .is_some_and(|name| !name.trim().is_empty())
        {
            score += WEIGHT_DEVICE;
        }
        if activity.calories.is_some_and(|c| c > 0) {
            score += BONUS_CALORIES;
        }
        if activity.elevation_gain.is_some_and(|e| e > 0) {
            score += BONUS_ELEVATION;
        }

        score.min(1.0)
    }
}
