//! Training-load computation from heterogeneous activity data
//!
//! A single activity may carry anything from a full per-second heart rate
//! stream down to nothing but a type and a duration. Load is computed by the
//! first applicable method in a strict priority chain, never blended, and
//! every result names its method and a fixed confidence so callers can weight
//! scores that are not cross-scale comparable. Applied defaults and clamps
//! are reported in the breakdown rather than corrected invisibly.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::models::{Activity, ActivityType, Gender, Intensity, UserProfile};

/// Banister TRIMP base coefficient
const TRIMP_BASE: f64 = 0.64;
/// Exponential gender factor for male/unspecified athletes
const GENDER_FACTOR_MALE: f64 = 1.92;
/// Exponential gender factor for female athletes
const GENDER_FACTOR_FEMALE: f64 = 1.67;
/// Upper clamp for heart-rate-reserve fraction; tolerates readings above
/// the estimated maximum
const HRR_CLAMP_MAX: f64 = 1.2;
/// Linear intensity multipliers for zones 1-5
const ZONE_MULTIPLIERS: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];
/// Scaling applied to the MET fallback so it sits conservatively against
/// physiology-backed methods
const MET_SCALE: f64 = 0.8;
/// Default resting heart rate when the profile omits one
const DEFAULT_REST_HR: f64 = 60.0;
/// Default age for max heart rate estimation when the profile omits one
const DEFAULT_AGE: f64 = 30.0;

/// Method used to compute a load score, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadMethod {
    HeartRateImpulse,
    ZoneBased,
    SubjectiveExertionDuration,
    MetabolicEquivalent,
}

impl LoadMethod {
    /// Declared reliability signal per method; fixed, not a probability
    pub fn confidence(&self) -> f64 {
        match self {
            LoadMethod::HeartRateImpulse => 0.95,
            LoadMethod::ZoneBased => 0.85,
            LoadMethod::SubjectiveExertionDuration => 0.75,
            LoadMethod::MetabolicEquivalent => 0.65,
        }
    }
}

impl std::fmt::Display for LoadMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LoadMethod::HeartRateImpulse => "heart_rate_impulse",
            LoadMethod::ZoneBased => "zone_based",
            LoadMethod::SubjectiveExertionDuration => "subjective_exertion_duration",
            LoadMethod::MetabolicEquivalent => "metabolic_equivalent",
        };
        write!(f, "{}", s)
    }
}

/// Method-specific intermediates and every default or clamp that was applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LoadBreakdown {
    /// Session duration in minutes, used by every method
    pub duration_minutes: f64,

    /// Maximum heart rate used (measured or estimated)
    pub max_heart_rate: Option<f64>,
    /// True when max heart rate was estimated from age and gender
    pub max_heart_rate_estimated: bool,
    /// True when the estimation fell back to the default age
    pub age_defaulted: bool,
    /// Resting heart rate used
    pub rest_heart_rate: Option<f64>,
    /// True when resting heart rate fell back to the default
    pub rest_heart_rate_defaulted: bool,
    /// Gender factor applied in the impulse exponent
    pub gender_factor: Option<f64>,
    /// Heart-rate-reserve fraction for the average-based path
    pub heart_rate_reserve: Option<f64>,
    /// Number of per-second samples folded, when a stream was used
    pub samples_used: Option<usize>,
    /// Number of samples (or the single average) clamped into [0, 1.2]
    pub clamped_readings: usize,

    /// Total zone minutes counted by the zone method
    pub zone_minutes_total: Option<f64>,

    /// RPE value used after clamping
    pub rpe_used: Option<f64>,
    /// True when the supplied RPE was outside 1-10
    pub rpe_clamped: bool,

    /// MET value for the activity type
    pub met_value: Option<f64>,
    /// Intensity multiplier applied to the MET value
    pub intensity_multiplier: Option<f64>,
}

/// Computed training load for one activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResult {
    /// Non-negative score on the method's own scale
    pub score: f64,

    /// Method that produced the score
    pub method: LoadMethod,

    /// Fixed confidence for the method
    pub confidence: f64,

    /// Intermediates for auditing and tests
    pub breakdown: LoadBreakdown,
}

/// Per-activity outcome of a batch load computation
#[derive(Debug)]
pub struct ActivityLoad {
    pub activity_id: String,
    pub outcome: Result<LoadResult>,
}

/// Core load calculation engine
pub struct LoadCalculator;

impl LoadCalculator {
    /// Ordered (predicate, method) dispatch table; the first applicable
    /// method wins and methods are never blended.
    fn method_chain() -> [(fn(&Activity) -> bool, LoadMethod); 4] {
        [
            (
                // Requires usable data, not just the stream-present flag
                |a| {
                    a.avg_heart_rate.is_some()
                        || a.hr_samples.as_ref().is_some_and(|s| !s.is_empty())
                },
                LoadMethod::HeartRateImpulse,
            ),
            (
                |a| a.zone_minutes.is_some_and(|z| z.total() > 0.0),
                LoadMethod::ZoneBased,
            ),
            (
                |a| a.subjective_exertion.is_some(),
                LoadMethod::SubjectiveExertionDuration,
            ),
            (|_| true, LoadMethod::MetabolicEquivalent),
        ]
    }

    /// Compute training load for an activity using the best available method
    pub fn compute_load(activity: &Activity, profile: &UserProfile) -> Result<LoadResult> {
        if activity.duration_seconds == 0 {
            return Err(EngineError::InsufficientData(format!(
                "activity {} has no usable duration",
                activity.id
            )));
        }

        let method = Self::method_chain()
            .into_iter()
            .find(|(applicable, _)| applicable(activity))
            .map(|(_, method)| method)
            .expect("the MET fallback is always applicable");

        debug!(activity = %activity.id, %method, "selected load method");

        let result = match method {
            LoadMethod::HeartRateImpulse => Self::heart_rate_impulse(activity, profile)?,
            LoadMethod::ZoneBased => Self::zone_based(activity),
            LoadMethod::SubjectiveExertionDuration => Self::exertion_duration(activity),
            LoadMethod::MetabolicEquivalent => Self::metabolic_equivalent(activity),
        };

        Ok(result)
    }

    /// Batch load computation, one activity per rayon work unit
    ///
    /// A failed activity is reported in its slot; it never aborts the batch.
    pub fn compute_loads(activities: &[Activity], profile: &UserProfile) -> Vec<ActivityLoad> {
        activities
            .par_iter()
            .map(|activity| ActivityLoad {
                activity_id: activity.id.clone(),
                outcome: Self::compute_load(activity, profile),
            })
            .collect()
    }

    /// Banister-style heart rate impulse
    ///
    /// `load = duration_min x 0.64 x e^(k x hrr)` with the reserve fraction
    /// clamped into [0, 1.2]. When a per-second stream is present the same
    /// formula is folded per sample at 1/60 minute each.
    fn heart_rate_impulse(activity: &Activity, profile: &UserProfile) -> Result<LoadResult> {
        let mut breakdown = LoadBreakdown {
            duration_minutes: activity.duration_minutes(),
            ..LoadBreakdown::default()
        };

        let rest_hr = match profile.rest_heart_rate {
            Some(hr) => f64::from(hr),
            None => {
                breakdown.rest_heart_rate_defaulted = true;
                DEFAULT_REST_HR
            }
        };
        let max_hr = match profile.max_heart_rate {
            Some(hr) => f64::from(hr),
            None => {
                breakdown.max_heart_rate_estimated = true;
                let age = match profile.age {
                    Some(age) => f64::from(age),
                    None => {
                        breakdown.age_defaulted = true;
                        DEFAULT_AGE
                    }
                };
                match profile.gender {
                    Gender::Female => 206.0 - 0.88 * age,
                    Gender::Male | Gender::Unspecified => 220.0 - age,
                }
            }
        };

        if max_hr <= rest_hr {
            return Err(EngineError::Calculation(format!(
                "max heart rate {max_hr} must exceed resting heart rate {rest_hr}"
            )));
        }

        let gender_factor = match profile.gender {
            Gender::Female => GENDER_FACTOR_FEMALE,
            Gender::Male | Gender::Unspecified => GENDER_FACTOR_MALE,
        };

        breakdown.max_heart_rate = Some(max_hr);
        breakdown.rest_heart_rate = Some(rest_hr);
        breakdown.gender_factor = Some(gender_factor);

        let reserve = max_hr - rest_hr;
        let mut clamped = 0usize;
        let mut hrr_of = |hr: f64| -> f64 {
            let raw = (hr - rest_hr) / reserve;
            let bounded = raw.clamp(0.0, HRR_CLAMP_MAX);
            if bounded != raw {
                clamped += 1;
            }
            bounded
        };

        let score = match activity.hr_samples.as_ref().filter(|s| !s.is_empty()) {
            Some(samples) => {
                // Per-sample fold, one second of credit per sample
                let sum: f64 = samples
                    .iter()
                    .map(|&hr| {
                        let hrr = hrr_of(f64::from(hr));
                        (1.0 / 60.0) * TRIMP_BASE * (gender_factor * hrr).exp()
                    })
                    .sum();
                breakdown.samples_used = Some(samples.len());
                sum
            }
            None => {
                let avg = activity.avg_heart_rate.ok_or_else(|| {
                    EngineError::InsufficientData(format!(
                        "activity {} has no heart rate signal",
                        activity.id
                    ))
                })?;
                let hrr = hrr_of(f64::from(avg));
                breakdown.heart_rate_reserve = Some(hrr);
                activity.duration_minutes() * TRIMP_BASE * (gender_factor * hrr).exp()
            }
        };
        breakdown.clamped_readings = clamped;

        Ok(LoadResult {
            score,
            method: LoadMethod::HeartRateImpulse,
            confidence: LoadMethod::HeartRateImpulse.confidence(),
            breakdown,
        })
    }

    /// Linear time-in-zone proxy: one minute in zone n contributes load n
    fn zone_based(activity: &Activity) -> LoadResult {
        let zones = activity.zone_minutes.unwrap_or_default();
        let minutes = [zones.zone1, zones.zone2, zones.zone3, zones.zone4, zones.zone5];

        let score: f64 = minutes
            .iter()
            .zip(ZONE_MULTIPLIERS.iter())
            .filter(|(m, _)| m.is_finite() && **m > 0.0)
            .map(|(m, mult)| m * mult)
            .sum();

        LoadResult {
            score,
            method: LoadMethod::ZoneBased,
            confidence: LoadMethod::ZoneBased.confidence(),
            breakdown: LoadBreakdown {
                duration_minutes: activity.duration_minutes(),
                zone_minutes_total: Some(zones.total()),
                ..LoadBreakdown::default()
            },
        }
    }

    /// Session RPE: clamped perceived exertion times duration
    fn exertion_duration(activity: &Activity) -> LoadResult {
        let raw = activity
            .subjective_exertion
            .expect("dispatch predicate guarantees RPE presence");
        let rpe = f64::from(raw).clamp(1.0, 10.0);

        LoadResult {
            score: rpe * activity.duration_minutes(),
            method: LoadMethod::SubjectiveExertionDuration,
            confidence: LoadMethod::SubjectiveExertionDuration.confidence(),
            breakdown: LoadBreakdown {
                duration_minutes: activity.duration_minutes(),
                rpe_used: Some(rpe),
                rpe_clamped: f64::from(raw) != rpe,
                ..LoadBreakdown::default()
            },
        }
    }

    /// MET table fallback when only type and duration are known
    fn metabolic_equivalent(activity: &Activity) -> LoadResult {
        let met = Self::met_value(activity.activity_type);
        let multiplier = Self::intensity_multiplier(activity.intensity);
        let score = met * multiplier * activity.duration_minutes() * MET_SCALE;

        LoadResult {
            score,
            method: LoadMethod::MetabolicEquivalent,
            confidence: LoadMethod::MetabolicEquivalent.confidence(),
            breakdown: LoadBreakdown {
                duration_minutes: activity.duration_minutes(),
                met_value: Some(met),
                intensity_multiplier: Some(multiplier),
                ..LoadBreakdown::default()
            },
        }
    }

    /// Fixed MET reference values per activity type at moderate intensity
    fn met_value(activity_type: ActivityType) -> f64 {
        match activity_type {
            ActivityType::Run => 10.0,
            ActivityType::Ride => 8.0,
            ActivityType::Swim => 12.0,
            ActivityType::Strength => 6.0,
            ActivityType::Soccer => 7.0,
            ActivityType::Recovery => 2.5,
            ActivityType::Other => 4.0,
        }
    }

    fn intensity_multiplier(intensity: Intensity) -> f64 {
        match intensity {
            Intensity::Low => 0.75,
            Intensity::Moderate => 1.0,
            Intensity::High => 1.3,
        }
    }
}
