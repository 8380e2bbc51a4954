use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Activity types supported by the deduplication and load engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Run,
    Ride,
    Swim,
    Strength,
    Soccer,
    Recovery,
    Other,
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActivityType::Run => "run",
            ActivityType::Ride => "ride",
            ActivityType::Swim => "swim",
            ActivityType::Strength => "strength",
            ActivityType::Soccer => "soccer",
            ActivityType::Recovery => "recovery",
            ActivityType::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Provenance of an activity record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySource {
    /// Entered by the user directly
    Manual,
    /// Imported from an external fitness service, tagged with the service name
    Imported(String),
}

impl ActivitySource {
    pub fn is_manual(&self) -> bool {
        matches!(self, ActivitySource::Manual)
    }

    /// Stable key used in source sets and merge history
    pub fn key(&self) -> String {
        match self {
            ActivitySource::Manual => "manual".to_string(),
            ActivitySource::Imported(service) => service.clone(),
        }
    }
}

/// Session intensity tag used by the MET fallback when no physiological data exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Low,
    #[default]
    Moderate,
    High,
}

/// Minutes spent in each of the five training zones
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ZoneMinutes {
    pub zone1: f64,
    pub zone2: f64,
    pub zone3: f64,
    pub zone4: f64,
    pub zone5: f64,
}

impl ZoneMinutes {
    /// Total minutes across all zones; non-finite or negative entries count as 0
    pub fn total(&self) -> f64 {
        [self.zone1, self.zone2, self.zone3, self.zone4, self.zone5]
            .iter()
            .filter(|m| m.is_finite() && **m > 0.0)
            .sum()
    }
}

/// Per-source provenance entry accumulated during merges
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// External identifier scoped to the source service
    pub external_id: Option<String>,

    /// Richness score of the record that contributed this source
    pub richness: f64,
}

/// One merge event in an activity's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeEvent {
    /// Source key of the record merged in
    pub source: String,

    /// External identifier of the merged record, if any
    pub external_id: Option<String>,

    /// When the merge was performed
    pub merged_at: DateTime<Utc>,
}

/// Core activity record, the engine's immutable input
///
/// Optional fields model data that a given source may or may not supply;
/// "is this signal present" is a defined check, never a property probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Unique identifier for the activity record
    pub id: String,

    /// Owning user; matching and hashing are scoped to this
    pub user_id: String,

    /// Session start time (UTC)
    pub start_time: DateTime<Utc>,

    /// Session duration in seconds
    pub duration_seconds: u32,

    /// Sport/activity tag
    pub activity_type: ActivityType,

    /// Where this record came from
    pub source: ActivitySource,

    /// Identifier assigned by the source service
    pub source_external_id: Option<String>,

    /// When the record was created in our system
    pub created_at: DateTime<Utc>,

    /// True if a beat-by-beat heart rate stream accompanies the record
    pub has_heart_rate_stream: bool,

    /// Session-average heart rate in bpm
    pub avg_heart_rate: Option<u16>,

    /// Per-second heart rate samples, when the source supplies them
    pub hr_samples: Option<Vec<u16>>,

    /// GPS track present
    pub has_gps: bool,

    /// Power-meter data present
    pub has_power: bool,

    /// Record carries per-second resolution data
    pub per_second_data: bool,

    /// Recording device name
    pub device_name: Option<String>,

    /// Calories burned (estimated by the source)
    pub calories: Option<u16>,

    /// Elevation gain in meters
    pub elevation_gain: Option<u16>,

    /// Minutes per training zone, when the source provides a breakdown
    pub zone_minutes: Option<ZoneMinutes>,

    /// User-authored notes; must survive any merge
    pub notes: Option<String>,

    /// Rate of perceived exertion (1-10), user-authored; must survive any merge
    pub subjective_exertion: Option<u8>,

    /// Intensity tag used by the MET fallback
    pub intensity: Intensity,

    /// Source chosen as canonical by the last merge, if any
    pub canonical_source: Option<ActivitySource>,

    /// Every source that has contributed to this record, keyed by source name
    pub source_set: BTreeMap<String, SourceRecord>,

    /// Ordered history of merge events applied to this record
    pub merge_history: Vec<MergeEvent>,
}

impl Activity {
    /// Duration expressed in fractional minutes
    pub fn duration_minutes(&self) -> f64 {
        f64::from(self.duration_seconds) / 60.0
    }

    /// True when any heart rate signal (stream, samples or average) is present
    pub fn has_heart_rate(&self) -> bool {
        self.has_heart_rate_stream
            || self.avg_heart_rate.is_some()
            || self.hr_samples.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Calendar date of the session start (UTC)
    pub fn date(&self) -> NaiveDate {
        self.start_time.date_naive()
    }
}

/// Gender, used only to select heart-rate formula constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unspecified,
}

/// Self-reported fitness level; affects normalization thresholds only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FitnessLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

/// Read-only physiological profile supplied alongside each load calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserProfile {
    /// Measured maximum heart rate; estimated from age and gender when absent
    pub max_heart_rate: Option<u16>,

    /// Resting heart rate; defaults to 60 when absent
    pub rest_heart_rate: Option<u16>,

    /// Age in years, used for max heart rate estimation
    pub age: Option<u16>,

    pub gender: Gender,

    pub fitness_level: FitnessLevel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_activity() -> Activity {
        Activity {
            id: "a1".to_string(),
            user_id: "user-42".to_string(),
            start_time: Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap(),
            duration_seconds: 3600,
            activity_type: ActivityType::Run,
            source: ActivitySource::Manual,
            source_external_id: None,
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 11, 0, 0).unwrap(),
            has_heart_rate_stream: false,
            avg_heart_rate: None,
            hr_samples: None,
            has_gps: false,
            has_power: false,
            per_second_data: false,
            device_name: None,
            calories: None,
            elevation_gain: None,
            zone_minutes: None,
            notes: None,
            subjective_exertion: None,
            intensity: Intensity::Moderate,
            canonical_source: None,
            source_set: BTreeMap::new(),
            merge_history: Vec::new(),
        }
    }

    #[test]
    fn duration_minutes_is_fractional() {
        let mut activity = base_activity();
        activity.duration_seconds = 90;
        assert!((activity.duration_minutes() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn heart_rate_presence_covers_all_signals() {
        let activity = base_activity();
        assert!(!activity.has_heart_rate());

        let mut averaged = base_activity();
        averaged.avg_heart_rate = Some(150);
        assert!(averaged.has_heart_rate());

        let mut streamed = base_activity();
        streamed.hr_samples = Some(vec![140, 142]);
        assert!(streamed.has_heart_rate());

        let mut empty_samples = base_activity();
        empty_samples.hr_samples = Some(Vec::new());
        assert!(!empty_samples.has_heart_rate());
    }

    #[test]
    fn zone_minutes_total_ignores_invalid_entries() {
        let zones = ZoneMinutes {
            zone1: 10.0,
            zone2: -5.0,
            zone3: f64::NAN,
            zone4: 4.0,
            zone5: 0.0,
        };
        assert!((zones.total() - 14.0).abs() < f64::EPSILON);
    }

    #[test]
    fn activity_survives_serde_round_trip() {
        let mut activity = base_activity();
        activity.source = ActivitySource::Imported("service-a".to_string());
        activity.avg_heart_rate = Some(151);
        activity.notes = Some("tempo intervals".to_string());
        activity.source_set.insert(
            "service-a".to_string(),
            SourceRecord {
                external_id: Some("ext-1".to_string()),
                richness: 0.4,
            },
        );

        let json = serde_json::to_string(&activity).unwrap();
        let parsed: Activity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, activity);
    }

    #[test]
    fn source_key_is_stable() {
        assert_eq!(ActivitySource::Manual.key(), "manual");
        assert_eq!(
            ActivitySource::Imported("service-a".to_string()).key(),
            "service-a"
        );
        assert!(ActivitySource::Manual.is_manual());
    }
}
