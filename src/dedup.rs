//! Activity deduplication: fingerprinting, tolerance matching and merging
//!
//! Two independently ingested records (say a manual entry and a service
//! import) often describe the same real-world session. The fast path groups
//! records by a normalized fingerprint; a tolerance-based pairwise pass
//! catches near-duplicates whose durations round to different minute
//! buckets. Merging keeps the richest record as canonical and never drops
//! user-authored fields.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::models::{Activity, MergeEvent, SourceRecord};
use crate::richness::RichnessScorer;

/// Produces a normalized, rounded fingerprint used as a fast duplicate filter
pub struct DedupHasher;

impl DedupHasher {
    /// Deterministic fingerprint over the activity's identity fields
    ///
    /// Duration is rounded to the nearest whole minute so sub-minute jitter
    /// between sources lands in the same bucket.
    pub fn fingerprint(activity: &Activity) -> Result<String> {
        if activity.user_id.trim().is_empty() {
            return Err(EngineError::InvalidActivity {
                field: "user_id",
                reason: "must not be empty".to_string(),
            });
        }
        if activity.duration_seconds == 0 {
            return Err(EngineError::InvalidActivity {
                field: "duration_seconds",
                reason: "must be positive".to_string(),
            });
        }

        let duration_minutes = (activity.duration_seconds + 30) / 60;
        let key = format!(
            "{}|{}|{}|{}",
            activity.user_id,
            activity
                .start_time
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            duration_minutes,
            activity.activity_type,
        );

        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Tolerances applied when deciding whether two records describe one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchTolerances {
    /// Maximum start-time difference in seconds (inclusive)
    pub time_tolerance_seconds: i64,

    /// Maximum duration difference as a fraction of the longer duration (inclusive)
    pub duration_tolerance_ratio: f64,
}

impl Default for MatchTolerances {
    fn default() -> Self {
        MatchTolerances {
            time_tolerance_seconds: 6 * 60,
            duration_tolerance_ratio: 0.10,
        }
    }
}

/// Tolerance-based comparison beyond the fingerprint fast path
pub struct DuplicateMatcher {
    tolerances: MatchTolerances,
}

impl Default for DuplicateMatcher {
    fn default() -> Self {
        DuplicateMatcher::new(MatchTolerances::default())
    }
}

impl DuplicateMatcher {
    pub fn new(tolerances: MatchTolerances) -> Self {
        DuplicateMatcher { tolerances }
    }

    /// True when `a` and `b` likely describe the same real-world session
    ///
    /// Rules, in order: identity scope (user and type) must match exactly,
    /// start times within the time tolerance, both durations positive, and
    /// durations within the ratio tolerance of the longer one. All boundary
    /// comparisons are inclusive.
    pub fn likely_duplicate(&self, a: &Activity, b: &Activity) -> bool {
        if a.user_id != b.user_id || a.activity_type != b.activity_type {
            return false;
        }

        let time_diff = (a.start_time - b.start_time).num_seconds().abs();
        if time_diff > self.tolerances.time_tolerance_seconds {
            return false;
        }

        if a.duration_seconds == 0 || b.duration_seconds == 0 {
            return false;
        }

        let longer = f64::from(a.duration_seconds.max(b.duration_seconds));
        let diff = f64::from(a.duration_seconds.abs_diff(b.duration_seconds));
        diff <= self.tolerances.duration_tolerance_ratio * longer
    }
}

/// Selects the canonical record among duplicates and merges them
pub struct ActivityMerger;

impl ActivityMerger {
    /// Pick the record that should represent the merged activity
    ///
    /// Higher richness wins; on a tie a manual source beats any import; on a
    /// further tie the more recently created record wins (first argument on
    /// equal timestamps).
    pub fn select_canonical<'a>(a: &'a Activity, b: &'a Activity) -> &'a Activity {
        let richness_a = RichnessScorer::score(a);
        let richness_b = RichnessScorer::score(b);

        if richness_a > richness_b {
            return a;
        }
        if richness_b > richness_a {
            return b;
        }

        match (a.source.is_manual(), b.source.is_manual()) {
            (true, false) => return a,
            (false, true) => return b,
            _ => {}
        }

        if b.created_at > a.created_at {
            b
        } else {
            a
        }
    }

    /// Merge `secondary` into `primary`, producing a new record
    ///
    /// The result carries the primary's identity and auxiliary data, unions
    /// richness signals from both sides, and preserves user-authored fields
    /// from whichever input has them. Neither input is mutated.
    pub fn merge(primary: &Activity, secondary: &Activity) -> Activity {
        Self::merge_at(primary, secondary, Utc::now())
    }

    /// Merge with an explicit event timestamp
    pub fn merge_at(
        primary: &Activity,
        secondary: &Activity,
        merged_at: DateTime<Utc>,
    ) -> Activity {
        let mut merged = primary.clone();

        // Union boolean richness signals
        merged.has_heart_rate_stream |= secondary.has_heart_rate_stream;
        merged.has_gps |= secondary.has_gps;
        merged.has_power |= secondary.has_power;
        merged.per_second_data |= secondary.per_second_data;

        // Fill auxiliary data the primary lacks
        if merged.avg_heart_rate.is_none() {
            merged.avg_heart_rate = secondary.avg_heart_rate;
        }
        if merged.hr_samples.is_none() {
            merged.hr_samples = secondary.hr_samples.clone();
        }
        if merged.device_name.is_none() {
            merged.device_name = secondary.device_name.clone();
        }
        if merged.calories.is_none() {
            merged.calories = secondary.calories;
        }
        if merged.elevation_gain.is_none() {
            merged.elevation_gain = secondary.elevation_gain;
        }
        if merged.zone_minutes.is_none() {
            merged.zone_minutes = secondary.zone_minutes;
        }

        // User-authored fields survive from either side
        if merged.notes.is_none() {
            merged.notes = secondary.notes.clone();
        }
        if merged.subjective_exertion.is_none() {
            merged.subjective_exertion = secondary.subjective_exertion;
        }

        merged.canonical_source = Some(primary.source.clone());

        for (key, record) in &secondary.source_set {
            merged
                .source_set
                .entry(key.clone())
                .or_insert_with(|| record.clone());
        }
        merged
            .source_set
            .entry(primary.source.key())
            .or_insert_with(|| SourceRecord {
                external_id: primary.source_external_id.clone(),
                richness: RichnessScorer::score(primary),
            });
        merged
            .source_set
            .entry(secondary.source.key())
            .or_insert_with(|| SourceRecord {
                external_id: secondary.source_external_id.clone(),
                richness: RichnessScorer::score(secondary),
            });

        merged.merge_history.extend(secondary.merge_history.clone());
        merged.merge_history.push(MergeEvent {
            source: secondary.source.key(),
            external_id: secondary.source_external_id.clone(),
            merged_at,
        });

        debug!(
            primary = %primary.id,
            secondary = %secondary.id,
            canonical = %primary.source.key(),
            "merged duplicate activities"
        );

        merged
    }
}

/// How a duplicate pair was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPath {
    /// Identical normalized fingerprint
    Fingerprint,
    /// Tolerance-based pairwise comparison
    Tolerance,
}

/// One detected duplicate pair, by record id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicatePair {
    pub kept_id: String,
    pub merged_id: String,
    pub matched_by: MatchPath,
}

/// Result of a batch deduplication pass
#[derive(Debug, Clone, PartialEq)]
pub struct DedupOutcome {
    /// Surviving activities, merges applied, in first-seen input order
    pub activities: Vec<Activity>,

    /// Every duplicate pair that was folded together
    pub duplicate_pairs: Vec<DuplicatePair>,
}

/// Batch deduplication over a user's activity set
pub struct Deduplicator {
    matcher: DuplicateMatcher,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Deduplicator::new(MatchTolerances::default())
    }
}

impl Deduplicator {
    pub fn new(tolerances: MatchTolerances) -> Self {
        Deduplicator {
            matcher: DuplicateMatcher::new(tolerances),
        }
    }

    /// Group by fingerprint first, then sweep the survivors with the
    /// tolerance matcher to catch near-duplicates that round to different
    /// minute buckets. Quadratic only within a (user, type) partition.
    pub fn process(&self, activities: &[Activity]) -> Result<DedupOutcome> {
        let mut duplicate_pairs = Vec::new();

        // Fast path: exact fingerprint collisions, input order preserved
        let mut group_index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<Vec<&Activity>> = Vec::new();
        for activity in activities {
            let fingerprint = DedupHasher::fingerprint(activity)?;
            match group_index.get(&fingerprint) {
                Some(&idx) => groups[idx].push(activity),
                None => {
                    group_index.insert(fingerprint, groups.len());
                    groups.push(vec![activity]);
                }
            }
        }

        let mut survivors: Vec<Activity> = Vec::with_capacity(groups.len());
        for group in groups {
            let mut iter = group.into_iter();
            let mut merged = iter
                .next()
                .expect("fingerprint groups are never empty")
                .clone();
            for next in iter {
                let (primary, secondary) =
                    if std::ptr::eq(ActivityMerger::select_canonical(&merged, next), &merged) {
                        (merged.clone(), next.clone())
                    } else {
                        (next.clone(), merged.clone())
                    };
                duplicate_pairs.push(DuplicatePair {
                    kept_id: primary.id.clone(),
                    merged_id: secondary.id.clone(),
                    matched_by: MatchPath::Fingerprint,
                });
                merged = ActivityMerger::merge(&primary, &secondary);
            }
            survivors.push(merged);
        }

        // Slow path: tolerance sweep across the fingerprint survivors
        let mut deduplicated: Vec<Activity> = Vec::with_capacity(survivors.len());
        for candidate in survivors {
            let existing = deduplicated
                .iter()
                .position(|kept| self.matcher.likely_duplicate(kept, &candidate));
            match existing {
                Some(idx) => {
                    let kept = &deduplicated[idx];
                    let canonical_is_kept =
                        std::ptr::eq(ActivityMerger::select_canonical(kept, &candidate), kept);
                    let (primary, secondary) = if canonical_is_kept {
                        (kept.clone(), candidate)
                    } else {
                        (candidate, kept.clone())
                    };
                    duplicate_pairs.push(DuplicatePair {
                        kept_id: primary.id.clone(),
                        merged_id: secondary.id.clone(),
                        matched_by: MatchPath::Tolerance,
                    });
                    deduplicated[idx] = ActivityMerger::merge(&primary, &secondary);
                }
                None => deduplicated.push(candidate),
            }
        }

        debug!(
            input = activities.len(),
            output = deduplicated.len(),
            pairs = duplicate_pairs.len(),
            "deduplication pass complete"
        );

        Ok(DedupOutcome {
            activities: deduplicated,
            duplicate_pairs,
        })
    }
}
