// Library interface for the activity deduplication and training-load engine.
// Pure, synchronous computation over caller-supplied records; persistence,
// transport and authentication live in the embedding application.

pub mod dedup;
pub mod error;
pub mod load;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod richness;

// Re-export commonly used types for convenience
pub use dedup::{
    ActivityMerger, DedupHasher, DedupOutcome, Deduplicator, DuplicateMatcher, DuplicatePair,
    MatchPath, MatchTolerances,
};
pub use error::{EngineError, Result};
pub use load::{ActivityLoad, LoadBreakdown, LoadCalculator, LoadMethod, LoadResult};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use metrics::{DailyLoad, MetricsConfig, RollingMetrics, RollingMetricsAggregator};
pub use models::*;
pub use richness::RichnessScorer;
