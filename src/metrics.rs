//! Rolling training-load metrics: acute/chronic load, monotony and strain
//!
//! Consumes an ordered sequence of per-day load totals (oldest to newest) and
//! derives the trend metrics used to gauge fatigue against fitness. The
//! caller owns persistence and per-day summation of individual activities;
//! a small aggregation helper is provided for convenience.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Time constants for the exponentially weighted load averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Acute (fatigue) time constant in days
    pub acute_time_constant: f64,

    /// Chronic (fitness) time constant in days
    pub chronic_time_constant: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            acute_time_constant: 7.0,
            chronic_time_constant: 28.0,
        }
    }
}

/// Per-day load total produced by the aggregation helper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLoad {
    pub date: NaiveDate,

    /// Sum of all activity loads on this day
    pub total_load: f64,

    /// Number of activities contributing to the total
    pub activity_count: u32,
}

/// Bundle of rolling metrics for one evaluation point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingMetrics {
    /// 7-day exponentially weighted load (fatigue)
    pub acute: f64,

    /// 28-day exponentially weighted load (fitness)
    pub chronic: f64,

    /// Training stress balance: chronic minus acute
    pub balance: f64,

    /// Day-to-day variability of the trailing week
    pub monotony: f64,

    /// Weekly load scaled by monotony
    pub strain: f64,
}

/// Derives rolling metrics from ordered daily load sequences
pub struct RollingMetricsAggregator {
    config: MetricsConfig,
}

impl Default for RollingMetricsAggregator {
    fn default() -> Self {
        RollingMetricsAggregator::new(MetricsConfig::default())
    }
}

impl RollingMetricsAggregator {
    pub fn new(config: MetricsConfig) -> Self {
        RollingMetricsAggregator { config }
    }

    /// Sum same-day loads into per-day totals, ordered by date
    pub fn aggregate_daily(loads: &[(NaiveDate, f64)]) -> BTreeMap<NaiveDate, DailyLoad> {
        let mut daily: BTreeMap<NaiveDate, DailyLoad> = BTreeMap::new();
        for &(date, load) in loads {
            daily
                .entry(date)
                .and_modify(|day| {
                    day.total_load += load;
                    day.activity_count += 1;
                })
                .or_insert(DailyLoad {
                    date,
                    total_load: load,
                    activity_count: 1,
                });
        }
        daily
    }

    /// Short-horizon exponentially weighted load
    pub fn acute(&self, daily_loads: &[f64]) -> f64 {
        Self::ewma(daily_loads, self.config.acute_time_constant)
    }

    /// Long-horizon exponentially weighted load
    pub fn chronic(&self, daily_loads: &[f64]) -> f64 {
        Self::ewma(daily_loads, self.config.chronic_time_constant)
    }

    /// Training stress balance: fitness minus fatigue
    pub fn balance(&self, chronic: f64, acute: f64) -> f64 {
        chronic - acute
    }

    /// Mean over (standard deviation + 1); the +1 keeps a perfectly flat
    /// week finite
    pub fn monotony(&self, daily_loads: &[f64]) -> f64 {
        if daily_loads.is_empty() {
            return 0.0;
        }
        let mean = daily_loads.mean();
        let std_dev = if daily_loads.len() < 2 {
            0.0
        } else {
            daily_loads.std_dev()
        };
        mean / (std_dev + 1.0)
    }

    /// Weekly load scaled by monotony
    pub fn strain(&self, monotony: f64, weekly_load: f64) -> f64 {
        weekly_load * monotony
    }

    /// Evaluate every rolling metric for the supplied sequence
    ///
    /// Acute/chronic run over the whole sequence; monotony and strain use the
    /// trailing seven entries as the current training week.
    pub fn evaluate(&self, daily_loads: &[f64]) -> RollingMetrics {
        let acute = self.acute(daily_loads);
        let chronic = self.chronic(daily_loads);

        let week_start = daily_loads.len().saturating_sub(7);
        let week = &daily_loads[week_start..];
        let monotony = self.monotony(week);
        let weekly_load: f64 = week.iter().sum();

        RollingMetrics {
            acute,
            chronic,
            balance: self.balance(chronic, acute),
            monotony,
            strain: self.strain(monotony, weekly_load),
        }
    }

    /// Iterative EWMA seeded at 0, oldest value first
    fn ewma(daily_loads: &[f64], time_constant: f64) -> f64 {
        if daily_loads.is_empty() {
            return 0.0;
        }
        let alpha = 1.0 - (-1.0 / time_constant).exp();
        daily_loads
            .iter()
            .fold(0.0, |ema, &load| alpha * load + (1.0 - alpha) * ema)
    }
}
