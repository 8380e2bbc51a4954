//! Unified error hierarchy for the deduplication and load engine
//!
//! Hard failures are limited to identity problems (a record that cannot be
//! fingerprinted safely) and activities with no usable signal. Everything
//! else is a soft condition reflected in result breakdowns, never an error.

use thiserror::Error;

/// Top-level error type for all engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    /// Required identity field missing or empty on an input to hashing or
    /// matching. Never defaulted: a miscomputed fingerprint could merge
    /// unrelated activities.
    #[error("invalid activity: {field}: {reason}")]
    InvalidActivity { field: &'static str, reason: String },

    /// No usable signal for load computation (missing or non-positive duration)
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Internal numeric failure during a calculation
    #[error("calculation error: {0}")]
    Calculation(String),
}

/// Convenience result type used throughout the engine
pub type Result<T> = std::result::Result<T, EngineError>;
