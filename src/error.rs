use thiserror::Error;

/// Errors raised while enriching a single reading.
///
/// Every variant aborts the whole computation for that reading; the engine
/// never hands back a partially populated set of derived fields.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Unsupported unit token passed to a conversion.
    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    /// No reference record satisfies the lookup predicate.
    #[error("no {table} record for {key}")]
    ConversionNotFound { table: &'static str, key: String },

    /// Unparseable date/time or unsupported timezone abbreviation.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A numeric field fails a declared range check.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl EngineError {
    pub(crate) fn saturation_not_found(refrigerant: &str, key: impl std::fmt::Display) -> Self {
        EngineError::ConversionNotFound {
            table: "saturation",
            key: format!("{refrigerant} at {key}"),
        }
    }
}
