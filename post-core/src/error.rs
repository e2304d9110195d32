use thiserror::Error;

use crate::postcore::Phase;

/// Convenience result alias for post-processor operations.
pub type Result<T> = std::result::Result<T, PostError>;

/// Errors surfaced to the caller driving a post-processing session.
///
/// None of these are recovered internally. Text already returned by earlier
/// calls stays valid, but a session that produced an error should be treated
/// as aborted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PostError {
    #[error("property index {index} is out of range (dialect has {count} properties)")]
    PropertyIndex { index: usize, count: usize },

    #[error("axis list has {axes} entries but value list has {values}")]
    AxisMismatch { axes: usize, values: usize },

    #[error("`{operation}` is not allowed while the session is {phase}")]
    Lifecycle { operation: &'static str, phase: Phase },

    #[error("no locale selected for this dialect")]
    LocaleNotSelected,

    #[error("unsupported locale `{0}`")]
    UnsupportedLocale(String),

    /// The value could not be converted to the slot's type.
    #[error("property {index} expects {expected}, got `{value}`")]
    Coercion {
        index: usize,
        expected: &'static str,
        value: String,
    },

    /// The value has the right type but violates the slot's constraint.
    #[error("property {index} rejects value {value}")]
    OutOfRange { index: usize, value: String },
}
