//! Error types for the dynamic value model.

use thiserror::Error;

/// Result type for `bio-value` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing, converting, or narrowing [`crate::Value`]s.
#[derive(Error, Debug)]
pub enum Error {
    /// A [`crate::TypeId::Flag`] value was requested with a vector number,
    /// which is never legal (spec §4.C: "Flag is only legal for non-vector
    /// values").
    #[error("flag fields cannot be vectors")]
    FlagCannotBeVector,

    /// Two type ids were not compatible for a requested conversion.
    #[error("type {from:?} is not compatible with {to:?}")]
    IncompatibleTypes {
        from: crate::TypeId,
        to: crate::TypeId,
    },

    /// An integer value did not fit in any supported BCF integer width.
    #[error("value {0} out of range for any supported integer width (int8/16/32)")]
    IntegerOutOfRange(i64),
}
