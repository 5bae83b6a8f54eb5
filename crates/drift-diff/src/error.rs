//! Error types for the diff crate.

use drift_types::ValueKind;

/// Errors produced by diff computation and patch application.
///
/// Every variant is a contract violation detected synchronously before or
/// during the failing call; no partial patch or partially applied value is
/// ever returned alongside an error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DiffError {
    /// `diff` was given one record and one sequence.
    #[error("cannot diff {left} against {right}: operands must be two records or two sequences")]
    KindMismatch { left: ValueKind, right: ValueKind },

    /// A top-level `diff` operand was not a record or a sequence.
    #[error("cannot diff a {0}: top-level operands must be records or sequences")]
    NotComposite(ValueKind),

    /// A record field held an absent value, which is only meaningful as a
    /// sequence hole.
    #[error("record field {key:?} holds an absent value; holes are only valid inside sequences")]
    AbsentField { key: String },

    /// Recursive diffing exceeded the nesting depth limit.
    #[error("value nesting exceeds the depth limit of {limit}")]
    DepthExceeded { limit: usize },

    /// `patch` was given a target whose kind does not match the patch.
    #[error("patch applies to a {patch} but the target is a {target}")]
    TargetMismatch { patch: ValueKind, target: ValueKind },

    /// A splice anchor fell outside the target sequence.
    #[error("splice at anchor {anchor} is out of bounds for a sequence of length {len}")]
    SpliceOutOfBounds { anchor: usize, len: usize },

    /// The patch is internally inconsistent, e.g. a relocation without a
    /// source index.
    #[error("malformed patch: {0}")]
    MalformedPatch(String),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
