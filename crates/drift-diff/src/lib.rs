//! Structural diff engine for Drift.
//!
//! Compares two tree-shaped values — keyed records or ordered sequences —
//! and produces a compact, serializable patch describing how to transform
//! one into the other, then replays such patches against a base value.
//! Sequence comparison is identity-aware: an element that survives in a
//! new position is reported as a relocation rather than a delete/insert
//! pair.
//!
//! # Key Types
//!
//! - [`diff`] / [`patch`] -- Entry points dispatching on value shape
//! - [`Patch`] / [`RecordPatch`] / [`SequencePatch`] -- The patch model
//! - [`DiffOptions`] / [`ApplyOptions`] -- Identity extraction, deep comparison, transform hooks
//! - [`DiffError`] -- Contract-violation errors
//!
//! Applying `diff(a, b)` to `a` always reproduces `b`. The diff is a
//! greedy single pass and not guaranteed minimal.

pub mod apply;
pub mod error;
pub mod options;
pub mod patch;
pub mod record_diff;
pub mod sequence_diff;

pub use apply::{apply_record, apply_sequence};
pub use error::{DiffError, DiffResult};
pub use options::{ApplyOptions, DiffOptions, IdentityFn, TransformFn};
pub use patch::{
    Addition, ChangeKind, ElementChange, Patch, RecordChange, RecordPatch, Removal, SequencePatch,
    Splice,
};
pub use record_diff::diff_records;
pub use sequence_diff::diff_sequences;

use drift_types::Value;
use tracing::debug;

/// Maximum nesting depth for recursive diffing.
///
/// The owned value tree cannot be cyclic, so this only bounds
/// pathologically deep inputs, failing fast with
/// [`DiffError::DepthExceeded`] instead of exhausting the stack.
pub const MAX_DEPTH: usize = 128;

pub(crate) fn check_depth(depth: usize) -> DiffResult<()> {
    if depth >= MAX_DEPTH {
        return Err(DiffError::DepthExceeded { limit: MAX_DEPTH });
    }
    Ok(())
}

/// Nested dispatch for deep comparison. Callers guarantee both values are
/// composites of the same kind.
pub(crate) fn diff_values_at(
    before: &Value,
    after: &Value,
    options: &DiffOptions,
    depth: usize,
) -> DiffResult<Option<Patch>> {
    match (before, after) {
        (Value::Record(a), Value::Record(b)) => {
            Ok(record_diff::diff_records_at(a, b, options, depth)?.map(Patch::Record))
        }
        (Value::Sequence(a), Value::Sequence(b)) => {
            Ok(sequence_diff::diff_sequences_at(a, b, options, depth)?.map(Patch::Sequence))
        }
        (a, b) => {
            debug_assert!(false, "nested dispatch on mismatched kinds");
            Err(DiffError::KindMismatch {
                left: a.kind(),
                right: b.kind(),
            })
        }
    }
}

/// Compare two values and produce a patch.
///
/// Both operands must be composites of the same kind: two records route
/// to [`diff_records`], two sequences to [`diff_sequences`]. A record
/// against a sequence fails with [`DiffError::KindMismatch`]; a primitive
/// operand fails with [`DiffError::NotComposite`]. Both are detected
/// before any comparison work begins.
///
/// Returns `Ok(None)` when the operands are identical — "no patch" is a
/// valid terminal state, not an error.
pub fn diff(before: &Value, after: &Value, options: &DiffOptions) -> DiffResult<Option<Patch>> {
    match (before, after) {
        (Value::Record(a), Value::Record(b)) => {
            debug!(before_fields = a.len(), after_fields = b.len(), "diffing records");
            Ok(record_diff::diff_records_at(a, b, options, 0)?.map(Patch::Record))
        }
        (Value::Sequence(a), Value::Sequence(b)) => {
            debug!(before_len = a.len(), after_len = b.len(), "diffing sequences");
            Ok(sequence_diff::diff_sequences_at(a, b, options, 0)?.map(Patch::Sequence))
        }
        (a, b) if a.is_composite() && b.is_composite() => Err(DiffError::KindMismatch {
            left: a.kind(),
            right: b.kind(),
        }),
        (a, b) => {
            let offending = if a.is_composite() { b } else { a };
            Err(DiffError::NotComposite(offending.kind()))
        }
    }
}

/// Apply a patch to a base value, returning the patched value.
///
/// Application is copy-on-write: the target is never mutated, so frozen
/// or shared targets need no special handling. A target whose kind does
/// not match the patch fails with [`DiffError::TargetMismatch`].
pub fn patch(target: &Value, patch: &Patch, options: &ApplyOptions) -> DiffResult<Value> {
    apply::apply_value(target, patch, options)
}
