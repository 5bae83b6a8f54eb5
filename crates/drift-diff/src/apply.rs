//! Patch application: replay a patch against a base value.
//!
//! Application is copy-on-write — the target is never mutated, a new
//! value is returned — and all-or-nothing: on error, nothing partial
//! escapes. Relocated sequence elements are resolved against a snapshot
//! of the pristine target taken before any splicing, so the relative
//! order of removals and relocated insertions within a patch does not
//! matter.

use drift_types::{Record, Sequence, Value};

use crate::error::{DiffError, DiffResult};
use crate::options::ApplyOptions;
use crate::patch::{Addition, ElementChange, Patch, RecordChange, RecordPatch, SequencePatch};

/// Apply a record patch.
///
/// Deletes remove the key (tolerating a key that is already gone), adds
/// and updates insert the new value, nested changes recurse into the
/// current value. Keys the patch does not name pass through unchanged.
pub fn apply_record(
    target: &Record,
    patch: &RecordPatch,
    options: &ApplyOptions,
) -> DiffResult<Record> {
    let mut out = target.clone();
    for (key, change) in &patch.changes {
        match change {
            RecordChange::Add { new } | RecordChange::Update { new, .. } => {
                out.insert(key.clone(), new.clone());
            }
            RecordChange::Delete { .. } => {
                out.remove(key);
            }
            RecordChange::Nested { patch } => {
                let current = out.get(key).ok_or_else(|| {
                    DiffError::MalformedPatch(format!("nested patch for missing key {key:?}"))
                })?;
                let patched = apply_value(current, patch, options)?;
                out.insert(key.clone(), patched);
            }
        }
    }
    Ok(out)
}

/// Apply a sequence patch.
///
/// Element-level updates are applied first, while before-coordinates are
/// still valid. Splice anchors are then walked in ascending order with a
/// cumulative offset, since earlier splices shift later positions: each
/// splice removes `removed.len()` elements at `anchor + offset` and
/// inserts the resolved added values there. A `moved` addition resolves
/// to its carried value when the relocated element's content drifted,
/// else to the element at its `from` index in the pristine target; with
/// [`ApplyOptions::transform`] set, every resolved addition is routed
/// through the callback before insertion.
pub fn apply_sequence(
    target: &Sequence,
    patch: &SequencePatch,
    options: &ApplyOptions,
) -> DiffResult<Sequence> {
    let snapshot = target.clone();
    let mut out = target.clone();

    for (&index, change) in &patch.updates {
        let current = out.get(index).ok_or_else(|| {
            DiffError::MalformedPatch(format!(
                "element update at {index} is out of bounds for a sequence of length {}",
                out.len()
            ))
        })?;
        let patched = match change {
            ElementChange::Replace { new } => new.clone(),
            ElementChange::Nested(nested) => apply_value(current, nested, options)?,
        };
        out[index] = patched;
    }

    let mut offset: isize = 0;
    for (&anchor, splice) in &patch.splices {
        let start = anchor as isize + offset;
        if start < 0 || start as usize > out.len() {
            return Err(DiffError::SpliceOutOfBounds {
                anchor,
                len: out.len(),
            });
        }
        let start = start as usize;
        let end = start + splice.removed.len();
        if end > out.len() {
            return Err(DiffError::SpliceOutOfBounds {
                anchor,
                len: out.len(),
            });
        }

        let mut inserted = Vec::with_capacity(splice.added.len());
        for addition in &splice.added {
            let value = resolve_addition(addition, &snapshot)?;
            let value = match options.transform {
                Some(transform) => transform(addition, &value),
                None => value,
            };
            inserted.push(value);
        }

        out.splice(start..end, inserted);
        offset += splice.added.len() as isize - splice.removed.len() as isize;
    }

    Ok(out)
}

fn resolve_addition(addition: &Addition, snapshot: &[Value]) -> DiffResult<Value> {
    if addition.moved {
        let from = addition.from.ok_or_else(|| {
            DiffError::MalformedPatch(format!(
                "moved addition at {} carries no source index",
                addition.to
            ))
        })?;
        // A relocation whose content drifted carries the replacement value
        // inline; a plain relocation resolves from the snapshot.
        if let Some(value) = &addition.value {
            return Ok(value.clone());
        }
        let value = snapshot.get(from).ok_or_else(|| {
            DiffError::MalformedPatch(format!(
                "moved addition at {} references source {from} outside the target",
                addition.to
            ))
        })?;
        Ok(value.clone())
    } else {
        addition.value.clone().ok_or_else(|| {
            DiffError::MalformedPatch(format!("addition at {} carries no value", addition.to))
        })
    }
}

/// Apply a patch to a value of the matching composite kind.
pub(crate) fn apply_value(
    target: &Value,
    patch: &Patch,
    options: &ApplyOptions,
) -> DiffResult<Value> {
    match (patch, target) {
        (Patch::Record(patch), Value::Record(map)) => {
            Ok(Value::Record(apply_record(map, patch, options)?))
        }
        (Patch::Sequence(patch), Value::Sequence(items)) => {
            Ok(Value::Sequence(apply_sequence(items, patch, options)?))
        }
        (patch, target) => Err(DiffError::TargetMismatch {
            patch: patch.kind(),
            target: target.kind(),
        }),
    }
}
