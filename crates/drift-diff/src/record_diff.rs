//! Record diff: compare two keyed records and produce per-key change
//! descriptors.
//!
//! Keys only in the before-record become deletions, keys only in the
//! after-record become additions, and keys on both sides with differing
//! values become updates. Unchanged keys are omitted entirely.

use std::collections::BTreeMap;

use drift_types::{Record, Value};

use crate::error::{DiffError, DiffResult};
use crate::options::DiffOptions;
use crate::patch::{RecordChange, RecordPatch};

/// Compare two records.
///
/// Returns `Ok(None)` when there are zero differences — "no patch" is a
/// valid terminal state, not an error.
///
/// With [`DiffOptions::deep_compare`] set, a key whose values are
/// composites of the same kind on both sides yields a
/// [`RecordChange::Nested`] patch instead of a whole-value update; a kind
/// flip or a composite-vs-primitive change still falls back to
/// [`RecordChange::Update`].
pub fn diff_records(
    before: &Record,
    after: &Record,
    options: &DiffOptions,
) -> DiffResult<Option<RecordPatch>> {
    diff_records_at(before, after, options, 0)
}

pub(crate) fn diff_records_at(
    before: &Record,
    after: &Record,
    options: &DiffOptions,
    depth: usize,
) -> DiffResult<Option<RecordPatch>> {
    crate::check_depth(depth)?;
    let mut changes: BTreeMap<String, RecordChange> = BTreeMap::new();

    // Deleted and changed keys, in before iteration order.
    for (key, old) in before {
        reject_absent(key, old)?;
        match after.get(key) {
            None => {
                changes.insert(key.clone(), RecordChange::Delete { old: old.clone() });
            }
            Some(new) => {
                reject_absent(key, new)?;
                if old == new {
                    continue;
                }
                let change = if options.deep_compare
                    && old.is_composite()
                    && old.kind() == new.kind()
                {
                    match crate::diff_values_at(old, new, options, depth + 1)? {
                        Some(patch) => RecordChange::Nested { patch },
                        // An empty nested diff means the values agree.
                        None => continue,
                    }
                } else {
                    RecordChange::Update {
                        old: old.clone(),
                        new: new.clone(),
                    }
                };
                changes.insert(key.clone(), change);
            }
        }
    }

    // Added keys.
    for (key, new) in after {
        if !before.contains_key(key) {
            reject_absent(key, new)?;
            changes.insert(key.clone(), RecordChange::Add { new: new.clone() });
        }
    }

    if changes.is_empty() {
        Ok(None)
    } else {
        Ok(Some(RecordPatch { changes }))
    }
}

fn reject_absent(key: &str, value: &Value) -> DiffResult<()> {
    if value.is_absent() {
        return Err(DiffError::AbsentField {
            key: key.to_string(),
        });
    }
    Ok(())
}
