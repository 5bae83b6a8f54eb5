//! Sequence diff: identity-aware alignment of ordered sequences.
//!
//! A greedy single-pass scan aligns the two sequences by element identity,
//! emitting splice entries for runs of removals and insertions. An element
//! that survives in a new position is reported as a relocation: a
//! `deleted: false` removal marking the vacated slot, paired with a
//! `moved: true` addition naming the source index. The result is not
//! guaranteed minimal, but replaying it against the before-sequence always
//! reproduces the after-sequence.

use std::collections::BTreeMap;
use std::mem;

use tracing::trace;

use drift_types::{Sequence, Value};

use crate::error::DiffResult;
use crate::options::DiffOptions;
use crate::patch::{Addition, ElementChange, Removal, SequencePatch, Splice};

/// Compare two sequences.
///
/// Returns `Ok(None)` when there are zero differences. Identity is
/// extracted per [`DiffOptions`]; by default an element's identity is the
/// element itself.
pub fn diff_sequences(
    before: &Sequence,
    after: &Sequence,
    options: &DiffOptions,
) -> DiffResult<Option<SequencePatch>> {
    diff_sequences_at(before, after, options, 0)
}

pub(crate) fn diff_sequences_at(
    before: &Sequence,
    after: &Sequence,
    options: &DiffOptions,
    depth: usize,
) -> DiffResult<Option<SequencePatch>> {
    crate::check_depth(depth)?;
    let mut session = AlignSession::new(before, after, options);
    session.scan(depth)?;
    let patch = session.finish();
    if patch.is_empty() {
        Ok(None)
    } else {
        Ok(Some(patch))
    }
}

/// Consumption state of a before-side slot during the scan.
///
/// Slots start `Free`. A direct match marks its slot `Matched`. A removal
/// whose identity survives elsewhere in the after-sequence leaves its slot
/// `Vacated` until an addition claims it as a relocation source
/// (`Claimed`); a removal with no surviving identity is `Dropped`.
/// After-side positions need no marker array: they are consumed strictly
/// in cursor order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Free,
    Matched,
    Vacated,
    Claimed,
    Dropped,
}

/// Scratch state for one alignment scan.
///
/// Holds the cursors, the pending removal/addition buffers, and the
/// running anchor as explicit fields. The anchor is one past the most
/// recent match, in before-sequence coordinates; pending buffers flush as
/// a splice keyed there. When both cursors point at matchable elements
/// ahead, the shorter walk wins and removals break ties.
struct AlignSession<'a> {
    before: &'a [Value],
    after: &'a [Value],
    options: &'a DiffOptions<'a>,
    before_ids: Vec<Value>,
    after_ids: Vec<Value>,
    slots: Vec<Slot>,
    i: usize,
    j: usize,
    anchor: usize,
    removed: Vec<Removal>,
    added: Vec<Addition>,
    splices: BTreeMap<usize, Splice>,
    updates: BTreeMap<usize, ElementChange>,
}

impl<'a> AlignSession<'a> {
    fn new(before: &'a Sequence, after: &'a Sequence, options: &'a DiffOptions<'a>) -> Self {
        let before_ids: Vec<Value> = before.iter().map(|v| options.identity_of(v)).collect();
        let after_ids: Vec<Value> = after.iter().map(|v| options.identity_of(v)).collect();
        Self {
            before,
            after,
            options,
            slots: vec![Slot::Free; before.len()],
            before_ids,
            after_ids,
            i: 0,
            j: 0,
            anchor: 0,
            removed: Vec::new(),
            added: Vec::new(),
            splices: BTreeMap::new(),
            updates: BTreeMap::new(),
        }
    }

    fn scan(&mut self, depth: usize) -> DiffResult<()> {
        while self.i < self.before.len() && self.j < self.after.len() {
            if self.slots[self.i] != Slot::Free {
                // Vacated earlier by a relocation claim: record the hole it
                // left behind and move on.
                self.remove_current();
                continue;
            }
            if self.before_ids[self.i] == self.after_ids[self.j] {
                self.take_match(depth)?;
                continue;
            }
            let a_in_b = self.find_in_after(&self.before_ids[self.i]);
            let b_in_a = self.find_in_before(&self.after_ids[self.j]);
            match (a_in_b, b_in_a) {
                (None, None) => {
                    // Neither element can match ahead of the cursors.
                    self.remove_current();
                    self.add_current();
                }
                (None, Some(_)) => self.remove_current(),
                (Some(_), None) => self.add_current(),
                (Some(ahead_in_after), Some(ahead_in_before)) => {
                    if ahead_in_after - self.j < ahead_in_before - self.i {
                        self.add_current();
                    } else {
                        self.remove_current();
                    }
                }
            }
        }

        // One side is exhausted; drain the other.
        while self.i < self.before.len() {
            self.remove_current();
        }
        while self.j < self.after.len() {
            self.add_current();
        }
        self.flush();
        Ok(())
    }

    /// Align `before[i]` with `after[j]`: flush pending buffers, consume
    /// both positions, and capture any content drift of the matched pair.
    fn take_match(&mut self, depth: usize) -> DiffResult<()> {
        self.flush();
        let (i, j) = (self.i, self.j);
        self.slots[i] = Slot::Matched;

        let old = &self.before[i];
        let new = &self.after[j];
        if old != new {
            // Identity matched but content drifted; record it so replay
            // still reproduces the after-sequence exactly.
            let change = if self.options.deep_compare
                && old.is_composite()
                && old.kind() == new.kind()
            {
                crate::diff_values_at(old, new, self.options, depth + 1)?
                    .map(ElementChange::Nested)
            } else {
                Some(ElementChange::Replace { new: new.clone() })
            };
            if let Some(change) = change {
                self.updates.insert(i, change);
            }
        }

        self.anchor = i + 1;
        self.i += 1;
        self.j += 1;
        Ok(())
    }

    /// First after-side position at or past the cursor holding `id`.
    fn find_in_after(&self, id: &Value) -> Option<usize> {
        (self.j..self.after_ids.len()).find(|&j| self.after_ids[j] == *id)
    }

    /// First Free before-side slot at or past the cursor holding `id`.
    fn find_in_before(&self, id: &Value) -> Option<usize> {
        (self.i..self.before_ids.len())
            .find(|&i| self.slots[i] == Slot::Free && self.before_ids[i] == *id)
    }

    /// First Vacated slot holding `id`, scanning from the start. First
    /// match wins; later duplicates stay available for later additions.
    fn find_vacated(&self, id: &Value) -> Option<usize> {
        (0..self.before_ids.len())
            .find(|&i| self.slots[i] == Slot::Vacated && self.before_ids[i] == *id)
    }

    /// Buffer a removal of `before[i]` and advance the before-cursor.
    fn remove_current(&mut self) {
        let i = self.i;
        match self.slots[i] {
            Slot::Free => {
                // Tombstone-independent scan of the full after-sequence:
                // a surviving identity means this is a relocation, not a
                // deletion.
                let id = &self.before_ids[i];
                let survives = self.after_ids.iter().any(|other| other == id);
                self.slots[i] = if survives { Slot::Vacated } else { Slot::Dropped };
                self.removed.push(Removal { deleted: !survives });
            }
            state => {
                debug_assert_eq!(state, Slot::Claimed, "cursor can only revisit claimed slots");
                self.removed.push(Removal { deleted: false });
            }
        }
        self.i += 1;
    }

    /// Buffer an addition of `after[j]` and advance the after-cursor.
    fn add_current(&mut self) {
        let j = self.j;
        let id = &self.after_ids[j];
        // Relocation source: a Free slot ahead of the cursor, else a slot
        // already vacated by an earlier removal.
        let source = self.find_in_before(id).or_else(|| self.find_vacated(id));
        match source {
            Some(from) => {
                self.slots[from] = Slot::Claimed;
                let mut addition = Addition::relocated(from, j);
                if self.before[from] != self.after[j] {
                    // Identity matched but content drifted in flight; carry
                    // the after-value so replay does not resurrect the
                    // stale element.
                    addition.value = Some(self.after[j].clone());
                }
                self.added.push(addition);
            }
            None => {
                self.added.push(Addition::inserted(j, self.after[j].clone()));
            }
        }
        self.j += 1;
    }

    /// Emit the pending buffers as a splice keyed at the running anchor.
    fn flush(&mut self) {
        if self.removed.is_empty() && self.added.is_empty() {
            return;
        }
        let splice = Splice {
            removed: mem::take(&mut self.removed),
            added: mem::take(&mut self.added),
        };
        trace!(
            anchor = self.anchor,
            removed = splice.removed.len(),
            added = splice.added.len(),
            "flushing splice"
        );
        let previous = self.splices.insert(self.anchor, splice);
        debug_assert!(previous.is_none(), "splice anchors are strictly increasing");
    }

    fn finish(self) -> SequencePatch {
        SequencePatch {
            splices: self.splices,
            updates: self.updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Patch;
    use drift_types::Record;

    fn seq_of(items: &[&str]) -> Sequence {
        items.iter().map(|s| Value::from(*s)).collect()
    }

    fn row(id: i64, label: &str) -> Value {
        Value::Record(
            [
                ("id".to_string(), Value::Int(id)),
                ("label".to_string(), Value::from(label)),
            ]
            .into_iter()
            .collect::<Record>(),
        )
    }

    #[test]
    fn identical_sequences_produce_no_patch() {
        let items = seq_of(&["a", "b", "c"]);
        let patch = diff_sequences(&items, &items, &DiffOptions::new()).unwrap();
        assert_eq!(patch, None);
    }

    #[test]
    fn pure_append_is_one_trailing_splice() {
        let before = seq_of(&["a", "b", "c"]);
        let after = seq_of(&["a", "b", "c", "d"]);

        let patch = diff_sequences(&before, &after, &DiffOptions::new())
            .unwrap()
            .expect("differences");
        assert_eq!(patch.splices.len(), 1);
        assert!(patch.updates.is_empty());

        let splice = &patch.splices[&3];
        assert!(splice.removed.is_empty());
        assert_eq!(splice.added, vec![Addition::inserted(3, Value::from("d"))]);
    }

    #[test]
    fn relocation_is_a_move_plus_vacated_slot() {
        let before = seq_of(&["a", "b", "c", "d", "e"]);
        let after = seq_of(&["a", "d", "b", "c", "e"]);

        let patch = diff_sequences(&before, &after, &DiffOptions::new())
            .unwrap()
            .expect("differences");
        assert_eq!(patch.splices.len(), 2);

        let moved_in = &patch.splices[&1];
        assert!(moved_in.removed.is_empty());
        assert_eq!(moved_in.added, vec![Addition::relocated(3, 1)]);

        let vacated = &patch.splices[&3];
        assert_eq!(vacated.removed, vec![Removal { deleted: false }]);
        assert!(vacated.added.is_empty());
    }

    #[test]
    fn empty_before_is_one_splice_at_anchor_zero() {
        let before = Sequence::new();
        let after = seq_of(&["x", "y"]);

        let patch = diff_sequences(&before, &after, &DiffOptions::new())
            .unwrap()
            .expect("differences");
        assert_eq!(patch.splices.len(), 1);

        let splice = &patch.splices[&0];
        assert!(splice.removed.is_empty());
        assert_eq!(
            splice.added,
            vec![
                Addition::inserted(0, Value::from("x")),
                Addition::inserted(1, Value::from("y")),
            ]
        );
    }

    #[test]
    fn empty_after_deletes_everything() {
        let before = seq_of(&["x", "y"]);
        let after = Sequence::new();

        let patch = diff_sequences(&before, &after, &DiffOptions::new())
            .unwrap()
            .expect("differences");
        let splice = &patch.splices[&0];
        assert_eq!(splice.removed.len(), 2);
        assert!(splice.removed.iter().all(|r| r.deleted));
        assert!(splice.added.is_empty());
    }

    #[test]
    fn full_replacement_is_one_splice() {
        let before = seq_of(&["a", "b"]);
        let after = seq_of(&["x", "y"]);

        let patch = diff_sequences(&before, &after, &DiffOptions::new())
            .unwrap()
            .expect("differences");
        assert_eq!(patch.splices.len(), 1);

        let splice = &patch.splices[&0];
        assert_eq!(splice.removed.len(), 2);
        assert!(splice.removed.iter().all(|r| r.deleted));
        assert_eq!(splice.added.len(), 2);
        assert!(splice.added.iter().all(|a| !a.moved));
    }

    #[test]
    fn move_to_front_vacates_the_tail() {
        let before = seq_of(&["a", "b", "c"]);
        let after = seq_of(&["c", "a", "b"]);

        let patch = diff_sequences(&before, &after, &DiffOptions::new())
            .unwrap()
            .expect("differences");

        let front = &patch.splices[&0];
        assert_eq!(front.added, vec![Addition::relocated(2, 0)]);
        assert!(front.removed.is_empty());

        let tail = &patch.splices[&2];
        assert_eq!(tail.removed, vec![Removal { deleted: false }]);
    }

    #[test]
    fn move_to_back_vacates_the_front() {
        let before = seq_of(&["a", "b", "c"]);
        let after = seq_of(&["b", "c", "a"]);

        let patch = diff_sequences(&before, &after, &DiffOptions::new())
            .unwrap()
            .expect("differences");

        let front = &patch.splices[&0];
        assert_eq!(front.removed, vec![Removal { deleted: false }]);
        assert!(front.added.is_empty());

        let tail = &patch.splices[&3];
        assert_eq!(tail.added, vec![Addition::relocated(0, 2)]);
    }

    #[test]
    fn duplicate_identities_resolve_first_available() {
        let before = seq_of(&["x", "x"]);
        let after = seq_of(&["x"]);

        let patch = diff_sequences(&before, &after, &DiffOptions::new())
            .unwrap()
            .expect("differences");
        // One element aligns, the duplicate is removed.
        assert_eq!(patch.splices.len(), 1);
        let splice = patch.splices.values().next().expect("one splice");
        assert_eq!(splice.removed.len(), 1);
        assert!(splice.added.is_empty());
    }

    #[test]
    fn duplicate_identities_can_be_appended() {
        let before = seq_of(&["x"]);
        let after = seq_of(&["x", "x"]);

        let patch = diff_sequences(&before, &after, &DiffOptions::new())
            .unwrap()
            .expect("differences");
        let splice = &patch.splices[&1];
        assert_eq!(splice.added, vec![Addition::inserted(1, Value::from("x"))]);
    }

    #[test]
    fn holes_align_with_holes() {
        let before = vec![Value::from("a"), Value::Absent, Value::from("b")];
        let after = vec![Value::from("a"), Value::Absent, Value::from("c")];

        let patch = diff_sequences(&before, &after, &DiffOptions::new())
            .unwrap()
            .expect("differences");
        // Only the trailing element differs; the hole is aligned, not churned.
        assert_eq!(patch.splices.len(), 1);
        let splice = &patch.splices[&2];
        assert_eq!(splice.removed.len(), 1);
        assert_eq!(splice.added.len(), 1);
    }

    #[test]
    fn identity_key_detects_reordered_records() {
        let before = vec![row(1, "one"), row(2, "two"), row(3, "three")];
        let after = vec![row(3, "three"), row(1, "one"), row(2, "two")];

        let options = DiffOptions::with_identity_key("id");
        let patch = diff_sequences(&before, &after, &options)
            .unwrap()
            .expect("differences");
        assert_eq!(patch.relocations(), 1);
        assert_eq!(patch.additions(), 0);
        assert_eq!(patch.deletions(), 0);
    }

    #[test]
    fn identity_match_with_content_drift_is_replaced() {
        let before = vec![row(1, "old")];
        let after = vec![row(1, "new")];

        let options = DiffOptions::with_identity_key("id");
        let patch = diff_sequences(&before, &after, &options)
            .unwrap()
            .expect("differences");
        assert!(patch.splices.is_empty());
        assert_eq!(
            patch.updates[&0],
            ElementChange::Replace { new: row(1, "new") }
        );
    }

    #[test]
    fn identity_match_with_deep_compare_nests_the_drift() {
        let before = vec![row(1, "old")];
        let after = vec![row(1, "new")];

        let options = DiffOptions {
            deep_compare: true,
            ..DiffOptions::with_identity_key("id")
        };
        let patch = diff_sequences(&before, &after, &options)
            .unwrap()
            .expect("differences");
        match &patch.updates[&0] {
            ElementChange::Nested(Patch::Record(nested)) => {
                assert_eq!(nested.len(), 1);
                assert!(nested.changes.contains_key("label"));
            }
            other => panic!("expected nested record patch, got {other:?}"),
        }
    }

    #[test]
    fn relocated_element_with_content_drift_carries_the_new_value() {
        let before = vec![row(1, "a"), row(2, "b")];
        let after = vec![row(2, "b"), row(1, "z")];

        let options = DiffOptions::with_identity_key("id");
        let patch = diff_sequences(&before, &after, &options)
            .unwrap()
            .expect("differences");

        // The relocation must not resurrect the stale element: the drifted
        // content rides along with the move.
        let relocated: Vec<&Addition> = patch
            .splices
            .values()
            .flat_map(|s| &s.added)
            .filter(|a| a.moved)
            .collect();
        assert_eq!(relocated.len(), 1);
        assert_eq!(relocated[0].from, Some(0));
        assert_eq!(relocated[0].value, Some(row(1, "z")));

        let replayed =
            crate::apply::apply_sequence(&before, &patch, &crate::options::ApplyOptions::new())
                .unwrap();
        assert_eq!(replayed, after);
    }

    #[test]
    fn relocation_without_content_drift_carries_no_value() {
        let before = vec![row(1, "one"), row(2, "two"), row(3, "three")];
        let after = vec![row(3, "three"), row(1, "one"), row(2, "two")];

        let options = DiffOptions::with_identity_key("id");
        let patch = diff_sequences(&before, &after, &options)
            .unwrap()
            .expect("differences");
        let moved: Vec<&Addition> = patch
            .splices
            .values()
            .flat_map(|s| &s.added)
            .filter(|a| a.moved)
            .collect();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].value, None);
    }

    #[test]
    fn identity_fn_drives_alignment() {
        let first_char = |value: &Value| match value {
            Value::Text(s) => Value::from(&s[..1]),
            other => other.clone(),
        };
        let before = seq_of(&["apple", "banana"]);
        let after = seq_of(&["avocado", "banana"]);

        let options = DiffOptions {
            identity_fn: Some(&first_char),
            ..DiffOptions::default()
        };
        let patch = diff_sequences(&before, &after, &options)
            .unwrap()
            .expect("differences");
        // "apple" and "avocado" share an identity, so the change surfaces
        // as an element replacement rather than a splice.
        assert!(patch.splices.is_empty());
        assert_eq!(
            patch.updates[&0],
            ElementChange::Replace {
                new: Value::from("avocado")
            }
        );
    }

    #[test]
    fn interleaved_insert_between_matches() {
        let before = seq_of(&["a", "b"]);
        let after = seq_of(&["a", "x", "b"]);

        let patch = diff_sequences(&before, &after, &DiffOptions::new())
            .unwrap()
            .expect("differences");
        assert_eq!(patch.splices.len(), 1);
        let splice = &patch.splices[&1];
        assert!(splice.removed.is_empty());
        assert_eq!(splice.added, vec![Addition::inserted(1, Value::from("x"))]);
    }

    #[test]
    fn removal_and_insert_share_a_splice() {
        let before = seq_of(&["a", "b", "c"]);
        let after = seq_of(&["a", "x", "c"]);

        let patch = diff_sequences(&before, &after, &DiffOptions::new())
            .unwrap()
            .expect("differences");
        let splice = &patch.splices[&1];
        assert_eq!(splice.removed, vec![Removal { deleted: true }]);
        assert_eq!(splice.added, vec![Addition::inserted(1, Value::from("x"))]);
    }
}
