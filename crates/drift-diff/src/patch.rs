//! The patch model: serializable change descriptions produced by `diff`
//! and consumed by the applier.
//!
//! A patch is an opaque value — it can be stored, transmitted, and
//! replayed later against the before-value it was computed from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use drift_types::{Value, ValueKind};

/// The classification of a single change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Add,
    Update,
    Delete,
    Splice,
}

/// A patch over either composite shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Patch {
    Record(RecordPatch),
    Sequence(SequencePatch),
}

impl Patch {
    /// The shape of value this patch applies to.
    pub fn kind(&self) -> ValueKind {
        match self {
            Patch::Record(_) => ValueKind::Record,
            Patch::Sequence(_) => ValueKind::Sequence,
        }
    }

    /// Returns `true` if the patch describes no changes.
    pub fn is_empty(&self) -> bool {
        match self {
            Patch::Record(patch) => patch.is_empty(),
            Patch::Sequence(patch) => patch.is_empty(),
        }
    }
}

/// A single change to a record field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordChange {
    /// The key is new in the after-record.
    Add { new: Value },
    /// The key exists on both sides with different values.
    Update { old: Value, new: Value },
    /// The key is gone from the after-record.
    Delete { old: Value },
    /// Both sides hold composites of the same kind; the nested patch
    /// transforms the old value into the new one.
    Nested { patch: Patch },
}

impl RecordChange {
    /// The reporting-level classification of this change.
    pub fn kind(&self) -> ChangeKind {
        match self {
            RecordChange::Add { .. } => ChangeKind::Add,
            RecordChange::Update { .. } | RecordChange::Nested { .. } => ChangeKind::Update,
            RecordChange::Delete { .. } => ChangeKind::Delete,
        }
    }
}

/// The result of comparing two records: per-key change descriptors.
///
/// A key appears at most once; a key that is absent is unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    /// The changes, keyed by field name.
    pub changes: BTreeMap<String, RecordChange>,
}

impl RecordPatch {
    /// Create an empty record patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changed keys.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Number of added keys.
    pub fn additions(&self) -> usize {
        self.changes
            .values()
            .filter(|c| matches!(c, RecordChange::Add { .. }))
            .count()
    }

    /// Number of deleted keys.
    pub fn deletions(&self) -> usize {
        self.changes
            .values()
            .filter(|c| matches!(c, RecordChange::Delete { .. }))
            .count()
    }

    /// Number of updated keys, counting nested patches.
    pub fn updates(&self) -> usize {
        self.changes
            .values()
            .filter(|c| c.kind() == ChangeKind::Update)
            .count()
    }

    /// The patch that undoes this one: applying `p` then `p.invert()` to a
    /// record returns it to its original state.
    ///
    /// Returns `None` when the patch contains a nested sequence patch —
    /// sequence removals do not retain the removed values, so they cannot
    /// be reversed.
    pub fn invert(&self) -> Option<RecordPatch> {
        let mut changes = BTreeMap::new();
        for (key, change) in &self.changes {
            let inverted = match change {
                RecordChange::Add { new } => RecordChange::Delete { old: new.clone() },
                RecordChange::Delete { old } => RecordChange::Add { new: old.clone() },
                RecordChange::Update { old, new } => RecordChange::Update {
                    old: new.clone(),
                    new: old.clone(),
                },
                RecordChange::Nested { patch } => match patch {
                    Patch::Record(nested) => RecordChange::Nested {
                        patch: Patch::Record(nested.invert()?),
                    },
                    Patch::Sequence(_) => return None,
                },
            };
            changes.insert(key.clone(), inverted);
        }
        Some(RecordPatch { changes })
    }
}

/// The result of comparing two sequences.
///
/// Two sparse maps, both keyed in before-sequence coordinates:
/// [`splices`](Self::splices) describe removed and inserted runs, anchored
/// one past the preceding aligned element; [`updates`](Self::updates)
/// carry changes to elements that stayed aligned but whose content
/// drifted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePatch {
    /// Splice entries, keyed by anchor index.
    pub splices: BTreeMap<usize, Splice>,
    /// Element-level changes, keyed by the matched element's index.
    pub updates: BTreeMap<usize, ElementChange>,
}

impl SequencePatch {
    /// Create an empty sequence patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.splices.is_empty() && self.updates.is_empty()
    }

    /// Number of genuinely new elements across all splices.
    pub fn additions(&self) -> usize {
        self.splices
            .values()
            .flat_map(|s| &s.added)
            .filter(|a| !a.moved)
            .count()
    }

    /// Number of elements removed without a counterpart in the
    /// after-sequence.
    pub fn deletions(&self) -> usize {
        self.splices
            .values()
            .flat_map(|s| &s.removed)
            .filter(|r| r.deleted)
            .count()
    }

    /// Number of elements that survive at a new position.
    pub fn relocations(&self) -> usize {
        self.splices
            .values()
            .flat_map(|s| &s.added)
            .filter(|a| a.moved)
            .count()
    }
}

/// Removal of a contiguous run and insertion of another at one anchor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Splice {
    /// Descriptors for the elements removed at the anchor, in order.
    pub removed: Vec<Removal>,
    /// Descriptors for the elements inserted at the anchor, in order.
    pub added: Vec<Addition>,
}

/// One removed element within a splice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Removal {
    /// `true` if the element has no counterpart anywhere in the
    /// after-sequence; `false` marks the slot vacated by a relocation.
    pub deleted: bool,
}

/// One inserted element within a splice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Addition {
    /// `true` if this is a relocated element rather than a new value.
    pub moved: bool,
    /// For a relocation, the element's index in the before-sequence.
    pub from: Option<usize>,
    /// The element's index in the after-sequence.
    pub to: usize,
    /// For a genuine insertion, the inserted value; for a relocation whose
    /// content drifted, the replacement value. A plain relocation carries
    /// no value — the applier resolves it from the before-sequence.
    pub value: Option<Value>,
}

impl Addition {
    /// A genuinely new value surfacing at `to`.
    pub fn inserted(to: usize, value: Value) -> Self {
        Self {
            moved: false,
            from: None,
            to,
            value: Some(value),
        }
    }

    /// The element originally at `from`, surfacing at `to`.
    pub fn relocated(from: usize, to: usize) -> Self {
        Self {
            moved: true,
            from: Some(from),
            to,
            value: None,
        }
    }
}

/// A change to a sequence element that stayed aligned across the diff.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementChange {
    /// A structural patch for a matched composite pair.
    Nested(Patch),
    /// Whole-value replacement for a matched pair that cannot be
    /// structurally diffed.
    Replace { new: Value },
}

impl ElementChange {
    /// The reporting-level classification of this change.
    pub fn kind(&self) -> ChangeKind {
        ChangeKind::Update
    }
}
