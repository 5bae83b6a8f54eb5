use std::fmt;

use serde::{Deserialize, Serialize};

/// Shape classification for a [`Value`].
///
/// Classification happens once at an API boundary; everything downstream
/// routes on the enum rather than re-testing shapes.
///
/// [`Value`]: crate::Value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Null,
    Absent,
    Bool,
    Int,
    Float,
    Text,
    Sequence,
    Record,
}

impl ValueKind {
    /// Returns `true` for the two composite shapes.
    pub fn is_composite(self) -> bool {
        matches!(self, ValueKind::Sequence | ValueKind::Record)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Absent => "absent",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Sequence => "sequence",
            ValueKind::Record => "record",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_sequences_and_records_are_composite() {
        assert!(ValueKind::Sequence.is_composite());
        assert!(ValueKind::Record.is_composite());
        assert!(!ValueKind::Null.is_composite());
        assert!(!ValueKind::Absent.is_composite());
        assert!(!ValueKind::Text.is_composite());
    }

    #[test]
    fn display_names_are_lowercase() {
        assert_eq!(format!("{}", ValueKind::Record), "record");
        assert_eq!(format!("{}", ValueKind::Sequence), "sequence");
        assert_eq!(format!("{}", ValueKind::Float), "float");
    }
}
