use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::kind::ValueKind;

/// An unordered string-keyed mapping. Insertion order is not significant.
pub type Record = BTreeMap<String, Value>;

/// An ordered, possibly sparse list. A hole is represented explicitly as
/// [`Value::Absent`].
pub type Sequence = Vec<Value>;

/// A structured value: the single input and output shape of the diff/patch
/// engine.
///
/// `Value` is a closed union — there is no "other object" case, so every
/// value is either a primitive, a record, or a sequence by construction.
/// Shape dispatch happens once, at the top of `diff`/`patch`, by matching
/// on this enum.
///
/// [`Value::Absent`] marks a hole in a sparse sequence. It is not a legal
/// record field value; the engine rejects it there.
///
/// Note that `Int` and `Float` are distinct kinds: `Int(1)` and
/// `Float(1.0)` do not compare equal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
    Null,
    Absent,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Sequence(Sequence),
    Record(Record),
}

impl Value {
    /// The shape classification of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Absent => ValueKind::Absent,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::Record(_) => ValueKind::Record,
        }
    }

    /// Returns `true` for records and sequences.
    pub fn is_composite(&self) -> bool {
        self.kind().is_composite()
    }

    /// Returns `true` for anything that is not a record or a sequence.
    pub fn is_primitive(&self) -> bool {
        !self.is_composite()
    }

    /// Returns `true` if this value is a sequence hole.
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    /// The record inside, if this value is a record.
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(map) => Some(map),
            _ => None,
        }
    }

    /// The sequence inside, if this value is a sequence.
    pub fn as_sequence(&self) -> Option<&Sequence> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// The text inside, if this value is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean inside, if this value is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer inside, if this value is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Look up a field, if this value is a record.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_record().and_then(|map| map.get(key))
    }
}

/// Identity equality: deep structural equality with NaN equal to NaN.
///
/// This is the one equality the engine uses everywhere — change detection,
/// identity matching, and tests. The NaN rule keeps the relation reflexive,
/// which is what makes `diff(A, A)` a guaranteed no-op even when `A`
/// contains NaN floats.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Absent, Value::Absent) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Absent => write!(f, "absent"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Sequence(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Record(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Sequence> for Value {
    fn from(items: Sequence) -> Self {
        Value::Sequence(items)
    }
}

impl From<Record> for Value {
    fn from(map: Record) -> Self {
        Value::Record(map)
    }
}
