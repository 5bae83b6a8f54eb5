//! Caller-supplied options for diffing and patch application.

use std::fmt;

use drift_types::Value;

use crate::patch::Addition;

/// Identity extraction callback: maps a sequence element to the identity
/// used for alignment.
pub type IdentityFn<'a> = dyn Fn(&Value) -> Value + 'a;

/// Transform callback: materializes an added or relocated sequence element
/// during patch application, e.g. to re-render a view element instead of
/// copying raw data.
pub type TransformFn<'a> = dyn Fn(&Addition, &Value) -> Value + 'a;

/// Options controlling `diff`.
#[derive(Default)]
pub struct DiffOptions<'a> {
    /// Field whose value identifies a record element across reorderings.
    /// Ignored for non-record elements.
    pub identity_key: Option<String>,
    /// Arbitrary identity extraction; takes precedence over
    /// [`identity_key`](Self::identity_key).
    pub identity_fn: Option<&'a IdentityFn<'a>>,
    /// Recurse into matched composite values, emitting nested patches
    /// instead of whole-value updates.
    pub deep_compare: bool,
}

impl<'a> DiffOptions<'a> {
    /// Default options: identity is the element value itself, no deep
    /// comparison.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identify sequence elements by the given record field.
    pub fn with_identity_key(key: impl Into<String>) -> Self {
        Self {
            identity_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// The identity of `value` under these options.
    ///
    /// Falls back to the value itself when no extraction is configured or
    /// applicable. A record missing the identity key yields
    /// [`Value::Absent`], the explicit "no identity" marker — such
    /// elements still align with each other.
    pub(crate) fn identity_of(&self, value: &Value) -> Value {
        if let Some(extract) = self.identity_fn {
            return extract(value);
        }
        if let Some(key) = &self.identity_key {
            if let Value::Record(map) = value {
                return map.get(key).cloned().unwrap_or(Value::Absent);
            }
        }
        value.clone()
    }
}

impl fmt::Debug for DiffOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiffOptions")
            .field("identity_key", &self.identity_key)
            .field("identity_fn", &self.identity_fn.map(|_| "<fn>"))
            .field("deep_compare", &self.deep_compare)
            .finish()
    }
}

/// Options controlling `patch`.
#[derive(Default)]
pub struct ApplyOptions<'a> {
    /// When set, every added or relocated sequence element is routed
    /// through this callback instead of being copied directly.
    pub transform: Option<&'a TransformFn<'a>>,
}

impl ApplyOptions<'_> {
    /// Default options: added and relocated values are copied directly.
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for ApplyOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplyOptions")
            .field("transform", &self.transform.map(|_| "<fn>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drift_types::Record;

    fn record_of(pairs: &[(&str, Value)]) -> Value {
        Value::Record(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<Record>(),
        )
    }

    #[test]
    fn default_identity_is_the_value_itself() {
        let options = DiffOptions::new();
        assert_eq!(options.identity_of(&Value::Int(3)), Value::Int(3));
    }

    #[test]
    fn identity_key_reads_record_field() {
        let options = DiffOptions::with_identity_key("id");
        let element = record_of(&[("id", Value::Int(7)), ("label", Value::from("x"))]);
        assert_eq!(options.identity_of(&element), Value::Int(7));
    }

    #[test]
    fn identity_key_on_non_record_falls_back_to_value() {
        let options = DiffOptions::with_identity_key("id");
        assert_eq!(options.identity_of(&Value::from("a")), Value::from("a"));
    }

    #[test]
    fn missing_identity_key_yields_absent() {
        let options = DiffOptions::with_identity_key("id");
        let element = record_of(&[("label", Value::from("x"))]);
        assert_eq!(options.identity_of(&element), Value::Absent);
    }

    #[test]
    fn identity_fn_takes_precedence() {
        let extract = |value: &Value| match value {
            Value::Text(s) => Value::Int(s.len() as i64),
            other => other.clone(),
        };
        let options = DiffOptions {
            identity_key: Some("id".to_string()),
            identity_fn: Some(&extract),
            ..DiffOptions::default()
        };
        assert_eq!(options.identity_of(&Value::from("abc")), Value::Int(3));
    }
}
