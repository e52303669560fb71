//! Shared value types for AnVIL reconciliation.
//!
//! Terra entities carry their metadata as a free-form JSON object (the "attribute bag").
//! Cohorts disagree on key names and value types, so the bag is kept loosely typed and
//! interpreted by the rules in `anvil-core`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Errors that can occur when building shared value types.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// The input was not a JSON object.
    #[error("attributes must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Result type for shared value types.
pub type TypesResult<T> = Result<T, TypesError>;

/// A free-form key/value bag taken verbatim from source data.
///
/// Lookups distinguish between a key that is absent and a key that is present with a JSON
/// `null` value: [`Attributes::contains`] is true for both present cases, while
/// [`Attributes::raw_text`] yields `None` for `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Map<String, Value>);

impl Attributes {
    /// Creates an empty attribute bag.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builds an attribute bag from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::NotAnObject`] if `value` is not a JSON object.
    pub fn from_value(value: Value) -> TypesResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(TypesError::NotAnObject("null")),
            Value::Bool(_) => Err(TypesError::NotAnObject("boolean")),
            Value::Number(_) => Err(TypesError::NotAnObject("number")),
            Value::String(_) => Err(TypesError::NotAnObject("string")),
            Value::Array(_) => Err(TypesError::NotAnObject("array")),
        }
    }

    /// Returns the bag with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Whether `key` is present, including keys whose value is `null`.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the raw text of the value stored at `key`.
    ///
    /// See [`raw_text`] for how non-string values are rendered.
    pub fn raw_text(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(raw_text)
    }

    /// Returns the first key of `keys` that is present in the bag, with its value.
    pub fn first_present<'k>(&self, keys: &[&'k str]) -> Option<(&'k str, &Value)> {
        keys.iter()
            .find_map(|key| self.0.get(*key).map(|value| (*key, value)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Renders a JSON value the way source spreadsheets show it.
///
/// Strings are returned unchanged, numbers and booleans use their JSON rendering
/// (`45`, `45.5`, `true`), `null` has no text. Arrays and objects are rendered as compact JSON.
pub fn raw_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_rejects_non_objects() {
        let err = Attributes::from_value(json!(["a"])).expect_err("array is not a bag");
        assert!(matches!(err, TypesError::NotAnObject("array")));

        let err = Attributes::from_value(Value::Null).expect_err("null is not a bag");
        assert_eq!(err.to_string(), "attributes must be a JSON object, got null");
    }

    #[test]
    fn contains_sees_null_values_but_raw_text_does_not() {
        let attrs = Attributes::new().with("gender", Value::Null);
        assert!(attrs.contains("gender"));
        assert_eq!(attrs.raw_text("gender"), None);
        assert!(!attrs.contains("sex"));
    }

    #[test]
    fn raw_text_renders_scalars() {
        assert_eq!(raw_text(&json!("Female")), Some("Female".to_string()));
        assert_eq!(raw_text(&json!(45)), Some("45".to_string()));
        assert_eq!(raw_text(&json!(45.5)), Some("45.5".to_string()));
        assert_eq!(raw_text(&json!(true)), Some("true".to_string()));
        assert_eq!(raw_text(&json!({"a": 1})), Some("{\"a\":1}".to_string()));
    }

    #[test]
    fn first_present_respects_key_order() {
        let attrs = Attributes::new().with("AGE", "50").with("Age", "45");
        let (key, value) = attrs
            .first_present(&["Age", "AGE", "AGE_baseline"])
            .expect("a key is present");
        assert_eq!(key, "Age");
        assert_eq!(value, &json!("45"));

        assert!(attrs.first_present(&["age"]).is_none());
    }

    #[test]
    fn deserializes_transparently_from_an_object() {
        let attrs: Attributes =
            serde_json::from_value(json!({"gender": "Male", "age": 30})).expect("valid bag");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.raw_text("age"), Some("30".to_string()));

        let back = serde_json::to_value(&attrs).expect("serialize bag");
        assert_eq!(back, json!({"gender": "Male", "age": 30}));
    }
}
