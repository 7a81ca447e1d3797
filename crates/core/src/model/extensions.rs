use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provider-specific data the canonical model does not map.
///
/// Restricted to JSON-like values so it survives any encoding the document does.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ExtensionValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<ExtensionValue>),
    Map(BTreeMap<String, ExtensionValue>),
}

impl ExtensionValue {
    pub fn as_map(&self) -> Option<&BTreeMap<String, ExtensionValue>> {
        match self {
            ExtensionValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ExtensionValue]> {
        match self {
            ExtensionValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ExtensionValue::Null)
    }
}

impl From<Value> for ExtensionValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ExtensionValue::Null,
            Value::Bool(b) => ExtensionValue::Bool(b),
            Value::Number(n) => ExtensionValue::Number(n),
            Value::String(s) => ExtensionValue::String(s),
            Value::Array(items) => {
                ExtensionValue::List(items.into_iter().map(ExtensionValue::from).collect())
            }
            Value::Object(map) => ExtensionValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, ExtensionValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<ExtensionValue> for Value {
    fn from(value: ExtensionValue) -> Self {
        match value {
            ExtensionValue::Null => Value::Null,
            ExtensionValue::Bool(b) => Value::Bool(b),
            ExtensionValue::Number(n) => Value::Number(n),
            ExtensionValue::String(s) => Value::String(s),
            ExtensionValue::List(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            ExtensionValue::Map(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&ExtensionValue> for Value {
    fn from(value: &ExtensionValue) -> Self {
        Value::from(value.clone())
    }
}

/// Extensions keyed by provider namespace (`"whisper"`, `"deepgram"`, ...).
pub type Extensions = BTreeMap<String, ExtensionValue>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_conversion_preserves_nesting() {
        let raw = json!({"a": [1, 2.5, null], "b": {"c": true, "d": "x"}});
        let ext = ExtensionValue::from(raw.clone());
        assert_eq!(Value::from(ext), raw);
    }

    #[test]
    fn test_serializes_as_plain_json() {
        let ext = ExtensionValue::from(json!({"model_info": {"name": "nova"}}));
        let encoded = serde_json::to_value(&ext).unwrap();
        assert_eq!(encoded, json!({"model_info": {"name": "nova"}}));
    }

    #[test]
    fn test_accessors() {
        let ext = ExtensionValue::from(json!({"list": [1]}));
        let map = ext.as_map().unwrap();
        assert_eq!(map["list"].as_list().map(|l| l.len()), Some(1));
        assert!(ext.as_list().is_none());
        assert!(ExtensionValue::Null.is_null());
    }
}
