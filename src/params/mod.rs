//! Tekton parameter values and the flat-string parameter syntax.
//!
//! Tools that start or inspect runs accept parameters as a single string:
//!
//! ```text
//! message=Hello,items=array:one:two,config=object:key1=value1:key2=value2
//! ```
//!
//! Pairs are separated by `,`. A value prefixed with `array:` becomes an
//! array parameter whose elements are separated by `:`. A value prefixed with
//! `object:` becomes an object parameter made of `:`-separated `key=value`
//! entries. Anything else is a plain string.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

const ARRAY_PREFIX: &str = "array:";
const OBJECT_PREFIX: &str = "object:";

/// A named value passed to a Pipeline or Task invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: ParamValue,
}

impl Param {
    /// Creates a string-typed parameter.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: ParamValue::String(value.into()),
        }
    }

    /// Creates an array-typed parameter.
    pub fn array<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            value: ParamValue::Array(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Creates an object-typed parameter.
    pub fn object<I, K, V>(name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            value: ParamValue::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

/// The value of a [`Param`].
///
/// Serializes exactly like Tekton does: a bare JSON string, array or object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Array(Vec<String>),
    Object(BTreeMap<String, String>),
}

impl ParamValue {
    /// Returns the Tekton type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::String(_) => "string",
            ParamValue::Array(_) => "array",
            ParamValue::Object(_) => "object",
        }
    }
}

/// Errors produced while decoding a parameter string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    /// A pair had no `=` separating the name from the value.
    #[error("invalid parameter format: {0}")]
    MalformedParameter(String),
}

/// Decodes a comma-separated parameter string.
///
/// An empty string yields an empty list. An `object:` value without a single
/// `key=value` entry is kept as a plain string holding the original value.
pub fn decode(input: &str) -> Result<Vec<Param>, ParamError> {
    if input.is_empty() {
        return Ok(Vec::new());
    }

    input
        .split(',')
        .map(|pair| {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| ParamError::MalformedParameter(pair.to_string()))?;
            Ok(Param {
                name: name.to_string(),
                value: decode_value(name, value),
            })
        })
        .collect()
}

fn decode_value(name: &str, value: &str) -> ParamValue {
    if let Some(rest) = value.strip_prefix(ARRAY_PREFIX) {
        return ParamValue::Array(rest.split(':').map(str::to_string).collect());
    }

    if let Some(rest) = value.strip_prefix(OBJECT_PREFIX) {
        return match decode_object(rest) {
            Some(entries) => ParamValue::Object(entries),
            None => {
                tracing::warn!(
                    "Error parsing parameter {}: no valid key-value pairs in object value, using it as a string",
                    name
                );
                ParamValue::String(value.to_string())
            }
        };
    }

    ParamValue::String(value.to_string())
}

fn decode_object(body: &str) -> Option<BTreeMap<String, String>> {
    let entries: BTreeMap<String, String> = body
        .split(':')
        .filter_map(|entry| entry.split_once('='))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    if entries.is_empty() {
        None
    } else {
        Some(entries)
    }
}

/// Encodes parameters back into the flat string syntax accepted by [`decode`].
pub fn encode(params: &[Param]) -> String {
    params
        .iter()
        .map(|p| format!("{}={}", p.name, EncodedValue(&p.value)))
        .collect::<Vec<_>>()
        .join(",")
}

struct EncodedValue<'a>(&'a ParamValue);

impl fmt::Display for EncodedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            ParamValue::String(s) => f.write_str(s),
            ParamValue::Array(items) => write!(f, "{ARRAY_PREFIX}{}", items.join(":")),
            ParamValue::Object(entries) => {
                let body = entries
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join(":");
                write!(f, "{OBJECT_PREFIX}{body}")
            }
        }
    }
}

/// Merges `incoming` parameters over `existing` ones.
///
/// A parameter whose name already exists replaces the existing entry at its
/// original position; new names are appended in their original order.
pub fn merge(existing: Vec<Param>, incoming: Vec<Param>) -> Vec<Param> {
    if existing.is_empty() {
        return incoming;
    }
    if incoming.is_empty() {
        return existing;
    }

    let mut result = existing;
    for param in incoming {
        match result.iter_mut().find(|p| p.name == param.name) {
            Some(slot) => *slot = param,
            None => result.push(param),
        }
    }
    result
}

/// Converts an arbitrary JSON value into a parameter value.
///
/// Arrays and objects keep their shape with every element rendered as a
/// string; scalars become string parameters.
pub fn value_from_json(value: &serde_json::Value) -> ParamValue {
    use serde_json::Value;

    match value {
        Value::Array(items) => ParamValue::Array(items.iter().map(json_to_string).collect()),
        Value::Object(map) => ParamValue::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_string(v)))
                .collect(),
        ),
        other => ParamValue::String(json_to_string(other)),
    }
}

/// Builds a parameter list from a JSON object of name/value pairs.
pub fn from_json_map(map: &serde_json::Map<String, serde_json::Value>) -> Vec<Param> {
    map.iter()
        .map(|(name, value)| Param {
            name: name.clone(),
            value: value_from_json(value),
        })
        .collect()
}

fn json_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_empty() {
        assert_eq!(decode("").unwrap(), Vec::<Param>::new());
    }

    #[test]
    fn test_decode_single_string() {
        assert_eq!(decode("k=v").unwrap(), vec![Param::string("k", "v")]);
    }

    #[test]
    fn test_decode_multiple_strings() {
        let params = decode("message=Hello,user=World").unwrap();
        assert_eq!(
            params,
            vec![Param::string("message", "Hello"), Param::string("user", "World")]
        );
    }

    #[test]
    fn test_decode_array() {
        assert_eq!(
            decode("k=array:a:b:c").unwrap(),
            vec![Param::array("k", ["a", "b", "c"])]
        );
    }

    #[test]
    fn test_decode_array_keeps_empty_segments() {
        assert_eq!(
            decode("k=array:a::c").unwrap(),
            vec![Param::array("k", ["a", "", "c"])]
        );
        assert_eq!(decode("k=array:").unwrap(), vec![Param::array("k", [""])]);
    }

    #[test]
    fn test_decode_object() {
        assert_eq!(
            decode("k=object:a=1:b=2").unwrap(),
            vec![Param::object("k", [("a", "1"), ("b", "2")])]
        );
    }

    #[test]
    fn test_decode_object_skips_entries_without_equals() {
        assert_eq!(
            decode("k=object:a=1:junk:b=x=y").unwrap(),
            vec![Param::object("k", [("a", "1"), ("b", "x=y")])]
        );
    }

    #[test]
    fn test_decode_invalid_object_falls_back_to_string() {
        assert_eq!(
            decode("k=object:invalid").unwrap(),
            vec![Param::string("k", "object:invalid")]
        );
    }

    #[test]
    fn test_decode_mixed_types() {
        let params =
            decode("message=Hello,items=array:item1:item2,config=object:key1=value1:key2=value2")
                .unwrap();
        assert_eq!(
            params,
            vec![
                Param::string("message", "Hello"),
                Param::array("items", ["item1", "item2"]),
                Param::object("config", [("key1", "value1"), ("key2", "value2")]),
            ]
        );
    }

    #[test]
    fn test_decode_value_may_contain_equals() {
        assert_eq!(
            decode("expr=a=b").unwrap(),
            vec![Param::string("expr", "a=b")]
        );
    }

    #[test]
    fn test_decode_missing_equals_is_malformed() {
        let err = decode("message").unwrap_err();
        assert_eq!(err, ParamError::MalformedParameter("message".to_string()));
        assert!(err.to_string().contains("message"));

        let err = decode("a=1,broken").unwrap_err();
        assert_eq!(err, ParamError::MalformedParameter("broken".to_string()));
    }

    #[test]
    fn test_merge_replaces_in_place_and_appends() {
        let existing = vec![Param::string("k", "v1")];
        let incoming = vec![Param::string("k", "v2"), Param::string("m", "v3")];
        assert_eq!(
            merge(existing, incoming),
            vec![Param::string("k", "v2"), Param::string("m", "v3")]
        );
    }

    #[test]
    fn test_merge_preserves_position_of_replaced_entry() {
        let existing = vec![Param::string("message", "Hello"), Param::string("user", "World")];
        let incoming = vec![
            Param::string("message", "Updated"),
            Param::array("items", ["item1", "item2"]),
        ];
        assert_eq!(
            merge(existing, incoming),
            vec![
                Param::string("message", "Updated"),
                Param::string("user", "World"),
                Param::array("items", ["item1", "item2"]),
            ]
        );
    }

    #[test]
    fn test_merge_with_empty_sides() {
        let list = vec![Param::string("a", "1"), Param::array("b", ["x"])];
        assert_eq!(merge(Vec::new(), list.clone()), list);
        assert_eq!(merge(list.clone(), Vec::new()), list);
        assert!(merge(Vec::new(), Vec::new()).is_empty());
    }

    #[test]
    fn test_encode_decode_preserves_params() {
        let inputs = [
            "message=Hello,items=array:a::c,config=object:x=1:y=2",
            "k=object:invalid",
            "url=https://example.com/a=b",
        ];
        for input in inputs {
            let params = decode(input).unwrap();
            assert_eq!(decode(&encode(&params)).unwrap(), params, "input: {input}");
        }
    }

    #[test]
    fn test_param_value_serializes_like_tekton() {
        let params = vec![
            Param::string("a", "1"),
            Param::array("b", ["x", "y"]),
            Param::object("c", [("k", "v")]),
        ];
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            json!([
                {"name": "a", "value": "1"},
                {"name": "b", "value": ["x", "y"]},
                {"name": "c", "value": {"k": "v"}},
            ])
        );

        let back: Vec<Param> = serde_json::from_value(value).unwrap();
        assert_eq!(back, params);
    }

    #[test]
    fn test_value_from_json_scalars() {
        assert_eq!(value_from_json(&json!("test")), ParamValue::String("test".into()));
        assert_eq!(value_from_json(&json!(42)), ParamValue::String("42".into()));
        assert_eq!(value_from_json(&json!(3.5)), ParamValue::String("3.5".into()));
        assert_eq!(value_from_json(&json!(true)), ParamValue::String("true".into()));
        assert_eq!(value_from_json(&json!(null)), ParamValue::String(String::new()));
    }

    #[test]
    fn test_value_from_json_collections() {
        assert_eq!(
            value_from_json(&json!(["a", 1, false])),
            ParamValue::Array(vec!["a".into(), "1".into(), "false".into()])
        );
        assert_eq!(
            value_from_json(&json!({"key": "value", "n": 2})),
            ParamValue::Object(BTreeMap::from([
                ("key".to_string(), "value".to_string()),
                ("n".to_string(), "2".to_string()),
            ]))
        );
    }

    #[test]
    fn test_type_name() {
        assert_eq!(ParamValue::String(String::new()).type_name(), "string");
        assert_eq!(ParamValue::Array(Vec::new()).type_name(), "array");
        assert_eq!(ParamValue::Object(BTreeMap::new()).type_name(), "object");
    }
}
