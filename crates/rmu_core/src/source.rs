//! Read-only access to the rules engine's actor document.
//!
//! The upstream schema drifts between system versions, so every field the
//! extractors read goes through an ordered list of candidate paths. The first
//! candidate that resolves to a non-null value wins; that ordering is the
//! compatibility contract for each field and is spelled out at the call site.

use serde_json::{Number, Value};

pub static NULL: Value = Value::Null;

/// Object key under which the rules engine nests a document's own data.
pub const WRAPPER_KEY: &str = "system";

#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    data: Value,
}

impl SourceRecord {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    pub fn as_value(&self) -> &Value {
        &self.data
    }

    pub fn name(&self) -> &str {
        text(self.data.get("name")).unwrap_or("")
    }

    pub fn actor_type(&self) -> &str {
        text(self.data.get("type")).unwrap_or("")
    }

    pub fn id(&self) -> Option<&str> {
        text(self.data.get("_id"))
    }

    /// The `system` sub-tree, or `null` when the record has none.
    pub fn system(&self) -> &Value {
        self.data.get(WRAPPER_KEY).unwrap_or(&NULL)
    }

    pub fn items(&self) -> &[Value] {
        array(self.data.get("items"))
    }

    pub fn items_of_type<'a, 'k>(
        &'a self,
        kinds: &'k [&'k str],
    ) -> impl Iterator<Item = &'a Value> + use<'a, 'k> {
        self.items().iter().filter(move |item| {
            text(item.get("type")).is_some_and(|kind| kinds.contains(&kind))
        })
    }

    pub fn first_item_name(&self, kind: &str) -> Option<&str> {
        self.items()
            .iter()
            .filter(|item| text(item.get("type")) == Some(kind))
            .find_map(|item| text(item.get("name")))
    }
}

/// Walks `segments` from `value`. Null values count as absent.
pub fn at<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if current.is_null() { None } else { Some(current) }
}

/// Evaluates candidate paths in order; first non-null wins.
pub fn first_of<'a>(value: &'a Value, candidates: &[&[&str]]) -> Option<&'a Value> {
    candidates.iter().find_map(|segments| at(value, segments))
}

/// Non-empty string content.
pub fn text(value: Option<&Value>) -> Option<&str> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

pub fn array(value: Option<&Value>) -> &[Value] {
    match value {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    }
}

pub fn flag(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

/// JSON number, or a string holding one.
pub fn number(value: Option<&Value>) -> Option<Number> {
    match value? {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Some(Number::from(i));
            }
            trimmed.parse::<f64>().ok().and_then(Number::from_f64)
        }
        _ => None,
    }
}

pub fn float(value: Option<&Value>) -> Option<f64> {
    number(value).and_then(|n| n.as_f64())
}

/// Measurement input for the unit converter; non-numeric degrades to NaN.
pub fn measure(value: Option<&Value>) -> f64 {
    float(value).unwrap_or(f64::NAN)
}

pub fn display(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn first_of_skips_null_and_missing_candidates() {
        let value = json!({ "a": null, "b": { "c": 3 } });
        let found = first_of(&value, &[&["a"], &["x", "y"], &["b", "c"]]);
        assert_eq!(found, Some(&json!(3)));
    }

    #[test]
    fn at_indexes_arrays() {
        let value = json!({ "list": [{ "v": 1 }, { "v": 2 }] });
        assert_eq!(at(&value, &["list", "1", "v"]), Some(&json!(2)));
        assert_eq!(at(&value, &["list", "nope"]), None);
    }

    #[test]
    fn number_accepts_numeric_strings() {
        assert_eq!(number(Some(&json!("12"))), Some(Number::from(12)));
        assert_eq!(float(Some(&json!(" 2.5 "))), Some(2.5));
        assert_eq!(number(Some(&json!("heavy"))), None);
        assert!(measure(Some(&json!(true))).is_nan());
    }
}
