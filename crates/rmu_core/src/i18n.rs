//! Localization lookups.
//!
//! The host owns the string tables; the extractors only ask for a key and fall
//! back to the raw identifier when the host has nothing. Lookups never fail.

use std::collections::BTreeMap;

use serde_json::Value;

#[cfg_attr(test, mockall::automock)]
pub trait Localizer: Send + Sync {
    /// Translation for `key`, or `None` when the table has no entry.
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Localizer with no entries; every label falls back to its raw name.
#[derive(Debug, Default, Clone, Copy)]
pub struct RawLabels;

impl Localizer for RawLabels {
    fn lookup(&self, _key: &str) -> Option<String> {
        None
    }
}

/// String table loaded from a Foundry-style language file.
///
/// Nested objects are flattened into dotted keys, so `{"RMU": {"Stat": {"Ag":
/// "Agility"}}}` answers `RMU.Stat.Ag`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JsonLocalizer {
    entries: BTreeMap<String, String>,
}

impl JsonLocalizer {
    pub fn from_value(value: &Value) -> Self {
        let mut entries = BTreeMap::new();
        flatten_into(&mut entries, String::new(), value);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Localizer for JsonLocalizer {
    fn lookup(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

fn flatten_into(out: &mut BTreeMap<String, String>, prefix: String, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(out, path, child);
            }
        }
        Value::String(s) if !prefix.is_empty() => {
            out.insert(prefix, s.clone());
        }
        _ => {}
    }
}

/// Translation for `key`, or `fallback` when the table has none.
pub fn resolve_label(localizer: &dyn Localizer, key: &str, fallback: &str) -> String {
    localizer
        .lookup(key)
        .filter(|s| !s.is_empty() && s != key)
        .unwrap_or_else(|| fallback.to_string())
}

/// First key with a translation wins; otherwise the raw name.
pub fn probe_label(localizer: &dyn Localizer, keys: &[String], raw: &str) -> String {
    keys.iter()
        .find_map(|key| localizer.lookup(key).filter(|s| !s.is_empty() && s != key))
        .unwrap_or_else(|| raw.to_string())
}

/// Turns a display name into the identifier fragment used in string keys.
pub fn key_fragment(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use serde_json::json;

    #[test]
    fn resolve_label_falls_back_when_missing() {
        let mut loc = MockLocalizer::new();
        loc.expect_lookup()
            .with(eq("RMU.Stat.Ag"))
            .return_const(None::<String>);
        assert_eq!(resolve_label(&loc, "RMU.Stat.Ag", "Ag"), "Ag");
    }

    #[test]
    fn probe_label_takes_first_hit() {
        let mut loc = MockLocalizer::new();
        loc.expect_lookup()
            .with(eq("RMU.AttackTable.Broadsword"))
            .times(1)
            .return_const(None::<String>);
        loc.expect_lookup()
            .with(eq("RMU.Attack.Broadsword"))
            .times(1)
            .return_const(Some("Broadsword (1H)".to_string()));
        let keys = vec![
            "RMU.AttackTable.Broadsword".to_string(),
            "RMU.Attack.Broadsword".to_string(),
            "RMU.Never.Asked".to_string(),
        ];
        assert_eq!(probe_label(&loc, &keys, "broadsword"), "Broadsword (1H)");
    }

    #[test]
    fn echoed_keys_count_as_missing() {
        let table = JsonLocalizer::from_value(&json!({ "RMU": { "Size": "RMU.Size" } }));
        assert_eq!(resolve_label(&table, "RMU.Size", "Size"), "Size");
    }

    #[test]
    fn language_files_flatten_to_dotted_keys() {
        let table = JsonLocalizer::from_value(&json!({
            "RMU": { "Stat": { "Ag": "Agility" }, "Flat.Key": "Flat" }
        }));
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("RMU.Stat.Ag").as_deref(), Some("Agility"));
        assert_eq!(table.lookup("RMU.Flat.Key").as_deref(), Some("Flat"));
    }

    #[test]
    fn key_fragment_camel_cases_words() {
        assert_eq!(key_fragment("open ice-magic"), "OpenIceMagic");
        assert_eq!(key_fragment("Body Development"), "BodyDevelopment");
    }
}
