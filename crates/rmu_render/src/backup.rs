//! The machine-readable copy of the source record carried inside HTML sheets.

use rmu_core::import::BACKUP_BLOCK_ID;
use serde_json::{Map, Value};

use crate::error::RenderError;

/// Copy of `value` without engine-internal fields (object keys starting
/// with `_`), at any depth.
pub fn strip_private(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !key.starts_with('_'))
                .map(|(key, child)| (key.clone(), strip_private(child)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_private).collect()),
        other => other.clone(),
    }
}

/// The `<script>` element holding the backup payload.
///
/// `</` is written as `<\/`, which JSON reads back unchanged but which can no
/// longer close the script element early.
pub fn backup_script(record: &Value) -> Result<String, RenderError> {
    let json = serde_json::to_string(&strip_private(record))?;
    Ok(format!(
        r#"<script type="application/json" id="{BACKUP_BLOCK_ID}">{}</script>"#,
        json.replace("</", "<\\/")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn private_keys_are_removed_recursively() {
        let stripped = strip_private(&json!({
            "_id": "a",
            "name": "Filroden",
            "system": { "_skills": {}, "level": 3, "list": [{ "_cache": 1, "keep": 2 }] }
        }));
        assert_eq!(
            stripped,
            json!({ "name": "Filroden", "system": { "level": 3, "list": [{ "keep": 2 }] } })
        );
    }

    #[test]
    fn closing_tags_cannot_escape_the_script() {
        let script = backup_script(&json!({ "name": "</script><b>x</b>" })).unwrap_or_default();
        assert_eq!(script.matches("</script>").count(), 1);
        assert!(script.ends_with("</script>"));
        assert!(script.contains(r#"<\/script><b>x<\/b>"#));
    }
}
