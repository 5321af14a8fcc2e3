use serde_json::{Number, Value};

use super::ExtractContext;
use crate::document::{SpellEntry, SpellGroup};
use crate::i18n::{Localizer, key_fragment, resolve_label};
use crate::options::SectionKey;
use crate::source::{array, first_of, flag, number, text};

/// Known spells grouped by list, in source order. Lists with nothing known
/// are dropped.
pub fn extract(ctx: &ExtractContext<'_>) -> Option<Vec<SpellGroup>> {
    if !ctx.enabled(SectionKey::Spells) {
        return None;
    }

    let types = array(first_of(ctx.system(), &[&["_spells"], &["spells"]]));
    let mut groups = Vec::new();

    for type_group in types {
        let list_type = text(type_group.get("listType")).unwrap_or_default();
        for list in array(type_group.get("spellLists")) {
            let spells: Vec<SpellEntry> = array(list.get("spells"))
                .iter()
                .filter(|spell| flag(spell.get("known")))
                .map(|spell| spell_entry(spell, ctx.labels))
                .collect();
            if spells.is_empty() {
                continue;
            }

            let list_name = text(list.get("spellListName")).unwrap_or_default();
            groups.push(SpellGroup {
                list_type: localize(ctx.labels, "RMU.SpellListType", list_type),
                list_name: localize(ctx.labels, "RMU.SpellList", list_name),
                spells,
            });
        }
    }

    Some(groups)
}

fn spell_entry(spell: &Value, labels: &dyn Localizer) -> SpellEntry {
    SpellEntry {
        name: localize(labels, "RMU.Spell", text(spell.get("name")).unwrap_or_default()),
        level: number(spell.get("level")).unwrap_or_else(|| Number::from(0)),
    }
}

fn localize(labels: &dyn Localizer, prefix: &str, raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    resolve_label(labels, &format!("{prefix}.{}", key_fragment(raw)), raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{JsonLocalizer, RawLabels};
    use crate::options::ExportOptions;
    use crate::sections::DerivedSnapshots;
    use crate::source::SourceRecord;
    use serde_json::json;

    fn record() -> SourceRecord {
        SourceRecord::new(json!({
            "type": "Character",
            "system": {
                "_spells": [{
                    "listType": "Base",
                    "spellLists": [
                        {
                            "spellListName": "Fire Law",
                            "spells": [
                                { "name": "Boil Liquid", "level": 1, "known": true },
                                { "name": "Fire Bolt", "level": 6, "known": false }
                            ]
                        },
                        {
                            "spellListName": "Ice Law",
                            "spells": [{ "name": "Chill Solid", "level": 2, "known": false }]
                        }
                    ]
                }]
            }
        }))
    }

    #[test]
    fn unknown_spells_and_empty_lists_are_dropped() {
        let record = record();
        let options = ExportOptions::default();
        let ctx = ExtractContext {
            record: &record,
            options: &options,
            labels: &RawLabels,
            derived: &DerivedSnapshots::default(),
        };

        let groups = extract(&ctx).unwrap_or_default();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].list_name, "Fire Law");
        assert_eq!(groups[0].list_type, "Base");
        assert_eq!(groups[0].spells.len(), 1);
        assert_eq!(groups[0].spells[0].name, "Boil Liquid");
        assert_eq!(groups[0].spells[0].level, Number::from(1));
    }

    #[test]
    fn each_label_localizes_independently() {
        let labels = JsonLocalizer::from_value(&json!({
            "RMU": { "SpellList": { "FireLaw": "Loi du Feu" } }
        }));
        let record = record();
        let options = ExportOptions::default();
        let ctx = ExtractContext {
            record: &record,
            options: &options,
            labels: &labels,
            derived: &DerivedSnapshots::default(),
        };

        let groups = extract(&ctx).unwrap_or_default();
        assert_eq!(groups[0].list_name, "Loi du Feu");
        assert_eq!(groups[0].list_type, "Base");
        assert_eq!(groups[0].spells[0].name, "Boil Liquid");
    }
}
