use std::collections::BTreeMap;

use super::ExtractContext;
use crate::document::{TalentEntry, TalentGroup};
use crate::options::SectionKey;
use crate::source::{WRAPPER_KEY, at, display, text};

const TALENT_ITEM_TYPES: [&str; 2] = ["talent", "trait"];
const DEFAULT_GROUP: &str = "General";

pub fn extract(ctx: &ExtractContext<'_>) -> Option<Vec<TalentGroup>> {
    if !ctx.enabled(SectionKey::Talents) {
        return None;
    }

    let mut grouped: BTreeMap<String, Vec<TalentEntry>> = BTreeMap::new();
    for item in ctx.record.items_of_type(&TALENT_ITEM_TYPES) {
        let group = text(at(item, &[WRAPPER_KEY, "category"])).unwrap_or(DEFAULT_GROUP);
        grouped
            .entry(group.to_string())
            .or_default()
            .push(TalentEntry {
                name: text(item.get("name")).unwrap_or("Unknown").to_string(),
                tier: display(at(item, &[WRAPPER_KEY, "tier"])).unwrap_or_default(),
            });
    }

    Some(
        grouped
            .into_iter()
            .map(|(group, entries)| TalentGroup { group, entries })
            .collect(),
    )
}
