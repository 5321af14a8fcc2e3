use serde_json::Value;

use super::ExtractContext;
use crate::document::ResistanceRow;
use crate::format::format_signed_bonus;
use crate::i18n::resolve_label;
use crate::options::SectionKey;
use crate::source::{array, first_of, text};

const RESISTANCES: [&str; 5] = ["Channeling", "Essence", "Mentalism", "Physical", "Fear"];

/// Where the resistance list has lived across system versions, newest first.
const LIST_PATHS: [&[&str]; 6] = [
    &["_resistanceBlock", "_resistances"],
    &["_resistanceBlock", "resistances"],
    &["resistanceBlock", "_resistances"],
    &["resistanceBlock", "resistances"],
    &["_resistances"],
    &["resistances"],
];

pub fn extract(ctx: &ExtractContext<'_>) -> Option<Vec<ResistanceRow>> {
    if !ctx.enabled(SectionKey::Resistances) {
        return None;
    }

    let list = array(first_of(ctx.system(), &LIST_PATHS));

    Some(
        RESISTANCES
            .iter()
            .map(|&label| ResistanceRow {
                label: resolve_label(ctx.labels, &format!("RMU.Resistance.{label}"), label),
                bonus: format_signed_bonus(find_resistance(list, label)),
            })
            .collect(),
    )
}

fn find_resistance<'a>(list: &'a [Value], label: &str) -> Option<&'a Value> {
    let needle = label.to_lowercase();
    list.iter()
        .find(|entry| {
            text(entry.get("name")).is_some_and(|name| name.to_lowercase().contains(&needle))
        })
        .and_then(|entry| first_of(entry, &[&["total"], &["bonus"]]))
}
