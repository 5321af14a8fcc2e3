use super::ExtractContext;
use crate::document::StatRow;
use crate::format::format_signed_bonus;
use crate::i18n::resolve_label;
use crate::options::SectionKey;
use crate::source::{at, first_of};

pub const STAT_KEYS: [&str; 10] = ["Ag", "Co", "Em", "In", "Me", "Pr", "Qu", "Re", "SD", "St"];

pub fn extract(ctx: &ExtractContext<'_>) -> Option<Vec<StatRow>> {
    if !ctx.enabled(SectionKey::Stats) {
        return None;
    }

    let sys = ctx.system();
    let Some(block) = first_of(sys, &[&["_statBlock"], &["stats"]]) else {
        return Some(Vec::new());
    };

    let rows = STAT_KEYS
        .iter()
        .filter_map(|&key| {
            let data = at(block, &[key])?;
            Some(StatRow {
                label: key.to_string(),
                name: resolve_label(ctx.labels, &format!("RMU.Stat.{key}"), key),
                bonus: format_signed_bonus(first_of(data, &[&["total"], &["bonus"]])),
            })
        })
        .collect();

    Some(rows)
}
