use serde_json::Number;

use super::ExtractContext;
use crate::document::Header;
use crate::options::SectionKey;
use crate::source::{first_of, number, text};

pub fn extract(ctx: &ExtractContext<'_>) -> Option<Header> {
    if !ctx.enabled(SectionKey::Header) {
        return None;
    }

    let record = ctx.record;
    let sys = ctx.system();
    let item_name = |kind: &str| {
        record
            .first_item_name(kind)
            .unwrap_or("Unknown")
            .to_string()
    };

    Some(Header {
        name: record.name().to_string(),
        race: item_name("race"),
        culture: item_name("culture"),
        profession: item_name("profession"),
        level: number(first_of(sys, &[&["experience", "level"], &["level"]]))
            .unwrap_or_else(|| Number::from(1)),
        realm: text(first_of(sys, &[&["realm"], &["magic", "realm"]]))
            .unwrap_or("None")
            .to_string(),
        size: text(first_of(sys, &[&["appearance", "size"], &["size"]]))
            .unwrap_or("Unknown")
            .to_string(),
        portrait: None,
    })
}
