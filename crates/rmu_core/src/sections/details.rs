use serde_json::Value;

use super::ExtractContext;
use crate::document::Details;
use crate::options::SectionKey;
use crate::source::{display, first_of, float};
use crate::units::{height_to_display, weight_to_display};

pub fn extract(ctx: &ExtractContext<'_>) -> Option<Details> {
    if !ctx.enabled(SectionKey::Details) {
        return None;
    }

    let sys = ctx.system();
    let units = ctx.units();

    Some(Details {
        age: field(sys, "age"),
        gender: field(sys, "gender"),
        height: float(lookup(sys, "height"))
            .map(|inches| height_to_display(inches, units))
            .unwrap_or_default(),
        weight: float(lookup(sys, "weight"))
            .map(|pounds| weight_to_display(pounds, units))
            .unwrap_or_default(),
        hair: field(sys, "hair"),
        eyes: field(sys, "eyes"),
        skin: field(sys, "skin"),
        faith: field(sys, "faith"),
        biography: display(first_of(
            sys,
            &[
                &["biography"],
                &["details", "biography"],
                &["description", "value"],
                &["description"],
            ],
        ))
        .unwrap_or_default(),
    })
}

/// Appearance block first, then the details block, then the system root.
fn lookup<'a>(sys: &'a Value, key: &str) -> Option<&'a Value> {
    first_of(sys, &[&["appearance", key], &["details", key], &[key]])
}

fn field(sys: &Value, key: &str) -> String {
    display(lookup(sys, key)).unwrap_or_default()
}
