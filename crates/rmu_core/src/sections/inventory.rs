use serde_json::{Number, Value};

use super::ExtractContext;
use crate::document::{Inventory, InventoryItem};
use crate::i18n::resolve_label;
use crate::options::{MeasurementSystem, SectionKey};
use crate::source::{array, at, first_of, float, number, text};
use crate::units::weight_to_display;

const DEFAULT_PACE: &str = "Dash";

pub fn extract(ctx: &ExtractContext<'_>) -> Option<Inventory> {
    if !ctx.enabled(SectionKey::Inventory) {
        return None;
    }

    let sys = ctx.system();
    let units = ctx.units();

    let items = array(first_of(sys, &[&["_inventory"], &["inventory"]]))
        .iter()
        .map(|item| inventory_item(item, units))
        .collect();

    let max_pace = match text(at(sys, &["_movementBlock", "maxPaceForLoadLabel"])) {
        Some(key) => resolve_label(ctx.labels, key, key),
        None => text(at(sys, &["encumbrance", "pace"]))
            .unwrap_or(DEFAULT_PACE)
            .to_string(),
    };

    Some(Inventory {
        weight_allowance: total_weight(sys, "_loadAllowed", units),
        weight_carried: total_weight(sys, "_carriedWeight", units),
        enc_penalty: number(sys.get("_encManeuverPenalty")).unwrap_or_else(|| Number::from(0)),
        max_pace,
        items,
    })
}

fn inventory_item(item: &Value, units: MeasurementSystem) -> InventoryItem {
    let weight = float(first_of(
        item,
        &[&["system", "weight"], &["system", "_weight", "weight"]],
    ))
    .unwrap_or(0.0);

    InventoryItem {
        name: text(first_of(item, &[&["item", "name"], &["system", "name"], &["name"]]))
            .unwrap_or("Unknown")
            .to_string(),
        qty: number(at(item, &["system", "quantity"]))
            .filter(|qty| qty.as_f64().is_some_and(|v| v != 0.0))
            .unwrap_or_else(|| Number::from(1)),
        weight: weight_to_display(weight, units),
    }
}

/// Aggregate weight, rounded to hundredths before conversion.
fn total_weight(sys: &Value, key: &str, units: MeasurementSystem) -> String {
    let pounds = float(at(sys, &[key, "weight"])).unwrap_or(0.0);
    weight_to_display((pounds * 100.0).round() / 100.0, units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::RawLabels;
    use crate::options::ExportOptions;
    use crate::sections::DerivedSnapshots;
    use crate::source::SourceRecord;
    use serde_json::json;

    fn run(system: Value, options: ExportOptions) -> Inventory {
        let record = SourceRecord::new(json!({ "type": "Character", "system": system }));
        let ctx = ExtractContext {
            record: &record,
            options: &options,
            labels: &RawLabels,
            derived: &DerivedSnapshots::default(),
        };
        match extract(&ctx) {
            Some(inventory) => inventory,
            None => panic!("inventory section disabled"),
        }
    }

    #[test]
    fn item_weight_falls_back_to_nested_field() {
        let inventory = run(
            json!({
                "_inventory": [
                    { "item": { "name": "Rope" }, "system": { "weight": 3, "quantity": 2 } },
                    { "system": { "name": "Lantern", "_weight": { "weight": 1.5 } } }
                ],
                "_loadAllowed": { "weight": 48.456 },
                "_carriedWeight": { "weight": 4.5 },
                "_encManeuverPenalty": -10
            }),
            ExportOptions::default(),
        );

        assert_eq!(inventory.items.len(), 2);
        assert_eq!(inventory.items[0].name, "Rope");
        assert_eq!(inventory.items[0].qty, Number::from(2));
        assert_eq!(inventory.items[0].weight, "3 lbs");
        assert_eq!(inventory.items[1].name, "Lantern");
        assert_eq!(inventory.items[1].qty, Number::from(1));
        assert_eq!(inventory.items[1].weight, "1.5 lbs");
        assert_eq!(inventory.weight_allowance, "48.46 lbs");
        assert_eq!(inventory.weight_carried, "4.5 lbs");
        assert_eq!(inventory.enc_penalty, Number::from(-10));
        assert_eq!(inventory.max_pace, "Dash");
    }

    #[test]
    fn pace_prefers_label_key_then_raw_pace() {
        let labelled = run(
            json!({
                "_movementBlock": { "maxPaceForLoadLabel": "RMU.Pace.Run" },
                "encumbrance": { "pace": "Jog" }
            }),
            ExportOptions::default(),
        );
        assert_eq!(labelled.max_pace, "RMU.Pace.Run");

        let raw = run(json!({ "encumbrance": { "pace": "Jog" } }), ExportOptions::default());
        assert_eq!(raw.max_pace, "Jog");
    }

    #[test]
    fn metric_totals_convert_after_rounding() {
        let options = ExportOptions {
            measurement_system: MeasurementSystem::Metric,
            ..ExportOptions::default()
        };
        let inventory = run(json!({ "_carriedWeight": { "weight": 10 } }), options);
        assert_eq!(inventory.weight_carried, "4.54 kg");
        assert!(inventory.items.is_empty());
    }
}
