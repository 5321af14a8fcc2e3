use serde_json::{Number, Value};

use super::ExtractContext;
use crate::document::AttackRow;
use crate::format::format_signed_bonus;
use crate::i18n::{Localizer, key_fragment, probe_label};
use crate::options::{MeasurementSystem, SectionKey};
use crate::source::{array, display, first_of, flag, float, number, text};
use crate::units::{DistanceContext, distance_to_display};

pub fn extract(ctx: &ExtractContext<'_>) -> Option<Vec<AttackRow>> {
    if !ctx.enabled(SectionKey::Attacks) {
        return None;
    }

    let attacks = array(first_of(ctx.system(), &[&["_attacks"], &["attacks"]]));
    Some(
        attacks
            .iter()
            .map(|attack| attack_row(attack, ctx.labels, ctx.units()))
            .collect(),
    )
}

fn attack_row(attack: &Value, labels: &dyn Localizer, units: MeasurementSystem) -> AttackRow {
    let raw_name = text(first_of(attack, &[&["attackName"], &["name"]])).unwrap_or("Unknown Weapon");
    let table = text(first_of(
        attack,
        &[&["chart", "name"], &["attackTable"], &["chart", "key"]],
    ));
    let specialization = text(attack.get("specialization")).unwrap_or("Unknown");

    let (reach, range) = reach_and_range(attack, units);

    AttackRow {
        name: probe_label(labels, &name_keys(table, raw_name), raw_name),
        specialization: probe_label(
            labels,
            &[
                format!("RMU.Specializations.{}", key_fragment(specialization)),
                format!("RMU.Attacks.{}", key_fragment(specialization)),
            ],
            specialization,
        ),
        handed: display(attack.get("handed")).unwrap_or_default(),
        ob: format_signed_bonus(first_of(attack, &[&["totalBonus"], &["ob"]])),
        damage_type: match table {
            Some(table) => probe_label(
                labels,
                &[
                    format!("RMU.AttackTables.{}", key_fragment(table)),
                    format!("RMU.Attacks.{}", key_fragment(table)),
                ],
                table,
            ),
            None => "Unknown".to_string(),
        },
        fumble: number(first_of(attack, &[&["fumble"], &["usage", "fumble"]]))
            .unwrap_or_else(|| Number::from(0)),
        reach,
        range,
    }
}

/// Specific table entry first, then the generic attack name.
fn name_keys(table: Option<&str>, raw_name: &str) -> Vec<String> {
    let name = key_fragment(raw_name);
    let mut keys = Vec::with_capacity(2);
    if let Some(table) = table {
        keys.push(format!("RMU.AttackTables.{}.{name}", key_fragment(table)));
    }
    keys.push(format!("RMU.Attacks.{name}"));
    keys
}

/// Ranged attacks show their short range and suppress melee reach.
fn reach_and_range(attack: &Value, units: MeasurementSystem) -> (String, String) {
    let short_range = float(first_of(
        attack,
        &[&["usage", "range", "short"], &["range", "short"]],
    ))
    .filter(|v| *v > 0.0);

    if flag(attack.get("isRanged"))
        && let Some(short) = short_range
    {
        let range = distance_to_display(short, units, DistanceContext::Range);
        return (String::new(), format!("<{range}>"));
    }

    let reach = float(attack.get("meleeRange"))
        .filter(|v| *v > 0.0)
        .map(|feet| distance_to_display(feet, units, DistanceContext::Reach))
        .unwrap_or_default();
    (reach, String::new())
}
