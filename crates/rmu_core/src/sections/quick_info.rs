use serde_json::{Number, Value};

use super::ExtractContext;
use crate::document::{Pool, QuickInfo};
use crate::format::format_signed_bonus;
use crate::i18n::{key_fragment, resolve_label};
use crate::options::SectionKey;
use crate::source::{array, at, first_of, measure, number, text};
use crate::units::{DistanceContext, distance_to_display};

const DEFAULT_MOVEMENT_MODE: &str = "Running";
const BASE_PACE: &str = "Walk";

pub fn extract(ctx: &ExtractContext<'_>) -> Option<QuickInfo> {
    if !ctx.enabled(SectionKey::QuickInfo) {
        return None;
    }

    let sys = ctx.system();
    let mode = text(sys.get("activeMovementName")).unwrap_or(DEFAULT_MOVEMENT_MODE);
    let bmr = base_movement_rate(sys, mode);

    Some(QuickInfo {
        bmr_value: format!(
            "{}/rd",
            distance_to_display(bmr, ctx.units(), DistanceContext::Movement)
        ),
        bmr_mode: resolve_label(
            ctx.labels,
            &format!("RMU.MovementMode.{}", key_fragment(mode)),
            mode,
        ),
        initiative: format_signed_bonus(first_of(
            sys,
            &[&["_totalInitiativeBonus"], &["initiative", "bonus"]],
        )),
        hits: pool(sys, "hp"),
        endurance_physical: format_signed_bonus(first_of(
            sys,
            &[
                &["_injuryBlock", "_endurance", "_bonusWithRacial"],
                &["_injuryBlock", "_endurance", "bonus"],
            ],
        )),
        endurance_mental: format_signed_bonus(first_of(
            sys,
            &[
                &["_injuryBlock", "_concentration", "_bonusWithRacial"],
                &["_injuryBlock", "_concentration", "bonus"],
            ],
        )),
        power: pool(sys, "power"),
    })
}

/// Per-round distance of the Walk pace in the active movement mode's table.
fn base_movement_rate(sys: &Value, mode: &str) -> f64 {
    let rates = array(at(sys, &["_movementBlock", "_table", mode, "paceRates"]));
    rates
        .iter()
        .find(|rate| {
            text(first_of(rate, &[&["pace", "value"], &["pace"]])) == Some(BASE_PACE)
        })
        .map(|rate| measure(rate.get("perRound")))
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn pool(sys: &Value, key: &str) -> Pool {
    Pool {
        current: number(at(sys, &["health", key, "value"])).unwrap_or_else(|| Number::from(0)),
        max: number(at(sys, &["health", key, "max"])).unwrap_or_else(|| Number::from(0)),
    }
}
