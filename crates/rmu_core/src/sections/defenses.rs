use serde_json::{Number, Value};

use super::ExtractContext;
use crate::document::{ArmorPiece, ArmorSet, DefenseRow, Defenses};
use crate::format::{Bonus, format_signed_bonus};
use crate::i18n::resolve_label;
use crate::options::SectionKey;
use crate::source::{NULL, array, at, first_of, float, number, text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefenseMode {
    Passive,
    Partial,
    Full,
}

impl DefenseMode {
    pub const ALL: [DefenseMode; 3] = [Self::Passive, Self::Partial, Self::Full];

    /// Option value the rules engine uses for this mode.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Passive => "passive",
            Self::Partial => "partial",
            Self::Full => "full",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Passive => "Passive",
            Self::Partial => "Partial",
            Self::Full => "Full",
        }
    }
}

/// Dodge and block `{value, modifier}` option lists for one actor.
#[derive(Debug, Clone, Copy)]
pub struct ModifierSets<'a> {
    pub dodge: &'a [Value],
    pub block: &'a [Value],
}

impl ModifierSets<'_> {
    fn dodge(&self, mode: DefenseMode) -> f64 {
        modifier(self.dodge, mode)
    }

    fn block(&self, mode: DefenseMode) -> f64 {
        modifier(self.block, mode)
    }
}

fn modifier(options: &[Value], mode: DefenseMode) -> f64 {
    options
        .iter()
        .find(|option| text(option.get("value")) == Some(mode.key()))
        .and_then(|option| float(option.get("modifier")))
        .unwrap_or(0.0)
}

/// Dodge and block totals for one defensive mode.
///
/// Active modes (partial, full) also receive the passive modifier of the
/// other style: dodging gains the passive block bonus and vice versa.
pub fn mode_totals(
    base_total: f64,
    shield_bonus: f64,
    sets: &ModifierSets<'_>,
    mode: DefenseMode,
) -> (f64, f64) {
    let mut dodge = base_total + sets.dodge(mode);
    let mut block = base_total + sets.block(mode) + shield_bonus;

    if mode != DefenseMode::Passive {
        dodge += sets.block(DefenseMode::Passive);
        block += sets.dodge(DefenseMode::Passive);
    }

    (dodge, block)
}

pub fn extract(ctx: &ExtractContext<'_>) -> Option<Defenses> {
    if !ctx.enabled(SectionKey::Defenses) {
        return None;
    }

    let sys = ctx.system();
    let db_block = sys.get("_dbBlock").unwrap_or(&NULL);

    let quickness_db = first_of(db_block, &[&["quicknessDB"], &["quickness"]]);
    let armor_db = first_of(db_block, &[&["armorDB"], &["armor"]]);
    let other_db = first_of(sys, &[&["defense", "other"], &["defenses", "other"]]);
    let shield = first_of(
        sys,
        &[&["defenses", "shield", "bonus"], &["defense", "shield", "bonus"]],
    );

    let base_total = [quickness_db, armor_db, other_db]
        .into_iter()
        .map(|v| float(v).unwrap_or(0.0))
        .sum::<f64>();
    let shield_bonus = float(shield).unwrap_or(0.0);

    // The live block wins; the derivation snapshot covers lazily computed options.
    let dodge = live_or_snapshot(db_block, "dodgeOptions", ctx.derived.dodge_options.as_ref());
    let block = live_or_snapshot(db_block, "blockOptions", ctx.derived.block_options.as_ref());
    let sets = ModifierSets { dodge, block };

    let tactical = DefenseMode::ALL
        .iter()
        .map(|&mode| {
            let (dodge, block) = mode_totals(base_total, shield_bonus, &sets, mode);
            DefenseRow {
                mode: resolve_label(
                    ctx.labels,
                    &format!("RMU.DefenseMode.{}", mode.label()),
                    mode.label(),
                ),
                dodge: Bonus::from_f64(dodge),
                block: Bonus::from_f64(block),
            }
        })
        .collect();

    Some(Defenses {
        quickness_bonus: format_signed_bonus(quickness_db),
        armor_db: format_signed_bonus(armor_db),
        other_db: format_signed_bonus(other_db),
        shield_bonus: format_signed_bonus(shield),
        total_db_current: format_signed_bonus(first_of(db_block, &[&["totalDB"], &["total"]])),
        tactical,
        armor: ArmorSet {
            head: armor_piece(sys, "Head"),
            torso: armor_piece(sys, "Torso"),
            arms: armor_piece(sys, "Arms"),
            legs: armor_piece(sys, "Legs"),
        },
    })
}

fn live_or_snapshot<'a>(db_block: &'a Value, key: &str, snapshot: Option<&'a Value>) -> &'a [Value] {
    match at(db_block, &[key]) {
        Some(live) if live.is_array() => array(Some(live)),
        _ => array(snapshot),
    }
}

fn armor_piece(sys: &Value, location: &str) -> ArmorPiece {
    let Some(part) = at(sys, &["_armorWorn", location]) else {
        return ArmorPiece {
            name: "Unknown".to_string(),
            at: Number::from(0),
        };
    };
    ArmorPiece {
        name: text(first_of(
            part,
            &[&["piece", "_base", "material"], &["piece", "name"], &["name"]],
        ))
        .unwrap_or("Unknown")
        .to_string(),
        at: number(first_of(part, &[&["AT"], &["at"]])).unwrap_or_else(|| Number::from(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(passive: i64, partial: i64, full: i64) -> Vec<Value> {
        vec![
            json!({ "value": "passive", "modifier": passive }),
            json!({ "value": "partial", "modifier": partial }),
            json!({ "value": "full", "modifier": full }),
        ]
    }

    #[test]
    fn full_mode_cross_adds_other_passive() {
        let dodge = options(5, 0, 8);
        let block = options(3, 0, 6);
        let sets = ModifierSets {
            dodge: &dodge,
            block: &block,
        };
        let (d, b) = mode_totals(10.0, 2.0, &sets, DefenseMode::Full);
        // dodge: 10 + 8 + passive block 3; block: 10 + 6 + shield 2 + passive dodge 5
        assert_eq!(d, 21.0);
        assert_eq!(b, 23.0);
    }

    #[test]
    fn passive_mode_has_no_cross_add() {
        let dodge = options(5, 0, 8);
        let block = options(3, 0, 6);
        let sets = ModifierSets {
            dodge: &dodge,
            block: &block,
        };
        assert_eq!(mode_totals(10.0, 2.0, &sets, DefenseMode::Passive), (15.0, 15.0));
    }

    #[test]
    fn missing_options_contribute_nothing() {
        let sets = ModifierSets {
            dodge: &[],
            block: &[],
        };
        assert_eq!(mode_totals(4.0, 1.0, &sets, DefenseMode::Partial), (4.0, 5.0));
    }
}
