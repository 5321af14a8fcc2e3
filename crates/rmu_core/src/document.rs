//! Presentation-ready sheet document.
//!
//! `UnifiedDocument` is the only thing the renderers see. Every field is a
//! display value; nothing here points back into the source record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::format::Bonus;

pub const SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_info: Option<QuickInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Vec<StatRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resistances: Option<Vec<ResistanceRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defenses: Option<Defenses>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attacks: Option<Vec<AttackRow>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub talents: Option<Vec<TalentGroup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_groups: Option<Vec<SkillGroup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spells: Option<Vec<SpellGroup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Inventory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
    pub meta: Meta,
}

impl UnifiedDocument {
    /// Subject name for titles and filenames.
    pub fn subject_name(&self) -> &str {
        self.header
            .as_ref()
            .map(|h| h.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(self.meta.subject.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub generated_at: DateTime<Utc>,
    pub schema_version: String,
    pub exporter_version: String,
    pub system_version: String,
    pub subject: String,
    pub actor_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub race: String,
    pub culture: String,
    pub profession: String,
    pub level: Number,
    pub realm: String,
    pub size: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portrait: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub current: Number,
    pub max: Number,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuickInfo {
    pub bmr_value: String,
    pub bmr_mode: String,
    pub initiative: Bonus,
    pub hits: Pool,
    pub endurance_physical: Bonus,
    pub endurance_mental: Bonus,
    pub power: Pool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    pub label: String,
    pub name: String,
    pub bonus: Bonus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResistanceRow {
    pub label: String,
    pub bonus: Bonus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefenseRow {
    pub mode: String,
    pub dodge: Bonus,
    pub block: Bonus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorPiece {
    pub name: String,
    pub at: Number,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorSet {
    pub head: ArmorPiece,
    pub torso: ArmorPiece,
    pub arms: ArmorPiece,
    pub legs: ArmorPiece,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defenses {
    pub quickness_bonus: Bonus,
    pub armor_db: Bonus,
    pub other_db: Bonus,
    pub shield_bonus: Bonus,
    pub total_db_current: Bonus,
    pub tactical: Vec<DefenseRow>,
    pub armor: ArmorSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackRow {
    pub name: String,
    pub specialization: String,
    pub handed: String,
    pub ob: Bonus,
    pub damage_type: String,
    pub fumble: Number,
    pub reach: String,
    pub range: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentEntry {
    pub name: String,
    pub tier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentGroup {
    pub group: String,
    pub entries: Vec<TalentEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub name: String,
    pub specialisation: String,
    pub ranks: Number,
    pub bonus: Bonus,
    pub favorite: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGroup {
    pub category: String,
    pub label: String,
    pub list: Vec<SkillEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellEntry {
    pub name: String,
    pub level: Number,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpellGroup {
    pub list_type: String,
    pub list_name: String,
    pub spells: Vec<SpellEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub qty: Number,
    pub weight: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub weight_allowance: String,
    pub weight_carried: String,
    pub enc_penalty: Number,
    pub max_pace: String,
    pub items: Vec<InventoryItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Details {
    pub age: String,
    pub gender: String,
    pub height: String,
    pub weight: String,
    pub hair: String,
    pub eyes: String,
    pub skin: String,
    pub faith: String,
    pub biography: String,
}
