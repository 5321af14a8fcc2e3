use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Actor types that offer the export affordance (compared case-insensitively).
pub const EXPORTABLE_TYPES: [&str; 1] = ["character"];

pub fn is_exportable(actor_type: &str) -> bool {
    EXPORTABLE_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(actor_type))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Header,
    QuickInfo,
    Stats,
    Resistances,
    Defenses,
    Attacks,
    Talents,
    Skills,
    Spells,
    Inventory,
    Details,
}

impl SectionKey {
    pub const ALL: [SectionKey; 11] = [
        Self::Header,
        Self::QuickInfo,
        Self::Stats,
        Self::Resistances,
        Self::Defenses,
        Self::Attacks,
        Self::Talents,
        Self::Skills,
        Self::Spells,
        Self::Inventory,
        Self::Details,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::QuickInfo => "quick_info",
            Self::Stats => "stats",
            Self::Resistances => "resistances",
            Self::Defenses => "defenses",
            Self::Attacks => "attacks",
            Self::Talents => "talents",
            Self::Skills => "skills",
            Self::Spells => "spells",
            Self::Inventory => "inventory",
            Self::Details => "details",
        }
    }

    /// Whether an actor of `actor_type` carries the data this section reads.
    pub fn supports(&self, actor_type: &str) -> bool {
        match actor_type {
            "Character" | "character" => true,
            "Creature" | "creature" => {
                !matches!(self, Self::Talents | Self::Inventory | Self::Details)
            }
            _ => matches!(self, Self::Header),
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| format!("unknown section '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementSystem {
    #[default]
    Imperial,
    Metric,
}

impl FromStr for MeasurementSystem {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "imperial" | "imp" | "ft" => Ok(Self::Imperial),
            "metric" | "si" | "m" => Ok(Self::Metric),
            other => Err(format!("unknown measurement system '{other}'")),
        }
    }
}

/// Per-request export configuration. Built once from user input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub show_all_skills: bool,
    /// Explicit toggles; sections not listed are enabled.
    pub section_enabled: BTreeMap<SectionKey, bool>,
    pub measurement_system: MeasurementSystem,
    pub include_portrait: bool,
    pub layout_id: String,
    pub theme_id: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            show_all_skills: false,
            section_enabled: BTreeMap::new(),
            measurement_system: MeasurementSystem::default(),
            include_portrait: false,
            layout_id: "standard".to_string(),
            theme_id: "classic".to_string(),
        }
    }
}

impl ExportOptions {
    pub fn with_section(mut self, key: SectionKey, enabled: bool) -> Self {
        self.section_enabled.insert(key, enabled);
        self
    }

    pub fn is_enabled(&self, key: SectionKey, actor_type: &str) -> bool {
        let toggled = self.section_enabled.get(&key).copied().unwrap_or(true);
        toggled && key.supports(actor_type)
    }

    /// Sections a user may toggle for this actor type.
    pub fn available_sections(actor_type: &str) -> Vec<SectionKey> {
        SectionKey::ALL
            .into_iter()
            .filter(|key| key.supports(actor_type))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_characters_are_exportable() {
        assert!(is_exportable("Character"));
        assert!(is_exportable("character"));
        assert!(!is_exportable("Creature"));
        assert!(!is_exportable(""));
    }

    #[test]
    fn toggles_are_constrained_by_actor_type() {
        let options = ExportOptions::default().with_section(SectionKey::Spells, false);
        assert!(!options.is_enabled(SectionKey::Spells, "Character"));
        assert!(options.is_enabled(SectionKey::Skills, "Character"));
        assert!(!options.is_enabled(SectionKey::Inventory, "Creature"));
        assert!(options.is_enabled(SectionKey::Header, "Vehicle"));
        assert!(!options.is_enabled(SectionKey::Stats, "Vehicle"));
    }

    #[test]
    fn creatures_are_offered_fewer_toggles() {
        assert_eq!(ExportOptions::available_sections("Character"), SectionKey::ALL.to_vec());
        let creature = ExportOptions::available_sections("Creature");
        assert_eq!(creature.len(), 8);
        assert!(!creature.contains(&SectionKey::Talents));
        assert_eq!(ExportOptions::available_sections("Vehicle"), vec![SectionKey::Header]);
    }

    #[test]
    fn section_keys_parse_with_dashes() {
        assert_eq!("quick-info".parse::<SectionKey>(), Ok(SectionKey::QuickInfo));
        assert!("armor".parse::<SectionKey>().is_err());
    }
}
