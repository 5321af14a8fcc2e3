use rmu_core::{ExportOptions, SectionKey};

use crate::error::RenderError;

/// A selectable sheet layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub id: &'static str,
    pub label: &'static str,
    pub template_id: &'static str,
    pub show_skills: bool,
    pub show_spells: bool,
}

pub const LAYOUTS: [Layout; 2] = [
    Layout {
        id: "standard",
        label: "Standard Sheet",
        template_id: "sheet-standard",
        show_skills: true,
        show_spells: true,
    },
    Layout {
        id: "compact",
        label: "Compact Summary",
        template_id: "sheet-compact",
        show_skills: false,
        show_spells: false,
    },
];

pub fn find_layout(id: &str) -> Result<&'static Layout, RenderError> {
    LAYOUTS
        .iter()
        .find(|layout| layout.id.eq_ignore_ascii_case(id))
        .ok_or_else(|| RenderError::UnknownLayout(id.to_string()))
}

impl Layout {
    /// Options with the sections this layout has no room for switched off.
    pub fn constrain(&self, options: &ExportOptions) -> ExportOptions {
        let mut constrained = options.clone();
        if !self.show_skills {
            constrained.section_enabled.insert(SectionKey::Skills, false);
        }
        if !self.show_spells {
            constrained.section_enabled.insert(SectionKey::Spells, false);
        }
        constrained
    }
}
