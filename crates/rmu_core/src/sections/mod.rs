//! One extractor per sheet section.
//!
//! Each `extract` returns `None` when the section is switched off or the actor
//! type has no such data, and otherwise always produces a value: absent source
//! sub-trees become zero/empty defaults, never errors.

pub mod attacks;
pub mod defenses;
pub mod details;
pub mod header;
pub mod inventory;
pub mod quick_info;
pub mod resistances;
pub mod skills;
pub mod spells;
pub mod stats;
pub mod talents;

use serde_json::Value;

use crate::i18n::Localizer;
use crate::options::{ExportOptions, MeasurementSystem, SectionKey};
use crate::source::SourceRecord;

/// Values the rules engine computed during derivation that the settled record
/// may not expose directly (its defensive options are lazy getters).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DerivedSnapshots {
    pub dodge_options: Option<Value>,
    pub block_options: Option<Value>,
}

pub struct ExtractContext<'a> {
    pub record: &'a SourceRecord,
    pub options: &'a ExportOptions,
    pub labels: &'a dyn Localizer,
    pub derived: &'a DerivedSnapshots,
}

impl<'a> ExtractContext<'a> {
    pub fn enabled(&self, key: SectionKey) -> bool {
        self.options.is_enabled(key, self.record.actor_type())
    }

    pub fn system(&self) -> &'a Value {
        self.record.system()
    }

    pub fn units(&self) -> MeasurementSystem {
        self.options.measurement_system
    }
}
