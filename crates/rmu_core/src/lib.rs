pub mod clock;
pub mod document;
pub mod error;
pub mod export;
pub mod format;
pub mod i18n;
pub mod import;
pub mod options;
pub mod sections;
pub mod source;
pub mod units;

pub use document::{Meta, UnifiedDocument};
pub use error::{CoreError, CoreErrorCode};
pub use export::{Exporter, HostInfo, WorkflowOutcome};
pub use format::Bonus;
pub use options::{ExportOptions, MeasurementSystem, SectionKey};
pub use source::SourceRecord;
