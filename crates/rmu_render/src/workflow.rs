use std::sync::Arc;

use async_trait::async_trait;
use rmu_core::export::WorkflowOutcome;
use rmu_core::options::is_exportable;
use rmu_core::{CoreError, CoreErrorCode, ExportOptions, Exporter, SectionKey, SourceRecord};
use thiserror::Error;
use tracing::{debug, info};

use crate::layout::{LAYOUTS, Layout, find_layout};
use crate::template::{BuiltinTemplates, TemplateRenderer};
use crate::theme::{EmbeddedThemeSource, ThemeSource, resolve_theme_css};
use crate::{Artifact, Format, to_artifact};

/// What the user picked in the export dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportChoice {
    pub format: Format,
    pub options: ExportOptions,
}

#[async_trait]
pub trait ExportPrompt: Send + Sync {
    /// `sections` lists only the toggles that apply to the record's type.
    /// `None` when the dialog is closed without submitting.
    async fn choose(
        &self,
        record: &SourceRecord,
        layouts: &[Layout],
        sections: &[SectionKey],
    ) -> Option<ExportChoice>;
}

#[derive(Debug, Error)]
#[error("failed to save {filename}: {reason}")]
pub struct SinkError {
    pub filename: String,
    pub reason: String,
}

#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn save(&self, artifact: &Artifact) -> Result<(), SinkError>;
}

/// Collaborators needed to go from a record to a saved artifact.
#[derive(Clone)]
pub struct RenderServices {
    pub exporter: Exporter,
    pub themes: Arc<dyn ThemeSource>,
    pub templates: Arc<dyn TemplateRenderer>,
}

impl Default for RenderServices {
    fn default() -> Self {
        Self {
            exporter: Exporter::default(),
            themes: Arc::new(EmbeddedThemeSource),
            templates: Arc::new(BuiltinTemplates),
        }
    }
}

/// Builds and serializes one export without any dialog.
pub async fn export_artifact(
    record: &SourceRecord,
    services: &RenderServices,
    format: Format,
    options: &ExportOptions,
) -> Result<Artifact, CoreError> {
    let layout = find_layout(&options.layout_id)?;
    let options = layout.constrain(options);
    let document = services.exporter.build_document(record, &options).await;

    let css = match format {
        Format::Html => resolve_theme_css(services.themes.as_ref(), &options.theme_id).await,
        Format::Json => String::new(),
    };
    let artifact = to_artifact(
        &document,
        record,
        format,
        layout,
        &css,
        services.templates.as_ref(),
    )?;
    debug!(filename = artifact.filename.as_str(), bytes = artifact.body.len(), "artifact assembled");
    Ok(artifact)
}

/// Prompt, build, assemble, save. Closing the prompt produces nothing.
pub async fn run_export(
    record: &SourceRecord,
    services: &RenderServices,
    prompt: &dyn ExportPrompt,
    sink: &dyn ArtifactSink,
) -> Result<WorkflowOutcome<Artifact>, CoreError> {
    if !is_exportable(record.actor_type()) {
        return Err(CoreError::new(
            CoreErrorCode::TypeMismatch,
            format!("'{}' records cannot be exported", record.actor_type()),
        ));
    }

    let sections = ExportOptions::available_sections(record.actor_type());
    let Some(choice) = prompt.choose(record, &LAYOUTS, &sections).await else {
        debug!(subject = record.name(), "export cancelled");
        return Ok(WorkflowOutcome::Cancelled);
    };

    let artifact = export_artifact(record, services, choice.format, &choice.options).await?;
    sink.save(&artifact)
        .await
        .map_err(|err| CoreError::new(CoreErrorCode::Io, err.to_string()))?;

    info!(filename = artifact.filename.as_str(), "sheet exported");
    Ok(WorkflowOutcome::Completed(artifact))
}
