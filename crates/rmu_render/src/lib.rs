pub mod backup;
pub mod error;
pub mod filename;
pub mod layout;
pub mod template;
pub mod theme;
pub mod workflow;

use std::fmt::Write as _;
use std::str::FromStr;

use rmu_core::{SourceRecord, UnifiedDocument};

pub use error::RenderError;
pub use layout::{LAYOUTS, Layout, find_layout};
pub use template::{BuiltinTemplates, SheetContext, TemplateRenderer};
pub use theme::{EmbeddedThemeSource, FsThemeSource, ThemeSource, resolve_theme_css};
pub use workflow::{
    ArtifactSink, ExportChoice, ExportPrompt, RenderServices, SinkError, export_artifact, run_export,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    Json,
    #[default]
    Html,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Html => "html",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Html => "text/html",
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "html" | "htm" => Ok(Self::Html),
            other => Err(format!("unknown format '{other}'")),
        }
    }
}

/// A finished export, ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub mime: &'static str,
    pub body: String,
}

/// Pretty-printed document, keys in section order.
pub fn render_json(document: &UnifiedDocument) -> Result<String, RenderError> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Full HTML page: theme inlined, sheet body from the layout's template, and
/// the backup block for later import.
pub fn assemble_html(
    document: &UnifiedDocument,
    record: &SourceRecord,
    layout: &Layout,
    css: &str,
    templates: &dyn TemplateRenderer,
) -> Result<String, RenderError> {
    let body = templates.render(layout.template_id, &SheetContext { document, layout })?;
    let backup = backup::backup_script(record.as_value())?;

    let mut out = String::with_capacity(body.len() + backup.len() + css.len() + 512);
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, r#"<html lang="en">"#)?;
    writeln!(out, "<head>")?;
    writeln!(out, r#"<meta charset="utf-8">"#)?;
    writeln!(out, r#"<meta name="generator" content="rmu-sheet-export {}">"#, template::Esc(&document.meta.exporter_version))?;
    writeln!(out, "<title>{}</title>", template::Esc(document.subject_name()))?;
    writeln!(out, "<style>\n{}\n</style>", css.replace("</", "<\\/"))?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    out.push_str(&body);
    writeln!(out, "{backup}")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;
    Ok(out)
}

/// Serializes `document` in `format`.
///
/// The filename is stamped with the document's own generation time, so the
/// same document always yields the same artifact.
pub fn to_artifact(
    document: &UnifiedDocument,
    record: &SourceRecord,
    format: Format,
    layout: &Layout,
    css: &str,
    templates: &dyn TemplateRenderer,
) -> Result<Artifact, RenderError> {
    let body = match format {
        Format::Json => render_json(document)?,
        Format::Html => assemble_html(document, record, layout, css, templates)?,
    };
    Ok(Artifact {
        filename: filename::artifact_filename(
            document.subject_name(),
            document.meta.generated_at,
            format.extension(),
        ),
        mime: format.mime(),
        body,
    })
}
