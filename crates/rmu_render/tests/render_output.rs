use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use rmu_core::clock::FixedClock;
use rmu_core::export::WorkflowOutcome;
use rmu_core::import::{InMemoryRecord, parse_artifact, reconcile};
use rmu_core::{
    CoreErrorCode, ExportOptions, Exporter, SectionKey, SourceRecord, UnifiedDocument,
};
use rmu_render::{
    Artifact, ArtifactSink, BuiltinTemplates, ExportChoice, ExportPrompt, Format, Layout,
    RenderError, RenderServices, SheetContext, SinkError, TemplateRenderer, export_artifact,
    find_layout, run_export,
};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn fixture(name: &str) -> SourceRecord {
    let path = workspace_root().join("tests/fixtures").join(name);
    let text = std::fs::read_to_string(&path).expect("fixture should be readable");
    SourceRecord::new(serde_json::from_str(&text).expect("fixture should parse"))
}

fn services() -> RenderServices {
    let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
    RenderServices {
        exporter: Exporter::default().with_clock(Arc::new(FixedClock(at))),
        ..RenderServices::default()
    }
}

#[tokio::test]
async fn json_artifact_is_the_pretty_document() {
    let artifact = export_artifact(
        &fixture("filroden.json"),
        &services(),
        Format::Json,
        &ExportOptions::default(),
    )
    .await
    .expect("export");

    assert_eq!(artifact.filename, "Filroden_the_Bold_Sheet_2026-03-14_09-26-53.json");
    assert_eq!(artifact.mime, "application/json");
    assert!(artifact.body.contains("\n  \"header\": {"));

    let doc: UnifiedDocument = serde_json::from_str(&artifact.body).expect("valid document");
    assert_eq!(doc.subject_name(), "Filroden the Bold");
}

#[tokio::test]
async fn html_artifact_embeds_theme_sheet_and_backup() {
    let options = ExportOptions {
        theme_id: "dark".to_string(),
        ..ExportOptions::default()
    };
    let artifact = export_artifact(&fixture("filroden.json"), &services(), Format::Html, &options)
        .await
        .expect("export");

    assert_eq!(artifact.filename, "Filroden_the_Bold_Sheet_2026-03-14_09-26-53.html");
    assert_eq!(artifact.mime, "text/html");
    let html = &artifact.body;
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Filroden the Bold</title>"));
    assert!(html.contains("#f5c26b"), "dark theme should be inlined");
    assert!(html.contains(r#"data-show-skills="true""#));
    assert!(html.contains("<h2>Skills</h2>"));
    assert!(html.contains("Nature&#39;s Lore"));
    assert!(html.contains(r#"id="rmu-actor-data""#));

    let backup = parse_artifact(html).expect("backup block");
    assert_eq!(backup["name"], "Filroden the Bold");
    assert!(backup.get("_id").is_none());
    assert!(backup["system"].get("_skills").is_none());
    assert_eq!(backup["system"]["appearance"]["eyes"], "Green");
}

#[tokio::test]
async fn compact_layout_omits_skill_and_spell_lists() {
    let options = ExportOptions {
        layout_id: "compact".to_string(),
        ..ExportOptions::default()
    };
    let artifact = export_artifact(&fixture("filroden.json"), &services(), Format::Html, &options)
        .await
        .expect("export");
    assert!(artifact.body.contains(r#"data-show-spells="false""#));
    assert!(!artifact.body.contains("<strong>Skills</strong>"));
    assert!(!artifact.body.contains("<strong>Spell Lists</strong>"));
    assert!(artifact.body.contains("<h2>Attacks</h2>"));

    let json = export_artifact(&fixture("filroden.json"), &services(), Format::Json, &options)
        .await
        .expect("export");
    let value: Value = serde_json::from_str(&json.body).expect("json");
    assert!(value.get("skill_groups").is_none());
    assert!(value.get("spells").is_none());
}

#[tokio::test]
async fn unknown_theme_still_produces_a_sheet() {
    let options = ExportOptions {
        theme_id: "neon".to_string(),
        ..ExportOptions::default()
    };
    let artifact = export_artifact(&fixture("filroden.json"), &services(), Format::Html, &options)
        .await
        .expect("export");
    assert!(artifact.body.contains("/* Theme 'neon' could not be loaded: unknown theme */"));
    assert!(artifact.body.contains("<h1>Filroden the Bold</h1>"));
}

#[tokio::test]
async fn unknown_layout_is_a_render_error() {
    let options = ExportOptions {
        layout_id: "poster".to_string(),
        ..ExportOptions::default()
    };
    let err = export_artifact(&fixture("filroden.json"), &services(), Format::Html, &options)
        .await
        .expect_err("no such layout");
    assert_eq!(err.code, CoreErrorCode::Render);
}

#[tokio::test]
async fn record_text_cannot_inject_markup() {
    let record = SourceRecord::new(serde_json::json!({
        "name": "<script>alert(1)</script>",
        "type": "Character",
        "system": { "biography": "</script><img src=x onerror=alert(2)>" }
    }));
    let artifact = export_artifact(&record, &services(), Format::Html, &ExportOptions::default())
        .await
        .expect("export");

    let html = &artifact.body;
    assert!(html.contains("<h1>&lt;script&gt;alert(1)&lt;/script&gt;</h1>"));
    assert!(!html.contains("<img src=x"));
    // The only closing script tag is the backup block's own.
    assert_eq!(html.matches("</script>").count(), 1);

    let backup = parse_artifact(html).expect("backup");
    assert_eq!(backup["system"]["biography"], "</script><img src=x onerror=alert(2)>");
}

#[tokio::test]
async fn exported_sheet_imports_back_into_a_fresh_record() {
    let artifact = export_artifact(
        &fixture("filroden.json"),
        &services(),
        Format::Html,
        &ExportOptions::default(),
    )
    .await
    .expect("export");

    let target = InMemoryRecord::new(serde_json::json!({ "type": "Character", "items": [] }));
    let payload = parse_artifact(&artifact.body).expect("backup");
    let summary = reconcile(&target, payload).await.expect("import");
    assert_eq!(summary.items_created, 5);

    let restored = SourceRecord::new(target.snapshot().expect("snapshot"));
    assert_eq!(restored.name(), "Filroden the Bold");
    assert_eq!(restored.first_item_name("race"), Some("Wood Elf"));
}

struct ScriptedPrompt(Option<ExportChoice>);

#[async_trait]
impl ExportPrompt for ScriptedPrompt {
    async fn choose(
        &self,
        _record: &SourceRecord,
        layouts: &[Layout],
        sections: &[SectionKey],
    ) -> Option<ExportChoice> {
        assert_eq!(layouts.len(), 2);
        assert_eq!(sections, SectionKey::ALL.as_slice());
        self.0.clone()
    }
}

#[derive(Default)]
struct MemorySink {
    saved: Mutex<Vec<Artifact>>,
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn save(&self, artifact: &Artifact) -> Result<(), SinkError> {
        self.saved
            .lock()
            .map_err(|_| SinkError {
                filename: artifact.filename.clone(),
                reason: "poisoned".to_string(),
            })?
            .push(artifact.clone());
        Ok(())
    }
}

#[tokio::test]
async fn cancelled_dialog_saves_nothing() {
    let sink = MemorySink::default();
    let outcome = run_export(
        &fixture("filroden.json"),
        &services(),
        &ScriptedPrompt(None),
        &sink,
    )
    .await
    .expect("no error");

    assert_eq!(outcome, WorkflowOutcome::Cancelled);
    assert!(sink.saved.lock().expect("sink").is_empty());
}

#[tokio::test]
async fn submitted_dialog_saves_one_artifact() {
    let sink = MemorySink::default();
    let choice = ExportChoice {
        format: Format::Json,
        options: ExportOptions::default(),
    };
    let outcome = run_export(
        &fixture("filroden.json"),
        &services(),
        &ScriptedPrompt(Some(choice)),
        &sink,
    )
    .await
    .expect("export");

    let artifact = outcome.completed().expect("completed");
    let saved = sink.saved.lock().expect("sink");
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0], artifact);
}

#[tokio::test]
async fn creatures_are_not_offered_for_export() {
    let sink = MemorySink::default();
    let err = run_export(
        &fixture("cave_troll.json"),
        &services(),
        &ScriptedPrompt(None),
        &sink,
    )
    .await
    .expect_err("creature export refused");
    assert_eq!(err.code, CoreErrorCode::TypeMismatch);
}

#[test]
fn unknown_template_ids_are_rejected() {
    let doc: UnifiedDocument = serde_json::from_value(serde_json::json!({
        "meta": {
            "generated_at": "2026-03-14T09:26:53Z",
            "schema_version": "1",
            "exporter_version": "0.2.0",
            "system_version": "1.4.2",
            "subject": "Nobody",
            "actor_type": "Character"
        }
    }))
    .expect("minimal document");
    let layout = find_layout("standard").expect("layout");
    let ctx = SheetContext {
        document: &doc,
        layout,
    };

    assert!(matches!(
        BuiltinTemplates.render("sheet-poster", &ctx),
        Err(RenderError::UnknownTemplate(_))
    ));
    let body = BuiltinTemplates.render("sheet-standard", &ctx).expect("render");
    assert!(body.starts_with(r#"<div class="rmu-sheet layout-standard""#));
    assert!(!body.contains("<h2>"));
}
