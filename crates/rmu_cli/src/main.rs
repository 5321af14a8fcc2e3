mod host;

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use rmu_core::clock::SystemClock;
use rmu_core::export::{AssetFetcher, NoAssets, NullRulesEngine};
use rmu_core::i18n::{JsonLocalizer, Localizer, RawLabels};
use rmu_core::import::{InMemoryRecord, run_import};
use rmu_core::options::is_exportable;
use rmu_core::{
    ExportOptions, Exporter, HostInfo, MeasurementSystem, SectionKey, SourceRecord,
    WorkflowOutcome,
};
use rmu_render::{
    BuiltinTemplates, EmbeddedThemeSource, ExportChoice, Format, FsThemeSource, RenderServices,
    ThemeSource, export_artifact, find_layout, run_export,
};
use serde_json::{Value as JsonValue, json};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::host::{DirectorySink, FsAssetFetcher, PresetChoice, SheetFile};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render an actor as a JSON document or a self-contained HTML sheet.
    Export(ExportArgs),
    /// Overwrite an actor with the data embedded in an exported HTML sheet.
    Import(ImportArgs),
}

#[derive(Debug, Args)]
struct ExportArgs {
    #[arg(value_name = "ACTOR.json")]
    path: PathBuf,
    #[arg(long, value_name = "json|html", default_value = "html", value_parser = parse_format)]
    format: Format,
    #[arg(long, default_value = "standard")]
    layout: String,
    #[arg(long, default_value = "classic")]
    theme: String,
    #[arg(long = "all-skills")]
    all_skills: bool,
    #[arg(
        long,
        env = "RMU_SHEET_UNITS",
        value_name = "imperial|metric",
        default_value = "imperial",
        value_parser = parse_units
    )]
    units: MeasurementSystem,
    #[arg(long = "disable", value_name = "SECTION", value_parser = parse_section)]
    disabled: Vec<SectionKey>,
    #[arg(long, env = "RMU_SHEET_LANG", value_name = "LANG.json")]
    lang: Option<PathBuf>,
    #[arg(long = "portrait-root", value_name = "DIR")]
    portrait_root: Option<PathBuf>,
    #[arg(long = "theme-dir", env = "RMU_SHEET_THEME_DIR", value_name = "DIR")]
    theme_dir: Option<PathBuf>,
    #[arg(long = "system-version", default_value = "Unknown")]
    system_version: String,
    #[arg(long = "out-dir", default_value = ".", conflicts_with = "stdout")]
    out_dir: PathBuf,
    #[arg(long)]
    stdout: bool,
}

#[derive(Debug, Args)]
struct ImportArgs {
    #[arg(value_name = "ACTOR.json")]
    target: PathBuf,
    #[arg(value_name = "SHEET.html")]
    sheet: PathBuf,
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    json: bool,
}

fn parse_format(value: &str) -> Result<Format, String> {
    value.parse()
}

fn parse_units(value: &str) -> Result<MeasurementSystem, String> {
    value.parse()
}

fn parse_section(value: &str) -> Result<SectionKey, String> {
    value.parse()
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn read_json(path: &Path, what: &str) -> JsonValue {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            process::exit(1);
        }
    };
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error parsing {what}: {}", path.display());
            eprintln!("  {e}");
            process::exit(1);
        }
    }
}

fn load_labels(path: Option<&Path>) -> Arc<dyn Localizer> {
    match path {
        Some(path) => {
            let labels = JsonLocalizer::from_value(&read_json(path, "language file"));
            debug!(entries = labels.len(), path = %path.display(), "loaded labels");
            Arc::new(labels)
        }
        None => Arc::new(RawLabels),
    }
}

fn build_services(args: &ExportArgs) -> RenderServices {
    let assets: Arc<dyn AssetFetcher> = match &args.portrait_root {
        Some(root) => Arc::new(FsAssetFetcher::new(root)),
        None => Arc::new(NoAssets),
    };
    let themes: Arc<dyn ThemeSource> = match &args.theme_dir {
        Some(dir) => Arc::new(FsThemeSource::new(dir)),
        None => Arc::new(EmbeddedThemeSource),
    };
    let exporter = Exporter::new(
        Arc::new(NullRulesEngine),
        assets,
        load_labels(args.lang.as_deref()),
        Arc::new(SystemClock),
    )
    .with_host(HostInfo {
        system_version: args.system_version.clone(),
        ..HostInfo::default()
    });

    RenderServices {
        exporter,
        themes,
        templates: Arc::new(BuiltinTemplates),
    }
}

fn export_options(args: &ExportArgs) -> ExportOptions {
    let options = ExportOptions {
        show_all_skills: args.all_skills,
        measurement_system: args.units,
        include_portrait: args.portrait_root.is_some(),
        layout_id: args.layout.clone(),
        theme_id: args.theme.clone(),
        ..ExportOptions::default()
    };
    args.disabled
        .iter()
        .fold(options, |options, key| options.with_section(*key, false))
}

async fn export(args: ExportArgs) {
    if let Err(e) = find_layout(&args.layout) {
        eprintln!("{e}");
        process::exit(2);
    }

    let record = SourceRecord::new(read_json(&args.path, "actor file"));
    if !is_exportable(record.actor_type()) {
        eprintln!(
            "'{}' actors cannot be exported; only characters have sheets",
            record.actor_type()
        );
        process::exit(2);
    }

    let services = build_services(&args);
    let options = export_options(&args);

    if args.stdout {
        match export_artifact(&record, &services, args.format, &options).await {
            Ok(artifact) => println!("{}", artifact.body),
            Err(e) => {
                eprintln!("Error exporting {}: {}", args.path.display(), e.message);
                process::exit(1);
            }
        }
        return;
    }

    let sink = DirectorySink::new(&args.out_dir);
    let prompt = PresetChoice(ExportChoice {
        format: args.format,
        options,
    });
    match run_export(&record, &services, &prompt, &sink).await {
        Ok(WorkflowOutcome::Completed(artifact)) => {
            println!("{}", sink.path_for(&artifact).display());
        }
        Ok(WorkflowOutcome::Cancelled) => {}
        Err(e) => {
            eprintln!("Error exporting {}: {}", args.path.display(), e.message);
            process::exit(1);
        }
    }
}

async fn import(args: ImportArgs) {
    let store = InMemoryRecord::new(read_json(&args.target, "actor file"));
    let html = match fs::read_to_string(&args.sheet) {
        Ok(html) => html,
        Err(e) => {
            eprintln!("Error reading {}: {e}", args.sheet.display());
            process::exit(1);
        }
    };

    let summary = match run_import(&store, &SheetFile(html)).await {
        Ok(WorkflowOutcome::Completed(summary)) => summary,
        Ok(WorkflowOutcome::Cancelled) => return,
        Err(e) => {
            eprintln!("Error importing {}: {}", args.sheet.display(), e.message);
            process::exit(1);
        }
    };

    let updated = match store.snapshot() {
        Ok(value) => value,
        Err(e) => {
            eprintln!("Error reading imported actor: {e}");
            process::exit(1);
        }
    };
    let text = match serde_json::to_string_pretty(&updated) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        }
    };
    let out_path = args.output.as_ref().unwrap_or(&args.target);
    if let Err(e) = fs::write(out_path, text) {
        eprintln!("Error writing {}: {e}", out_path.display());
        process::exit(1);
    }

    if args.json {
        let report = json!({
            "output": out_path.display().to_string(),
            "items_deleted": summary.items_deleted,
            "effects_deleted": summary.effects_deleted,
            "items_created": summary.items_created,
            "effects_created": summary.effects_created,
        });
        println!("{report}");
    } else {
        println!("output={}", out_path.display());
        println!("items_deleted={}", summary.items_deleted);
        println!("effects_deleted={}", summary.effects_deleted);
        println!("items_created={}", summary.items_created);
        println!("effects_created={}", summary.effects_created);
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Export(args) => export(args).await,
        Command::Import(args) => import(args).await,
    }
}
