//! Extraction orchestration.
//!
//! `Exporter` settles the source record through the rules engine, runs every
//! enabled section extractor against it, and wraps the result in a
//! `UnifiedDocument`. Nothing in here fails the export: derivation and portrait
//! problems are logged and the document is built from whatever is available.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::document::{Meta, SCHEMA_VERSION, UnifiedDocument};
use crate::i18n::{Localizer, RawLabels};
use crate::options::ExportOptions;
use crate::sections::{self, DerivedSnapshots, ExtractContext};
use crate::source::{SourceRecord, flag, text};

/// Portrait path the host uses when an actor has no image of its own.
pub const PLACEHOLDER_PORTRAIT: &str = "icons/svg/mystery-man.svg";

/// Result of a dialog-driven workflow. Cancelling is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowOutcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> WorkflowOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Cancelled => None,
        }
    }
}

/// Versions stamped into `meta`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub system_version: String,
    pub exporter_version: String,
}

impl Default for HostInfo {
    fn default() -> Self {
        Self {
            system_version: "Unknown".to_string(),
            exporter_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DerivationError {
    #[error("rules engine has no derivation entry point")]
    Unavailable,
    #[error("derivation failed: {0}")]
    Failed(String),
}

/// Record after derivation, plus values the engine computed on the side.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub record: SourceRecord,
    pub snapshots: DerivedSnapshots,
}

/// The host rules engine that fills in derived fields (totals, skill tree,
/// attack table) on a raw actor record.
#[async_trait]
pub trait RulesEngine: Send + Sync {
    /// A live token-like context already bound to the record, if one exists.
    async fn active_token(&self, record: &SourceRecord) -> Option<Value>;

    /// Runs the engine's full derivation through `token`.
    async fn derive(
        &self,
        record: &SourceRecord,
        token: &Value,
    ) -> Result<Derivation, DerivationError>;

    /// Standard data preparation, used when full derivation is unavailable.
    async fn prepare_defaults(&self, record: &SourceRecord)
    -> Result<SourceRecord, DerivationError>;
}

/// Engine for records that were exported already settled: no tokens, no
/// derivation, preparation is the identity.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRulesEngine;

#[async_trait]
impl RulesEngine for NullRulesEngine {
    async fn active_token(&self, _record: &SourceRecord) -> Option<Value> {
        None
    }

    async fn derive(
        &self,
        _record: &SourceRecord,
        _token: &Value,
    ) -> Result<Derivation, DerivationError> {
        Err(DerivationError::Unavailable)
    }

    async fn prepare_defaults(
        &self,
        record: &SourceRecord,
    ) -> Result<SourceRecord, DerivationError> {
        Ok(record.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("failed to fetch asset {path}: {reason}")]
    Failed { path: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Asset {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Asset, FetchError>;
}

/// Fetcher with nothing to serve.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAssets;

#[async_trait]
impl AssetFetcher for NoAssets {
    async fn fetch(&self, path: &str) -> Result<Asset, FetchError> {
        Err(FetchError::NotFound(path.to_string()))
    }
}

/// MIME type from a path's extension; unknown extensions are opaque bytes.
pub fn mime_for_path(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Token data for a one-off context built from the record's prototype.
///
/// `None` when the record carries no prototype to build from.
pub fn ephemeral_token(record: &SourceRecord) -> Option<Value> {
    let Value::Object(prototype) = record.as_value().get("prototypeToken")? else {
        return None;
    };
    let mut token: Map<String, Value> = prototype.clone();
    if let Some(id) = record.id() {
        token.insert("actorId".to_string(), Value::String(id.to_string()));
    }
    token.insert("actorLink".to_string(), Value::Bool(true));
    Some(Value::Object(token))
}

/// Brings `record` to a settled state before any extractor reads it.
///
/// Order: skip if the engine already marked the record initialised; derive
/// through a live token, else through an ephemeral one; on failure prepare
/// with defaults; on failure of that too, use the raw record.
pub async fn ensure_derived(
    engine: &dyn RulesEngine,
    record: &SourceRecord,
) -> (SourceRecord, DerivedSnapshots) {
    if flag(record.system().get("_hudInitialized")) {
        debug!(subject = record.name(), "record already derived");
        return (record.clone(), DerivedSnapshots::default());
    }

    let token = match engine.active_token(record).await {
        Some(token) => Some(token),
        None => {
            let token = ephemeral_token(record);
            if token.is_none() {
                warn!(subject = record.name(), "no prototype token to derive through");
            }
            token
        }
    };

    if let Some(token) = token {
        match engine.derive(record, &token).await {
            Ok(derivation) => return (derivation.record, derivation.snapshots),
            Err(DerivationError::Unavailable) => {
                debug!(subject = record.name(), "derivation unavailable");
            }
            Err(err) => warn!(subject = record.name(), error = %err, "derivation failed"),
        }
    }

    match engine.prepare_defaults(record).await {
        Ok(prepared) => (prepared, DerivedSnapshots::default()),
        Err(err) => {
            warn!(
                subject = record.name(),
                error = %err,
                "default preparation failed; extracting from raw record"
            );
            (record.clone(), DerivedSnapshots::default())
        }
    }
}

/// Builds `UnifiedDocument`s. Collaborators are shared so one exporter can
/// serve many requests.
#[derive(Clone)]
pub struct Exporter {
    engine: Arc<dyn RulesEngine>,
    assets: Arc<dyn AssetFetcher>,
    labels: Arc<dyn Localizer>,
    clock: Arc<dyn Clock>,
    host: HostInfo,
}

impl Default for Exporter {
    fn default() -> Self {
        Self {
            engine: Arc::new(NullRulesEngine),
            assets: Arc::new(NoAssets),
            labels: Arc::new(RawLabels),
            clock: Arc::new(SystemClock),
            host: HostInfo::default(),
        }
    }
}

impl Exporter {
    pub fn new(
        engine: Arc<dyn RulesEngine>,
        assets: Arc<dyn AssetFetcher>,
        labels: Arc<dyn Localizer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            engine,
            assets,
            labels,
            clock,
            host: HostInfo::default(),
        }
    }

    pub fn with_host(mut self, host: HostInfo) -> Self {
        self.host = host;
        self
    }

    pub fn with_labels(mut self, labels: Arc<dyn Localizer>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_assets(mut self, assets: Arc<dyn AssetFetcher>) -> Self {
        self.assets = assets;
        self
    }

    pub async fn build_document(
        &self,
        record: &SourceRecord,
        options: &ExportOptions,
    ) -> UnifiedDocument {
        let (settled, derived) = ensure_derived(self.engine.as_ref(), record).await;
        let ctx = ExtractContext {
            record: &settled,
            options,
            labels: self.labels.as_ref(),
            derived: &derived,
        };

        let mut header = sections::header::extract(&ctx);
        if options.include_portrait
            && let Some(header) = header.as_mut()
        {
            header.portrait = self.portrait(&settled).await;
        }

        let document = UnifiedDocument {
            header,
            quick_info: sections::quick_info::extract(&ctx),
            stats: sections::stats::extract(&ctx),
            resistances: sections::resistances::extract(&ctx),
            defenses: sections::defenses::extract(&ctx),
            attacks: sections::attacks::extract(&ctx),
            talents: sections::talents::extract(&ctx),
            skill_groups: sections::skills::extract(&ctx),
            spells: sections::spells::extract(&ctx),
            inventory: sections::inventory::extract(&ctx),
            details: sections::details::extract(&ctx),
            meta: Meta {
                generated_at: self.clock.now(),
                schema_version: SCHEMA_VERSION.to_string(),
                exporter_version: self.host.exporter_version.clone(),
                system_version: self.host.system_version.clone(),
                subject: settled.name().to_string(),
                actor_type: settled.actor_type().to_string(),
            },
        };

        info!(
            subject = document.meta.subject.as_str(),
            actor_type = document.meta.actor_type.as_str(),
            "built sheet document"
        );
        document
    }

    async fn portrait(&self, record: &SourceRecord) -> Option<String> {
        let path = text(record.as_value().get("img"))?;
        if path == PLACEHOLDER_PORTRAIT {
            return None;
        }
        match self.assets.fetch(path).await {
            Ok(asset) if asset.mime.starts_with("image/") => Some(asset.to_data_uri()),
            Ok(asset) => {
                warn!(path, mime = asset.mime.as_str(), "portrait is not an image; omitted");
                None
            }
            Err(err) => {
                warn!(path, error = %err, "portrait omitted");
                None
            }
        }
    }
}
