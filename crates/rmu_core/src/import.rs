//! Restoring a record from a previously exported HTML sheet.
//!
//! The sheet carries the source record in a `<script type="application/json">`
//! block. Reconciliation is wipe-and-replace for embedded collections: every
//! existing item and effect is deleted before the top-level fields are merged
//! and the sheet's own collections are created.

use std::sync::{LazyLock, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::error::{CoreError, CoreErrorCode};
use crate::export::WorkflowOutcome;
use crate::source::{array, text};

/// `id` of the script element holding the backup payload.
pub const BACKUP_BLOCK_ID: &str = "rmu-actor-data";

/// Block id written by earlier releases; still accepted on import.
pub const LEGACY_BACKUP_BLOCK_ID: &str = "foundry-actor-data";

/// Top-level fields that belong to the host installation, not the character.
const HOST_FIELDS: [&str; 4] = ["_id", "folder", "ownership", "sort"];

/// Script element carrying either block id; group 2 is the payload.
static BACKUP_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<script\b[^>]*\bid\s*=\s*["'](rmu-actor-data|foundry-actor-data)["'][^>]*>(.*?)</script\s*>"#,
    )
    .expect("backup block pattern is valid")
});

/// Finds the embedded backup block and parses it.
pub fn parse_artifact(html: &str) -> Result<Value, CoreError> {
    let body = BACKUP_BLOCK
        .captures(html)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().trim())
        .ok_or_else(CoreError::missing_backup_data)?;

    let payload: Value = serde_json::from_str(body).map_err(|err| {
        CoreError::new(
            CoreErrorCode::Parse,
            format!("embedded actor data is not valid JSON: {err}"),
        )
    })?;

    if !payload.is_object() {
        return Err(CoreError::new(
            CoreErrorCode::Parse,
            "embedded actor data is not an object",
        ));
    }
    Ok(payload)
}

/// Strips host-identity fields that must not overwrite the target record.
pub fn clean_payload(mut payload: Value) -> Value {
    if let Some(map) = payload.as_object_mut() {
        for key in HOST_FIELDS {
            map.remove(key);
        }
        if let Some(Value::Object(flags)) = map.get_mut("flags") {
            flags.remove("core");
        }
        if let Some(Value::Object(token)) = map.get_mut("prototypeToken") {
            token.remove("actorId");
        }
    }
    payload
}

/// Recursive object merge: objects merge key by key, anything else replaces.
pub fn merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                let nested = value.is_object() && target.get(key).is_some_and(Value::is_object);
                if !nested {
                    target.insert(key.clone(), value.clone());
                } else if let Some(existing) = target.get_mut(key) {
                    merge(existing, value);
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedKind {
    Item,
    ActiveEffect,
}

impl EmbeddedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Item => "Item",
            Self::ActiveEffect => "ActiveEffect",
        }
    }

    /// Field of the record document holding this collection.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Item => "items",
            Self::ActiveEffect => "effects",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
    #[error("{kind} rejected: {reason}")]
    Rejected { kind: &'static str, reason: String },
}

/// Host persistence for the record being overwritten.
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn record_type(&self) -> String;

    async fn embedded_ids(&self, kind: EmbeddedKind) -> Result<Vec<String>, StoreError>;

    async fn delete_embedded(&self, kind: EmbeddedKind, ids: &[String]) -> Result<(), StoreError>;

    /// Recursive merge of `patch` into the record.
    async fn update(&self, patch: &Value) -> Result<(), StoreError>;

    /// Creates documents and returns how many were created.
    async fn create_embedded(&self, kind: EmbeddedKind, docs: &[Value])
    -> Result<usize, StoreError>;
}

/// A record held in memory as a JSON document.
#[derive(Debug)]
pub struct InMemoryRecord {
    data: Mutex<Value>,
    next_id: AtomicU64,
}

impl InMemoryRecord {
    /// Embedded documents without an `_id` are given one, so every existing
    /// entry can be addressed by a later delete.
    pub fn new(mut data: Value) -> Self {
        if let Some(map) = data.as_object_mut() {
            for kind in [EmbeddedKind::Item, EmbeddedKind::ActiveEffect] {
                let Some(Value::Array(docs)) = map.get_mut(kind.field()) else {
                    continue;
                };
                for (index, doc) in docs.iter_mut().enumerate() {
                    if let Value::Object(fields) = doc
                        && text(fields.get("_id")).is_none()
                    {
                        fields.insert(
                            "_id".to_string(),
                            Value::String(format!("local-{}-{index}", kind.as_str())),
                        );
                    }
                }
            }
        }
        Self {
            data: Mutex::new(data),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn snapshot(&self) -> Result<Value, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Value>, StoreError> {
        self.data
            .lock()
            .map_err(|_| StoreError::Unavailable("record lock poisoned".to_string()))
    }

    fn fresh_id(&self) -> String {
        format!("imported{:08}", self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

#[async_trait]
impl RecordStore for InMemoryRecord {
    fn record_type(&self) -> String {
        self.lock()
            .ok()
            .and_then(|data| text(data.get("type")).map(str::to_string))
            .unwrap_or_default()
    }

    async fn embedded_ids(&self, kind: EmbeddedKind) -> Result<Vec<String>, StoreError> {
        let data = self.lock()?;
        Ok(array(data.get(kind.field()))
            .iter()
            .filter_map(|doc| text(doc.get("_id")).map(str::to_string))
            .collect())
    }

    async fn delete_embedded(&self, kind: EmbeddedKind, ids: &[String]) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        if let Some(Value::Array(docs)) = data.get_mut(kind.field()) {
            docs.retain(|doc| {
                text(doc.get("_id")).is_none_or(|id| !ids.iter().any(|target| target == id))
            });
        }
        Ok(())
    }

    async fn update(&self, patch: &Value) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        merge(&mut data, patch);
        Ok(())
    }

    async fn create_embedded(
        &self,
        kind: EmbeddedKind,
        docs: &[Value],
    ) -> Result<usize, StoreError> {
        let mut created = Vec::with_capacity(docs.len());
        for doc in docs {
            let Value::Object(fields) = doc else {
                return Err(StoreError::Rejected {
                    kind: kind.as_str(),
                    reason: "embedded document is not an object".to_string(),
                });
            };
            let mut fields: Map<String, Value> = fields.clone();
            if text(fields.get("_id")).is_none() {
                fields.insert("_id".to_string(), Value::String(self.fresh_id()));
            }
            created.push(Value::Object(fields));
        }

        let mut data = self.lock()?;
        let Some(map) = data.as_object_mut() else {
            return Err(StoreError::Unavailable("record is not an object".to_string()));
        };
        let count = created.len();
        match map.get_mut(kind.field()) {
            Some(Value::Array(existing)) => existing.extend(created),
            _ => {
                map.insert(kind.field().to_string(), Value::Array(created));
            }
        }
        Ok(count)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub items_deleted: usize,
    pub effects_deleted: usize,
    pub items_created: usize,
    pub effects_created: usize,
}

/// Overwrites the record in `store` with `payload`.
///
/// The type check runs before any mutation, so a mismatch leaves the record
/// untouched. Deletions complete before anything is created.
pub async fn reconcile(store: &dyn RecordStore, payload: Value) -> Result<ImportSummary, CoreError> {
    let source_type = text(payload.get("type")).unwrap_or_default().to_string();
    let target_type = store.record_type();
    if source_type != target_type {
        return Err(CoreError::type_mismatch(&source_type, &target_type));
    }

    let mut update = clean_payload(payload);
    let (items, effects) = match update.as_object_mut() {
        Some(map) => (take_array(map, "items"), take_array(map, "effects")),
        None => (Vec::new(), Vec::new()),
    };

    let mut summary = ImportSummary::default();
    let store_err = |err: StoreError| CoreError::new(CoreErrorCode::ReconciliationFailure, err.to_string());

    let item_ids = store.embedded_ids(EmbeddedKind::Item).await.map_err(store_err)?;
    let effect_ids = store.embedded_ids(EmbeddedKind::ActiveEffect).await.map_err(store_err)?;
    if !item_ids.is_empty() {
        store
            .delete_embedded(EmbeddedKind::Item, &item_ids)
            .await
            .map_err(store_err)?;
        summary.items_deleted = item_ids.len();
    }
    if !effect_ids.is_empty() {
        store
            .delete_embedded(EmbeddedKind::ActiveEffect, &effect_ids)
            .await
            .map_err(store_err)?;
        summary.effects_deleted = effect_ids.len();
    }
    debug!(
        items = summary.items_deleted,
        effects = summary.effects_deleted,
        "cleared embedded collections"
    );

    store.update(&update).await.map_err(store_err)?;

    if !items.is_empty() {
        summary.items_created = store
            .create_embedded(EmbeddedKind::Item, &items)
            .await
            .map_err(store_err)?;
    }
    if !effects.is_empty() {
        summary.effects_created = store
            .create_embedded(EmbeddedKind::ActiveEffect, &effects)
            .await
            .map_err(store_err)?;
    }

    info!(
        items = summary.items_created,
        effects = summary.effects_created,
        "import complete"
    );
    Ok(summary)
}

fn take_array(map: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match map.remove(key) {
        Some(Value::Array(docs)) => docs,
        _ => Vec::new(),
    }
}

/// The file-selection dialog. `None` means the user closed it.
#[async_trait]
pub trait ImportPrompt: Send + Sync {
    async fn choose_artifact(&self) -> Option<String>;
}

/// Prompt, parse, reconcile.
pub async fn run_import(
    store: &dyn RecordStore,
    prompt: &dyn ImportPrompt,
) -> Result<WorkflowOutcome<ImportSummary>, CoreError> {
    let Some(html) = prompt.choose_artifact().await else {
        debug!("import cancelled");
        return Ok(WorkflowOutcome::Cancelled);
    };
    let payload = parse_artifact(&html)?;
    reconcile(store, payload).await.map(WorkflowOutcome::Completed)
}
