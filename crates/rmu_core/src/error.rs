use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    Io,
    Parse,
    DerivationFailure,
    AssetFetchFailure,
    TypeMismatch,
    MissingBackupData,
    ReconciliationFailure,
    Render,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code:?}: {message}")]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn type_mismatch(source: &str, target: &str) -> Self {
        Self::new(
            CoreErrorCode::TypeMismatch,
            format!("cannot import a '{source}' sheet into a '{target}' record"),
        )
    }

    pub fn missing_backup_data() -> Self {
        Self::new(
            CoreErrorCode::MissingBackupData,
            format!(
                "could not find embedded actor data (#{}) in this file",
                crate::import::BACKUP_BLOCK_ID
            ),
        )
    }
}
