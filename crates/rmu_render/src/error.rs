use rmu_core::{CoreError, CoreErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),
    #[error("unknown layout '{0}'")]
    UnknownLayout(String),
    #[error("failed to write markup")]
    Markup(#[from] std::fmt::Error),
    #[error("failed to serialize sheet data: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<RenderError> for CoreError {
    fn from(err: RenderError) -> Self {
        CoreError::new(CoreErrorCode::Render, err.to_string())
    }
}
