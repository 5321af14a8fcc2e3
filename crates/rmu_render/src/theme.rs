//! Stylesheets for the HTML sheet.
//!
//! A theme is an id mapped to a stylesheet path. The stylesheet text is always
//! inlined into the artifact so the file stays self-contained; when it cannot
//! be loaded the sheet is still produced, unstyled, with a comment in its place.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

/// Built-in theme ids and their stylesheet paths.
pub const THEMES: [(&str, &str); 3] = [
    ("classic", "themes/classic.css"),
    ("parchment", "themes/parchment.css"),
    ("dark", "themes/dark.css"),
];

pub fn theme_path(id: &str) -> Option<&'static str> {
    THEMES
        .iter()
        .find(|(theme, _)| theme.eq_ignore_ascii_case(id))
        .map(|(_, path)| *path)
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("unknown theme")]
    Unknown,
    #[error("{path} not found")]
    NotFound { path: String },
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait ThemeSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<String, ThemeError>;
}

/// Serves the stylesheets compiled into this crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedThemeSource;

#[async_trait]
impl ThemeSource for EmbeddedThemeSource {
    async fn fetch(&self, path: &str) -> Result<String, ThemeError> {
        let css = match path {
            "themes/classic.css" => include_str!("../themes/classic.css"),
            "themes/parchment.css" => include_str!("../themes/parchment.css"),
            "themes/dark.css" => include_str!("../themes/dark.css"),
            _ => {
                return Err(ThemeError::NotFound {
                    path: path.to_string(),
                });
            }
        };
        Ok(css.to_string())
    }
}

/// Reads stylesheets relative to a directory, for user-supplied themes.
#[derive(Debug, Clone)]
pub struct FsThemeSource {
    root: PathBuf,
}

impl FsThemeSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ThemeSource for FsThemeSource {
    async fn fetch(&self, path: &str) -> Result<String, ThemeError> {
        let full = self.root.join(path);
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => ThemeError::NotFound {
                    path: full.display().to_string(),
                },
                _ => ThemeError::Io {
                    path: full.display().to_string(),
                    source,
                },
            })
    }
}

/// Stylesheet text for `theme_id`, or a CSS comment explaining why there is none.
pub async fn resolve_theme_css(source: &dyn ThemeSource, theme_id: &str) -> String {
    let result = match theme_path(theme_id) {
        Some(path) => source.fetch(path).await,
        None => Err(ThemeError::Unknown),
    };
    match result {
        Ok(css) => css,
        Err(err) => {
            warn!(theme = theme_id, error = %err, "theme not loaded");
            format!(
                "/* Theme '{}' could not be loaded: {} */",
                theme_id.replace("*/", ""),
                err.to_string().replace("*/", "")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn built_in_themes_are_embedded() {
        for (id, _) in THEMES {
            let css = resolve_theme_css(&EmbeddedThemeSource, id).await;
            assert!(css.contains(".rmu-sheet"), "theme {id} has no sheet rules");
        }
    }

    #[tokio::test]
    async fn unknown_theme_becomes_a_comment() {
        let css = resolve_theme_css(&EmbeddedThemeSource, "neon").await;
        assert_eq!(css, "/* Theme 'neon' could not be loaded: unknown theme */");
    }

    #[tokio::test]
    async fn missing_file_is_reported_inline() {
        let source = FsThemeSource::new("/nonexistent-theme-root");
        let css = resolve_theme_css(&source, "dark").await;
        assert!(css.starts_with("/* Theme 'dark' could not be loaded:"));
        assert!(css.contains("not found"));
    }
}
