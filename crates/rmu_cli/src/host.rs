//! File-system stand-ins for the dialogs and storage a sheet host provides.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use rmu_core::{SectionKey, SourceRecord};
use rmu_core::export::{Asset, AssetFetcher, FetchError, mime_for_path};
use rmu_core::import::ImportPrompt;
use rmu_render::{Artifact, ArtifactSink, ExportChoice, ExportPrompt, Layout, SinkError};

/// Resolves portrait paths against a local directory.
#[derive(Debug, Clone)]
pub struct FsAssetFetcher {
    root: PathBuf,
}

impl FsAssetFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AssetFetcher for FsAssetFetcher {
    async fn fetch(&self, path: &str) -> Result<Asset, FetchError> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(FetchError::Failed {
                path: path.to_string(),
                reason: "path leaves the portrait root".to_string(),
            });
        }

        let full = self.root.join(relative);
        match tokio::fs::read(&full).await {
            Ok(bytes) => Ok(Asset {
                mime: mime_for_path(path),
                bytes,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(full.display().to_string()))
            }
            Err(err) => Err(FetchError::Failed {
                path: full.display().to_string(),
                reason: err.to_string(),
            }),
        }
    }
}

/// Answers the export dialog with choices made on the command line.
#[derive(Debug, Clone)]
pub struct PresetChoice(pub ExportChoice);

#[async_trait]
impl ExportPrompt for PresetChoice {
    async fn choose(
        &self,
        _record: &SourceRecord,
        _layouts: &[Layout],
        _sections: &[SectionKey],
    ) -> Option<ExportChoice> {
        Some(self.0.clone())
    }
}

/// Writes artifacts into a directory under their own filenames.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, artifact: &Artifact) -> PathBuf {
        self.dir.join(&artifact.filename)
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn save(&self, artifact: &Artifact) -> Result<(), SinkError> {
        let to_error = |err: std::io::Error| SinkError {
            filename: artifact.filename.clone(),
            reason: err.to_string(),
        };
        tokio::fs::create_dir_all(&self.dir).await.map_err(to_error)?;
        tokio::fs::write(self.path_for(artifact), &artifact.body)
            .await
            .map_err(to_error)
    }
}

/// Sheet contents already read from disk.
#[derive(Debug, Clone)]
pub struct SheetFile(pub String);

#[async_trait]
impl ImportPrompt for SheetFile {
    async fn choose_artifact(&self) -> Option<String> {
        Some(self.0.clone())
    }
}
