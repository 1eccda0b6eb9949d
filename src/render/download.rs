/// Downloadable polaroid files
///
/// A `DownloadArtifact` is the encoded composite plus the file name it should
/// be saved under (`retro-snap-<unix millis>.jpg`).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::error::{Result, SnapError};

pub const FILE_PREFIX: &str = "retro-snap";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl DownloadArtifact {
    /// Wrap JPEG bytes, naming the file after `taken_at`
    pub fn jpeg(bytes: Vec<u8>, taken_at: DateTime<Utc>) -> Self {
        Self {
            file_name: file_name_for(taken_at),
            mime_type: "image/jpeg",
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Inline `data:` reference for embedding or handing to a browser
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.bytes))
    }

    /// Write into `dir`, returning the full path
    pub async fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "polaroid saved");
        Ok(path)
    }

    /// Write into the user's download directory
    pub async fn save_to_downloads(&self) -> Result<PathBuf> {
        let dir = downloads_dir(dirs::download_dir(), dirs::home_dir())?;
        self.save_to(&dir).await
    }
}

/// The platform download directory, else `~/Downloads`
fn downloads_dir(download: Option<PathBuf>, home: Option<PathBuf>) -> Result<PathBuf> {
    download
        .or_else(|| home.map(|home| home.join("Downloads")))
        .ok_or_else(|| SnapError::Config("could not determine a download directory".into()))
}

/// `retro-snap-<unix millis>.jpg`
pub fn file_name_for(taken_at: DateTime<Utc>) -> String {
    format!("{FILE_PREFIX}-{}.jpg", taken_at.timestamp_millis())
}
