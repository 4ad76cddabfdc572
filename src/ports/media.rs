use crate::domain::models::MediaAsset;
use crate::error::MediaError;
use async_trait::async_trait;
use std::path::Path;
use tempfile::TempPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedMedia {
    pub url: String,
    pub public_id: String,
    /// Seconds, for videos the provider could measure.
    pub duration: Option<f64>,
}

impl From<UploadedMedia> for MediaAsset {
    fn from(media: UploadedMedia) -> Self {
        MediaAsset {
            url: media.url,
            public_id: media.public_id,
        }
    }
}

/// A client upload parked on local disk. The file is removed when this is dropped.
#[derive(Debug)]
pub struct StagedFile {
    pub path: TempPath,
    pub file_name: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Push a local file to storage
    async fn upload(&self, local_path: &Path, kind: MediaKind) -> Result<UploadedMedia, MediaError>;

    /// Remove a previously uploaded file
    async fn destroy(&self, public_id: &str, kind: MediaKind) -> Result<(), MediaError>;
}
