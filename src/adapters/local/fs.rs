use super::probe::{parse_duration, DurationProbe};
use crate::error::MediaError;
use crate::ports::media::{MediaKind, MediaStorage, UploadedMedia};
use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Media kept on local disk and served back under `<public_url>/media/`.
pub struct FsMedia<P> {
    root: PathBuf,
    public_url: String,
    probe: P,
}

impl<P: DurationProbe> FsMedia<P> {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>, probe: P) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
            probe,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn duration(&self, path: &Path) -> Option<f64> {
        match self.probe.probe(path).await {
            Ok(raw) => parse_duration(&raw),
            Err(err) => {
                tracing::warn!("could not probe {:?}: {}", path, err);
                None
            }
        }
    }
}

/// A stored key must be a single plain file name.
fn is_plain_name(key: &str) -> bool {
    let mut components = Path::new(key).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[async_trait]
impl<P: DurationProbe + 'static> MediaStorage for FsMedia<P> {
    async fn upload(&self, local_path: &Path, kind: MediaKind) -> Result<UploadedMedia, MediaError> {
        tokio::fs::create_dir_all(&self.root).await?;

        let extension = local_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .unwrap_or_default();
        let public_id = format!("{}{}", Uuid::new_v4(), extension);
        let stored = self.root.join(&public_id);
        tokio::fs::copy(local_path, &stored).await?;

        let duration = match kind {
            MediaKind::Video => self.duration(&stored).await,
            MediaKind::Image => None,
        };
        tracing::debug!("stored {} as {:?}", kind.as_str(), stored);

        Ok(UploadedMedia {
            url: format!("{}/media/{}", self.public_url, public_id),
            public_id,
            duration,
        })
    }

    async fn destroy(&self, public_id: &str, _kind: MediaKind) -> Result<(), MediaError> {
        if !is_plain_name(public_id) {
            return Err(MediaError::InvalidKey(public_id.to_string()));
        }
        match tokio::fs::remove_file(self.root.join(public_id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
