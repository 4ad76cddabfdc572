//! Moving staged client uploads into media storage.

use crate::domain::models::MediaAsset;
use crate::error::AppError;
use crate::ports::media::{MediaKind, MediaStorage, StagedFile, UploadedMedia};

/// Push a staged file to storage. The staged copy is removed either way.
pub async fn store_staged(
    media: &dyn MediaStorage,
    file: StagedFile,
    kind: MediaKind,
) -> Result<UploadedMedia, AppError> {
    let uploaded = media.upload(&file.path, kind).await;
    if let Err(err) = &uploaded {
        tracing::error!("upload of {} failed: {}", file.file_name, err);
    }
    Ok(uploaded?)
}

pub async fn store_required(
    media: &dyn MediaStorage,
    file: Option<StagedFile>,
    kind: MediaKind,
    missing: &str,
) -> Result<UploadedMedia, AppError> {
    let file = file.ok_or_else(|| AppError::bad_request(missing))?;
    store_staged(media, file, kind).await
}

/// Best-effort removal of an asset that is no longer referenced.
pub async fn discard(media: &dyn MediaStorage, asset: &MediaAsset, kind: MediaKind) {
    if let Err(err) = media.destroy(&asset.public_id, kind).await {
        tracing::warn!("could not delete {} {}: {}", kind.as_str(), asset.public_id, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use crate::ports::media::MockMediaStorage;
    use tempfile::NamedTempFile;

    fn staged() -> StagedFile {
        StagedFile {
            path: NamedTempFile::new().unwrap().into_temp_path(),
            file_name: "avatar.png".into(),
        }
    }

    #[tokio::test]
    async fn test_staged_file_is_removed_after_upload() {
        let mut media = MockMediaStorage::new();
        media.expect_upload().returning(|_, _| {
            Ok(UploadedMedia {
                url: "http://cdn/a".into(),
                public_id: "a".into(),
                duration: None,
            })
        });
        let file = staged();
        let path = file.path.to_path_buf();
        store_staged(&media, file, MediaKind::Image).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_staged_file_is_removed_after_failure() {
        let mut media = MockMediaStorage::new();
        media.expect_upload().returning(|_, _| {
            Err(MediaError::Rejected {
                status: 400,
                message: "bad file".into(),
            })
        });
        let file = staged();
        let path = file.path.to_path_buf();
        let err = store_staged(&media, file, MediaKind::Image).await.unwrap_err();
        assert!(matches!(err, AppError::Media(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_a_bad_request() {
        let media = MockMediaStorage::new();
        let err = store_required(&media, None, MediaKind::Image, "Avatar file is required")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Avatar file is required");
    }
}
