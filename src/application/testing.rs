//! Fixtures shared by the service tests.

use super::Services;
use crate::adapters::memory::MemoryStore;
use crate::auth::TokenService;
use crate::config::TokenConfig;
use crate::domain::models::{MediaAsset, User, Video};
use crate::ports::media::{MediaKind, MockMediaStorage, StagedFile, UploadedMedia};
use crate::ports::repository::{UserRepository, VideoRepository};
use bson::oid::ObjectId;
use bson::DateTime;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

pub(crate) struct Fixture {
    pub store: Arc<MemoryStore>,
    pub services: Services,
}

pub(crate) fn tokens() -> TokenService {
    TokenService::new(&TokenConfig {
        access_secret: "test-access".into(),
        access_ttl: Duration::from_secs(600),
        refresh_secret: "test-refresh".into(),
        refresh_ttl: Duration::from_secs(3600),
    })
}

/// Media storage that accepts everything and hands out fresh ids.
pub(crate) fn accepting_media() -> MockMediaStorage {
    let mut media = MockMediaStorage::new();
    media.expect_upload().returning(|_, kind| {
        let id = uuid::Uuid::new_v4().to_string();
        Ok(UploadedMedia {
            url: format!("http://cdn/{}", id),
            public_id: id,
            duration: (kind == MediaKind::Video).then_some(12.5),
        })
    });
    media.expect_destroy().returning(|_, _| Ok(()));
    media
}

pub(crate) fn fixture_with(media: MockMediaStorage) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let services = Services::new(store.clone(), Arc::new(media), tokens());
    Fixture { store, services }
}

pub(crate) fn fixture() -> Fixture {
    fixture_with(accepting_media())
}

pub(crate) fn staged(name: &str) -> StagedFile {
    StagedFile {
        path: NamedTempFile::new().unwrap().into_temp_path(),
        file_name: name.to_string(),
    }
}

fn asset(id: &str) -> MediaAsset {
    MediaAsset {
        url: format!("http://cdn/{}", id),
        public_id: id.to_string(),
    }
}

impl Fixture {
    pub async fn user(&self, name: &str) -> User {
        let now = DateTime::now();
        let user = User {
            id: ObjectId::new(),
            username: name.to_string(),
            email: format!("{}@example.com", name),
            full_name: format!("{} tester", name),
            avatar: asset(&format!("{}-avatar", name)),
            cover_image: None,
            watch_history: vec![],
            password: "not-a-hash".into(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_user(&user).await.unwrap();
        user
    }

    pub async fn video(&self, owner: &User, title: &str, published: bool) -> Video {
        let now = DateTime::now();
        let video = Video {
            id: ObjectId::new(),
            video_file: asset(&format!("{}-file", title)),
            thumbnail: asset(&format!("{}-thumb", title)),
            title: title.to_string(),
            description: format!("about {}", title),
            duration: 60.0,
            views: 0,
            is_published: published,
            owner: owner.id,
            created_at: now,
            updated_at: now,
        };
        self.store.insert_video(&video).await.unwrap();
        video
    }
}
