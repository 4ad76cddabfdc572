use super::{newest_first, Collections, MemoryStore};
use crate::domain::models::{Like, LikeKind, LikeTarget, Playlist, Subscription};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::views::OwnerSummary;
use crate::error::{StoreError, StoreResult};
use crate::ports::repository::{LikeRepository, PlaylistRepository, SubscriptionRepository};
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::DateTime;

fn likes_on(like: &Like, kind: LikeKind, targets: &[ObjectId]) -> bool {
    like.target()
        .is_some_and(|t| t.kind == kind && targets.contains(&t.id))
}

#[async_trait]
impl LikeRepository for MemoryStore {
    async fn find_like(&self, target: LikeTarget, user: ObjectId) -> StoreResult<Option<Like>> {
        let db = self.inner.read().await;
        Ok(db
            .likes
            .iter()
            .find(|l| l.liked_by == user && l.target() == Some(target))
            .cloned())
    }

    async fn insert_like(&self, like: &Like) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        let target = like.target();
        if db
            .likes
            .iter()
            .any(|l| l.liked_by == like.liked_by && l.target() == target)
        {
            return Err(StoreError::Duplicate(format!("like by {}", like.liked_by)));
        }
        db.likes.push(like.clone());
        Ok(())
    }

    async fn delete_like(&self, id: ObjectId) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        let before = db.likes.len();
        db.likes.retain(|l| l.id != id);
        Ok(db.likes.len() < before)
    }

    async fn liked_video_ids(&self, user: ObjectId) -> StoreResult<Vec<ObjectId>> {
        let db = self.inner.read().await;
        let mut liked: Vec<&Like> = db
            .likes
            .iter()
            .filter(|l| l.liked_by == user && l.video.is_some())
            .collect();
        liked.sort_by(|a, b| newest_first((a.created_at, a.id), (b.created_at, b.id)));
        Ok(liked.into_iter().filter_map(|l| l.video).collect())
    }

    async fn count_likes(&self, kind: LikeKind, targets: &[ObjectId]) -> StoreResult<u64> {
        let db = self.inner.read().await;
        Ok(db.likes.iter().filter(|l| likes_on(l, kind, targets)).count() as u64)
    }

    async fn delete_likes_for(&self, kind: LikeKind, targets: &[ObjectId]) -> StoreResult<u64> {
        let mut db = self.inner.write().await;
        let before = db.likes.len();
        db.likes.retain(|l| !likes_on(l, kind, targets));
        Ok((before - db.likes.len()) as u64)
    }
}

impl Collections {
    fn playlist_mut(&mut self, id: ObjectId) -> Option<&mut Playlist> {
        self.playlists.iter_mut().find(|p| p.id == id)
    }
}

#[async_trait]
impl PlaylistRepository for MemoryStore {
    async fn insert_playlist(&self, playlist: &Playlist) -> StoreResult<()> {
        self.inner.write().await.playlists.push(playlist.clone());
        Ok(())
    }

    async fn find_playlist(&self, id: ObjectId) -> StoreResult<Option<Playlist>> {
        let db = self.inner.read().await;
        Ok(db.playlists.iter().find(|p| p.id == id).cloned())
    }

    async fn playlists_by_owner(&self, owner: ObjectId) -> StoreResult<Vec<Playlist>> {
        let db = self.inner.read().await;
        let mut owned: Vec<Playlist> = db
            .playlists
            .iter()
            .filter(|p| p.owner == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| newest_first((a.created_at, a.id), (b.created_at, b.id)));
        Ok(owned)
    }

    async fn update_playlist(
        &self,
        id: ObjectId,
        name: String,
        description: String,
    ) -> StoreResult<Option<Playlist>> {
        let mut db = self.inner.write().await;
        Ok(db.playlist_mut(id).map(|playlist| {
            playlist.name = name;
            playlist.description = description;
            playlist.updated_at = DateTime::now();
            playlist.clone()
        }))
    }

    async fn add_to_playlist(&self, id: ObjectId, video: ObjectId) -> StoreResult<Option<Playlist>> {
        let mut db = self.inner.write().await;
        Ok(db.playlist_mut(id).map(|playlist| {
            if !playlist.videos.contains(&video) {
                playlist.videos.push(video);
            }
            playlist.updated_at = DateTime::now();
            playlist.clone()
        }))
    }

    async fn remove_from_playlist(
        &self,
        id: ObjectId,
        video: ObjectId,
    ) -> StoreResult<Option<Playlist>> {
        let mut db = self.inner.write().await;
        Ok(db.playlist_mut(id).map(|playlist| {
            playlist.videos.retain(|v| *v != video);
            playlist.updated_at = DateTime::now();
            playlist.clone()
        }))
    }

    async fn delete_playlist(&self, id: ObjectId) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        let before = db.playlists.len();
        db.playlists.retain(|p| p.id != id);
        Ok(db.playlists.len() < before)
    }

    async fn remove_from_all_playlists(&self, video: ObjectId) -> StoreResult<u64> {
        let mut db = self.inner.write().await;
        let mut touched = 0;
        for playlist in db.playlists.iter_mut().filter(|p| p.videos.contains(&video)) {
            playlist.videos.retain(|v| *v != video);
            touched += 1;
        }
        Ok(touched)
    }
}

impl Collections {
    /// Users on the far side of the subscriptions selected by `near`, newest first.
    fn subscription_users(
        &self,
        near: impl Fn(&Subscription) -> bool,
        far: impl Fn(&Subscription) -> ObjectId,
        page: PageRequest,
    ) -> Page<OwnerSummary> {
        let mut matched: Vec<&Subscription> = self.subscriptions.iter().filter(|s| near(*s)).collect();
        matched.sort_by(|a, b| newest_first((a.created_at, a.id), (b.created_at, b.id)));
        let users: Vec<OwnerSummary> = matched
            .into_iter()
            .filter_map(|s| self.owner_summary(far(s)))
            .collect();
        Page::slice(users, page)
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn find_subscription(
        &self,
        subscriber: ObjectId,
        channel: ObjectId,
    ) -> StoreResult<Option<Subscription>> {
        let db = self.inner.read().await;
        Ok(db
            .subscriptions
            .iter()
            .find(|s| s.subscriber == subscriber && s.channel == channel)
            .cloned())
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db
            .subscriptions
            .iter()
            .any(|s| s.subscriber == subscription.subscriber && s.channel == subscription.channel)
        {
            return Err(StoreError::Duplicate(format!(
                "subscription to {}",
                subscription.channel
            )));
        }
        db.subscriptions.push(subscription.clone());
        Ok(())
    }

    async fn delete_subscription(&self, id: ObjectId) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        let before = db.subscriptions.len();
        db.subscriptions.retain(|s| s.id != id);
        Ok(db.subscriptions.len() < before)
    }

    async fn subscribers(
        &self,
        channel: ObjectId,
        page: PageRequest,
    ) -> StoreResult<Page<OwnerSummary>> {
        let db = self.inner.read().await;
        Ok(db.subscription_users(|s| s.channel == channel, |s| s.subscriber, page))
    }

    async fn subscribed_channels(
        &self,
        subscriber: ObjectId,
        page: PageRequest,
    ) -> StoreResult<Page<OwnerSummary>> {
        let db = self.inner.read().await;
        Ok(db.subscription_users(|s| s.subscriber == subscriber, |s| s.channel, page))
    }

    async fn count_subscribers(&self, channel: ObjectId) -> StoreResult<u64> {
        let db = self.inner.read().await;
        Ok(db.subscriptions.iter().filter(|s| s.channel == channel).count() as u64)
    }
}
