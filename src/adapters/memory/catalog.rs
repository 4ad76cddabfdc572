use super::{newest_first, ordered, MemoryStore};
use crate::domain::models::{Comment, CommentTarget, Tweet, User, Video};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::sort::SortSpec;
use crate::domain::views::{ChannelProfile, CommentView, MediaUrl, TweetView, VideoView};
use crate::error::{StoreError, StoreResult};
use crate::ports::repository::{
    ChannelTotals, CommentRepository, TweetRepository, UserChanges, UserRepository, VideoChanges,
    VideoFilter, VideoRepository,
};
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::DateTime;
use std::cmp::Ordering;

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(format!("username {}", user.username)));
        }
        if db.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(format!("email {}", user.email)));
        }
        db.users.push(user.clone());
        Ok(())
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        let db = self.inner.read().await;
        Ok(db.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<Option<User>> {
        let db = self.inner.read().await;
        Ok(db
            .users
            .iter()
            .find(|u| {
                username.is_some_and(|name| u.username == name)
                    || email.is_some_and(|mail| u.email == mail)
            })
            .cloned())
    }

    async fn update_user(&self, id: ObjectId, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut db = self.inner.write().await;
        if let Some(email) = &changes.email {
            if db.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Duplicate(format!("email {}", email)));
            }
        }
        let Some(user) = db.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(full_name) = changes.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(avatar) = changes.avatar {
            user.avatar = avatar;
        }
        if let Some(cover) = changes.cover_image {
            user.cover_image = Some(cover);
        }
        if let Some(password) = changes.password {
            user.password = password;
        }
        user.updated_at = DateTime::now();
        Ok(Some(user.clone()))
    }

    async fn set_refresh_token(&self, id: ObjectId, token: Option<String>) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if let Some(user) = db.users.iter_mut().find(|u| u.id == id) {
            user.refresh_token = token;
        }
        Ok(())
    }

    async fn record_watch(&self, id: ObjectId, video: ObjectId) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if let Some(user) = db.users.iter_mut().find(|u| u.id == id) {
            user.watch_history.retain(|v| *v != video);
            user.watch_history.insert(0, video);
        }
        Ok(())
    }

    async fn channel_profile(
        &self,
        username: &str,
        viewer: ObjectId,
    ) -> StoreResult<Option<ChannelProfile>> {
        let db = self.inner.read().await;
        let Some(user) = db.users.iter().find(|u| u.username == username) else {
            return Ok(None);
        };
        let subscribers: Vec<ObjectId> = db
            .subscriptions
            .iter()
            .filter(|s| s.channel == user.id)
            .map(|s| s.subscriber)
            .collect();
        let following = db
            .subscriptions
            .iter()
            .filter(|s| s.subscriber == user.id)
            .count();
        Ok(Some(ChannelProfile {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            avatar: MediaUrl {
                url: user.avatar.url.clone(),
            },
            cover_image: user.cover_image.as_ref().map(|c| MediaUrl { url: c.url.clone() }),
            subscribers_count: subscribers.len() as u64,
            channels_subscribed_to_count: following as u64,
            is_subscribed: subscribers.contains(&viewer),
        }))
    }
}

fn compare_videos(a: &Video, b: &Video, field: &str) -> Ordering {
    match field {
        "views" => a.views.cmp(&b.views),
        "duration" => a.duration.total_cmp(&b.duration),
        "title" => a.title.cmp(&b.title),
        "updatedAt" => a.updated_at.cmp(&b.updated_at),
        _ => a.created_at.cmp(&b.created_at),
    }
}

fn matches_filter(video: &Video, filter: &VideoFilter) -> bool {
    let title_ok = filter.title.as_ref().map_or(true, |needle| {
        video.title.to_lowercase().contains(&needle.to_lowercase())
    });
    let owner_ok = filter.owner.map_or(true, |owner| video.owner == owner);
    title_ok && owner_ok && (!filter.published_only || video.is_published)
}

#[async_trait]
impl VideoRepository for MemoryStore {
    async fn insert_video(&self, video: &Video) -> StoreResult<()> {
        self.inner.write().await.videos.push(video.clone());
        Ok(())
    }

    async fn find_video(&self, id: ObjectId) -> StoreResult<Option<Video>> {
        let db = self.inner.read().await;
        Ok(db.videos.iter().find(|v| v.id == id).cloned())
    }

    async fn video_view(&self, id: ObjectId) -> StoreResult<Option<VideoView>> {
        let db = self.inner.read().await;
        Ok(db
            .videos
            .iter()
            .find(|v| v.id == id)
            .map(|v| VideoView::from_parts(v, db.owner_summary(v.owner))))
    }

    async fn video_views(&self, ids: &[ObjectId]) -> StoreResult<Vec<VideoView>> {
        let db = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| db.videos.iter().find(|v| v.id == *id))
            .map(|v| VideoView::from_parts(v, db.owner_summary(v.owner)))
            .collect())
    }

    async fn list_videos(
        &self,
        filter: &VideoFilter,
        sort: SortSpec,
        page: PageRequest,
    ) -> StoreResult<Page<VideoView>> {
        let db = self.inner.read().await;
        let mut matched: Vec<&Video> = db.videos.iter().filter(|v| matches_filter(v, filter)).collect();
        matched.sort_by(|a, b| {
            ordered(compare_videos(a, b, sort.field), a.id, b.id, sort.descending)
        });
        Ok(Page::slice(matched, page)
            .map(|v| VideoView::from_parts(v, db.owner_summary(v.owner))))
    }

    async fn update_video(&self, id: ObjectId, changes: VideoChanges) -> StoreResult<Option<Video>> {
        let mut db = self.inner.write().await;
        let Some(video) = db.videos.iter_mut().find(|v| v.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            video.title = title;
        }
        if let Some(description) = changes.description {
            video.description = description;
        }
        if let Some(thumbnail) = changes.thumbnail {
            video.thumbnail = thumbnail;
        }
        if let Some(published) = changes.is_published {
            video.is_published = published;
        }
        video.updated_at = DateTime::now();
        Ok(Some(video.clone()))
    }

    async fn increment_views(&self, id: ObjectId) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.videos.iter_mut().find(|v| v.id == id) {
            Some(video) => {
                video.views += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_video(&self, id: ObjectId) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        let before = db.videos.len();
        db.videos.retain(|v| v.id != id);
        Ok(db.videos.len() < before)
    }

    async fn video_ids_by_owner(&self, owner: ObjectId) -> StoreResult<Vec<ObjectId>> {
        let db = self.inner.read().await;
        Ok(db.videos.iter().filter(|v| v.owner == owner).map(|v| v.id).collect())
    }

    async fn channel_totals(&self, owner: ObjectId) -> StoreResult<ChannelTotals> {
        let db = self.inner.read().await;
        Ok(db
            .videos
            .iter()
            .filter(|v| v.owner == owner)
            .fold(ChannelTotals::default(), |totals, v| ChannelTotals {
                videos: totals.videos + 1,
                views: totals.views + v.views,
            }))
    }
}

fn on_target(comment: &Comment, target: CommentTarget) -> bool {
    comment.target() == Some(target)
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        self.inner.write().await.comments.push(comment.clone());
        Ok(())
    }

    async fn find_comment(&self, id: ObjectId) -> StoreResult<Option<Comment>> {
        let db = self.inner.read().await;
        Ok(db.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn comment_view(&self, id: ObjectId) -> StoreResult<Option<CommentView>> {
        let db = self.inner.read().await;
        Ok(db
            .comments
            .iter()
            .find(|c| c.id == id)
            .map(|c| CommentView::from_parts(c, db.owner_summary(c.owner))))
    }

    async fn list_comments(
        &self,
        target: CommentTarget,
        page: PageRequest,
    ) -> StoreResult<Page<CommentView>> {
        let db = self.inner.read().await;
        let mut matched: Vec<&Comment> = db.comments.iter().filter(|c| on_target(c, target)).collect();
        matched.sort_by(|a, b| newest_first((a.created_at, a.id), (b.created_at, b.id)));
        Ok(Page::slice(matched, page)
            .map(|c| CommentView::from_parts(c, db.owner_summary(c.owner))))
    }

    async fn update_comment(
        &self,
        id: ObjectId,
        content: String,
        reply_to: Option<ObjectId>,
    ) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.comments.iter_mut().find(|c| c.id == id) {
            Some(comment) => {
                comment.content = content;
                comment.reply_to = reply_to;
                comment.updated_at = DateTime::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn comment_ids_for_target(&self, target: CommentTarget) -> StoreResult<Vec<ObjectId>> {
        let db = self.inner.read().await;
        Ok(db
            .comments
            .iter()
            .filter(|c| on_target(c, target))
            .map(|c| c.id)
            .collect())
    }

    async fn reply_ids(&self, parents: &[ObjectId]) -> StoreResult<Vec<ObjectId>> {
        let db = self.inner.read().await;
        Ok(db
            .comments
            .iter()
            .filter(|c| c.reply_to.is_some_and(|p| parents.contains(&p)))
            .map(|c| c.id)
            .collect())
    }

    async fn delete_comments(&self, ids: &[ObjectId]) -> StoreResult<u64> {
        let mut db = self.inner.write().await;
        let before = db.comments.len();
        db.comments.retain(|c| !ids.contains(&c.id));
        Ok((before - db.comments.len()) as u64)
    }
}

#[async_trait]
impl TweetRepository for MemoryStore {
    async fn insert_tweet(&self, tweet: &Tweet) -> StoreResult<()> {
        self.inner.write().await.tweets.push(tweet.clone());
        Ok(())
    }

    async fn find_tweet(&self, id: ObjectId) -> StoreResult<Option<Tweet>> {
        let db = self.inner.read().await;
        Ok(db.tweets.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tweets(
        &self,
        owner: Option<ObjectId>,
        sort: SortSpec,
        page: PageRequest,
    ) -> StoreResult<Page<TweetView>> {
        let db = self.inner.read().await;
        let mut matched: Vec<&Tweet> = db
            .tweets
            .iter()
            .filter(|t| owner.map_or(true, |o| t.owner == o))
            .collect();
        matched.sort_by(|a, b| {
            let key = match sort.field {
                "updatedAt" => a.updated_at.cmp(&b.updated_at),
                _ => a.created_at.cmp(&b.created_at),
            };
            ordered(key, a.id, b.id, sort.descending)
        });
        Ok(Page::slice(matched, page)
            .map(|t| TweetView::from_parts(t, db.owner_summary(t.owner))))
    }

    async fn update_tweet(&self, id: ObjectId, content: String) -> StoreResult<Option<Tweet>> {
        let mut db = self.inner.write().await;
        Ok(db.tweets.iter_mut().find(|t| t.id == id).map(|tweet| {
            tweet.content = content;
            tweet.updated_at = DateTime::now();
            tweet.clone()
        }))
    }

    async fn delete_tweet(&self, id: ObjectId) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        let before = db.tweets.len();
        db.tweets.retain(|t| t.id != id);
        Ok(db.tweets.len() < before)
    }
}
