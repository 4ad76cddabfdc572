use crate::domain::models::{
    Comment, CommentTarget, Like, LikeKind, LikeTarget, MediaAsset, Playlist, Subscription,
    Tweet, User, Video,
};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::sort::SortSpec;
use crate::domain::views::{ChannelProfile, CommentView, OwnerSummary, TweetView, VideoView};
use crate::error::StoreResult;
use async_trait::async_trait;
use bson::oid::ObjectId;

/// Partial update of a user; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<MediaAsset>,
    pub cover_image: Option<MediaAsset>,
    pub password: Option<String>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>>;

    /// First user matching either the username or the email.
    async fn find_user_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<Option<User>>;

    /// Apply changes and return the updated user.
    async fn update_user(&self, id: ObjectId, changes: UserChanges) -> StoreResult<Option<User>>;

    async fn set_refresh_token(&self, id: ObjectId, token: Option<String>) -> StoreResult<()>;

    /// Move `video` to the front of the user's watch history.
    async fn record_watch(&self, id: ObjectId, video: ObjectId) -> StoreResult<()>;

    async fn channel_profile(
        &self,
        username: &str,
        viewer: ObjectId,
    ) -> StoreResult<Option<ChannelProfile>>;
}

/// Filter for the public video listing.
#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    /// Case-insensitive literal match on the title.
    pub title: Option<String>,
    pub owner: Option<ObjectId>,
    pub published_only: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<MediaAsset>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelTotals {
    pub videos: u64,
    pub views: i64,
}

#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn insert_video(&self, video: &Video) -> StoreResult<()>;

    async fn find_video(&self, id: ObjectId) -> StoreResult<Option<Video>>;

    /// The video joined with its owner summary.
    async fn video_view(&self, id: ObjectId) -> StoreResult<Option<VideoView>>;

    /// Joined views of the given videos, in the order of `ids`. Missing ids are skipped.
    async fn video_views(&self, ids: &[ObjectId]) -> StoreResult<Vec<VideoView>>;

    async fn list_videos(
        &self,
        filter: &VideoFilter,
        sort: SortSpec,
        page: PageRequest,
    ) -> StoreResult<Page<VideoView>>;

    async fn update_video(&self, id: ObjectId, changes: VideoChanges) -> StoreResult<Option<Video>>;

    /// Returns false when the video does not exist.
    async fn increment_views(&self, id: ObjectId) -> StoreResult<bool>;

    async fn delete_video(&self, id: ObjectId) -> StoreResult<bool>;

    async fn video_ids_by_owner(&self, owner: ObjectId) -> StoreResult<Vec<ObjectId>>;

    async fn channel_totals(&self, owner: ObjectId) -> StoreResult<ChannelTotals>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()>;

    async fn find_comment(&self, id: ObjectId) -> StoreResult<Option<Comment>>;

    async fn comment_view(&self, id: ObjectId) -> StoreResult<Option<CommentView>>;

    /// Newest first, joined with owners.
    async fn list_comments(
        &self,
        target: CommentTarget,
        page: PageRequest,
    ) -> StoreResult<Page<CommentView>>;

    async fn update_comment(
        &self,
        id: ObjectId,
        content: String,
        reply_to: Option<ObjectId>,
    ) -> StoreResult<bool>;

    async fn comment_ids_for_target(&self, target: CommentTarget) -> StoreResult<Vec<ObjectId>>;

    /// Direct replies to any of `parents`.
    async fn reply_ids(&self, parents: &[ObjectId]) -> StoreResult<Vec<ObjectId>>;

    async fn delete_comments(&self, ids: &[ObjectId]) -> StoreResult<u64>;
}

#[async_trait]
pub trait TweetRepository: Send + Sync {
    async fn insert_tweet(&self, tweet: &Tweet) -> StoreResult<()>;

    async fn find_tweet(&self, id: ObjectId) -> StoreResult<Option<Tweet>>;

    async fn list_tweets(
        &self,
        owner: Option<ObjectId>,
        sort: SortSpec,
        page: PageRequest,
    ) -> StoreResult<Page<TweetView>>;

    async fn update_tweet(&self, id: ObjectId, content: String) -> StoreResult<Option<Tweet>>;

    async fn delete_tweet(&self, id: ObjectId) -> StoreResult<bool>;
}

#[async_trait]
pub trait LikeRepository: Send + Sync {
    async fn find_like(&self, target: LikeTarget, user: ObjectId) -> StoreResult<Option<Like>>;

    async fn insert_like(&self, like: &Like) -> StoreResult<()>;

    async fn delete_like(&self, id: ObjectId) -> StoreResult<bool>;

    /// Videos liked by `user`, most recent like first.
    async fn liked_video_ids(&self, user: ObjectId) -> StoreResult<Vec<ObjectId>>;

    async fn count_likes(&self, kind: LikeKind, targets: &[ObjectId]) -> StoreResult<u64>;

    async fn delete_likes_for(&self, kind: LikeKind, targets: &[ObjectId]) -> StoreResult<u64>;
}

#[async_trait]
pub trait PlaylistRepository: Send + Sync {
    async fn insert_playlist(&self, playlist: &Playlist) -> StoreResult<()>;

    async fn find_playlist(&self, id: ObjectId) -> StoreResult<Option<Playlist>>;

    async fn playlists_by_owner(&self, owner: ObjectId) -> StoreResult<Vec<Playlist>>;

    async fn update_playlist(
        &self,
        id: ObjectId,
        name: String,
        description: String,
    ) -> StoreResult<Option<Playlist>>;

    async fn add_to_playlist(&self, id: ObjectId, video: ObjectId) -> StoreResult<Option<Playlist>>;

    async fn remove_from_playlist(
        &self,
        id: ObjectId,
        video: ObjectId,
    ) -> StoreResult<Option<Playlist>>;

    async fn delete_playlist(&self, id: ObjectId) -> StoreResult<bool>;

    /// Drop `video` from every playlist that holds it.
    async fn remove_from_all_playlists(&self, video: ObjectId) -> StoreResult<u64>;
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn find_subscription(
        &self,
        subscriber: ObjectId,
        channel: ObjectId,
    ) -> StoreResult<Option<Subscription>>;

    async fn insert_subscription(&self, subscription: &Subscription) -> StoreResult<()>;

    async fn delete_subscription(&self, id: ObjectId) -> StoreResult<bool>;

    /// Users subscribed to `channel`, newest subscription first.
    async fn subscribers(
        &self,
        channel: ObjectId,
        page: PageRequest,
    ) -> StoreResult<Page<OwnerSummary>>;

    /// Channels `subscriber` follows, newest subscription first.
    async fn subscribed_channels(
        &self,
        subscriber: ObjectId,
        page: PageRequest,
    ) -> StoreResult<Page<OwnerSummary>>;

    async fn count_subscribers(&self, channel: ObjectId) -> StoreResult<u64>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}

/// Everything a backing store has to provide.
pub trait Store:
    UserRepository
    + VideoRepository
    + CommentRepository
    + TweetRepository
    + LikeRepository
    + PlaylistRepository
    + SubscriptionRepository
    + StoreHealth
    + 'static
{
}

impl<T> Store for T where
    T: UserRepository
        + VideoRepository
        + CommentRepository
        + TweetRepository
        + LikeRepository
        + PlaylistRepository
        + SubscriptionRepository
        + StoreHealth
        + 'static
{
}
