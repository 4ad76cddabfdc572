//! Persisted documents, one struct per collection.

use bson::oid::ObjectId;
use bson::DateTime;
use serde::{Deserialize, Serialize};

/// A file held by the media provider. `public_id` is the provider's handle
/// and is never sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: MediaAsset,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<MediaAsset>,
    /// Most recently watched first.
    #[serde(default)]
    pub watch_history: Vec<ObjectId>,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub video_file: MediaAsset,
    pub thumbnail: MediaAsset,
    pub title: String,
    pub description: String,
    pub duration: f64,
    #[serde(default)]
    pub views: i64,
    #[serde(default = "published_by_default")]
    pub is_published: bool,
    pub owner: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

fn published_by_default() -> bool {
    true
}

/// What a comment hangs off. A comment belongs to exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
    Video(ObjectId),
    Tweet(ObjectId),
}

impl CommentTarget {
    /// Document field holding the target id.
    pub fn field(&self) -> &'static str {
        match self {
            CommentTarget::Video(_) => "video",
            CommentTarget::Tweet(_) => "tweet",
        }
    }

    pub fn id(&self) -> ObjectId {
        match self {
            CommentTarget::Video(id) | CommentTarget::Tweet(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet: Option<ObjectId>,
    pub owner: ObjectId,
    #[serde(default)]
    pub reply_to: Option<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Comment {
    pub fn new(
        target: CommentTarget,
        owner: ObjectId,
        content: String,
        reply_to: Option<ObjectId>,
    ) -> Self {
        let now = DateTime::now();
        let (video, tweet) = match target {
            CommentTarget::Video(id) => (Some(id), None),
            CommentTarget::Tweet(id) => (None, Some(id)),
        };
        Self {
            id: ObjectId::new(),
            content,
            video,
            tweet,
            owner,
            reply_to,
            created_at: now,
            updated_at: now,
        }
    }

    /// `None` when the stored document violates the one-target rule.
    pub fn target(&self) -> Option<CommentTarget> {
        match (self.video, self.tweet) {
            (Some(video), None) => Some(CommentTarget::Video(video)),
            (None, Some(tweet)) => Some(CommentTarget::Tweet(tweet)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub content: String,
    pub owner: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Tweet {
    pub fn new(owner: ObjectId, content: String) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            content,
            owner,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeKind {
    Video,
    Comment,
    Tweet,
}

impl LikeKind {
    pub fn field(&self) -> &'static str {
        match self {
            LikeKind::Video => "video",
            LikeKind::Comment => "comment",
            LikeKind::Tweet => "tweet",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LikeKind::Video => "Video",
            LikeKind::Comment => "Comment",
            LikeKind::Tweet => "Tweet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeTarget {
    pub kind: LikeKind,
    pub id: ObjectId,
}

impl LikeTarget {
    pub fn video(id: ObjectId) -> Self {
        Self { kind: LikeKind::Video, id }
    }

    pub fn comment(id: ObjectId) -> Self {
        Self { kind: LikeKind::Comment, id }
    }

    pub fn tweet(id: ObjectId) -> Self {
        Self { kind: LikeKind::Tweet, id }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(default)]
    pub video: Option<ObjectId>,
    #[serde(default)]
    pub comment: Option<ObjectId>,
    #[serde(default)]
    pub tweet: Option<ObjectId>,
    pub liked_by: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Like {
    pub fn new(target: LikeTarget, liked_by: ObjectId) -> Self {
        let now = DateTime::now();
        let mut like = Self {
            id: ObjectId::new(),
            video: None,
            comment: None,
            tweet: None,
            liked_by,
            created_at: now,
            updated_at: now,
        };
        match target.kind {
            LikeKind::Video => like.video = Some(target.id),
            LikeKind::Comment => like.comment = Some(target.id),
            LikeKind::Tweet => like.tweet = Some(target.id),
        }
        like
    }

    /// `None` unless exactly one target field is set.
    pub fn target(&self) -> Option<LikeTarget> {
        match (self.video, self.comment, self.tweet) {
            (Some(id), None, None) => Some(LikeTarget::video(id)),
            (None, Some(id), None) => Some(LikeTarget::comment(id)),
            (None, None, Some(id)) => Some(LikeTarget::tweet(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub videos: Vec<ObjectId>,
    pub owner: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub subscriber: ObjectId,
    pub channel: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Subscription {
    pub fn new(subscriber: ObjectId, channel: ObjectId) -> Self {
        let now = DateTime::now();
        Self {
            id: ObjectId::new(),
            subscriber,
            channel,
            created_at: now,
            updated_at: now,
        }
    }
}
