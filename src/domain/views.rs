//! Client-facing projections of the stored documents.
//!
//! Views drop provider handles and secrets, render ids as hex strings and
//! timestamps as RFC 3339. Joined views also deserialize straight out of
//! aggregation results.

use super::models::{Comment, Playlist, Tweet, User, Video};
use bson::oid::ObjectId;
use bson::DateTime;
use serde::{Deserialize, Serialize};

mod wire {
    use bson::oid::ObjectId;
    use bson::DateTime;
    use serde::ser::Error;
    use serde::Serializer;

    pub fn id<S: Serializer>(id: &ObjectId, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&id.to_hex())
    }

    pub fn opt_id<S: Serializer>(id: &Option<ObjectId>, s: S) -> Result<S::Ok, S::Error> {
        match id {
            Some(id) => s.serialize_some(&id.to_hex()),
            None => s.serialize_none(),
        }
    }

    pub fn ids<S: Serializer>(ids: &[ObjectId], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(ids.iter().map(|id| id.to_hex()))
    }

    pub fn timestamp<S: Serializer>(at: &DateTime, s: S) -> Result<S::Ok, S::Error> {
        let text = at.try_to_rfc3339_string().map_err(S::Error::custom)?;
        s.serialize_str(&text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaUrl {
    pub url: String,
}

/// Owner fields embedded in lists: the `$lookup` projection of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    #[serde(rename = "_id", serialize_with = "wire::id")]
    pub id: ObjectId,
    pub username: String,
    pub full_name: String,
    pub avatar: MediaUrl,
}

impl From<&User> for OwnerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            avatar: MediaUrl {
                url: user.avatar.url.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id", serialize_with = "wire::id")]
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: MediaUrl,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<MediaUrl>,
    #[serde(serialize_with = "wire::ids")]
    pub watch_history: Vec<ObjectId>,
    #[serde(serialize_with = "wire::timestamp")]
    pub created_at: DateTime,
    #[serde(serialize_with = "wire::timestamp")]
    pub updated_at: DateTime,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            avatar: MediaUrl {
                url: user.avatar.url.clone(),
            },
            cover_image: user.cover_image.as_ref().map(|asset| MediaUrl {
                url: asset.url.clone(),
            }),
            watch_history: user.watch_history.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    #[serde(rename = "_id", serialize_with = "wire::id")]
    pub id: ObjectId,
    pub video_file: MediaUrl,
    pub thumbnail: MediaUrl,
    pub title: String,
    pub description: String,
    pub duration: f64,
    #[serde(default)]
    pub views: i64,
    pub is_published: bool,
    #[serde(default)]
    pub owner: Option<OwnerSummary>,
    #[serde(serialize_with = "wire::timestamp")]
    pub created_at: DateTime,
    #[serde(serialize_with = "wire::timestamp")]
    pub updated_at: DateTime,
}

impl VideoView {
    pub fn from_parts(video: &Video, owner: Option<OwnerSummary>) -> Self {
        Self {
            id: video.id,
            video_file: MediaUrl {
                url: video.video_file.url.clone(),
            },
            thumbnail: MediaUrl {
                url: video.thumbnail.url.clone(),
            },
            title: video.title.clone(),
            description: video.description.clone(),
            duration: video.duration,
            views: video.views,
            is_published: video.is_published,
            owner,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id", serialize_with = "wire::id")]
    pub id: ObjectId,
    pub content: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "wire::opt_id"
    )]
    pub video: Option<ObjectId>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "wire::opt_id"
    )]
    pub tweet: Option<ObjectId>,
    #[serde(default, serialize_with = "wire::opt_id")]
    pub reply_to: Option<ObjectId>,
    #[serde(default)]
    pub owner: Option<OwnerSummary>,
    #[serde(serialize_with = "wire::timestamp")]
    pub created_at: DateTime,
    #[serde(serialize_with = "wire::timestamp")]
    pub updated_at: DateTime,
}

impl CommentView {
    pub fn from_parts(comment: &Comment, owner: Option<OwnerSummary>) -> Self {
        Self {
            id: comment.id,
            content: comment.content.clone(),
            video: comment.video,
            tweet: comment.tweet,
            reply_to: comment.reply_to,
            owner,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetView {
    #[serde(rename = "_id", serialize_with = "wire::id")]
    pub id: ObjectId,
    pub content: String,
    #[serde(serialize_with = "wire::id")]
    pub owner: ObjectId,
    #[serde(default)]
    pub user_details: Option<OwnerSummary>,
    #[serde(serialize_with = "wire::timestamp")]
    pub created_at: DateTime,
    #[serde(serialize_with = "wire::timestamp")]
    pub updated_at: DateTime,
}

impl TweetView {
    pub fn from_parts(tweet: &Tweet, user_details: Option<OwnerSummary>) -> Self {
        Self {
            id: tweet.id,
            content: tweet.content.clone(),
            owner: tweet.owner,
            user_details,
            created_at: tweet.created_at,
            updated_at: tweet.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistView {
    #[serde(rename = "_id", serialize_with = "wire::id")]
    pub id: ObjectId,
    pub name: String,
    pub description: String,
    #[serde(serialize_with = "wire::ids")]
    pub videos: Vec<ObjectId>,
    #[serde(serialize_with = "wire::id")]
    pub owner: ObjectId,
    #[serde(serialize_with = "wire::timestamp")]
    pub created_at: DateTime,
    #[serde(serialize_with = "wire::timestamp")]
    pub updated_at: DateTime,
}

impl From<&Playlist> for PlaylistView {
    fn from(playlist: &Playlist) -> Self {
        Self {
            id: playlist.id,
            name: playlist.name.clone(),
            description: playlist.description.clone(),
            videos: playlist.videos.clone(),
            owner: playlist.owner,
            created_at: playlist.created_at,
            updated_at: playlist.updated_at,
        }
    }
}

/// Public channel page: a user plus subscription counts relative to a viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(rename = "_id", serialize_with = "wire::id")]
    pub id: ObjectId,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar: MediaUrl,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<MediaUrl>,
    pub subscribers_count: u64,
    pub channels_subscribed_to_count: u64,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_video_views: i64,
    pub total_subscribers: u64,
    pub total_videos: u64,
    pub total_likes: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: UserView,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LikeState {
    pub liked: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SubscriptionState {
    pub subscribed: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishState {
    pub is_published: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::MediaAsset;
    use serde_json::json;

    fn user() -> User {
        let now = DateTime::now();
        User {
            id: ObjectId::new(),
            username: "chai".into(),
            email: "chai@example.com".into(),
            full_name: "Chai Code".into(),
            avatar: MediaAsset {
                url: "http://cdn/a.png".into(),
                public_id: "secret-handle".into(),
            },
            cover_image: None,
            watch_history: vec![ObjectId::new()],
            password: "hash".into(),
            refresh_token: Some("token".into()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_user_view_hides_secrets() {
        let user = user();
        let value = serde_json::to_value(UserView::from(&user)).unwrap();
        assert_eq!(value["_id"], json!(user.id.to_hex()));
        assert_eq!(value["fullName"], json!("Chai Code"));
        assert_eq!(value["avatar"], json!({ "url": "http://cdn/a.png" }));
        assert_eq!(value["watchHistory"][0], json!(user.watch_history[0].to_hex()));
        assert!(value.get("password").is_none());
        assert!(value.get("refreshToken").is_none());
        assert!(value.get("coverImage").is_none());
        assert!(!value.to_string().contains("secret-handle"));
    }

    #[test]
    fn test_timestamps_render_as_rfc3339() {
        let value = serde_json::to_value(UserView::from(&user())).unwrap();
        let created = value["createdAt"].as_str().unwrap();
        assert!(created.contains('T'));
        assert!(created.ends_with('Z'));
    }

    #[test]
    fn test_owner_summary_reads_lookup_output() {
        let id = ObjectId::new();
        let doc = bson::doc! {
            "_id": id,
            "username": "chai",
            "fullName": "Chai Code",
            "avatar": { "url": "http://cdn/a.png" },
        };
        let owner: OwnerSummary = bson::from_document(doc).unwrap();
        assert_eq!(owner.id, id);
        assert_eq!(owner.full_name, "Chai Code");
    }

    #[test]
    fn test_comment_view_drops_the_absent_target() {
        let comment = Comment::new(
            crate::domain::models::CommentTarget::Tweet(ObjectId::new()),
            ObjectId::new(),
            "hi".into(),
            None,
        );
        let value = serde_json::to_value(CommentView::from_parts(&comment, None)).unwrap();
        assert!(value.get("video").is_none());
        assert!(value["tweet"].is_string());
        assert!(value["replyTo"].is_null());
        assert!(value["owner"].is_null());
    }
}
