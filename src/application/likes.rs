use crate::domain::models::{Like, LikeKind, LikeTarget};
use crate::domain::validation::parse_object_id;
use crate::domain::views::{LikeState, VideoView};
use crate::error::{AppError, StoreError};
use crate::ports::repository::{CommentRepository, LikeRepository, TweetRepository, VideoRepository};
use bson::oid::ObjectId;
use std::sync::Arc;

#[derive(Clone)]
pub struct LikeService {
    likes: Arc<dyn LikeRepository>,
    videos: Arc<dyn VideoRepository>,
    comments: Arc<dyn CommentRepository>,
    tweets: Arc<dyn TweetRepository>,
}

impl LikeService {
    pub fn new(
        likes: Arc<dyn LikeRepository>,
        videos: Arc<dyn VideoRepository>,
        comments: Arc<dyn CommentRepository>,
        tweets: Arc<dyn TweetRepository>,
    ) -> Self {
        Self {
            likes,
            videos,
            comments,
            tweets,
        }
    }

    pub fn target(kind: LikeKind, raw: &str) -> Result<LikeTarget, AppError> {
        let label = kind.field();
        let id = parse_object_id(raw, label)?;
        Ok(LikeTarget { kind, id })
    }

    async fn target_exists(&self, target: LikeTarget) -> Result<bool, AppError> {
        Ok(match target.kind {
            LikeKind::Video => self.videos.find_video(target.id).await?.is_some(),
            LikeKind::Comment => self.comments.find_comment(target.id).await?.is_some(),
            LikeKind::Tweet => self.tweets.find_tweet(target.id).await?.is_some(),
        })
    }

    /// Like when not yet liked, unlike otherwise.
    pub async fn toggle(&self, target: LikeTarget, user: ObjectId) -> Result<LikeState, AppError> {
        if !self.target_exists(target).await? {
            return Err(AppError::not_found(format!("{} not found", target.kind.label())));
        }

        if let Some(existing) = self.likes.find_like(target, user).await? {
            self.likes.delete_like(existing.id).await?;
            return Ok(LikeState { liked: false });
        }
        match self.likes.insert_like(&Like::new(target, user)).await {
            // A concurrent toggle got there first; the like exists either way.
            Ok(()) | Err(StoreError::Duplicate(_)) => Ok(LikeState { liked: true }),
            Err(err) => Err(err.into()),
        }
    }

    /// Liked videos the user can still see, most recent like first.
    pub async fn liked_videos(&self, user: ObjectId) -> Result<Vec<VideoView>, AppError> {
        let ids = self.likes.liked_video_ids(user).await?;
        let videos = self.videos.video_views(&ids).await?;
        Ok(videos
            .into_iter()
            .filter(|v| v.is_published || v.owner.as_ref().is_some_and(|o| o.id == user))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::fixture;
    use crate::domain::models::{Comment, CommentTarget};

    #[tokio::test]
    async fn test_toggle_flips_state() {
        let fx = fixture();
        let chai = fx.user("chai").await;
        let video = fx.video(&chai, "live", true).await;
        let target = LikeTarget::video(video.id);

        let first = fx.services.likes.toggle(target, chai.id).await.unwrap();
        assert!(first.liked);
        let second = fx.services.likes.toggle(target, chai.id).await.unwrap();
        assert!(!second.liked);
        assert_eq!(
            fx.store.count_likes(LikeKind::Video, &[video.id]).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_missing_target_is_not_found() {
        let fx = fixture();
        let chai = fx.user("chai").await;
        let err = fx
            .services
            .likes
            .toggle(LikeTarget::comment(ObjectId::new()), chai.id)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Comment not found");
        assert!(LikeService::target(LikeKind::Tweet, "bad").is_err());
    }

    #[tokio::test]
    async fn test_comment_likes_are_separate_from_video_likes() {
        let fx = fixture();
        let chai = fx.user("chai").await;
        let video = fx.video(&chai, "live", true).await;
        let comment = Comment::new(CommentTarget::Video(video.id), chai.id, "hi".into(), None);
        fx.store.insert_comment(&comment).await.unwrap();

        fx.services
            .likes
            .toggle(LikeTarget::comment(comment.id), chai.id)
            .await
            .unwrap();
        assert!(fx.services.likes.liked_videos(chai.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_liked_videos_hide_other_peoples_drafts() {
        let fx = fixture();
        let chai = fx.user("chai").await;
        let fan = fx.user("fan").await;
        let live = fx.video(&chai, "live", true).await;
        let draft = fx.video(&chai, "draft", false).await;
        for id in [live.id, draft.id] {
            fx.store
                .insert_like(&Like::new(LikeTarget::video(id), fan.id))
                .await
                .unwrap();
        }
        let liked = fx.services.likes.liked_videos(fan.id).await.unwrap();
        let titles: Vec<&str> = liked.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["live"]);
    }
}
