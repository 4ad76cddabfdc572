use crate::domain::models::{Comment, CommentTarget, LikeKind, User};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::validation::{comment_content, parse_object_id, parse_optional_id};
use crate::domain::views::{CommentView, OwnerSummary};
use crate::error::{AppError, StoreResult};
use crate::ports::repository::{
    CommentRepository, LikeRepository, TweetRepository, VideoRepository,
};
use bson::oid::ObjectId;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct CommentInput {
    pub content: Option<String>,
    pub reply_to: Option<String>,
}

/// Delete `roots` with every reply beneath them, and the likes on all of those comments.
pub(crate) async fn purge_threads(
    comments: &dyn CommentRepository,
    likes: &dyn LikeRepository,
    roots: Vec<ObjectId>,
) -> StoreResult<u64> {
    let mut doomed = roots.clone();
    let mut frontier = roots;
    while !frontier.is_empty() {
        let replies: Vec<ObjectId> = comments
            .reply_ids(&frontier)
            .await?
            .into_iter()
            .filter(|id| !doomed.contains(id))
            .collect();
        doomed.extend(&replies);
        frontier = replies;
    }
    likes.delete_likes_for(LikeKind::Comment, &doomed).await?;
    comments.delete_comments(&doomed).await
}

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    videos: Arc<dyn VideoRepository>,
    tweets: Arc<dyn TweetRepository>,
    likes: Arc<dyn LikeRepository>,
}

impl CommentService {
    pub fn new(
        comments: Arc<dyn CommentRepository>,
        videos: Arc<dyn VideoRepository>,
        tweets: Arc<dyn TweetRepository>,
        likes: Arc<dyn LikeRepository>,
    ) -> Self {
        Self {
            comments,
            videos,
            tweets,
            likes,
        }
    }

    pub fn video_target(raw: &str) -> Result<CommentTarget, AppError> {
        parse_object_id(raw, "video").map(CommentTarget::Video)
    }

    pub fn tweet_target(raw: &str) -> Result<CommentTarget, AppError> {
        parse_object_id(raw, "tweet").map(CommentTarget::Tweet)
    }

    async fn ensure_target(&self, target: CommentTarget) -> Result<(), AppError> {
        let exists = match target {
            CommentTarget::Video(id) => self.videos.find_video(id).await?.is_some(),
            CommentTarget::Tweet(id) => self.tweets.find_tweet(id).await?.is_some(),
        };
        if exists {
            Ok(())
        } else {
            Err(match target {
                CommentTarget::Video(_) => AppError::not_found("Video not found"),
                CommentTarget::Tweet(_) => AppError::not_found("Tweet not found"),
            })
        }
    }

    /// A reply must point at an existing comment on the same video or tweet.
    async fn check_reply(
        &self,
        target: CommentTarget,
        reply_to: Option<&str>,
        own_id: Option<ObjectId>,
    ) -> Result<Option<ObjectId>, AppError> {
        let Some(parent) = parse_optional_id(reply_to, "comment")? else {
            return Ok(None);
        };
        if Some(parent) == own_id {
            return Err(AppError::bad_request("A comment cannot reply to itself"));
        }
        let parent_comment = self
            .comments
            .find_comment(parent)
            .await?
            .ok_or_else(|| AppError::not_found("Parent comment not found"))?;
        if parent_comment.target() != Some(target) {
            return Err(AppError::bad_request(
                "Reply must reference a comment on the same item",
            ));
        }
        Ok(Some(parent))
    }

    pub async fn list(
        &self,
        target: CommentTarget,
        page: PageRequest,
    ) -> Result<Page<CommentView>, AppError> {
        self.ensure_target(target).await?;
        Ok(self.comments.list_comments(target, page).await?)
    }

    pub async fn add(
        &self,
        target: CommentTarget,
        author: &User,
        input: CommentInput,
    ) -> Result<CommentView, AppError> {
        self.ensure_target(target).await?;
        let content = comment_content(input.content.as_deref())?;
        let reply_to = self.check_reply(target, input.reply_to.as_deref(), None).await?;

        let comment = Comment::new(target, author.id, content, reply_to);
        self.comments.insert_comment(&comment).await?;
        Ok(CommentView::from_parts(
            &comment,
            Some(OwnerSummary::from(author)),
        ))
    }

    async fn owned(&self, comment_id: &str, actor: &User) -> Result<Comment, AppError> {
        let id = parse_object_id(comment_id, "comment")?;
        let comment = self
            .comments
            .find_comment(id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment not found"))?;
        if comment.owner != actor.id {
            return Err(AppError::forbidden(
                "You are not allowed to modify this comment",
            ));
        }
        Ok(comment)
    }

    pub async fn update(
        &self,
        comment_id: &str,
        actor: &User,
        input: CommentInput,
    ) -> Result<CommentView, AppError> {
        let comment = self.owned(comment_id, actor).await?;
        let content = comment_content(input.content.as_deref())?;
        let target = comment.target().ok_or_else(|| {
            AppError::Internal(format!("comment {} has no single target", comment.id))
        })?;
        let reply_to = self
            .check_reply(target, input.reply_to.as_deref(), Some(comment.id))
            .await?;

        if !self.comments.update_comment(comment.id, content, reply_to).await? {
            return Err(AppError::not_found("Comment not found"));
        }
        self.comments
            .comment_view(comment.id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment not found"))
    }

    pub async fn delete(&self, comment_id: &str, actor: &User) -> Result<u64, AppError> {
        let comment = self.owned(comment_id, actor).await?;
        Ok(purge_threads(self.comments.as_ref(), self.likes.as_ref(), vec![comment.id]).await?)
    }
}
