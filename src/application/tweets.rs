use super::comments::purge_threads;
use crate::domain::models::{CommentTarget, LikeKind, Tweet, User};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::sort::{SortSpec, TWEET_SORT_FIELDS};
use crate::domain::validation::{parse_object_id, tweet_content};
use crate::domain::views::{OwnerSummary, TweetView};
use crate::error::AppError;
use crate::ports::repository::{CommentRepository, LikeRepository, TweetRepository, UserRepository};
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct TweetQuery {
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub page: PageRequest,
}

impl TweetQuery {
    fn sort(&self) -> SortSpec {
        SortSpec::parse(
            self.sort_by.as_deref(),
            self.sort_type.as_deref(),
            TWEET_SORT_FIELDS,
        )
    }
}

#[derive(Clone)]
pub struct TweetService {
    tweets: Arc<dyn TweetRepository>,
    users: Arc<dyn UserRepository>,
    comments: Arc<dyn CommentRepository>,
    likes: Arc<dyn LikeRepository>,
}

impl TweetService {
    pub fn new(
        tweets: Arc<dyn TweetRepository>,
        users: Arc<dyn UserRepository>,
        comments: Arc<dyn CommentRepository>,
        likes: Arc<dyn LikeRepository>,
    ) -> Self {
        Self {
            tweets,
            users,
            comments,
            likes,
        }
    }

    pub async fn create(&self, author: &User, content: Option<&str>) -> Result<TweetView, AppError> {
        let tweet = Tweet::new(author.id, tweet_content(content)?);
        self.tweets.insert_tweet(&tweet).await?;
        Ok(TweetView::from_parts(&tweet, Some(OwnerSummary::from(author))))
    }

    pub async fn list_all(&self, query: TweetQuery) -> Result<Page<TweetView>, AppError> {
        Ok(self.tweets.list_tweets(None, query.sort(), query.page).await?)
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        query: TweetQuery,
    ) -> Result<Page<TweetView>, AppError> {
        let owner = parse_object_id(user_id, "user")?;
        if self.users.find_user(owner).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }
        Ok(self
            .tweets
            .list_tweets(Some(owner), query.sort(), query.page)
            .await?)
    }

    async fn owned(&self, tweet_id: &str, actor: &User) -> Result<Tweet, AppError> {
        let id = parse_object_id(tweet_id, "tweet")?;
        let tweet = self
            .tweets
            .find_tweet(id)
            .await?
            .ok_or_else(|| AppError::not_found("Tweet not found"))?;
        if tweet.owner != actor.id {
            return Err(AppError::forbidden(
                "You are not allowed to modify this tweet",
            ));
        }
        Ok(tweet)
    }

    pub async fn update(
        &self,
        tweet_id: &str,
        actor: &User,
        content: Option<&str>,
    ) -> Result<TweetView, AppError> {
        let tweet = self.owned(tweet_id, actor).await?;
        let content = tweet_content(content)?;
        let updated = self
            .tweets
            .update_tweet(tweet.id, content)
            .await?
            .ok_or_else(|| AppError::not_found("Tweet not found"))?;
        Ok(TweetView::from_parts(&updated, Some(OwnerSummary::from(actor))))
    }

    pub async fn delete(&self, tweet_id: &str, actor: &User) -> Result<(), AppError> {
        let tweet = self.owned(tweet_id, actor).await?;
        if !self.tweets.delete_tweet(tweet.id).await? {
            return Err(AppError::not_found("Tweet not found"));
        }
        let roots = self
            .comments
            .comment_ids_for_target(CommentTarget::Tweet(tweet.id))
            .await?;
        purge_threads(self.comments.as_ref(), self.likes.as_ref(), roots).await?;
        self.likes
            .delete_likes_for(LikeKind::Tweet, &[tweet.id])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::fixture;
    use crate::domain::models::{Comment, Like, LikeTarget};
    use bson::oid::ObjectId;

    #[tokio::test]
    async fn test_create_enforces_length() {
        let fx = fixture();
        let chai = fx.user("chai").await;
        let long = "x".repeat(301);
        assert!(fx.services.tweets.create(&chai, Some(&long)).await.is_err());
        assert!(fx.services.tweets.create(&chai, None).await.is_err());
        let view = fx
            .services
            .tweets
            .create(&chai, Some(" hello "))
            .await
            .unwrap();
        assert_eq!(view.content, "hello");
        assert_eq!(view.user_details.unwrap().username, "chai");
    }

    #[tokio::test]
    async fn test_user_listing_filters_by_owner() {
        let fx = fixture();
        let chai = fx.user("chai").await;
        let fan = fx.user("fan").await;
        fx.services.tweets.create(&chai, Some("a")).await.unwrap();
        fx.services.tweets.create(&fan, Some("b")).await.unwrap();
        fx.services.tweets.create(&chai, Some("c")).await.unwrap();

        let page = fx
            .services
            .tweets
            .list_for_user(&chai.id.to_hex(), TweetQuery::default())
            .await
            .unwrap();
        let contents: Vec<&str> = page.docs.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["c", "a"]);

        let all = fx
            .services
            .tweets
            .list_all(TweetQuery {
                sort_by: Some("createdAt".into()),
                sort_type: Some("asc".into()),
                page: PageRequest::default(),
            })
            .await
            .unwrap();
        let contents: Vec<&str> = all.docs.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b", "c"]);

        let err = fx
            .services
            .tweets
            .list_for_user(&ObjectId::new().to_hex(), TweetQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete_are_owner_only() {
        let fx = fixture();
        let chai = fx.user("chai").await;
        let fan = fx.user("fan").await;
        let tweet = fx.services.tweets.create(&chai, Some("mine")).await.unwrap();
        let id = tweet.id.to_hex();

        let err = fx
            .services
            .tweets
            .update(&id, &fan, Some("theirs"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(fx.services.tweets.delete(&id, &fan).await.is_err());

        let updated = fx
            .services
            .tweets
            .update(&id, &chai, Some("still mine"))
            .await
            .unwrap();
        assert_eq!(updated.content, "still mine");
    }

    #[tokio::test]
    async fn test_delete_cascades_to_comments_and_likes() {
        let fx = fixture();
        let chai = fx.user("chai").await;
        let fan = fx.user("fan").await;
        let tweet = fx.services.tweets.create(&chai, Some("mine")).await.unwrap();
        let target = CommentTarget::Tweet(tweet.id);
        let comment = Comment::new(target, fan.id, "nice".into(), None);
        fx.store.insert_comment(&comment).await.unwrap();
        fx.store
            .insert_like(&Like::new(LikeTarget::tweet(tweet.id), fan.id))
            .await
            .unwrap();

        fx.services
            .tweets
            .delete(&tweet.id.to_hex(), &chai)
            .await
            .unwrap();
        assert!(fx.store.find_tweet(tweet.id).await.unwrap().is_none());
        assert!(fx.store.comment_ids_for_target(target).await.unwrap().is_empty());
        assert_eq!(
            fx.store.count_likes(LikeKind::Tweet, &[tweet.id]).await.unwrap(),
            0
        );
    }
}
