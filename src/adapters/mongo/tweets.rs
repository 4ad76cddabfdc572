use super::{join_owner, paginate, sort_stage, MongoStore, TWEETS};
use crate::domain::models::Tweet;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::sort::SortSpec;
use crate::domain::views::TweetView;
use crate::error::StoreResult;
use crate::ports::repository::TweetRepository;
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, DateTime, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::Collection;

impl MongoStore {
    fn tweets(&self) -> Collection<Tweet> {
        self.collection(TWEETS)
    }
}

#[async_trait]
impl TweetRepository for MongoStore {
    async fn insert_tweet(&self, tweet: &Tweet) -> StoreResult<()> {
        self.tweets().insert_one(tweet, None).await?;
        Ok(())
    }

    async fn find_tweet(&self, id: ObjectId) -> StoreResult<Option<Tweet>> {
        Ok(self.tweets().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_tweets(
        &self,
        owner: Option<ObjectId>,
        sort: SortSpec,
        page: PageRequest,
    ) -> StoreResult<Page<TweetView>> {
        let mut matcher = Document::new();
        if let Some(owner) = owner {
            matcher.insert("owner", owner);
        }
        let pipeline = vec![
            doc! { "$match": matcher },
            sort_stage(sort.field, sort.direction()),
        ];
        paginate(&self.tweets(), pipeline, join_owner("owner", "userDetails"), page).await
    }

    async fn update_tweet(&self, id: ObjectId, content: String) -> StoreResult<Option<Tweet>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .tweets()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "content": content, "updatedAt": DateTime::now() } },
                options,
            )
            .await?)
    }

    async fn delete_tweet(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self.tweets().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}
