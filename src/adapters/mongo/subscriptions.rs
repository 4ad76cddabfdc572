use super::{paginate, replace_with_user, sort_stage, write_error, MongoStore, SUBSCRIPTIONS};
use crate::domain::models::Subscription;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::views::OwnerSummary;
use crate::error::StoreResult;
use crate::ports::repository::SubscriptionRepository;
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};
use mongodb::Collection;

impl MongoStore {
    fn subscriptions(&self) -> Collection<Subscription> {
        self.collection(SUBSCRIPTIONS)
    }

    /// Page through the users on the other side of `field == id`.
    async fn subscription_users(
        &self,
        field: &str,
        id: ObjectId,
        other_side: &str,
        page: PageRequest,
    ) -> StoreResult<Page<OwnerSummary>> {
        let pipeline = subscription_users_pipeline(field, id, other_side);
        paginate(&self.subscriptions(), pipeline, Vec::new(), page).await
    }
}

/// The user join runs before pagination so `totalDocs` skips deleted accounts.
fn subscription_users_pipeline(field: &str, id: ObjectId, other_side: &str) -> Vec<Document> {
    let mut matcher = Document::new();
    matcher.insert(field, id);
    let mut pipeline = vec![doc! { "$match": matcher }, sort_stage("createdAt", -1)];
    pipeline.extend(replace_with_user(other_side));
    pipeline
}

#[async_trait]
impl SubscriptionRepository for MongoStore {
    async fn find_subscription(
        &self,
        subscriber: ObjectId,
        channel: ObjectId,
    ) -> StoreResult<Option<Subscription>> {
        Ok(self
            .subscriptions()
            .find_one(doc! { "subscriber": subscriber, "channel": channel }, None)
            .await?)
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> StoreResult<()> {
        self.subscriptions()
            .insert_one(subscription, None)
            .await
            .map_err(write_error)?;
        Ok(())
    }

    async fn delete_subscription(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self
            .subscriptions()
            .delete_one(doc! { "_id": id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn subscribers(
        &self,
        channel: ObjectId,
        page: PageRequest,
    ) -> StoreResult<Page<OwnerSummary>> {
        self.subscription_users("channel", channel, "subscriber", page)
            .await
    }

    async fn subscribed_channels(
        &self,
        subscriber: ObjectId,
        page: PageRequest,
    ) -> StoreResult<Page<OwnerSummary>> {
        self.subscription_users("subscriber", subscriber, "channel", page)
            .await
    }

    async fn count_subscribers(&self, channel: ObjectId) -> StoreResult<u64> {
        Ok(self
            .subscriptions()
            .count_documents(doc! { "channel": channel }, None)
            .await?)
    }
}
