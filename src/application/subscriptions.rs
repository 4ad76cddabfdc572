use crate::domain::models::{Subscription, User};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::validation::parse_object_id;
use crate::domain::views::{OwnerSummary, SubscriptionState};
use crate::error::{AppError, StoreError};
use crate::ports::repository::{SubscriptionRepository, UserRepository};
use std::sync::Arc;

#[derive(Clone)]
pub struct SubscriptionService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    users: Arc<dyn UserRepository>,
}

impl SubscriptionService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            subscriptions,
            users,
        }
    }

    pub async fn toggle(
        &self,
        channel_id: &str,
        subscriber: &User,
    ) -> Result<SubscriptionState, AppError> {
        let channel = parse_object_id(channel_id, "channel")?;
        if channel == subscriber.id {
            return Err(AppError::bad_request(
                "You cannot subscribe to your own channel",
            ));
        }
        if self.users.find_user(channel).await?.is_none() {
            return Err(AppError::not_found("Channel not found"));
        }

        if let Some(existing) = self
            .subscriptions
            .find_subscription(subscriber.id, channel)
            .await?
        {
            self.subscriptions.delete_subscription(existing.id).await?;
            return Ok(SubscriptionState { subscribed: false });
        }
        match self
            .subscriptions
            .insert_subscription(&Subscription::new(subscriber.id, channel))
            .await
        {
            Ok(()) | Err(StoreError::Duplicate(_)) => Ok(SubscriptionState { subscribed: true }),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn subscribers(
        &self,
        channel_id: &str,
        page: PageRequest,
    ) -> Result<Page<OwnerSummary>, AppError> {
        let channel = parse_object_id(channel_id, "channel")?;
        Ok(self.subscriptions.subscribers(channel, page).await?)
    }

    pub async fn subscribed_channels(
        &self,
        subscriber_id: &str,
        page: PageRequest,
    ) -> Result<Page<OwnerSummary>, AppError> {
        let subscriber = parse_object_id(subscriber_id, "subscriber")?;
        Ok(self
            .subscriptions
            .subscribed_channels(subscriber, page)
            .await?)
    }
}
