use crate::domain::models::LikeKind;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::sort::SortSpec;
use crate::domain::views::{ChannelStats, VideoView};
use crate::error::AppError;
use crate::ports::repository::{
    LikeRepository, SubscriptionRepository, VideoFilter, VideoRepository,
};
use bson::oid::ObjectId;
use std::sync::Arc;

/// Aggregates for the signed-in user's own channel.
#[derive(Clone)]
pub struct DashboardService {
    videos: Arc<dyn VideoRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    likes: Arc<dyn LikeRepository>,
}

impl DashboardService {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        likes: Arc<dyn LikeRepository>,
    ) -> Self {
        Self {
            videos,
            subscriptions,
            likes,
        }
    }

    /// Totals across every video the channel owns, drafts included.
    pub async fn stats(&self, channel: ObjectId) -> Result<ChannelStats, AppError> {
        let totals = self.videos.channel_totals(channel).await?;
        let total_subscribers = self.subscriptions.count_subscribers(channel).await?;
        let owned = self.videos.video_ids_by_owner(channel).await?;
        let total_likes = if owned.is_empty() {
            0
        } else {
            self.likes.count_likes(LikeKind::Video, &owned).await?
        };
        Ok(ChannelStats {
            total_video_views: totals.views,
            total_subscribers,
            total_videos: totals.videos,
            total_likes,
        })
    }

    pub async fn channel_videos(
        &self,
        channel: ObjectId,
        page: PageRequest,
    ) -> Result<Page<VideoView>, AppError> {
        let filter = VideoFilter {
            title: None,
            owner: Some(channel),
            published_only: false,
        };
        Ok(self
            .videos
            .list_videos(&filter, SortSpec::default(), page)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::fixture;
    use crate::domain::models::{Like, LikeTarget, Subscription};

    #[tokio::test]
    async fn test_stats_for_empty_channel() {
        let fx = fixture();
        let chai = fx.user("chai").await;
        let stats = fx.services.dashboard.stats(chai.id).await.unwrap();
        assert_eq!(
            stats,
            ChannelStats {
                total_video_views: 0,
                total_subscribers: 0,
                total_videos: 0,
                total_likes: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_stats_count_views_likes_and_subscribers() {
        let fx = fixture();
        let chai = fx.user("chai").await;
        let fan = fx.user("fan").await;
        let live = fx.video(&chai, "live", true).await;
        let draft = fx.video(&chai, "draft", false).await;
        let theirs = fx.video(&fan, "theirs", true).await;
        fx.store.increment_views(live.id).await.unwrap();
        fx.store.increment_views(live.id).await.unwrap();
        fx.store.increment_views(draft.id).await.unwrap();
        for id in [live.id, draft.id, theirs.id] {
            fx.store
                .insert_like(&Like::new(LikeTarget::video(id), fan.id))
                .await
                .unwrap();
        }
        fx.store
            .insert_subscription(&Subscription::new(fan.id, chai.id))
            .await
            .unwrap();

        let stats = fx.services.dashboard.stats(chai.id).await.unwrap();
        assert_eq!(stats.total_video_views, 3);
        assert_eq!(stats.total_videos, 2);
        assert_eq!(stats.total_likes, 2);
        assert_eq!(stats.total_subscribers, 1);
    }

    #[tokio::test]
    async fn test_channel_videos_include_drafts() {
        let fx = fixture();
        let chai = fx.user("chai").await;
        let fan = fx.user("fan").await;
        fx.video(&chai, "live", true).await;
        fx.video(&chai, "draft", false).await;
        fx.video(&fan, "theirs", true).await;

        let page = fx
            .services
            .dashboard
            .channel_videos(chai.id, PageRequest::default())
            .await
            .unwrap();
        let titles: Vec<&str> = page.docs.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["draft", "live"]);
    }
}
