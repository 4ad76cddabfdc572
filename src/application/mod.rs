//! Application layer - one service per resource, built on the ports.

pub mod comments;
pub mod dashboard;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod uploads;
pub mod users;
pub mod videos;

#[cfg(test)]
pub(crate) mod testing;

use crate::auth::TokenService;
use crate::error::AppError;
use crate::ports::media::MediaStorage;
use crate::ports::repository::{StoreHealth, Store};
use std::sync::Arc;

pub use comments::CommentService;
pub use dashboard::DashboardService;
pub use likes::LikeService;
pub use playlists::PlaylistService;
pub use subscriptions::SubscriptionService;
pub use tweets::TweetService;
pub use users::UserService;
pub use videos::VideoService;

#[derive(Clone)]
pub struct HealthService {
    store: Arc<dyn StoreHealth>,
}

impl HealthService {
    pub fn new(store: Arc<dyn StoreHealth>) -> Self {
        Self { store }
    }

    pub async fn check(&self) -> Result<(), AppError> {
        self.store.ping().await.map_err(|err| {
            tracing::error!("store ping failed: {}", err);
            AppError::Unavailable("Database is not connected".into())
        })
    }
}

/// Every service, wired to one store and one media backend.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub videos: VideoService,
    pub comments: CommentService,
    pub tweets: TweetService,
    pub likes: LikeService,
    pub playlists: PlaylistService,
    pub subscriptions: SubscriptionService,
    pub dashboard: DashboardService,
    pub health: HealthService,
}

impl Services {
    pub fn new<S: Store>(store: Arc<S>, media: Arc<dyn MediaStorage>, tokens: TokenService) -> Self {
        Self {
            users: UserService::new(store.clone(), store.clone(), media.clone(), tokens),
            videos: VideoService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                media.clone(),
            ),
            comments: CommentService::new(store.clone(), store.clone(), store.clone(), store.clone()),
            tweets: TweetService::new(store.clone(), store.clone(), store.clone(), store.clone()),
            likes: LikeService::new(store.clone(), store.clone(), store.clone(), store.clone()),
            playlists: PlaylistService::new(store.clone(), store.clone(), store.clone()),
            subscriptions: SubscriptionService::new(store.clone(), store.clone()),
            dashboard: DashboardService::new(store.clone(), store.clone(), store.clone()),
            health: HealthService::new(store),
        }
    }
}
