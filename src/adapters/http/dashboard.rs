use super::extract::AuthUser;
use super::response::ApiResponse;
use super::{AppState, PageParams};
use crate::domain::pagination::Page;
use crate::domain::views::{ChannelStats, VideoView};
use crate::error::AppError;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(channel_stats))
        .route("/videos", get(channel_videos))
}

async fn channel_stats(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ApiResponse<ChannelStats>, AppError> {
    let stats = state.services.dashboard.stats(user.id).await?;
    Ok(ApiResponse::ok(stats, "Channel stats fetched successfully"))
}

async fn channel_videos(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<PageParams>,
) -> Result<ApiResponse<Page<VideoView>>, AppError> {
    let page = state
        .services
        .dashboard
        .channel_videos(user.id, params.request())
        .await?;
    Ok(ApiResponse::ok(page, "Channel videos fetched successfully"))
}
