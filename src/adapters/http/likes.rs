use super::extract::AuthUser;
use super::response::ApiResponse;
use super::AppState;
use crate::application::LikeService;
use crate::domain::models::{LikeKind, User};
use crate::domain::views::{LikeState, VideoView};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/toggle/v/:video_id", post(toggle_video_like))
        .route("/toggle/c/:comment_id", post(toggle_comment_like))
        .route("/toggle/t/:tweet_id", post(toggle_tweet_like))
        .route("/videos", get(liked_videos))
}

async fn toggle(
    state: &AppState,
    user: &User,
    kind: LikeKind,
    raw: &str,
) -> Result<ApiResponse<LikeState>, AppError> {
    let target = LikeService::target(kind, raw)?;
    let outcome = state.services.likes.toggle(target, user.id).await?;
    let verb = if outcome.liked { "liked" } else { "unliked" };
    Ok(ApiResponse::ok(outcome, format!("{} {}", kind.label(), verb)))
}

async fn toggle_video_like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<LikeState>, AppError> {
    toggle(&state, &user, LikeKind::Video, &video_id).await
}

async fn toggle_comment_like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<LikeState>, AppError> {
    toggle(&state, &user, LikeKind::Comment, &comment_id).await
}

async fn toggle_tweet_like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<LikeState>, AppError> {
    toggle(&state, &user, LikeKind::Tweet, &tweet_id).await
}

async fn liked_videos(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ApiResponse<Vec<VideoView>>, AppError> {
    let videos = state.services.likes.liked_videos(user.id).await?;
    let message = if videos.is_empty() {
        "No liked videos found"
    } else {
        "Liked videos retrieved successfully"
    };
    Ok(ApiResponse::ok(videos, message))
}
