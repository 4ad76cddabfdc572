use super::extract::{AuthUser, JsonBody};
use super::response::ApiResponse;
use super::{AppState, PageParams};
use crate::application::comments::{CommentInput, CommentService};
use crate::domain::models::{CommentTarget, User};
use crate::domain::pagination::Page;
use crate::domain::views::CommentView;
use crate::error::AppError;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/videos/:video_id",
            get(list_video_comments).post(add_video_comment),
        )
        .route(
            "/tweets/:tweet_id",
            get(list_tweet_comments).post(add_tweet_comment),
        )
        .route("/c/:comment_id", patch(update_comment).delete(delete_comment))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentBody {
    content: Option<String>,
    reply_to: Option<String>,
}

impl From<CommentBody> for CommentInput {
    fn from(body: CommentBody) -> Self {
        CommentInput {
            content: body.content,
            reply_to: body.reply_to,
        }
    }
}

async fn list(
    state: &AppState,
    target: CommentTarget,
    params: PageParams,
) -> Result<ApiResponse<Page<CommentView>>, AppError> {
    let page = state.services.comments.list(target, params.request()).await?;
    Ok(ApiResponse::ok(page, "Comments fetched successfully"))
}

async fn add(
    state: &AppState,
    target: CommentTarget,
    author: &User,
    body: CommentBody,
) -> Result<ApiResponse<CommentView>, AppError> {
    let comment = state
        .services
        .comments
        .add(target, author, body.into())
        .await?;
    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

async fn list_video_comments(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(video_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<ApiResponse<Page<CommentView>>, AppError> {
    list(&state, CommentService::video_target(&video_id)?, params).await
}

async fn add_video_comment(
    State(state): State<AppState>,
    AuthUser(author): AuthUser,
    Path(video_id): Path<String>,
    JsonBody(body): JsonBody<CommentBody>,
) -> Result<ApiResponse<CommentView>, AppError> {
    add(&state, CommentService::video_target(&video_id)?, &author, body).await
}

async fn list_tweet_comments(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(tweet_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<ApiResponse<Page<CommentView>>, AppError> {
    list(&state, CommentService::tweet_target(&tweet_id)?, params).await
}

async fn add_tweet_comment(
    State(state): State<AppState>,
    AuthUser(author): AuthUser,
    Path(tweet_id): Path<String>,
    JsonBody(body): JsonBody<CommentBody>,
) -> Result<ApiResponse<CommentView>, AppError> {
    add(&state, CommentService::tweet_target(&tweet_id)?, &author, body).await
}

async fn update_comment(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(comment_id): Path<String>,
    JsonBody(body): JsonBody<CommentBody>,
) -> Result<ApiResponse<CommentView>, AppError> {
    let comment = state
        .services
        .comments
        .update(&comment_id, &actor, body.into())
        .await?;
    Ok(ApiResponse::ok(comment, "Comment updated"))
}

async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<Value>, AppError> {
    let removed = state.services.comments.delete(&comment_id, &actor).await?;
    Ok(ApiResponse::ok(
        json!({ "deletedCount": removed }),
        "Comment deleted successfully",
    ))
}
