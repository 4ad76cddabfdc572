use super::extract::AuthUser;
use super::response::ApiResponse;
use super::{AppState, PageParams};
use crate::domain::pagination::Page;
use crate::domain::views::{OwnerSummary, SubscriptionState};
use crate::error::AppError;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/c/:channel_id",
            get(channel_subscribers).post(toggle_subscription),
        )
        .route("/u/:subscriber_id", get(subscribed_channels))
}

async fn toggle_subscription(
    State(state): State<AppState>,
    AuthUser(subscriber): AuthUser,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<SubscriptionState>, AppError> {
    let outcome = state
        .services
        .subscriptions
        .toggle(&channel_id, &subscriber)
        .await?;
    Ok(if outcome.subscribed {
        ApiResponse::new(StatusCode::CREATED, outcome, "Subscribed successfully")
    } else {
        ApiResponse::ok(outcome, "Unsubscribed successfully")
    })
}

async fn channel_subscribers(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(channel_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<ApiResponse<Page<OwnerSummary>>, AppError> {
    let page = state
        .services
        .subscriptions
        .subscribers(&channel_id, params.request())
        .await?;
    Ok(ApiResponse::ok(page, "Subscribers fetched successfully"))
}

async fn subscribed_channels(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(subscriber_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<ApiResponse<Page<OwnerSummary>>, AppError> {
    let page = state
        .services
        .subscriptions
        .subscribed_channels(&subscriber_id, params.request())
        .await?;
    Ok(ApiResponse::ok(page, "Subscribed channels fetched successfully"))
}
