use super::extract::{AuthUser, JsonBody};
use super::response::ApiResponse;
use super::AppState;
use crate::application::tweets::TweetQuery;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::views::TweetView;
use crate::error::AppError;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::Router;
use serde::Deserialize;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tweets).post(create_tweet))
        .route("/user/:user_id", get(user_tweets))
        .route("/:tweet_id", patch(update_tweet).delete(delete_tweet))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TweetParams {
    page: Option<String>,
    limit: Option<String>,
    sort_by: Option<String>,
    sort_type: Option<String>,
}

impl From<TweetParams> for TweetQuery {
    fn from(params: TweetParams) -> Self {
        TweetQuery {
            page: PageRequest::from_query(params.page.as_deref(), params.limit.as_deref()),
            sort_by: params.sort_by,
            sort_type: params.sort_type,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TweetBody {
    content: Option<String>,
}

fn listed(page: Page<TweetView>) -> ApiResponse<Page<TweetView>> {
    let message = if page.is_empty() {
        "No tweets found"
    } else {
        "Tweets fetched successfully"
    };
    ApiResponse::ok(page, message)
}

async fn create_tweet(
    State(state): State<AppState>,
    AuthUser(author): AuthUser,
    JsonBody(body): JsonBody<TweetBody>,
) -> Result<ApiResponse<TweetView>, AppError> {
    let tweet = state
        .services
        .tweets
        .create(&author, body.content.as_deref())
        .await?;
    Ok(ApiResponse::created(tweet, "Tweet created successfully"))
}

async fn list_tweets(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Query(params): Query<TweetParams>,
) -> Result<ApiResponse<Page<TweetView>>, AppError> {
    let page = state.services.tweets.list_all(params.into()).await?;
    Ok(listed(page))
}

async fn user_tweets(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(user_id): Path<String>,
    Query(params): Query<TweetParams>,
) -> Result<ApiResponse<Page<TweetView>>, AppError> {
    let page = state
        .services
        .tweets
        .list_for_user(&user_id, params.into())
        .await?;
    Ok(listed(page))
}

async fn update_tweet(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(tweet_id): Path<String>,
    JsonBody(body): JsonBody<TweetBody>,
) -> Result<ApiResponse<TweetView>, AppError> {
    let tweet = state
        .services
        .tweets
        .update(&tweet_id, &actor, body.content.as_deref())
        .await?;
    Ok(ApiResponse::ok(tweet, "Tweet updated successfully"))
}

async fn delete_tweet(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<Option<()>>, AppError> {
    state.services.tweets.delete(&tweet_id, &actor).await?;
    Ok(ApiResponse::ok(None, "Tweet deleted successfully"))
}
