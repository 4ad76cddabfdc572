use super::extract::AuthUser;
use super::response::ApiResponse;
use super::upload::read_multipart;
use super::AppState;
use crate::application::videos::{NewVideo, VideoQuery, VideoUpdate};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::views::{PublishState, VideoView};
use crate::error::AppError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::routing::{get, patch};
use axum::Router;
use serde::Deserialize;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(list_videos).post(publish_video).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/:video_id",
            get(get_video)
                .post(watch_video)
                .patch(update_video)
                .delete(delete_video)
                .layer(DefaultBodyLimit::disable()),
        )
        .route("/toggle/publish/:video_id", patch(toggle_publish))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    page: Option<String>,
    limit: Option<String>,
    query: Option<String>,
    sort_by: Option<String>,
    sort_type: Option<String>,
    user_id: Option<String>,
}

async fn list_videos(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<ApiResponse<Page<VideoView>>, AppError> {
    let query = VideoQuery {
        query: params.query,
        user_id: params.user_id,
        sort_by: params.sort_by,
        sort_type: params.sort_type,
        page: PageRequest::from_query(params.page.as_deref(), params.limit.as_deref()),
    };
    let page = state.services.videos.list(query, viewer.id).await?;
    let message = if page.is_empty() {
        "No videos found"
    } else {
        "Videos fetched successfully"
    };
    Ok(ApiResponse::ok(page, message))
}

async fn publish_video(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    multipart: Multipart,
) -> Result<ApiResponse<VideoView>, AppError> {
    let mut form = read_multipart(multipart, &state.temp_dir).await?;
    let upload = NewVideo {
        title: form.text("title"),
        description: form.text("description"),
        video_file: form.file("videoFile"),
        thumbnail: form.file("thumbnail"),
    };
    let video = state.services.videos.publish(&owner, upload).await?;
    tracing::info!("{} published video {}", owner.username, video.id);
    Ok(ApiResponse::created(video, "Video published successfully"))
}

async fn get_video(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<VideoView>, AppError> {
    let video = state.services.videos.get(&video_id, viewer.id).await?;
    Ok(ApiResponse::ok(video, "Video fetched successfully"))
}

async fn watch_video(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<VideoView>, AppError> {
    let video = state
        .services
        .videos
        .record_view(&video_id, viewer.id)
        .await?;
    Ok(ApiResponse::ok(video, "Video view recorded"))
}

async fn update_video(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> Result<ApiResponse<VideoView>, AppError> {
    let mut form = read_multipart(multipart, &state.temp_dir).await?;
    let update = VideoUpdate {
        title: form.text("title"),
        description: form.text("description"),
        thumbnail: form.file("thumbnail"),
    };
    let video = state
        .services
        .videos
        .update(&video_id, &actor, update)
        .await?;
    Ok(ApiResponse::ok(video, "Video successfully updated"))
}

async fn delete_video(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Option<()>>, AppError> {
    state.services.videos.delete(&video_id, &actor).await?;
    Ok(ApiResponse::ok(None, "Video successfully deleted"))
}

async fn toggle_publish(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<PublishState>, AppError> {
    let published = state
        .services
        .videos
        .toggle_publish(&video_id, &actor)
        .await?;
    let message = if published.is_published {
        "Video published successfully"
    } else {
        "Video unpublished successfully"
    };
    Ok(ApiResponse::ok(published, message))
}
