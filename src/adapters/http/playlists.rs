use super::extract::{AuthUser, JsonBody};
use super::response::ApiResponse;
use super::AppState;
use crate::application::playlists::PlaylistInput;
use crate::domain::views::PlaylistView;
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Router;
use serde::Deserialize;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_playlist))
        .route(
            "/:playlist_id",
            get(get_playlist)
                .patch(update_playlist)
                .delete(delete_playlist),
        )
        .route("/add/:video_id/:playlist_id", patch(add_video))
        .route("/remove/:video_id/:playlist_id", patch(remove_video))
        .route("/user/:user_id", get(user_playlists))
}

#[derive(Debug, Default, Deserialize)]
struct PlaylistBody {
    name: Option<String>,
    description: Option<String>,
    #[serde(default, alias = "videoIds")]
    videos: Option<Vec<String>>,
}

impl From<PlaylistBody> for PlaylistInput {
    fn from(body: PlaylistBody) -> Self {
        PlaylistInput {
            name: body.name,
            description: body.description,
            videos: body.videos,
        }
    }
}

async fn create_playlist(
    State(state): State<AppState>,
    AuthUser(owner): AuthUser,
    JsonBody(body): JsonBody<PlaylistBody>,
) -> Result<ApiResponse<PlaylistView>, AppError> {
    let playlist = state.services.playlists.create(&owner, body.into()).await?;
    Ok(ApiResponse::created(playlist, "New playlist created"))
}

async fn user_playlists(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<PlaylistView>>, AppError> {
    let playlists = state.services.playlists.list_for_user(&user_id).await?;
    Ok(ApiResponse::ok(playlists, "Playlists fetched successfully"))
}

async fn get_playlist(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<PlaylistView>, AppError> {
    let playlist = state.services.playlists.get(&playlist_id).await?;
    Ok(ApiResponse::ok(playlist, "Playlist fetched successfully"))
}

async fn add_video(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<ApiResponse<PlaylistView>, AppError> {
    let playlist = state
        .services
        .playlists
        .add_video(&video_id, &playlist_id, &actor)
        .await?;
    Ok(ApiResponse::ok(playlist, "Video added to the playlist"))
}

async fn remove_video(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<ApiResponse<PlaylistView>, AppError> {
    let playlist = state
        .services
        .playlists
        .remove_video(&video_id, &playlist_id, &actor)
        .await?;
    Ok(ApiResponse::ok(playlist, "Video removed from the playlist"))
}

async fn update_playlist(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(playlist_id): Path<String>,
    JsonBody(body): JsonBody<PlaylistBody>,
) -> Result<ApiResponse<PlaylistView>, AppError> {
    let playlist = state
        .services
        .playlists
        .update(&playlist_id, &actor, body.into())
        .await?;
    Ok(ApiResponse::ok(playlist, "Playlist updated"))
}

async fn delete_playlist(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<Option<()>>, AppError> {
    state
        .services
        .playlists
        .delete(&playlist_id, &actor)
        .await?;
    Ok(ApiResponse::ok(None, "Playlist deleted"))
}
