use crate::domain::models::{Playlist, User};
use crate::domain::validation::{non_blank, parse_object_id, required};
use crate::domain::views::PlaylistView;
use crate::error::AppError;
use crate::ports::repository::{PlaylistRepository, UserRepository, VideoRepository};
use bson::oid::ObjectId;
use bson::DateTime;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct PlaylistInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub videos: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct PlaylistService {
    playlists: Arc<dyn PlaylistRepository>,
    videos: Arc<dyn VideoRepository>,
    users: Arc<dyn UserRepository>,
}

impl PlaylistService {
    pub fn new(
        playlists: Arc<dyn PlaylistRepository>,
        videos: Arc<dyn VideoRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            playlists,
            videos,
            users,
        }
    }

    async fn existing_video(&self, raw: &str) -> Result<ObjectId, AppError> {
        let id = parse_object_id(raw, "video")?;
        match self.videos.find_video(id).await? {
            Some(video) => Ok(video.id),
            None => Err(AppError::not_found("Video not found")),
        }
    }

    pub async fn create(&self, owner: &User, input: PlaylistInput) -> Result<PlaylistView, AppError> {
        let name = required(input.name.as_deref(), "Name is required")?;
        let description = required(input.description.as_deref(), "Description is required")?;
        let mut videos: Vec<ObjectId> = Vec::new();
        for raw in input.videos.unwrap_or_default() {
            let id = self.existing_video(&raw).await?;
            if !videos.contains(&id) {
                videos.push(id);
            }
        }

        let now = DateTime::now();
        let playlist = Playlist {
            id: ObjectId::new(),
            name,
            description,
            videos,
            owner: owner.id,
            created_at: now,
            updated_at: now,
        };
        self.playlists.insert_playlist(&playlist).await?;
        Ok(PlaylistView::from(&playlist))
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<PlaylistView>, AppError> {
        let owner = parse_object_id(user_id, "user")?;
        if self.users.find_user(owner).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }
        let playlists = self.playlists.playlists_by_owner(owner).await?;
        Ok(playlists.iter().map(PlaylistView::from).collect())
    }

    async fn find(&self, playlist_id: &str) -> Result<Playlist, AppError> {
        let id = parse_object_id(playlist_id, "playlist")?;
        self.playlists
            .find_playlist(id)
            .await?
            .ok_or_else(|| AppError::not_found("Playlist not found"))
    }

    pub async fn get(&self, playlist_id: &str) -> Result<PlaylistView, AppError> {
        Ok(PlaylistView::from(&self.find(playlist_id).await?))
    }

    async fn owned(&self, playlist_id: &str, actor: &User) -> Result<Playlist, AppError> {
        let playlist = self.find(playlist_id).await?;
        if playlist.owner != actor.id {
            return Err(AppError::forbidden(
                "You are not allowed to modify this playlist",
            ));
        }
        Ok(playlist)
    }

    pub async fn add_video(
        &self,
        video_id: &str,
        playlist_id: &str,
        actor: &User,
    ) -> Result<PlaylistView, AppError> {
        let playlist = self.owned(playlist_id, actor).await?;
        let video = self.existing_video(video_id).await?;
        if playlist.videos.contains(&video) {
            return Err(AppError::bad_request("Video already exists in the playlist"));
        }
        let updated = self
            .playlists
            .add_to_playlist(playlist.id, video)
            .await?
            .ok_or_else(|| AppError::not_found("Playlist not found"))?;
        Ok(PlaylistView::from(&updated))
    }

    pub async fn remove_video(
        &self,
        video_id: &str,
        playlist_id: &str,
        actor: &User,
    ) -> Result<PlaylistView, AppError> {
        let playlist = self.owned(playlist_id, actor).await?;
        let video = parse_object_id(video_id, "video")?;
        if !playlist.videos.contains(&video) {
            return Err(AppError::bad_request(
                "Video does not exist in the playlist",
            ));
        }
        let updated = self
            .playlists
            .remove_from_playlist(playlist.id, video)
            .await?
            .ok_or_else(|| AppError::not_found("Playlist not found"))?;
        Ok(PlaylistView::from(&updated))
    }

    /// Rename or re-describe; an omitted field keeps its current value.
    pub async fn update(
        &self,
        playlist_id: &str,
        actor: &User,
        input: PlaylistInput,
    ) -> Result<PlaylistView, AppError> {
        let playlist = self.owned(playlist_id, actor).await?;
        let name = non_blank(input.name.as_deref());
        let description = non_blank(input.description.as_deref());
        if name.is_none() && description.is_none() {
            return Err(AppError::bad_request(
                "Name or description is required",
            ));
        }
        let updated = self
            .playlists
            .update_playlist(
                playlist.id,
                name.unwrap_or(playlist.name),
                description.unwrap_or(playlist.description),
            )
            .await?
            .ok_or_else(|| AppError::not_found("Playlist not found"))?;
        Ok(PlaylistView::from(&updated))
    }

    pub async fn delete(&self, playlist_id: &str, actor: &User) -> Result<(), AppError> {
        let playlist = self.owned(playlist_id, actor).await?;
        if !self.playlists.delete_playlist(playlist.id).await? {
            return Err(AppError::not_found("Playlist not found"));
        }
        Ok(())
    }
}
