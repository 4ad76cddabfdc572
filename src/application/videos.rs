use super::comments::purge_threads;
use super::uploads::{discard, store_required, store_staged};
use crate::domain::models::{CommentTarget, LikeKind, MediaAsset, User, Video};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::sort::{SortSpec, VIDEO_SORT_FIELDS};
use crate::domain::validation::{non_blank, parse_object_id, parse_optional_id, required};
use crate::domain::views::{OwnerSummary, PublishState, VideoView};
use crate::error::AppError;
use crate::ports::media::{MediaKind, MediaStorage, StagedFile};
use crate::ports::repository::{
    CommentRepository, LikeRepository, PlaylistRepository, UserRepository, VideoChanges,
    VideoFilter, VideoRepository,
};
use bson::oid::ObjectId;
use bson::DateTime;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct VideoQuery {
    pub query: Option<String>,
    pub user_id: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub page: PageRequest,
}

#[derive(Debug, Default)]
pub struct NewVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_file: Option<StagedFile>,
    pub thumbnail: Option<StagedFile>,
}

#[derive(Debug, Default)]
pub struct VideoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<StagedFile>,
}

#[derive(Clone)]
pub struct VideoService {
    videos: Arc<dyn VideoRepository>,
    users: Arc<dyn UserRepository>,
    comments: Arc<dyn CommentRepository>,
    likes: Arc<dyn LikeRepository>,
    playlists: Arc<dyn PlaylistRepository>,
    media: Arc<dyn MediaStorage>,
}

impl VideoService {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        users: Arc<dyn UserRepository>,
        comments: Arc<dyn CommentRepository>,
        likes: Arc<dyn LikeRepository>,
        playlists: Arc<dyn PlaylistRepository>,
        media: Arc<dyn MediaStorage>,
    ) -> Self {
        Self {
            videos,
            users,
            comments,
            likes,
            playlists,
            media,
        }
    }

    /// Published videos, or every video of the viewer's own channel when they filter by themselves.
    pub async fn list(&self, query: VideoQuery, viewer: ObjectId) -> Result<Page<VideoView>, AppError> {
        let owner = parse_optional_id(query.user_id.as_deref(), "user")?;
        let filter = VideoFilter {
            title: non_blank(query.query.as_deref()),
            owner,
            published_only: owner != Some(viewer),
        };
        let sort = SortSpec::parse(
            query.sort_by.as_deref(),
            query.sort_type.as_deref(),
            VIDEO_SORT_FIELDS,
        );
        Ok(self.videos.list_videos(&filter, sort, query.page).await?)
    }

    pub async fn publish(&self, owner: &User, upload: NewVideo) -> Result<VideoView, AppError> {
        let title = required(upload.title.as_deref(), "Title is required")?;
        let description = required(upload.description.as_deref(), "Description is required")?;
        if upload.video_file.is_none() {
            return Err(AppError::bad_request("Video file is required"));
        }
        let Some(thumbnail_file) = upload.thumbnail else {
            return Err(AppError::bad_request("Thumbnail is required"));
        };

        let video_file = store_required(
            self.media.as_ref(),
            upload.video_file,
            MediaKind::Video,
            "Video file is required",
        )
        .await?;
        let duration = video_file.duration.unwrap_or(0.0);
        let video_file: MediaAsset = video_file.into();
        let thumbnail: MediaAsset =
            match store_staged(self.media.as_ref(), thumbnail_file, MediaKind::Image).await {
                Ok(uploaded) => uploaded.into(),
                Err(err) => {
                    discard(self.media.as_ref(), &video_file, MediaKind::Video).await;
                    return Err(err);
                }
            };

        let now = DateTime::now();
        let video = Video {
            id: ObjectId::new(),
            video_file,
            thumbnail,
            title,
            description,
            duration,
            views: 0,
            is_published: true,
            owner: owner.id,
            created_at: now,
            updated_at: now,
        };
        if let Err(err) = self.videos.insert_video(&video).await {
            discard(self.media.as_ref(), &video.video_file, MediaKind::Video).await;
            discard(self.media.as_ref(), &video.thumbnail, MediaKind::Image).await;
            return Err(err.into());
        }

        tracing::info!("user {} published video {}", owner.username, video.id);
        Ok(VideoView::from_parts(&video, Some(OwnerSummary::from(owner))))
    }

    /// A video the viewer may see: published, or their own.
    async fn visible(&self, id: ObjectId, viewer: ObjectId) -> Result<VideoView, AppError> {
        let view = self
            .videos
            .video_view(id)
            .await?
            .ok_or_else(|| AppError::not_found("Video not found"))?;
        let owned = view.owner.as_ref().is_some_and(|o| o.id == viewer);
        if !view.is_published && !owned {
            return Err(AppError::not_found("Video not found"));
        }
        Ok(view)
    }

    pub async fn get(&self, video_id: &str, viewer: ObjectId) -> Result<VideoView, AppError> {
        let id = parse_object_id(video_id, "video")?;
        self.visible(id, viewer).await
    }

    /// Count a view and move the video to the front of the viewer's history.
    pub async fn record_view(&self, video_id: &str, viewer: ObjectId) -> Result<VideoView, AppError> {
        let id = parse_object_id(video_id, "video")?;
        let mut view = self.visible(id, viewer).await?;
        if self.videos.increment_views(id).await? {
            view.views += 1;
        }
        self.users.record_watch(viewer, id).await?;
        Ok(view)
    }

    async fn owned(&self, video_id: &str, actor: &User) -> Result<Video, AppError> {
        let id = parse_object_id(video_id, "video")?;
        let video = self
            .videos
            .find_video(id)
            .await?
            .ok_or_else(|| AppError::not_found("Video not found"))?;
        if video.owner != actor.id {
            return Err(AppError::forbidden(
                "You are not allowed to modify this video",
            ));
        }
        Ok(video)
    }

    pub async fn update(
        &self,
        video_id: &str,
        actor: &User,
        update: VideoUpdate,
    ) -> Result<VideoView, AppError> {
        let video = self.owned(video_id, actor).await?;
        let title = non_blank(update.title.as_deref());
        let description = non_blank(update.description.as_deref());
        if title.is_none() && description.is_none() && update.thumbnail.is_none() {
            return Err(AppError::bad_request(
                "At least one field is required to update",
            ));
        }

        let thumbnail: Option<MediaAsset> = match update.thumbnail {
            Some(file) => Some(store_staged(self.media.as_ref(), file, MediaKind::Image).await?.into()),
            None => None,
        };
        let replaced_thumbnail = thumbnail.is_some();
        let changes = VideoChanges {
            title,
            description,
            thumbnail,
            is_published: None,
        };
        let updated = self
            .videos
            .update_video(video.id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("Video not found"))?;
        if replaced_thumbnail {
            discard(self.media.as_ref(), &video.thumbnail, MediaKind::Image).await;
        }
        Ok(VideoView::from_parts(&updated, Some(OwnerSummary::from(actor))))
    }

    /// Remove a video with its comment threads, likes and playlist entries.
    pub async fn delete(&self, video_id: &str, actor: &User) -> Result<(), AppError> {
        let video = self.owned(video_id, actor).await?;
        if !self.videos.delete_video(video.id).await? {
            return Err(AppError::not_found("Video not found"));
        }

        let roots = self
            .comments
            .comment_ids_for_target(CommentTarget::Video(video.id))
            .await?;
        let removed_comments = purge_threads(self.comments.as_ref(), self.likes.as_ref(), roots).await?;
        let removed_likes = self
            .likes
            .delete_likes_for(LikeKind::Video, &[video.id])
            .await?;
        self.playlists.remove_from_all_playlists(video.id).await?;

        discard(self.media.as_ref(), &video.video_file, MediaKind::Video).await;
        discard(self.media.as_ref(), &video.thumbnail, MediaKind::Image).await;
        tracing::info!(
            "deleted video {} with {} comments and {} likes",
            video.id,
            removed_comments,
            removed_likes
        );
        Ok(())
    }

    pub async fn toggle_publish(&self, video_id: &str, actor: &User) -> Result<PublishState, AppError> {
        let video = self.owned(video_id, actor).await?;
        let changes = VideoChanges {
            is_published: Some(!video.is_published),
            ..Default::default()
        };
        let updated = self
            .videos
            .update_video(video.id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("Video not found"))?;
        Ok(PublishState {
            is_published: updated.is_published,
        })
    }
}
