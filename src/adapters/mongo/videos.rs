use super::{aggregate_all, join_owner, paginate, sort_stage, MongoStore, VIDEOS};
use crate::domain::models::Video;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::sort::SortSpec;
use crate::domain::views::VideoView;
use crate::error::StoreResult;
use crate::ports::repository::{ChannelTotals, VideoChanges, VideoFilter, VideoRepository};
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, DateTime, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::Collection;
use serde::Deserialize;
use std::collections::HashMap;

impl MongoStore {
    fn videos(&self) -> Collection<Video> {
        self.collection(VIDEOS)
    }
}

fn filter_document(filter: &VideoFilter) -> Document {
    let mut matcher = Document::new();
    if let Some(title) = &filter.title {
        matcher.insert(
            "title",
            doc! { "$regex": regex::escape(title), "$options": "i" },
        );
    }
    if let Some(owner) = filter.owner {
        matcher.insert("owner", owner);
    }
    if filter.published_only {
        matcher.insert("isPublished", true);
    }
    matcher
}

#[derive(Deserialize)]
struct Totals {
    videos: i64,
    views: i64,
}

#[async_trait]
impl VideoRepository for MongoStore {
    async fn insert_video(&self, video: &Video) -> StoreResult<()> {
        self.videos().insert_one(video, None).await?;
        Ok(())
    }

    async fn find_video(&self, id: ObjectId) -> StoreResult<Option<Video>> {
        Ok(self.videos().find_one(doc! { "_id": id }, None).await?)
    }

    async fn video_view(&self, id: ObjectId) -> StoreResult<Option<VideoView>> {
        let mut pipeline = vec![doc! { "$match": { "_id": id } }];
        pipeline.extend(join_owner("owner", "owner"));
        let views: Vec<VideoView> = aggregate_all(&self.videos(), pipeline).await?;
        Ok(views.into_iter().next())
    }

    async fn video_views(&self, ids: &[ObjectId]) -> StoreResult<Vec<VideoView>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut pipeline = vec![doc! { "$match": { "_id": { "$in": ids.to_vec() } } }];
        pipeline.extend(join_owner("owner", "owner"));
        let found: Vec<VideoView> = aggregate_all(&self.videos(), pipeline).await?;

        let mut by_id: HashMap<ObjectId, VideoView> =
            found.into_iter().map(|v| (v.id, v)).collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn list_videos(
        &self,
        filter: &VideoFilter,
        sort: SortSpec,
        page: PageRequest,
    ) -> StoreResult<Page<VideoView>> {
        let pipeline = vec![
            doc! { "$match": filter_document(filter) },
            sort_stage(sort.field, sort.direction()),
        ];
        paginate(&self.videos(), pipeline, join_owner("owner", "owner"), page).await
    }

    async fn update_video(&self, id: ObjectId, changes: VideoChanges) -> StoreResult<Option<Video>> {
        let mut set = doc! { "updatedAt": DateTime::now() };
        if let Some(title) = changes.title {
            set.insert("title", title);
        }
        if let Some(description) = changes.description {
            set.insert("description", description);
        }
        if let Some(thumbnail) = changes.thumbnail {
            set.insert("thumbnail", bson::to_bson(&thumbnail)?);
        }
        if let Some(published) = changes.is_published {
            set.insert("isPublished", published);
        }
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .videos()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await?)
    }

    async fn increment_views(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self
            .videos()
            .update_one(doc! { "_id": id }, doc! { "$inc": { "views": 1 } }, None)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_video(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self.videos().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn video_ids_by_owner(&self, owner: ObjectId) -> StoreResult<Vec<ObjectId>> {
        self.ids_matching(VIDEOS, doc! { "owner": owner }).await
    }

    async fn channel_totals(&self, owner: ObjectId) -> StoreResult<ChannelTotals> {
        let pipeline = vec![
            doc! { "$match": { "owner": owner } },
            doc! {
                "$group": {
                    "_id": null,
                    "videos": { "$sum": 1 },
                    "views": { "$sum": "$views" },
                }
            },
        ];
        let totals: Vec<Totals> = aggregate_all(&self.videos(), pipeline).await?;
        Ok(totals
            .first()
            .map(|t| ChannelTotals {
                videos: t.videos.max(0) as u64,
                views: t.views,
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_search_is_literal() {
        let matcher = filter_document(&VideoFilter {
            title: Some("c++ (part 1)".into()),
            owner: None,
            published_only: true,
        });
        let title = matcher.get_document("title").unwrap();
        assert_eq!(title.get_str("$regex").unwrap(), r"c\+\+ \(part 1\)");
        assert_eq!(title.get_str("$options").unwrap(), "i");
        assert!(matcher.get_bool("isPublished").unwrap());
        assert!(!matcher.contains_key("owner"));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(filter_document(&VideoFilter::default()).is_empty());
    }
}
