use super::{write_error, MongoStore, LIKES};
use crate::domain::models::{Like, LikeKind, LikeTarget};
use crate::error::{StoreError, StoreResult};
use crate::ports::repository::LikeRepository;
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::options::FindOptions;
use mongodb::Collection;

impl MongoStore {
    fn likes(&self) -> Collection<Like> {
        self.collection(LIKES)
    }
}

fn in_targets(kind: LikeKind, targets: &[ObjectId]) -> Document {
    let mut filter = Document::new();
    filter.insert(kind.field(), doc! { "$in": targets.to_vec() });
    filter
}

#[async_trait]
impl LikeRepository for MongoStore {
    async fn find_like(&self, target: LikeTarget, user: ObjectId) -> StoreResult<Option<Like>> {
        let mut filter = doc! { "likedBy": user };
        filter.insert(target.kind.field(), target.id);
        Ok(self.likes().find_one(filter, None).await?)
    }

    async fn insert_like(&self, like: &Like) -> StoreResult<()> {
        self.likes().insert_one(like, None).await.map_err(write_error)?;
        Ok(())
    }

    async fn delete_like(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self.likes().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn liked_video_ids(&self, user: ObjectId) -> StoreResult<Vec<ObjectId>> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .build();
        let likes: Vec<Like> = self
            .likes()
            .find(
                doc! { "likedBy": user, "video": { "$type": "objectId" } },
                options,
            )
            .await?
            .try_collect()
            .await?;
        likes
            .into_iter()
            .map(|like| {
                like.video
                    .ok_or_else(|| StoreError::Corrupt(format!("like {} lost its video", like.id)))
            })
            .collect()
    }

    async fn count_likes(&self, kind: LikeKind, targets: &[ObjectId]) -> StoreResult<u64> {
        if targets.is_empty() {
            return Ok(0);
        }
        Ok(self
            .likes()
            .count_documents(in_targets(kind, targets), None)
            .await?)
    }

    async fn delete_likes_for(&self, kind: LikeKind, targets: &[ObjectId]) -> StoreResult<u64> {
        if targets.is_empty() {
            return Ok(0);
        }
        let result = self
            .likes()
            .delete_many(in_targets(kind, targets), None)
            .await?;
        Ok(result.deleted_count)
    }
}
