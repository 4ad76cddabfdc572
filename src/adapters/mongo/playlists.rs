use super::{MongoStore, PLAYLISTS};
use crate::domain::models::Playlist;
use crate::error::StoreResult;
use crate::ports::repository::PlaylistRepository;
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, DateTime, Document};
use futures::TryStreamExt;
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::Collection;

impl MongoStore {
    fn playlists(&self) -> Collection<Playlist> {
        self.collection(PLAYLISTS)
    }

    async fn modify_playlist(&self, id: ObjectId, update: Document) -> StoreResult<Option<Playlist>> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        Ok(self
            .playlists()
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await?)
    }
}

#[async_trait]
impl PlaylistRepository for MongoStore {
    async fn insert_playlist(&self, playlist: &Playlist) -> StoreResult<()> {
        self.playlists().insert_one(playlist, None).await?;
        Ok(())
    }

    async fn find_playlist(&self, id: ObjectId) -> StoreResult<Option<Playlist>> {
        Ok(self.playlists().find_one(doc! { "_id": id }, None).await?)
    }

    async fn playlists_by_owner(&self, owner: ObjectId) -> StoreResult<Vec<Playlist>> {
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .build();
        Ok(self
            .playlists()
            .find(doc! { "owner": owner }, options)
            .await?
            .try_collect()
            .await?)
    }

    async fn update_playlist(
        &self,
        id: ObjectId,
        name: String,
        description: String,
    ) -> StoreResult<Option<Playlist>> {
        self.modify_playlist(
            id,
            doc! {
                "$set": {
                    "name": name,
                    "description": description,
                    "updatedAt": DateTime::now(),
                }
            },
        )
        .await
    }

    async fn add_to_playlist(&self, id: ObjectId, video: ObjectId) -> StoreResult<Option<Playlist>> {
        self.modify_playlist(
            id,
            doc! {
                "$addToSet": { "videos": video },
                "$set": { "updatedAt": DateTime::now() },
            },
        )
        .await
    }

    async fn remove_from_playlist(
        &self,
        id: ObjectId,
        video: ObjectId,
    ) -> StoreResult<Option<Playlist>> {
        self.modify_playlist(
            id,
            doc! {
                "$pull": { "videos": video },
                "$set": { "updatedAt": DateTime::now() },
            },
        )
        .await
    }

    async fn delete_playlist(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self.playlists().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn remove_from_all_playlists(&self, video: ObjectId) -> StoreResult<u64> {
        let result = self
            .playlists()
            .update_many(
                doc! { "videos": video },
                doc! { "$pull": { "videos": video } },
                None,
            )
            .await?;
        Ok(result.modified_count)
    }
}
