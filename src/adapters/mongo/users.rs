use super::{aggregate_all, write_error, MongoStore, SUBSCRIPTIONS, USERS};
use crate::domain::models::User;
use crate::domain::views::ChannelProfile;
use crate::error::StoreResult;
use crate::ports::repository::{UserChanges, UserRepository};
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, DateTime, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::Collection;

impl MongoStore {
    fn users(&self) -> Collection<User> {
        self.collection(USERS)
    }
}

#[async_trait]
impl UserRepository for MongoStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.users().insert_one(user, None).await.map_err(write_error)?;
        Ok(())
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_user_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<Option<User>> {
        let mut any = Vec::new();
        if let Some(username) = username {
            any.push(doc! { "username": username });
        }
        if let Some(email) = email {
            any.push(doc! { "email": email });
        }
        if any.is_empty() {
            return Ok(None);
        }
        Ok(self.users().find_one(doc! { "$or": any }, None).await?)
    }

    async fn update_user(&self, id: ObjectId, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut set = doc! { "updatedAt": DateTime::now() };
        if let Some(full_name) = changes.full_name {
            set.insert("fullName", full_name);
        }
        if let Some(email) = changes.email {
            set.insert("email", email);
        }
        if let Some(avatar) = changes.avatar {
            set.insert("avatar", bson::to_bson(&avatar)?);
        }
        if let Some(cover) = changes.cover_image {
            set.insert("coverImage", bson::to_bson(&cover)?);
        }
        if let Some(password) = changes.password {
            set.insert("password", password);
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.users()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await
            .map_err(write_error)
    }

    async fn set_refresh_token(&self, id: ObjectId, token: Option<String>) -> StoreResult<()> {
        let update = match token {
            Some(token) => doc! { "$set": { "refreshToken": token } },
            None => doc! { "$unset": { "refreshToken": "" } },
        };
        self.users().update_one(doc! { "_id": id }, update, None).await?;
        Ok(())
    }

    async fn record_watch(&self, id: ObjectId, video: ObjectId) -> StoreResult<()> {
        self.users()
            .update_one(doc! { "_id": id }, move_to_front("watchHistory", video), None)
            .await?;
        Ok(())
    }

    async fn channel_profile(
        &self,
        username: &str,
        viewer: ObjectId,
    ) -> StoreResult<Option<ChannelProfile>> {
        let pipeline: Vec<Document> = vec![
            doc! { "$match": { "username": username } },
            doc! {
                "$lookup": {
                    "from": SUBSCRIPTIONS,
                    "localField": "_id",
                    "foreignField": "channel",
                    "as": "subscribers",
                }
            },
            doc! {
                "$lookup": {
                    "from": SUBSCRIPTIONS,
                    "localField": "_id",
                    "foreignField": "subscriber",
                    "as": "subscribedTo",
                }
            },
            doc! {
                "$addFields": {
                    "subscribersCount": { "$size": "$subscribers" },
                    "channelsSubscribedToCount": { "$size": "$subscribedTo" },
                    "isSubscribed": { "$in": [viewer, "$subscribers.subscriber"] },
                }
            },
            doc! {
                "$project": {
                    "username": 1,
                    "fullName": 1,
                    "email": 1,
                    "avatar.url": 1,
                    "coverImage.url": 1,
                    "subscribersCount": 1,
                    "channelsSubscribedToCount": 1,
                    "isSubscribed": 1,
                }
            },
        ];
        let profiles: Vec<ChannelProfile> = aggregate_all(&self.users(), pipeline).await?;
        Ok(profiles.into_iter().next())
    }
}

/// Single pipeline update that drops `value` from the array and puts it first.
fn move_to_front(field: &str, value: ObjectId) -> Vec<Document> {
    let current = format!("${}", field);
    let mut set = Document::new();
    set.insert(
        field,
        doc! {
            "$concatArrays": [
                [value],
                {
                    "$filter": {
                        "input": { "$ifNull": [current, []] },
                        "cond": { "$ne": ["$$this", value] },
                    }
                },
            ]
        },
    );
    vec![doc! { "$set": set }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_is_a_single_pipeline_update() {
        let video = ObjectId::new();
        let stages = move_to_front("watchHistory", video);
        assert_eq!(stages.len(), 1);
        let history = stages[0]
            .get_document("$set")
            .unwrap()
            .get_document("watchHistory")
            .unwrap()
            .get_array("$concatArrays")
            .unwrap();
        assert_eq!(history[0], bson::bson!([video]));
        let filter = history[1].as_document().unwrap().get_document("$filter").unwrap();
        assert_eq!(
            filter.get_document("cond").unwrap().get_array("$ne").unwrap()[1],
            bson::Bson::ObjectId(video)
        );
    }
}
