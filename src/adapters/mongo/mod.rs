//! MongoDB adapter.
//!
//! `MongoStore` implements every repository port. Reads that the API serves
//! joined (owner summaries, subscription counts) are aggregation pipelines;
//! paginated reads run through a `$facet` that returns one page plus the
//! total in a single round trip.

mod comments;
mod likes;
mod playlists;
mod subscriptions;
mod tweets;
mod users;
mod videos;

use crate::domain::pagination::{Page, PageRequest};
use crate::error::{StoreError, StoreResult};
use crate::ports::repository::StoreHealth;
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Collection names
const USERS: &str = "users";
const VIDEOS: &str = "videos";
const COMMENTS: &str = "comments";
const TWEETS: &str = "tweets";
const LIKES: &str = "likes";
const PLAYLISTS: &str = "playlists";
const SUBSCRIPTIONS: &str = "subscriptions";

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone, Debug)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::from_database(client.database(database)))
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    /// Unique keys the services rely on, plus the lookup indexes for joins.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        let users = self.collection::<Document>(USERS);
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;

        let likes = self.collection::<Document>(LIKES);
        for field in ["video", "comment", "tweet"] {
            let mut keys = Document::new();
            keys.insert(field, 1);
            keys.insert("likedBy", 1);
            let mut only_set = Document::new();
            only_set.insert(field, doc! { "$type": "objectId" });
            let options = IndexOptions::builder()
                .unique(true)
                .partial_filter_expression(only_set)
                .build();
            likes
                .create_index(IndexModel::builder().keys(keys).options(options).build(), None)
                .await?;
        }

        self.collection::<Document>(SUBSCRIPTIONS)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "subscriber": 1, "channel": 1 })
                    .options(unique())
                    .build(),
                None,
            )
            .await?;

        let comments = self.collection::<Document>(COMMENTS);
        for field in ["video", "tweet", "replyTo"] {
            let mut keys = Document::new();
            keys.insert(field, 1);
            comments
                .create_index(IndexModel::builder().keys(keys).build(), None)
                .await?;
        }

        Ok(())
    }

    /// `_id`s of every document in `name` matching `filter`.
    async fn ids_matching(&self, name: &str, filter: Document) -> StoreResult<Vec<ObjectId>> {
        let options = FindOptions::builder().projection(doc! { "_id": 1 }).build();
        let docs: Vec<Document> = self
            .collection::<Document>(name)
            .find(filter, options)
            .await?
            .try_collect()
            .await?;
        docs.iter()
            .map(|d| {
                d.get_object_id("_id")
                    .map_err(|e| StoreError::Corrupt(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl StoreHealth for MongoStore {
    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

/// Map a write failure, turning duplicate-key violations into `StoreError::Duplicate`.
fn write_error(err: mongodb::error::Error) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(ref failure)) = *err.kind {
        if failure.code == DUPLICATE_KEY {
            return StoreError::Duplicate(failure.message.clone());
        }
    }
    StoreError::Mongo(err)
}

/// `$lookup` of the owning user, projected to an owner summary and flattened into `as_field`.
fn join_owner(local_field: &str, as_field: &str) -> Vec<Document> {
    let mut flatten = Document::new();
    flatten.insert(as_field, doc! { "$first": format!("${}", as_field) });
    vec![
        doc! {
            "$lookup": {
                "from": USERS,
                "localField": local_field,
                "foreignField": "_id",
                "as": as_field,
                "pipeline": [
                    { "$project": { "username": 1, "fullName": 1, "avatar.url": 1 } }
                ],
            }
        },
        doc! { "$addFields": flatten },
    ]
}

/// Replace each document with the user referenced by `local_field`.
fn replace_with_user(local_field: &str) -> Vec<Document> {
    vec![
        doc! {
            "$lookup": {
                "from": USERS,
                "localField": local_field,
                "foreignField": "_id",
                "as": "user",
                "pipeline": [
                    { "$project": { "username": 1, "fullName": 1, "avatar.url": 1 } }
                ],
            }
        },
        doc! { "$unwind": "$user" },
        doc! { "$replaceRoot": { "newRoot": "$user" } },
    ]
}

fn sort_stage(field: &str, direction: i32) -> Document {
    let mut order = Document::new();
    order.insert(field, direction);
    order.insert("_id", direction);
    doc! { "$sort": order }
}

#[derive(Deserialize)]
struct Facet<T> {
    docs: Vec<T>,
    total: Vec<Count>,
}

#[derive(Deserialize)]
struct Count {
    count: i64,
}

/// Run `pipeline`, then cut one page. `per_doc` stages only run on the page itself.
async fn paginate<T, C>(
    collection: &Collection<C>,
    mut pipeline: Vec<Document>,
    per_doc: Vec<Document>,
    page: PageRequest,
) -> StoreResult<Page<T>>
where
    T: DeserializeOwned,
    C: Send + Sync,
{
    let mut docs_branch = vec![
        doc! { "$skip": page.skip() as i64 },
        doc! { "$limit": page.limit as i64 },
    ];
    docs_branch.extend(per_doc);
    pipeline.push(doc! {
        "$facet": {
            "docs": docs_branch,
            "total": [ { "$count": "count" } ],
        }
    });

    let mut cursor = collection.aggregate(pipeline, None).await?;
    let Some(first) = cursor.try_next().await? else {
        return Ok(Page::empty(page));
    };
    let facet: Facet<T> = bson::from_document(first)?;
    let total = facet.total.first().map(|c| c.count.max(0) as u64).unwrap_or(0);
    Ok(Page::new(facet.docs, total, page))
}

async fn aggregate_all<T, C>(collection: &Collection<C>, pipeline: Vec<Document>) -> StoreResult<Vec<T>>
where
    T: DeserializeOwned,
    C: Send + Sync,
{
    let docs: Vec<Document> = collection.aggregate(pipeline, None).await?.try_collect().await?;
    docs.into_iter()
        .map(|d| bson::from_document(d).map_err(StoreError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_join_flattens_into_target_field() {
        let stages = join_owner("owner", "userDetails");
        let lookup = stages[0].get_document("$lookup").unwrap();
        assert_eq!(lookup.get_str("from").unwrap(), USERS);
        assert_eq!(lookup.get_str("as").unwrap(), "userDetails");
        let flatten = stages[1].get_document("$addFields").unwrap();
        assert_eq!(
            flatten.get_document("userDetails").unwrap().get_str("$first").unwrap(),
            "$userDetails"
        );
    }

    #[test]
    fn test_sort_stage_breaks_ties_on_id() {
        let stage = sort_stage("views", -1);
        let order = stage.get_document("$sort").unwrap();
        let keys: Vec<&String> = order.keys().collect();
        assert_eq!(keys, vec!["views", "_id"]);
        assert_eq!(order.get_i32("_id").unwrap(), -1);
    }
}
