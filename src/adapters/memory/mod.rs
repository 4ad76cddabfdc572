//! In-process store backed by plain vectors.
//!
//! Used for local development (`STORE=memory`) and the API tests. Orderings
//! and joins mirror the Mongo pipelines: ties on the sort key fall back to the
//! document id in the same direction.

mod catalog;
mod social;

use crate::domain::views::OwnerSummary;
use crate::domain::models::{Comment, Like, Playlist, Subscription, Tweet, User, Video};
use crate::error::StoreResult;
use crate::ports::repository::StoreHealth;
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::DateTime;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Collections {
    users: Vec<User>,
    videos: Vec<Video>,
    comments: Vec<Comment>,
    tweets: Vec<Tweet>,
    likes: Vec<Like>,
    playlists: Vec<Playlist>,
    subscriptions: Vec<Subscription>,
}

impl Collections {
    fn owner_summary(&self, id: ObjectId) -> Option<OwnerSummary> {
        self.users.iter().find(|u| u.id == id).map(OwnerSummary::from)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Order by `key`, then id, both in the requested direction.
fn ordered(key: Ordering, a: ObjectId, b: ObjectId, descending: bool) -> Ordering {
    let ord = key.then_with(|| a.cmp(&b));
    if descending {
        ord.reverse()
    } else {
        ord
    }
}

fn newest_first(a: (DateTime, ObjectId), b: (DateTime, ObjectId)) -> Ordering {
    ordered(a.0.cmp(&b.0), a.1, b.1, true)
}
