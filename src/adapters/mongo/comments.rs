use super::{aggregate_all, join_owner, paginate, sort_stage, MongoStore, COMMENTS};
use crate::domain::models::{Comment, CommentTarget};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::views::CommentView;
use crate::error::StoreResult;
use crate::ports::repository::CommentRepository;
use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson, DateTime, Document};
use mongodb::Collection;

impl MongoStore {
    fn comments(&self) -> Collection<Comment> {
        self.collection(COMMENTS)
    }
}

fn target_filter(target: CommentTarget) -> Document {
    let mut filter = Document::new();
    filter.insert(target.field(), target.id());
    filter
}

#[async_trait]
impl CommentRepository for MongoStore {
    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        self.comments().insert_one(comment, None).await?;
        Ok(())
    }

    async fn find_comment(&self, id: ObjectId) -> StoreResult<Option<Comment>> {
        Ok(self.comments().find_one(doc! { "_id": id }, None).await?)
    }

    async fn comment_view(&self, id: ObjectId) -> StoreResult<Option<CommentView>> {
        let mut pipeline = vec![doc! { "$match": { "_id": id } }];
        pipeline.extend(join_owner("owner", "owner"));
        let views: Vec<CommentView> = aggregate_all(&self.comments(), pipeline).await?;
        Ok(views.into_iter().next())
    }

    async fn list_comments(
        &self,
        target: CommentTarget,
        page: PageRequest,
    ) -> StoreResult<Page<CommentView>> {
        let pipeline = vec![
            doc! { "$match": target_filter(target) },
            sort_stage("createdAt", -1),
        ];
        paginate(&self.comments(), pipeline, join_owner("owner", "owner"), page).await
    }

    async fn update_comment(
        &self,
        id: ObjectId,
        content: String,
        reply_to: Option<ObjectId>,
    ) -> StoreResult<bool> {
        let reply_to = reply_to.map(Bson::ObjectId).unwrap_or(Bson::Null);
        let result = self
            .comments()
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": {
                        "content": content,
                        "replyTo": reply_to,
                        "updatedAt": DateTime::now(),
                    }
                },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn comment_ids_for_target(&self, target: CommentTarget) -> StoreResult<Vec<ObjectId>> {
        self.ids_matching(COMMENTS, target_filter(target)).await
    }

    async fn reply_ids(&self, parents: &[ObjectId]) -> StoreResult<Vec<ObjectId>> {
        if parents.is_empty() {
            return Ok(Vec::new());
        }
        self.ids_matching(COMMENTS, doc! { "replyTo": { "$in": parents.to_vec() } })
            .await
    }

    async fn delete_comments(&self, ids: &[ObjectId]) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = self
            .comments()
            .delete_many(doc! { "_id": { "$in": ids.to_vec() } }, None)
            .await?;
        Ok(result.deleted_count)
    }
}
