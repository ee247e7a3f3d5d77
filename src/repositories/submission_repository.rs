use std::collections::HashMap;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Document},
    options::{FindOptions, IndexOptions},
    Collection, IndexModel,
};
use tokio::sync::RwLock;

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{Submission, SubmissionKind},
};

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn create(&self, submission: Submission) -> AppResult<Submission>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<Submission>>;
    /// Newest first, optionally restricted to one kind. Returns the page and the total match count.
    async fn list_submissions(
        &self,
        kind: Option<SubmissionKind>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Submission>, i64)>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoSubmissionRepository {
    collection: Collection<Submission>,
}

impl MongoSubmissionRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("submissions");
        Self { collection }
    }
}

#[async_trait]
impl SubmissionRepository for MongoSubmissionRepository {
    async fn create(&self, submission: Submission) -> AppResult<Submission> {
        self.collection.insert_one(&submission).await?;
        Ok(submission)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Submission>> {
        let submission = self.collection.find_one(doc! { "id": id }).await?;
        Ok(submission)
    }

    async fn list_submissions(
        &self,
        kind: Option<SubmissionKind>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Submission>, i64)> {
        let filter = match kind {
            Some(kind) => doc! { "kind": to_bson(&kind)? },
            None => Document::new(),
        };

        let total = self.collection.count_documents(filter.clone()).await? as i64;

        let find_options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .skip(Some(offset.max(0) as u64))
            .limit(Some(limit))
            .build();

        let cursor = self.collection.find(filter).with_options(find_options).await?;
        let items: Vec<Submission> = cursor.try_collect().await?;

        Ok((items, total))
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();
        let user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(IndexOptions::builder().name("user_id".to_string()).build())
            .build();
        let kind_index = IndexModel::builder()
            .keys(doc! { "kind": 1, "created_at": -1 })
            .options(IndexOptions::builder().name("kind_created_at".to_string()).build())
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(user_index).await?;
        self.collection.create_index(kind_index).await?;
        log::info!("Created indexes for submissions collection");

        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySubmissionRepository {
    submissions: RwLock<HashMap<String, Submission>>,
}

impl InMemorySubmissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubmissionRepository for InMemorySubmissionRepository {
    async fn create(&self, submission: Submission) -> AppResult<Submission> {
        self.submissions
            .write()
            .await
            .insert(submission.id.clone(), submission.clone());
        Ok(submission)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<Submission>> {
        Ok(self.submissions.read().await.get(id).cloned())
    }

    async fn list_submissions(
        &self,
        kind: Option<SubmissionKind>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Submission>, i64)> {
        let submissions = self.submissions.read().await;
        let mut items: Vec<Submission> = submissions
            .values()
            .filter(|s| kind.map_or(true, |k| s.kind == k))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = items.len() as i64;
        let page = items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}
