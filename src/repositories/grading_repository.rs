use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};
use tokio::sync::RwLock;

use crate::{
    db::{is_duplicate_key, Database},
    errors::{AppError, AppResult},
    models::domain::Grading,
};

#[async_trait]
pub trait GradingRepository: Send + Sync {
    /// Inserts the grading unless its `target_key` is already graded.
    /// Rows without a `target_key` are always inserted.
    async fn insert_if_ungraded(&self, grading: Grading) -> AppResult<Grading>;
    async fn find_by_target_key(&self, target_key: &str) -> AppResult<Option<Grading>>;
    async fn find_by_student(&self, student_id: &str) -> AppResult<Vec<Grading>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

fn already_graded(grading: &Grading) -> AppError {
    AppError::AlreadyGraded(
        grading
            .target_key
            .clone()
            .unwrap_or_else(|| grading.id.clone()),
    )
}

pub struct MongoGradingRepository {
    collection: Collection<Grading>,
}

impl MongoGradingRepository {
    pub fn new(db: &Database) -> Self {
        let collection = db.get_collection("gradings");
        Self { collection }
    }
}

#[async_trait]
impl GradingRepository for MongoGradingRepository {
    async fn insert_if_ungraded(&self, grading: Grading) -> AppResult<Grading> {
        match self.collection.insert_one(&grading).await {
            Ok(_) => Ok(grading),
            Err(e) if is_duplicate_key(&e) => Err(already_graded(&grading)),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_target_key(&self, target_key: &str) -> AppResult<Option<Grading>> {
        let grading = self
            .collection
            .find_one(doc! { "target_key": target_key })
            .await?;
        Ok(grading)
    }

    async fn find_by_student(&self, student_id: &str) -> AppResult<Vec<Grading>> {
        let gradings = self
            .collection
            .find(doc! { "student_id": student_id })
            .await?
            .try_collect()
            .await?;
        Ok(gradings)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for gradings collection");

        // quiz rows carry no target_key and must not collide on null
        let target_key_index = IndexModel::builder()
            .keys(doc! { "target_key": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .partial_filter_expression(doc! { "target_key": { "$type": "string" } })
                    .name("target_key_unique".to_string())
                    .build(),
            )
            .build();

        let student_index = IndexModel::builder()
            .keys(doc! { "student_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("student_id".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(target_key_index).await?;
        self.collection.create_index(student_index).await?;

        log::info!("Successfully created indexes for gradings collection");
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryGradingRepository {
    gradings: RwLock<Vec<Grading>>,
}

impl InMemoryGradingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn insert_all(&self, gradings: Vec<Grading>) -> AppResult<()> {
        let mut stored = self.gradings.write().await;
        for grading in &gradings {
            if let Some(key) = &grading.target_key {
                if stored.iter().any(|g| g.target_key.as_ref() == Some(key)) {
                    return Err(already_graded(grading));
                }
            }
        }
        stored.extend(gradings);
        Ok(())
    }
}

#[async_trait]
impl GradingRepository for InMemoryGradingRepository {
    async fn insert_if_ungraded(&self, grading: Grading) -> AppResult<Grading> {
        self.insert_all(vec![grading.clone()]).await?;
        Ok(grading)
    }

    async fn find_by_target_key(&self, target_key: &str) -> AppResult<Option<Grading>> {
        let gradings = self.gradings.read().await;
        Ok(gradings
            .iter()
            .find(|g| g.target_key.as_deref() == Some(target_key))
            .cloned())
    }

    async fn find_by_student(&self, student_id: &str) -> AppResult<Vec<Grading>> {
        let gradings = self.gradings.read().await;
        Ok(gradings
            .iter()
            .filter(|g| g.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}
