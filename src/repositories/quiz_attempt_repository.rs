use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Client, Collection, IndexModel};
use tokio::sync::RwLock;

use crate::{
    db::Database,
    errors::AppResult,
    models::domain::{Grading, QuizAttempt},
    repositories::grading_repository::InMemoryGradingRepository,
};

#[async_trait]
pub trait QuizAttemptRepository: Send + Sync {
    /// Attempts by `user_id` on `quiz_id` with `created_at >= since`.
    async fn count_since(
        &self,
        user_id: &str,
        quiz_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<usize>;
    /// Same filter as `count_since`, oldest first.
    async fn find_since(
        &self,
        user_id: &str,
        quiz_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<QuizAttempt>>;
    /// Stores the attempt and its per-question gradings as one unit.
    async fn insert_with_gradings(
        &self,
        attempt: QuizAttempt,
        gradings: Vec<Grading>,
    ) -> AppResult<QuizAttempt>;
    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<QuizAttempt>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

fn window_filter(user_id: &str, quiz_id: &str, since: DateTime<Utc>) -> mongodb::bson::Document {
    doc! {
        "user_id": user_id,
        "quiz_id": quiz_id,
        "created_at": { "$gte": since.timestamp_millis() },
    }
}

pub struct MongoQuizAttemptRepository {
    client: Client,
    collection: Collection<QuizAttempt>,
    gradings: Collection<Grading>,
}

impl MongoQuizAttemptRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            client: db.client().clone(),
            collection: db.get_collection("quiz_attempts"),
            gradings: db.get_collection("gradings"),
        }
    }
}

#[async_trait]
impl QuizAttemptRepository for MongoQuizAttemptRepository {
    async fn count_since(
        &self,
        user_id: &str,
        quiz_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<usize> {
        let count = self
            .collection
            .count_documents(window_filter(user_id, quiz_id, since))
            .await?;
        Ok(count as usize)
    }

    async fn find_since(
        &self,
        user_id: &str,
        quiz_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self
            .collection
            .find(window_filter(user_id, quiz_id, since))
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn insert_with_gradings(
        &self,
        attempt: QuizAttempt,
        gradings: Vec<Grading>,
    ) -> AppResult<QuizAttempt> {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let result = async {
            self.collection
                .insert_one(&attempt)
                .session(&mut session)
                .await?;
            if !gradings.is_empty() {
                self.gradings
                    .insert_many(&gradings)
                    .session(&mut session)
                    .await?;
            }
            Ok::<_, mongodb::error::Error>(())
        }
        .await;

        match result {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(attempt)
            }
            Err(e) => {
                log::error!("Rolling back quiz attempt {}: {}", attempt.id, e);
                session.abort_transaction().await?;
                Err(e.into())
            }
        }
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self
            .collection
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        log::info!("Creating indexes for quiz_attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let window_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "quiz_id": 1, "created_at": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_quiz_created_at".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(window_index).await?;

        log::info!("Successfully created indexes for quiz_attempts collection");
        Ok(())
    }
}

pub struct InMemoryQuizAttemptRepository {
    attempts: RwLock<Vec<QuizAttempt>>,
    gradings: Arc<InMemoryGradingRepository>,
}

impl InMemoryQuizAttemptRepository {
    pub fn new(gradings: Arc<InMemoryGradingRepository>) -> Self {
        Self {
            attempts: RwLock::new(Vec::new()),
            gradings,
        }
    }
}

#[async_trait]
impl QuizAttemptRepository for InMemoryQuizAttemptRepository {
    async fn count_since(
        &self,
        user_id: &str,
        quiz_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<usize> {
        Ok(self.find_since(user_id, quiz_id, since).await?.len())
    }

    async fn find_since(
        &self,
        user_id: &str,
        quiz_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        let mut matching: Vec<QuizAttempt> = attempts
            .iter()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id && a.created_at >= since)
            .cloned()
            .collect();
        matching.sort_by_key(|a| a.created_at);
        Ok(matching)
    }

    async fn insert_with_gradings(
        &self,
        attempt: QuizAttempt,
        gradings: Vec<Grading>,
    ) -> AppResult<QuizAttempt> {
        let mut attempts = self.attempts.write().await;
        self.gradings.insert_all(gradings).await?;
        attempts.push(attempt.clone());
        Ok(attempt)
    }

    async fn find_by_user(&self, user_id: &str) -> AppResult<Vec<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        let mut mine: Vec<QuizAttempt> = attempts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mine)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        Ok(())
    }
}
