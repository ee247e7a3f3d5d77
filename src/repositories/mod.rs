pub mod grading_repository;
pub mod mint_status_repository;
pub mod quiz_attempt_repository;
pub mod quiz_repository;
pub mod refresh_token_repository;
pub mod submission_repository;
pub mod user_repository;

use std::sync::Arc;

pub use grading_repository::{GradingRepository, InMemoryGradingRepository, MongoGradingRepository};
pub use mint_status_repository::{
    InMemoryMintStatusRepository, MintStatusRepository, MongoMintStatusRepository,
};
pub use quiz_attempt_repository::{
    InMemoryQuizAttemptRepository, MongoQuizAttemptRepository, QuizAttemptRepository,
};
pub use quiz_repository::{InMemoryQuizRepository, MongoQuizRepository, QuizRepository};
pub use refresh_token_repository::{
    InMemoryRefreshTokenRepository, MongoRefreshTokenRepository, RefreshTokenRepository,
};
pub use submission_repository::{
    InMemorySubmissionRepository, MongoSubmissionRepository, SubmissionRepository,
};
pub use user_repository::{InMemoryUserRepository, MongoUserRepository, UserRepository};

use crate::{db::Database, errors::AppResult};

/// Every store the services need, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub attempts: Arc<dyn QuizAttemptRepository>,
    pub gradings: Arc<dyn GradingRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub mint_status: Arc<dyn MintStatusRepository>,
}

impl Repositories {
    pub fn mongo(db: &Database) -> Self {
        Self {
            users: Arc::new(MongoUserRepository::new(db)),
            refresh_tokens: Arc::new(MongoRefreshTokenRepository::new(db)),
            quizzes: Arc::new(MongoQuizRepository::new(db)),
            attempts: Arc::new(MongoQuizAttemptRepository::new(db)),
            gradings: Arc::new(MongoGradingRepository::new(db)),
            submissions: Arc::new(MongoSubmissionRepository::new(db)),
            mint_status: Arc::new(MongoMintStatusRepository::new(db)),
        }
    }

    pub fn in_memory() -> Self {
        let gradings = Arc::new(InMemoryGradingRepository::new());
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            refresh_tokens: Arc::new(InMemoryRefreshTokenRepository::new()),
            quizzes: Arc::new(InMemoryQuizRepository::new()),
            attempts: Arc::new(InMemoryQuizAttemptRepository::new(Arc::clone(&gradings))),
            gradings,
            submissions: Arc::new(InMemorySubmissionRepository::new()),
            mint_status: Arc::new(InMemoryMintStatusRepository::new()),
        }
    }

    pub async fn ensure_indexes(&self) -> AppResult<()> {
        self.users.ensure_indexes().await?;
        self.refresh_tokens.ensure_indexes().await?;
        self.quizzes.ensure_indexes().await?;
        self.attempts.ensure_indexes().await?;
        self.gradings.ensure_indexes().await?;
        self.submissions.ensure_indexes().await?;
        Ok(())
    }
}
