use std::sync::Arc;

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{AttemptQuota, Quiz, QuizQuestion},
        dto::{
            request::{CreateQuizRequest, SubmittedAnswer},
            response::QuizSubmissionResponse,
        },
    },
    repositories::QuizRepository,
    services::{attempt_tracker::QuizAttemptTracker, grading_aggregator::GradingAggregator},
};

pub struct QuizService {
    repository: Arc<dyn QuizRepository>,
    tracker: Arc<QuizAttemptTracker>,
    aggregator: Arc<GradingAggregator>,
}

impl QuizService {
    pub fn new(
        repository: Arc<dyn QuizRepository>,
        tracker: Arc<QuizAttemptTracker>,
        aggregator: Arc<GradingAggregator>,
    ) -> Self {
        Self {
            repository,
            tracker,
            aggregator,
        }
    }

    pub async fn create_quiz(&self, request: CreateQuizRequest, created_by: &str) -> AppResult<Quiz> {
        request.validate()?;

        let questions = request
            .questions
            .iter()
            .map(|question| QuizQuestion::from_draft(question.text.trim(), &question.options))
            .collect::<AppResult<Vec<_>>>()?;

        let quiz = Quiz::new(
            request.title.trim(),
            request.description,
            created_by,
            questions,
        );
        let quiz = self.repository.create(quiz).await?;

        log::info!(
            "Quiz {} created by {} with {} question(s)",
            quiz.id,
            created_by,
            quiz.total_questions()
        );
        Ok(quiz)
    }

    pub async fn get_quiz(&self, id: &str) -> AppResult<Quiz> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::QuizNotFound(id.to_string()))
    }

    pub async fn list_quizzes(&self, offset: i64, limit: i64) -> AppResult<(Vec<Quiz>, i64)> {
        self.repository.list_quizzes(offset, limit).await
    }

    pub async fn quota(&self, quiz_id: &str, user_id: &str, now: DateTime<Utc>) -> AppResult<AttemptQuota> {
        let quiz = self.get_quiz(quiz_id).await?;
        self.tracker.can_attempt(user_id, &quiz.id, now).await
    }

    /// Grades and records a submission. The quota is checked up front so a
    /// blocked student never triggers oracle calls, then re-checked under the
    /// per-(user, quiz) lock when the attempt is written.
    pub async fn submit_quiz(
        &self,
        quiz_id: &str,
        user_id: &str,
        answers: &[Option<SubmittedAnswer>],
        now: DateTime<Utc>,
    ) -> AppResult<QuizSubmissionResponse> {
        let quiz = self.get_quiz(quiz_id).await?;

        let quota = self.tracker.can_attempt(user_id, &quiz.id, now).await?;
        if !quota.allowed {
            log::info!("User {} blocked from quiz {} by attempt quota", user_id, quiz.id);
            return Err(self.tracker.quota_exceeded(&quota));
        }

        let score = self.aggregator.score(&quiz, answers).await?;
        let attempt = self
            .tracker
            .try_record_attempt(user_id, &quiz.id, score.total, &score.grading_entries(), now)
            .await?;

        Ok(QuizSubmissionResponse { attempt, score })
    }
}
