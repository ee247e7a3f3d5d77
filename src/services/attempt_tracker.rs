use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex},
};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::{
    config::{Config, MAX_ATTEMPT_WINDOW_HOURS},
    errors::{AppError, AppResult},
    models::domain::{
        quiz_attempt::format_wait, AttemptQuota, Grading, GradingEntry, QuizAttempt,
    },
    repositories::{QuizAttemptRepository, QuizRepository},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptPolicy {
    pub max_attempts: usize,
    pub window: Duration,
}

impl Default for AttemptPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            window: Duration::hours(12),
        }
    }
}

impl AttemptPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_quiz_attempts,
            window: Duration::hours(config.attempt_window_hours.clamp(1, MAX_ATTEMPT_WINDOW_HOURS)),
        }
    }
}

type LockKey = (String, String);

/// Enforces the sliding-window attempt quota and persists attempts.
///
/// The check and the insert for one (user, quiz) pair are serialized by a
/// per-pair async mutex, so concurrent submissions cannot both pass the
/// last free slot.
pub struct QuizAttemptTracker {
    attempts: Arc<dyn QuizAttemptRepository>,
    quizzes: Arc<dyn QuizRepository>,
    policy: AttemptPolicy,
    locks: StdMutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

impl QuizAttemptTracker {
    pub fn new(
        attempts: Arc<dyn QuizAttemptRepository>,
        quizzes: Arc<dyn QuizRepository>,
        policy: AttemptPolicy,
    ) -> Self {
        Self {
            attempts,
            quizzes,
            policy,
            locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> AttemptPolicy {
        self.policy
    }

    pub async fn can_attempt(
        &self,
        user_id: &str,
        quiz_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<AttemptQuota> {
        let since = now - self.policy.window;
        let in_window = self.attempts.find_since(user_id, quiz_id, since).await?;
        let count = in_window.len();
        let allowed = count < self.policy.max_attempts;

        // a slot frees once enough of the oldest attempts leave the window
        // to bring the count back under the limit
        let retry_after_secs = if allowed {
            None
        } else {
            in_window
                .get(count - self.policy.max_attempts)
                .map(|freeing| (freeing.created_at + self.policy.window - now).num_seconds().max(0))
        };

        Ok(AttemptQuota {
            allowed,
            remaining: self.policy.max_attempts.saturating_sub(count),
            attempts_in_window: count,
            retry_after_secs,
        })
    }

    pub async fn record_attempt(
        &self,
        user_id: &str,
        quiz_id: &str,
        score: f64,
        entries: &[GradingEntry],
        now: DateTime<Utc>,
    ) -> AppResult<QuizAttempt> {
        if self.quizzes.find_by_id(quiz_id).await?.is_none() {
            return Err(AppError::QuizNotFound(quiz_id.to_string()));
        }

        let attempt = QuizAttempt::new(user_id, quiz_id, score, now);
        let gradings = entries
            .iter()
            .map(|entry| {
                Grading::for_quiz_question(
                    quiz_id,
                    &attempt.id,
                    &entry.question_id,
                    user_id,
                    entry.score,
                    now,
                )
            })
            .collect::<AppResult<Vec<_>>>()?;

        let attempt = self.attempts.insert_with_gradings(attempt, gradings).await?;
        log::info!(
            "Recorded attempt {} for user {} on quiz {} (score {:.2})",
            attempt.id,
            user_id,
            quiz_id,
            score
        );
        Ok(attempt)
    }

    /// Quota check and insert as one step for the (user, quiz) pair.
    pub async fn try_record_attempt(
        &self,
        user_id: &str,
        quiz_id: &str,
        score: f64,
        entries: &[GradingEntry],
        now: DateTime<Utc>,
    ) -> AppResult<QuizAttempt> {
        let key = (user_id.to_string(), quiz_id.to_string());
        let lock = self.lock_for(&key);

        let result = {
            let _guard = lock.lock().await;
            match self.can_attempt(user_id, quiz_id, now).await {
                Ok(quota) if !quota.allowed => Err(self.quota_exceeded(&quota)),
                Ok(_) => self.record_attempt(user_id, quiz_id, score, entries, now).await,
                Err(e) => Err(e),
            }
        };

        drop(lock);
        self.release_lock(&key);
        result
    }

    pub fn quota_exceeded(&self, quota: &AttemptQuota) -> AppError {
        let wait = quota
            .retry_after()
            .map(format_wait)
            .unwrap_or_else(|| "a while".to_string());
        AppError::QuotaExceeded(format!(
            "You can take this quiz at most {} times every {} hours. Try again in {}",
            self.policy.max_attempts,
            self.policy.window.num_hours(),
            wait
        ))
    }

    fn lock_for(&self, key: &LockKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    fn release_lock(&self, key: &LockKey) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(key)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::{quiz_question::QuizQuestion, Quiz};
    use crate::repositories::{GradingRepository, Repositories};

    async fn setup() -> (Arc<QuizAttemptTracker>, Repositories, Quiz) {
        let repos = Repositories::in_memory();
        let quiz = Quiz::new("Q", None, "admin", vec![QuizQuestion::open_ended("why?")]);
        repos.quizzes.create(quiz.clone()).await.unwrap();
        let tracker = Arc::new(QuizAttemptTracker::new(
            repos.attempts.clone(),
            repos.quizzes.clone(),
            AttemptPolicy::default(),
        ));
        (tracker, repos, quiz)
    }

    #[tokio::test]
    async fn test_sliding_window_blocks_then_frees_a_slot() {
        let (tracker, _, quiz) = setup().await;
        let now = Utc::now();

        for hours_ago in [1, 5, 11] {
            tracker
                .record_attempt("u", &quiz.id, 50.0, &[], now - Duration::hours(hours_ago))
                .await
                .unwrap();
        }

        let blocked = tracker.can_attempt("u", &quiz.id, now).await.unwrap();
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);
        assert_eq!(blocked.retry_after_secs, Some(Duration::hours(1).num_seconds()));

        let later = now + Duration::hours(1) + Duration::minutes(1);
        let freed = tracker.can_attempt("u", &quiz.id, later).await.unwrap();
        assert!(freed.allowed);
        assert_eq!(freed.remaining, 1);
        assert_eq!(freed.retry_after_secs, None);
    }

    #[tokio::test]
    async fn test_retry_hint_when_over_the_limit() {
        let (tracker, _, quiz) = setup().await;
        let now = Utc::now();

        // four attempts can land when the limit was lowered after they were taken
        for hours_ago in [11, 10, 2, 1] {
            tracker
                .record_attempt("u", &quiz.id, 0.0, &[], now - Duration::hours(hours_ago))
                .await
                .unwrap();
        }

        let blocked = tracker.can_attempt("u", &quiz.id, now).await.unwrap();
        assert!(!blocked.allowed);
        assert_eq!(blocked.attempts_in_window, 4);
        assert_eq!(blocked.retry_after_secs, Some(Duration::hours(2).num_seconds()));

        let hinted = now + Duration::seconds(blocked.retry_after_secs.unwrap() + 1);
        assert!(tracker.can_attempt("u", &quiz.id, hinted).await.unwrap().allowed);
        let too_early = now + Duration::hours(1) + Duration::seconds(1);
        assert!(!tracker.can_attempt("u", &quiz.id, too_early).await.unwrap().allowed);
    }

    #[test]
    fn test_policy_window_is_clamped() {
        let mut config = Config::test_config();
        config.attempt_window_hours = i64::MAX;
        assert_eq!(
            AttemptPolicy::from_config(&config).window,
            Duration::hours(MAX_ATTEMPT_WINDOW_HOURS)
        );

        config.attempt_window_hours = -4;
        assert_eq!(AttemptPolicy::from_config(&config).window, Duration::hours(1));
    }

    #[tokio::test]
    async fn test_zero_attempt_policy_never_offers_a_retry() {
        let repos = Repositories::in_memory();
        let tracker = QuizAttemptTracker::new(
            repos.attempts.clone(),
            repos.quizzes.clone(),
            AttemptPolicy {
                max_attempts: 0,
                window: Duration::hours(12),
            },
        );

        let quota = tracker.can_attempt("u", "q", Utc::now()).await.unwrap();
        assert!(!quota.allowed);
        assert_eq!(quota.retry_after_secs, None);
    }

    #[tokio::test]
    async fn test_attempt_exactly_at_window_start_still_counts() {
        let (tracker, _, quiz) = setup().await;
        let now = Utc::now();

        for _ in 0..3 {
            tracker
                .record_attempt("u", &quiz.id, 0.0, &[], now - Duration::hours(12))
                .await
                .unwrap();
        }

        assert!(!tracker.can_attempt("u", &quiz.id, now).await.unwrap().allowed);
        let just_after = now + Duration::milliseconds(1);
        assert!(tracker.can_attempt("u", &quiz.id, just_after).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_quota_is_per_user_and_quiz() {
        let (tracker, _, quiz) = setup().await;
        let now = Utc::now();
        for _ in 0..3 {
            tracker.record_attempt("u", &quiz.id, 0.0, &[], now).await.unwrap();
        }

        assert!(tracker.can_attempt("other", &quiz.id, now).await.unwrap().allowed);
        assert!(tracker.can_attempt("u", "other-quiz", now).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_record_attempt_for_unknown_quiz() {
        let (tracker, _, _) = setup().await;
        let err = tracker
            .record_attempt("u", "missing", 10.0, &[], Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::QuizNotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_record_attempt_writes_placeholder_feedback() {
        let (tracker, repos, quiz) = setup().await;
        let entries = vec![GradingEntry {
            question_id: quiz.questions[0].id.clone(),
            score: 100.0,
        }];

        let attempt = tracker
            .record_attempt("u", &quiz.id, 100.0, &entries, Utc::now())
            .await
            .unwrap();

        let gradings = repos.gradings.find_by_student("u").await.unwrap();
        assert_eq!(gradings.len(), 1);
        assert_eq!(gradings[0].feedback.as_deref(), Some("None"));
        assert_eq!(gradings[0].quiz_id.as_deref(), Some(quiz.id.as_str()));
        assert_eq!(attempt.score, 100.0);
    }

    #[tokio::test]
    async fn test_try_record_attempt_reports_wait_hint() {
        let (tracker, _, quiz) = setup().await;
        let now = Utc::now();
        for _ in 0..3 {
            tracker.try_record_attempt("u", &quiz.id, 0.0, &[], now).await.unwrap();
        }

        let err = tracker
            .try_record_attempt("u", &quiz.id, 0.0, &[], now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded(msg) if msg.contains("12h 00m")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_at_the_boundary() {
        let (tracker, repos, quiz) = setup().await;
        let now = Utc::now();
        for _ in 0..2 {
            tracker.try_record_attempt("u", &quiz.id, 0.0, &[], now).await.unwrap();
        }

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                let quiz_id = quiz.id.clone();
                tokio::spawn(async move {
                    tracker.try_record_attempt("u", &quiz_id, 0.0, &[], now).await
                })
            })
            .collect();

        let mut successes = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(AppError::QuotaExceeded(_)) => rejected += 1,
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!((successes, rejected), (1, 1));
        assert_eq!(repos.attempts.count_since("u", &quiz.id, now).await.unwrap(), 3);
        assert!(tracker.locks.lock().unwrap().is_empty());
    }
}
