use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One submission of a quiz. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct QuizAttempt {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub score: f64,
    // epoch millis so window filters compare numerically in the store
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl QuizAttempt {
    pub fn new(user_id: &str, quiz_id: &str, score: f64, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            quiz_id: quiz_id.to_string(),
            score,
            created_at,
        }
    }
}

/// Per-question score handed from the aggregator to the attempt recorder.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct GradingEntry {
    pub question_id: String,
    pub score: f64,
}

/// Outcome of a quota check for a (user, quiz) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttemptQuota {
    pub allowed: bool,
    pub remaining: usize,
    pub attempts_in_window: usize,
    /// Seconds until the oldest counted attempt leaves the window; set only when blocked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<i64>,
}

impl AttemptQuota {
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after_secs.map(Duration::seconds)
    }
}

/// Renders a wait as "3h 05m" for user-facing messages.
pub fn format_wait(wait: Duration) -> String {
    let total_minutes = (wait.num_seconds().max(0) + 59) / 60;
    format!("{}h {:02}m", total_minutes / 60, total_minutes % 60)
}
