use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionKind {
    Assignment,
    Project,
}

/// Student work awaiting a grade: an assignment answer or a project link.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Submission {
    pub id: String,
    pub user_id: String,
    pub kind: SubmissionKind,
    pub assignment_id: Option<String>,
    pub title: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(
        user_id: &str,
        kind: SubmissionKind,
        assignment_id: Option<String>,
        title: Option<String>,
        content: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            kind,
            assignment_id,
            title,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }
}
