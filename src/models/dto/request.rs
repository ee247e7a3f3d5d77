use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::quiz_question::DraftOption;
use crate::models::domain::SubmissionKind;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,

    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, message = "Question text is required"))]
    pub text: String,

    #[serde(default)]
    pub options: Vec<DraftOption>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    pub description: Option<String>,

    #[validate(length(min = 1, message = "A quiz needs at least one question"), nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

/// An answer is an option index for multiple choice, free text otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    Choice(usize),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitQuizRequest {
    /// Indexed by question position; `null` for skipped questions.
    pub answers: Vec<Option<SubmittedAnswer>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    pub kind: SubmissionKind,

    pub assignment_id: Option<String>,

    #[validate(length(max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Submission content is required"))]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    #[validate(range(min = 0))]
    pub offset: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

impl PaginationParams {
    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionFilter {
    pub kind: Option<SubmissionKind>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradeRequest {
    pub grade: f64,
    pub feedback: Option<String>,
}
