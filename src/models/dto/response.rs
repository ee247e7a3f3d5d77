use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::domain::{
    GradeStatus, Quiz, QuizAttempt, QuizQuestion, Submission, User, UserRole,
};
use crate::services::grading_aggregator::QuizScore;

#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            logged_in: user.logged_in,
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionDto {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct QuizDto {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub total_questions: usize,
    pub questions: Vec<QuestionDto>,
}

impl QuizDto {
    /// Answer keys are only included for quiz authors.
    pub fn from_quiz(quiz: Quiz, reveal_answers: bool) -> Self {
        let questions = quiz
            .questions
            .into_iter()
            .map(|question: QuizQuestion| QuestionDto {
                id: question.id,
                text: question.text,
                options: question.options.into_iter().map(|o| o.text).collect(),
                correct_option: if reveal_answers {
                    question.correct_option
                } else {
                    None
                },
            })
            .collect::<Vec<_>>();

        QuizDto {
            id: quiz.id,
            title: quiz.title,
            description: quiz.description,
            total_questions: questions.len(),
            questions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginationMetadata {
    pub offset: i64,
    pub limit: i64,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub pagination: PaginationMetadata,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, offset: i64, limit: i64, total: i64) -> Self {
        Self {
            data,
            pagination: PaginationMetadata {
                offset,
                limit,
                total,
            },
        }
    }
}

/// A submission as listed for reviewers, with its current grade.
#[derive(Debug, Serialize)]
pub struct SubmissionDto {
    #[serde(flatten)]
    pub submission: Submission,
    pub grading: GradeStatus,
}

#[derive(Debug, Serialize)]
pub struct QuizSubmissionResponse {
    pub attempt: QuizAttempt,
    pub score: QuizScore,
}
