use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

pub const MIN_GRADE: f64 = 0.0;
pub const MAX_GRADE: f64 = 100.0;

/// Placeholder feedback stored on per-question quiz gradings.
pub const QUIZ_FEEDBACK_PLACEHOLDER: &str = "None";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GradeTarget {
    Submission {
        submission_id: String,
    },
    QuizQuestion {
        quiz_id: String,
        attempt_id: String,
        question_id: String,
    },
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Grading {
    pub id: String,
    pub grade: f64,
    pub feedback: Option<String>,
    pub target: GradeTarget,
    pub student_id: String,
    pub grader_id: String,
    /// Set only for quiz-derived rows; those are excluded from the project percentage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<String>,
    /// Uniqueness key for single-grade targets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub fn validate_grade(grade: f64) -> AppResult<f64> {
    if !grade.is_finite() || !(MIN_GRADE..=MAX_GRADE).contains(&grade) {
        return Err(AppError::GradeOutOfRange(grade));
    }
    Ok(grade)
}

pub fn submission_target_key(submission_id: &str) -> String {
    format!("submission:{}", submission_id)
}

impl Grading {
    pub fn for_submission(
        submission_id: &str,
        student_id: &str,
        grader_id: &str,
        grade: f64,
        feedback: Option<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            grade: validate_grade(grade)?,
            feedback,
            target: GradeTarget::Submission {
                submission_id: submission_id.to_string(),
            },
            student_id: student_id.to_string(),
            grader_id: grader_id.to_string(),
            quiz_id: None,
            target_key: Some(submission_target_key(submission_id)),
            created_at: Utc::now(),
        })
    }

    /// Quiz gradings are produced by the aggregator, so the student is also the recorded grader.
    pub fn for_quiz_question(
        quiz_id: &str,
        attempt_id: &str,
        question_id: &str,
        student_id: &str,
        grade: f64,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            grade: validate_grade(grade)?,
            feedback: Some(QUIZ_FEEDBACK_PLACEHOLDER.to_string()),
            target: GradeTarget::QuizQuestion {
                quiz_id: quiz_id.to_string(),
                attempt_id: attempt_id.to_string(),
                question_id: question_id.to_string(),
            },
            student_id: student_id.to_string(),
            grader_id: student_id.to_string(),
            quiz_id: Some(quiz_id.to_string()),
            target_key: None,
            created_at,
        })
    }
}

/// What a reader sees for a gradable item: one authoritative grade, or none yet.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GradeStatus {
    Graded {
        grade: f64,
        feedback: Option<String>,
        grader_id: String,
        graded_at: DateTime<Utc>,
    },
    Ungraded,
}

impl From<Option<Grading>> for GradeStatus {
    fn from(grading: Option<Grading>) -> Self {
        match grading {
            Some(g) => GradeStatus::Graded {
                grade: g.grade,
                feedback: g.feedback,
                grader_id: g.grader_id,
                graded_at: g.created_at,
            },
            None => GradeStatus::Ungraded,
        }
    }
}
