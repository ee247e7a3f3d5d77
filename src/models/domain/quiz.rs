use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::quiz_question::QuizQuestion;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_by: String,
    pub questions: Vec<QuizQuestion>, // graded in this order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Quiz {
    pub fn new(
        title: &str,
        description: Option<String>,
        created_by: &str,
        questions: Vec<QuizQuestion>,
    ) -> Self {
        Quiz {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description,
            created_by: created_by.to_string(),
            questions,
            created_at: Some(Utc::now()),
        }
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_quiz_keeps_question_order() {
        let quiz = Quiz::new(
            "Week 1",
            None,
            "admin-1",
            vec![QuizQuestion::open_ended("first"), QuizQuestion::open_ended("second")],
        );

        assert_eq!(quiz.total_questions(), 2);
        assert_eq!(quiz.questions[0].text, "first");
        assert_eq!(quiz.questions[1].text, "second");
        assert!(quiz.created_at.is_some());
    }
}
