use std::sync::Arc;

use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    models::{
        domain::{grading::MAX_GRADE, Grading, GradingEntry, Quiz, QuizQuestion},
        dto::request::SubmittedAnswer,
    },
    services::grading_oracle::GradingOracle,
};

pub const CERTIFICATE_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionScore {
    pub question_id: String,
    pub score: f64,
    pub max_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizScore {
    pub total: f64,
    pub per_question: Vec<QuestionScore>,
}

impl QuizScore {
    pub fn grading_entries(&self) -> Vec<GradingEntry> {
        self.per_question
            .iter()
            .map(|q| GradingEntry {
                question_id: q.question_id.clone(),
                score: q.score,
            })
            .collect()
    }
}

/// Scores quiz submissions; open-ended answers are judged by the oracle.
pub struct GradingAggregator {
    oracle: Arc<dyn GradingOracle>,
}

impl GradingAggregator {
    pub fn new(oracle: Arc<dyn GradingOracle>) -> Self {
        Self { oracle }
    }

    /// `answers[i]` belongs to `quiz.questions[i]`; missing positions score 0.
    pub async fn score(
        &self,
        quiz: &Quiz,
        answers: &[Option<SubmittedAnswer>],
    ) -> AppResult<QuizScore> {
        if quiz.questions.is_empty() {
            return Err(AppError::EmptyQuiz);
        }

        let max_score = MAX_GRADE / quiz.total_questions() as f64;
        let mut per_question = Vec::with_capacity(quiz.total_questions());

        for (index, question) in quiz.questions.iter().enumerate() {
            let answer = answers.get(index).and_then(Option::as_ref);
            let score = self.score_question(question, answer, max_score).await?;
            per_question.push(QuestionScore {
                question_id: question.id.clone(),
                score,
                max_score,
            });
        }

        let total = per_question.iter().map(|q| q.score).sum();
        Ok(QuizScore {
            total,
            per_question,
        })
    }

    async fn score_question(
        &self,
        question: &QuizQuestion,
        answer: Option<&SubmittedAnswer>,
        max_score: f64,
    ) -> AppResult<f64> {
        if question.is_multiple_choice() {
            let correct = matches!(
                (answer, question.correct_option),
                (Some(SubmittedAnswer::Choice(chosen)), Some(expected)) if *chosen == expected
            );
            return Ok(if correct { max_score } else { 0.0 });
        }

        let text = match answer {
            Some(SubmittedAnswer::Text(text)) if !text.trim().is_empty() => text.trim().to_string(),
            Some(SubmittedAnswer::Choice(n)) => n.to_string(),
            _ => return Ok(0.0),
        };

        let verdict = self.oracle.grade(&question.text, &text).await?;
        Ok(max_score * verdict.credit())
    }
}

/// Average of graded coursework (quiz rows and zero grades excluded), rounded
/// to two decimals. `None` when nothing qualifies.
pub fn project_percentage(gradings: &[Grading]) -> Option<f64> {
    let qualifying: Vec<f64> = gradings
        .iter()
        .filter(|g| g.quiz_id.is_none() && g.grade > 0.0)
        .map(|g| g.grade)
        .collect();

    if qualifying.is_empty() {
        return None;
    }

    let sum: f64 = qualifying.iter().sum();
    let percentage = sum / (qualifying.len() as f64 * MAX_GRADE) * 100.0;
    Some((percentage * 100.0).round() / 100.0)
}

pub fn is_eligible(percentage: Option<f64>) -> bool {
    percentage.is_some_and(|p| p >= CERTIFICATE_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::quiz_question::DraftOption;
    use crate::services::grading_oracle::{MockGradingOracle, OracleVerdict};
    use chrono::Utc;

    fn multiple_choice(text: &str, correct: usize, options: usize) -> QuizQuestion {
        let drafts: Vec<DraftOption> = (0..options)
            .map(|i| DraftOption {
                text: format!("option {}", i),
                is_correct: i == correct,
            })
            .collect();
        QuizQuestion::from_draft(text, &drafts).unwrap()
    }

    fn aggregator_with(oracle: MockGradingOracle) -> GradingAggregator {
        GradingAggregator::new(Arc::new(oracle))
    }

    fn no_oracle() -> GradingAggregator {
        let mut oracle = MockGradingOracle::new();
        oracle.expect_grade().never();
        aggregator_with(oracle)
    }

    #[tokio::test]
    async fn test_all_correct_multiple_choice_totals_100() {
        let questions: Vec<QuizQuestion> =
            (0..3).map(|i| multiple_choice(&format!("q{}", i), i, 4)).collect();
        let quiz = Quiz::new("MC", None, "admin", questions);
        let answers: Vec<_> = (0..3).map(|i| Some(SubmittedAnswer::Choice(i))).collect();

        let score = no_oracle().score(&quiz, &answers).await.unwrap();

        assert!((score.total - 100.0).abs() < 1e-9);
        assert_eq!(score.per_question.len(), 3);
    }

    #[tokio::test]
    async fn test_wrong_text_and_missing_multiple_choice_answers_score_zero() {
        let quiz = Quiz::new(
            "MC",
            None,
            "admin",
            vec![
                multiple_choice("a", 0, 2),
                multiple_choice("b", 0, 2),
                multiple_choice("c", 0, 2),
                multiple_choice("d", 0, 2),
            ],
        );
        let answers = vec![
            Some(SubmittedAnswer::Choice(1)),
            Some(SubmittedAnswer::Text("0".to_string())),
            None,
        ];

        let score = no_oracle().score(&quiz, &answers).await.unwrap();
        assert_eq!(score.total, 0.0);
    }

    #[tokio::test]
    async fn test_open_ended_verdicts_map_to_full_half_and_zero() {
        let quiz = Quiz::new(
            "Open",
            None,
            "admin",
            vec![
                QuizQuestion::open_ended("one"),
                QuizQuestion::open_ended("two"),
                QuizQuestion::open_ended("three"),
                QuizQuestion::open_ended("four"),
            ],
        );

        let mut oracle = MockGradingOracle::new();
        oracle.expect_grade().returning(|question, _| {
            Ok(match question {
                "one" => OracleVerdict::True,
                "two" => OracleVerdict::Maybe,
                _ => OracleVerdict::False,
            })
        });

        let answers = vec![
            Some(SubmittedAnswer::Text("a".into())),
            Some(SubmittedAnswer::Text("b".into())),
            Some(SubmittedAnswer::Text("c".into())),
            Some(SubmittedAnswer::Text("d".into())),
        ];
        let score = aggregator_with(oracle).score(&quiz, &answers).await.unwrap();

        let per: Vec<f64> = score.per_question.iter().map(|q| q.score).collect();
        assert_eq!(per, vec![25.0, 12.5, 0.0, 0.0]);
        assert_eq!(score.total, 37.5);
    }

    #[tokio::test]
    async fn test_blank_open_ended_answer_skips_the_oracle() {
        let quiz = Quiz::new(
            "Open",
            None,
            "admin",
            vec![QuizQuestion::open_ended("one"), QuizQuestion::open_ended("two")],
        );

        let score = no_oracle()
            .score(&quiz, &[Some(SubmittedAnswer::Text("   ".into())), None])
            .await
            .unwrap();
        assert_eq!(score.total, 0.0);
    }

    #[tokio::test]
    async fn test_total_is_not_rounded() {
        let quiz = Quiz::new(
            "Thirds",
            None,
            "admin",
            vec![
                multiple_choice("a", 0, 2),
                multiple_choice("b", 0, 2),
                multiple_choice("c", 0, 2),
            ],
        );
        let answers = vec![Some(SubmittedAnswer::Choice(0)), None, None];

        let score = no_oracle().score(&quiz, &answers).await.unwrap();
        assert_eq!(score.total, 100.0 / 3.0);
    }

    #[tokio::test]
    async fn test_empty_quiz_is_rejected() {
        let quiz = Quiz::new("Empty", None, "admin", vec![]);
        let err = no_oracle().score(&quiz, &[]).await.unwrap_err();
        assert!(matches!(err, AppError::EmptyQuiz));
    }

    #[tokio::test]
    async fn test_oracle_failure_aborts_scoring() {
        let quiz = Quiz::new("Open", None, "admin", vec![QuizQuestion::open_ended("one")]);
        let mut oracle = MockGradingOracle::new();
        oracle
            .expect_grade()
            .times(1)
            .returning(|_, _| Err(AppError::OracleUnavailable("timeout".into())));

        let err = aggregator_with(oracle)
            .score(&quiz, &[Some(SubmittedAnswer::Text("x".into()))])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OracleUnavailable(_)));
    }

    fn submission_grade(grade: f64) -> Grading {
        Grading::for_submission(&uuid::Uuid::new_v4().to_string(), "s", "admin", grade, None)
            .unwrap()
    }

    #[test]
    fn test_project_percentage_ignores_quiz_rows_and_zero_grades() {
        let gradings = vec![
            submission_grade(90.0),
            submission_grade(75.0),
            submission_grade(0.0),
            Grading::for_quiz_question("quiz", "a", "q", "s", 10.0, Utc::now()).unwrap(),
        ];

        assert_eq!(project_percentage(&gradings), Some(82.5));
        assert!(is_eligible(project_percentage(&gradings)));
    }

    #[test]
    fn test_project_percentage_rounds_to_two_decimals() {
        let gradings = vec![
            submission_grade(80.0),
            submission_grade(81.0),
            submission_grade(81.0),
        ];
        assert_eq!(project_percentage(&gradings), Some(80.67));
    }

    #[test]
    fn test_no_qualifying_gradings_is_not_eligible() {
        assert_eq!(project_percentage(&[]), None);
        assert_eq!(project_percentage(&[submission_grade(0.0)]), None);
        assert!(!is_eligible(None));
    }

    #[test]
    fn test_eligibility_threshold_is_inclusive() {
        assert!(is_eligible(Some(80.0)));
        assert!(!is_eligible(Some(79.99)));
    }
}
