use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionOption {
    pub text: String,
}

/// A question is multiple choice when it carries options, open-ended otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizQuestion {
    pub id: String,
    pub text: String,
    pub options: Vec<QuestionOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option: Option<usize>,
}

/// Author-side option as submitted by the quiz editor.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct DraftOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl QuizQuestion {
    pub fn open_ended(text: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            options: Vec::new(),
            correct_option: None,
        }
    }

    /// Builds a question from editor input. Blank options are discarded; when any
    /// option survives, the first one flagged correct becomes the answer key.
    pub fn from_draft(text: &str, options: &[DraftOption]) -> AppResult<Self> {
        let kept: Vec<&DraftOption> = options
            .iter()
            .filter(|option| !option.text.trim().is_empty())
            .collect();

        if kept.is_empty() {
            return Ok(Self::open_ended(text));
        }

        let correct_option = kept
            .iter()
            .position(|option| option.is_correct)
            .ok_or_else(|| {
                AppError::ValidationError(format!("No correct option for question: \"{}\"", text))
            })?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            options: kept
                .into_iter()
                .map(|option| QuestionOption {
                    text: option.text.clone(),
                })
                .collect(),
            correct_option: Some(correct_option),
        })
    }

    pub fn is_multiple_choice(&self) -> bool {
        !self.options.is_empty()
    }
}
