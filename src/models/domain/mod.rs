pub mod grading;
pub mod mint_status;
pub mod quiz;
pub mod quiz_attempt;
pub mod quiz_question;
pub mod refresh_token;
pub mod submission;
pub mod user;

pub use grading::{GradeStatus, GradeTarget, Grading};
pub use mint_status::MintStatus;
pub use quiz::Quiz;
pub use quiz_attempt::{AttemptQuota, GradingEntry, QuizAttempt};
pub use quiz_question::QuizQuestion;
pub use refresh_token::RefreshToken;
pub use submission::{Submission, SubmissionKind};
pub use user::{User, UserPatch, UserRole};
