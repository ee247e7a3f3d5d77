pub mod attempt_tracker;
pub mod auth_service;
pub mod certificate_service;
pub mod grading_aggregator;
pub mod grading_oracle;
pub mod grading_service;
pub mod quiz_service;

pub use attempt_tracker::{AttemptPolicy, QuizAttemptTracker};
pub use auth_service::{AuthService, TokenPair};
pub use certificate_service::{CertificateService, Eligibility};
pub use grading_aggregator::{GradingAggregator, QuizScore};
pub use grading_oracle::{GradingOracle, OpenAiGradingOracle, OracleVerdict};
pub use grading_service::GradingService;
pub use quiz_service::QuizService;
