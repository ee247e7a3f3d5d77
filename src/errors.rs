use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Invalid email or password")]
    InvalidCredential,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    TokenInvalid(String),

    #[error("Quiz attempt limit reached: {0}")]
    QuotaExceeded(String),

    #[error("Quiz with id '{0}' not found")]
    QuizNotFound(String),

    #[error("User not found")]
    UserNotFound,

    #[error("User ID is required for logout")]
    MissingUserId,

    #[error("Already graded: {0}")]
    AlreadyGraded(String),

    #[error("Grade must be a percentage between 0 and 100, got {0}")]
    GradeOutOfRange(f64),

    #[error("Quiz has no questions")]
    EmptyQuiz,

    #[error("Grading oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidCredential => "INVALID_CREDENTIAL",
            AppError::TokenExpired => "TOKEN_EXPIRED",
            AppError::TokenInvalid(_) => "TOKEN_INVALID",
            AppError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            AppError::QuizNotFound(_) => "QUIZ_NOT_FOUND",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::MissingUserId => "MISSING_USER_ID",
            AppError::AlreadyGraded(_) => "ALREADY_GRADED",
            AppError::GradeOutOfRange(_) => "GRADE_OUT_OF_RANGE",
            AppError::EmptyQuiz => "EMPTY_QUIZ",
            AppError::OracleUnavailable(_) => "ORACLE_UNAVAILABLE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AlreadyExists(_) => "ALREADY_EXISTS",
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Infrastructure faults. Their details stay in the server log.
    pub fn is_internal(&self) -> bool {
        matches!(self, AppError::DatabaseError(_) | AppError::InternalError(_))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    pub status: u16,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredential
            | AppError::TokenExpired
            | AppError::TokenInvalid(_)
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::QuizNotFound(_) | AppError::UserNotFound | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::AlreadyGraded(_) | AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::GradeOutOfRange(_)
            | AppError::EmptyQuiz
            | AppError::MissingUserId
            | AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::OracleUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DatabaseError(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = if self.is_internal() {
            log::error!("Request failed with infrastructure fault: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error,
            code: self.error_code(),
            status: self.status_code().as_u16(),
        })
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::InternalError(format!("BSON serialization error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::TokenInvalid(err.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
