pub mod auth_handler;
pub mod certificate_handler;
pub mod health_handler;
pub mod quiz_handler;
pub mod submission_handler;
pub mod user_handler;

use actix_web::web;

use crate::errors::AppError;

/// Registers every route. Authentication is handled by `AuthMiddleware`,
/// which the caller wraps around the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(err.to_string()).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(err.to_string()).into()
    }))
    .service(health_handler::health_check)
    .service(health_handler::health_check_live)
    .service(health_handler::health_check_ready)
    .service(auth_handler::register)
    .service(auth_handler::login)
    .service(auth_handler::refresh)
    .service(auth_handler::logout)
    .service(auth_handler::update_password)
    .service(user_handler::list_users)
    .service(user_handler::get_profile)
    .service(user_handler::get_eligibility)
    .service(quiz_handler::list_quizzes)
    .service(quiz_handler::create_quiz)
    .service(quiz_handler::get_quiz_quota)
    .service(quiz_handler::submit_quiz)
    .service(quiz_handler::get_quiz)
    .service(submission_handler::list_submissions)
    .service(submission_handler::create_submission)
    .service(submission_handler::grade_submission)
    .service(submission_handler::get_grade_status)
    .service(certificate_handler::get_mint_status)
    .service(certificate_handler::toggle_mint_status);
}
