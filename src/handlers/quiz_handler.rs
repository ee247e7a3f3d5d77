use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{require_admin, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::{CreateQuizRequest, PaginationParams, SubmitQuizRequest},
        response::{PaginatedResponse, QuizDto},
    },
};

#[get("/api/quizzes")]
pub async fn list_quizzes(
    state: web::Data<AppState>,
    query: web::Query<PaginationParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let pagination = query.into_inner();
    pagination.validate()?;

    let (offset, limit) = (pagination.offset(), pagination.limit());
    let (quizzes, total) = state.quiz_service.list_quizzes(offset, limit).await?;

    let reveal_answers = auth.0.is_admin();
    let data = quizzes
        .into_iter()
        .map(|quiz| QuizDto::from_quiz(quiz, reveal_answers))
        .collect();
    Ok(HttpResponse::Ok().json(PaginatedResponse::new(data, offset, limit, total)))
}

#[post("/api/quizzes")]
pub async fn create_quiz(
    state: web::Data<AppState>,
    request: web::Json<CreateQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let quiz = state
        .quiz_service
        .create_quiz(request.into_inner(), auth.0.user_id())
        .await?;
    Ok(HttpResponse::Created().json(QuizDto::from_quiz(quiz, true)))
}

#[get("/api/quizzes/{id}")]
pub async fn get_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quiz = state.quiz_service.get_quiz(&id).await?;
    Ok(HttpResponse::Ok().json(QuizDto::from_quiz(quiz, auth.0.is_admin())))
}

#[get("/api/quizzes/{id}/quota")]
pub async fn get_quiz_quota(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let quota = state
        .quiz_service
        .quota(&id, auth.0.user_id(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(quota))
}

#[post("/api/quizzes/{id}/submit")]
pub async fn submit_quiz(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<SubmitQuizRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let submission = state
        .quiz_service
        .submit_quiz(&id, auth.0.user_id(), &request.answers, Utc::now())
        .await?;
    Ok(HttpResponse::Created().json(submission))
}
