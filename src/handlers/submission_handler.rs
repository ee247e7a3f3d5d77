use actix_web::{get, post, put, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{require_admin, require_self_or_admin, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::{CreateSubmissionRequest, GradeRequest, PaginationParams, SubmissionFilter},
        response::PaginatedResponse,
    },
};

#[get("/api/submissions")]
pub async fn list_submissions(
    state: web::Data<AppState>,
    filter: web::Query<SubmissionFilter>,
    query: web::Query<PaginationParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let pagination = query.into_inner();
    pagination.validate()?;

    let (offset, limit) = (pagination.offset(), pagination.limit());
    let (submissions, total) = state
        .grading_service
        .list_submissions(filter.kind, offset, limit)
        .await?;
    Ok(HttpResponse::Ok().json(PaginatedResponse::new(submissions, offset, limit, total)))
}

#[post("/api/submissions")]
pub async fn create_submission(
    state: web::Data<AppState>,
    request: web::Json<CreateSubmissionRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let submission = state
        .grading_service
        .submit_work(auth.0.user_id(), request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(submission))
}

#[put("/api/submissions/{id}/grade")]
pub async fn grade_submission(
    state: web::Data<AppState>,
    id: web::Path<String>,
    request: web::Json<GradeRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let grading = state
        .grading_service
        .grade_submission(&id, request.into_inner(), auth.0.user_id())
        .await?;
    Ok(HttpResponse::Created().json(grading))
}

#[get("/api/submissions/{id}/grade")]
pub async fn get_grade_status(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let submission = state.grading_service.find_submission(&id).await?;
    require_self_or_admin(&auth.0, &submission.user_id)?;

    let status = state.grading_service.grade_status(&submission.id).await?;
    Ok(HttpResponse::Ok().json(status))
}
