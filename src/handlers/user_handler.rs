use actix_web::{get, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{require_admin, require_self_or_admin, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::PaginationParams,
        response::{PaginatedResponse, UserDto},
    },
};

#[get("/api/users")]
pub async fn list_users(
    state: web::Data<AppState>,
    query: web::Query<PaginationParams>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let pagination = query.into_inner();
    pagination.validate()?;

    let (offset, limit) = (pagination.offset(), pagination.limit());
    let (users, total) = state.auth_service.list_users(offset, limit).await?;
    let data = users.into_iter().map(UserDto::from).collect();
    Ok(HttpResponse::Ok().json(PaginatedResponse::new(data, offset, limit, total)))
}

#[get("/api/users/profile")]
pub async fn get_profile(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let user = state.auth_service.profile(auth.0.user_id()).await?;
    Ok(HttpResponse::Ok().json(UserDto::from(user)))
}

#[get("/api/users/{id}/eligibility")]
pub async fn get_eligibility(
    state: web::Data<AppState>,
    id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_self_or_admin(&auth.0, &id)?;

    let eligibility = state.certificate_service.eligibility(&id).await?;
    Ok(HttpResponse::Ok().json(eligibility))
}
