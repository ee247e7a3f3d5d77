use actix_web::{get, post, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::{require_admin, AuthenticatedUser},
    errors::AppError,
};

#[get("/api/mint-status")]
pub async fn get_mint_status(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let status = state.certificate_service.mint_status().await?;
    Ok(HttpResponse::Ok().json(status))
}

#[post("/api/mint-status/toggle")]
pub async fn toggle_mint_status(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let status = state.certificate_service.toggle_mint_status().await?;
    Ok(HttpResponse::Ok().json(status))
}
