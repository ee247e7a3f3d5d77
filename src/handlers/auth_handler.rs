use actix_web::{post, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{
        cookie::{clear_refresh_cookie, refresh_cookie, REFRESH_COOKIE_NAME},
        require_self_or_admin, AuthenticatedUser,
    },
    errors::AppError,
    models::dto::{
        request::{LoginRequest, LogoutRequest, RegisterRequest, UpdatePasswordRequest},
        response::{AccessTokenResponse, ApiResponse, MessageResponse, UserDto},
    },
};

#[post("/api/register")]
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let user = state.auth_service.register(request.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse {
        data: UserDto::from(user),
        message: "User registered successfully".to_string(),
    }))
}

#[post("/api/login")]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let pair = match state
        .auth_service
        .authenticate(&request.email, &request.password)
        .await
    {
        Ok(pair) => pair,
        // same answer as a wrong password so accounts cannot be enumerated
        Err(AppError::UserNotFound) | Err(AppError::InvalidCredential) => {
            log::warn!("Failed login attempt for {}", request.email.trim());
            return Err(AppError::InvalidCredential);
        }
        Err(e) => return Err(e),
    };

    let cookie = refresh_cookie(
        pair.refresh_token,
        state.config.is_production(),
        state.auth_service.jwt().refresh_ttl(),
    );

    Ok(HttpResponse::Ok().cookie(cookie).json(AccessTokenResponse {
        access_token: pair.access_token,
    }))
}

#[post("/api/refresh")]
pub async fn refresh(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse, AppError> {
    let cookie = req
        .cookie(REFRESH_COOKIE_NAME)
        .ok_or_else(|| AppError::Unauthorized("Refresh token missing".to_string()))?;

    let access_token = state.auth_service.refresh(cookie.value()).await?;

    Ok(HttpResponse::Ok().json(AccessTokenResponse { access_token }))
}

#[post("/api/logout")]
pub async fn logout(
    state: web::Data<AppState>,
    request: Option<web::Json<LogoutRequest>>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let request = request.map(web::Json::into_inner).unwrap_or_default();

    if let Some(user_id) = request.user_id.as_deref().filter(|id| !id.trim().is_empty()) {
        require_self_or_admin(&auth.0, user_id.trim())?;
    }
    state.auth_service.logout(request.user_id.as_deref()).await?;

    Ok(HttpResponse::Ok()
        .cookie(clear_refresh_cookie(state.config.is_production()))
        .json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }))
}

#[post("/api/update-password")]
pub async fn update_password(
    state: web::Data<AppState>,
    request: web::Json<UpdatePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    state
        .auth_service
        .update_password(request.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Password updated successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, web, App};

    use crate::{
        auth::{cookie::REFRESH_COOKIE_NAME, AuthMiddleware},
        handlers::configure,
        models::domain::UserRole,
        test_utils::{
            fixtures::{seeded_user, test_state_without_oracle, TEST_PASSWORD},
            test_helpers::{assert_error_status, bearer},
        },
    };

    #[actix_web::test]
    async fn test_register_then_login_sets_refresh_cookie() {
        let (state, _) = test_state_without_oracle();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(AuthMiddleware)
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/register")
            .set_json(serde_json::json!({
                "name": "Ada",
                "email": "ada@example.com",
                "password": "secret-pw"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["role"], "STUDENT");
        assert!(body["data"].get("password_hash").is_none());

        let req = test::TestRequest::post()
            .uri("/api/login")
            .set_json(serde_json::json!({ "email": "ada@example.com", "password": "secret-pw" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == REFRESH_COOKIE_NAME)
            .expect("refresh cookie should be set");
        assert_eq!(cookie.http_only(), Some(true));
        assert!(!cookie.value().is_empty());

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["access_token"].as_str().is_some());
    }

    #[actix_web::test]
    async fn test_login_hides_whether_the_account_exists() {
        let (state, repos) = test_state_without_oracle();
        seeded_user(&state, &repos, "ada@example.com", UserRole::Student).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(AuthMiddleware)
                .configure(configure),
        )
        .await;

        for email in ["ada@example.com", "ghost@example.com"] {
            let req = test::TestRequest::post()
                .uri("/api/login")
                .set_json(serde_json::json!({ "email": email, "password": "wrong-password" }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["code"], "INVALID_CREDENTIAL");
        }
    }

    #[actix_web::test]
    async fn test_refresh_without_cookie_is_unauthorized() {
        let (state, _) = test_state_without_oracle();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(AuthMiddleware)
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/refresh").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_students_cannot_log_out_someone_else() {
        let (state, repos) = test_state_without_oracle();
        let (_, token) = seeded_user(&state, &repos, "ada@example.com", UserRole::Student).await;
        let (other, _) = seeded_user(&state, &repos, "bob@example.com", UserRole::Student).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(AuthMiddleware)
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/logout")
            .insert_header(bearer(&token))
            .set_json(serde_json::json!({ "user_id": other.id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_logout_without_user_id_is_bad_request() {
        let (state, repos) = test_state_without_oracle();
        let (_, token) = seeded_user(&state, &repos, "ada@example.com", UserRole::Student).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(AuthMiddleware)
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/logout")
            .insert_header(bearer(&token))
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "MISSING_USER_ID");
    }

    #[actix_web::test]
    async fn test_logout_requires_a_bearer_token() {
        let (state, _) = test_state_without_oracle();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(AuthMiddleware)
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/logout")
            .set_json(serde_json::json!({ "user_id": "someone" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_error_status(resp.status());
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_update_password_mismatch() {
        let (state, repos) = test_state_without_oracle();
        seeded_user(&state, &repos, "ada@example.com", UserRole::Student).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(AuthMiddleware)
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/update-password")
            .set_json(serde_json::json!({
                "email": "ada@example.com",
                "password": "brand-new",
                "confirm_password": TEST_PASSWORD
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
