use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use futures::future::LocalBoxFuture;

use crate::{app_state::AppState, auth::Claims, errors::AppError};

/// Why a request carrying credentials was not authenticated. Surfaced by
/// `AuthenticatedUser` so public routes are unaffected by stale headers.
#[derive(Clone, Debug)]
struct AuthFailure(AppError);

/// Validates `Authorization: Bearer <access token>` when present and attaches
/// the resulting `Claims` to the request.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

fn authenticate_request(req: &ServiceRequest) -> Option<Result<Claims, AppError>> {
    let header = req.headers().get(AUTHORIZATION)?;

    let result = (|| {
        let state = req
            .app_data::<web::Data<AppState>>()
            .ok_or_else(|| AppError::InternalError("JWT service not configured".to_string()))?;

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::TokenInvalid("Invalid authorization header format".to_string())
            })?;

        state.auth_service.validate(token)
    })();

    Some(result)
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        match authenticate_request(&req) {
            Some(Ok(claims)) => {
                req.extensions_mut().insert(claims);
            }
            Some(Err(err)) => {
                log::debug!("Rejected bearer token on {}: {}", req.path(), err);
                req.extensions_mut().insert(AuthFailure(err));
            }
            None => {}
        }

        Box::pin(async move { service.call(req).await })
    }
}

// Extractor for authenticated user in handlers
pub struct AuthenticatedUser(pub Claims);

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let extensions = req.extensions();

        let result = if let Some(claims) = extensions.get::<Claims>() {
            Ok(AuthenticatedUser(claims.clone()))
        } else if let Some(AuthFailure(err)) = extensions.get::<AuthFailure>() {
            Err(err.clone())
        } else {
            Err(AppError::Unauthorized("Authentication required".to_string()))
        };

        ready(result)
    }
}
