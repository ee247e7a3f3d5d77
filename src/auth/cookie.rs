use actix_web::cookie::{time, Cookie, SameSite};

pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// The refresh token cookie: http-only, `SameSite=Strict`, `Secure` in production.
pub fn refresh_cookie(token: String, secure: bool, max_age: chrono::Duration) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE_NAME, token)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(max_age.num_seconds()))
        .finish()
}

pub fn clear_refresh_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build(REFRESH_COOKIE_NAME, "")
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .finish();
    cookie.make_removal();
    cookie
}
