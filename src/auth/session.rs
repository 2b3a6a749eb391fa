use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;

use crate::auth::jwt::SESSION_TTL_MINUTES;

pub const SESSION_COOKIE: &str = "portaria_session";

/// Build the session cookie. Secure deployments are served cross-site from
/// the front end, so they need `SameSite=None`.
pub fn session_cookie(token: &str, secure: bool) -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(if secure { SameSite::None } else { SameSite::Lax })
        .max_age(time::Duration::minutes(SESSION_TTL_MINUTES))
        .build();

    CookieJar::new().add(cookie)
}

pub fn clear_session_cookie(secure: bool) -> CookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(if secure { SameSite::None } else { SameSite::Lax })
        .max_age(time::Duration::ZERO)
        .build();
    CookieJar::new().add(cookie)
}
