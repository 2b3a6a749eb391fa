use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::CookieJar;

use crate::auth::jwt;
use crate::auth::session::SESSION_COOKIE;
use crate::error::AppError;
use crate::models::user::ROLE_ADMIN;
use crate::state::SharedState;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub open_id: String,
    pub name: Option<String>,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }

    /// Read the session from a Bearer token first, then from the session cookie.
    pub fn from_headers(headers: &HeaderMap, jwt_secret: &str) -> Result<Self, AppError> {
        if let Some(auth_header) = headers.get("authorization") {
            let auth_str = auth_header
                .to_str()
                .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Self::from_token(token, jwt_secret);
            }
        }

        let jar = CookieJar::from_headers(headers);
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            return Self::from_token(cookie.value(), jwt_secret);
        }

        Err(AppError::Unauthorized("Not authenticated".to_string()))
    }

    fn from_token(token: &str, jwt_secret: &str) -> Result<Self, AppError> {
        let claims = jwt::decode_token(token, jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired session".to_string()))?;

        Ok(AuthUser {
            user_id: claims.sub,
            open_id: claims.oid,
            name: claims.name,
            role: claims.role,
        })
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        AuthUser::from_headers(&parts.headers, &state.config.jwt_secret)
    }
}
