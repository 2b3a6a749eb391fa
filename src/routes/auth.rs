use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};

use crate::auth::extractor::AuthUser;
use crate::auth::jwt::{encode_token, Claims};
use crate::auth::pin;
use crate::auth::session::{clear_session_cookie, session_cookie};
use crate::db;
use crate::error::AppError;
use crate::middleware::audit;
use crate::models::user::{UpsertUser, User, ROLE_ADMIN};
use crate::net::client_ip;
use crate::state::SharedState;

/// The single local operator account that PIN login signs in as.
pub const LOCAL_ADMIN_OPEN_ID: &str = "admin-local";
const LOCAL_ADMIN_NAME: &str = "Administrador";
const LOCAL_ADMIN_EMAIL: &str = "admin@portaria.local";

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub pin: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: LoginUser,
    pub token: String,
}

#[derive(Serialize)]
pub struct LoginUser {
    pub name: Option<String>,
    pub role: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
}

pub async fn login(
    State(state): State<SharedState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let submitted = req.pin.unwrap_or_default();
    if submitted.is_empty() {
        return Err(AppError::BadRequest("PIN is required".to_string()));
    }

    let ip = client_ip::resolve(&headers, peer.ip(), &state.config.trusted_proxies);

    if let Err(retry_after) = state.pin_limiter.check(ip) {
        tracing::warn!(%ip, "PIN login blocked by rate limit");
        return Err(AppError::RateLimited(format!(
            "Too many attempts. Try again in {} minutes",
            retry_after.div_ceil(60).max(1)
        )));
    }

    if !pin::verify(&submitted, &state.config.admin_pin) {
        state.pin_limiter.record_failure(ip);
        tracing::warn!(%ip, "Invalid PIN submitted");
        return Err(AppError::Unauthorized("Invalid PIN".to_string()));
    }

    state.pin_limiter.reset(ip);

    let user = db::users::upsert(
        &state.pool,
        &UpsertUser {
            open_id: LOCAL_ADMIN_OPEN_ID,
            name: Some(LOCAL_ADMIN_NAME),
            email: Some(LOCAL_ADMIN_EMAIL),
            login_method: Some("pin"),
            role: Some(ROLE_ADMIN),
        },
    )
    .await?;

    let claims = Claims::new(
        user.id,
        user.open_id.clone(),
        user.name.clone(),
        user.email.clone(),
        user.role.clone(),
    );
    let token = encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    audit::log_event(
        &state.pool,
        Some(user.id),
        "login",
        "user",
        user.id,
        Some(serde_json::json!({ "method": "pin", "ip": ip.to_string() })),
    )
    .await;

    tracing::info!(user_id = user.id, "PIN login succeeded");

    let jar = session_cookie(&token, state.config.secure_cookies);
    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            user: LoginUser {
                name: user.name,
                role: user.role,
            },
            token,
        }),
    ))
}

pub async fn logout(State(state): State<SharedState>) -> (CookieJar, Json<MessageResponse>) {
    (
        clear_session_cookie(state.config.secure_cookies),
        Json(MessageResponse { success: true }),
    )
}

pub async fn me(State(state): State<SharedState>, auth: AuthUser) -> Result<Json<User>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;
    Ok(Json(user))
}
