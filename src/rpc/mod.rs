//! JSON-RPC style procedure layer used by the point-of-sale client.
//!
//! Queries are served on `GET /api/trpc/{procedure}?input=<json>` and
//! mutations on `POST /api/trpc/{procedure}` with the input as the body.
//! Successful calls answer `{"result": {"data": ...}}`; failures use the
//! regular `{"error": "..."}` body with a matching status code.

pub mod access;
pub mod audit;
pub mod auth;
pub mod reports;
pub mod system;
pub mod ticket_types;
pub mod tickets;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::state::SharedState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Query,
    Mutation,
}

const PROCEDURES: &[(&str, Kind)] = &[
    ("system.health", Kind::Query),
    ("system.marketingStatus", Kind::Query),
    ("auth.me", Kind::Query),
    ("auth.logout", Kind::Mutation),
    ("access.info", Kind::Query),
    ("access.validate", Kind::Mutation),
    ("access.checkIn", Kind::Mutation),
    ("tickets.list", Kind::Query),
    ("tickets.create", Kind::Mutation),
    ("tickets.getById", Kind::Query),
    ("tickets.cancel", Kind::Mutation),
    ("tickets.markPrinted", Kind::Mutation),
    ("tickets.markUsed", Kind::Mutation),
    ("ticketTypes.list", Kind::Query),
    ("ticketTypes.create", Kind::Mutation),
    ("ticketTypes.delete", Kind::Mutation),
    ("reports.sales", Kind::Query),
    ("reports.stats", Kind::Query),
    ("audit.list", Kind::Query),
];

pub fn procedure_kind(name: &str) -> Option<Kind> {
    PROCEDURES
        .iter()
        .find(|(procedure, _)| *procedure == name)
        .map(|(_, kind)| *kind)
}

pub fn rpc_routes() -> Router<SharedState> {
    Router::new().route("/api/trpc/{procedure}", get(query).post(mutation))
}

#[derive(Deserialize)]
pub struct QueryParams {
    pub input: Option<String>,
}

async fn query(
    State(state): State<SharedState>,
    Path(procedure): Path<String>,
    Query(params): Query<QueryParams>,
    headers: HeaderMap,
) -> Result<RpcOutput, AppError> {
    check_kind(&procedure, Kind::Query)?;

    let input = match params.input.as_deref() {
        None | Some("") => Value::Null,
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| AppError::BadRequest(format!("Invalid input JSON: {e}")))?,
    };

    call(state, &headers, &procedure, input).await
}

async fn mutation(
    State(state): State<SharedState>,
    Path(procedure): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<RpcOutput, AppError> {
    check_kind(&procedure, Kind::Mutation)?;

    let input = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid input JSON: {e}")))?
    };

    call(state, &headers, &procedure, input).await
}

fn check_kind(procedure: &str, expected: Kind) -> Result<(), AppError> {
    match procedure_kind(procedure) {
        None => Err(AppError::NotFound(format!(
            "No procedure found on path \"{procedure}\""
        ))),
        Some(kind) if kind != expected => Err(AppError::MethodNotAllowed(match kind {
            Kind::Query => format!("\"{procedure}\" is a query; use GET"),
            Kind::Mutation => format!("\"{procedure}\" is a mutation; use POST"),
        })),
        Some(_) => Ok(()),
    }
}

async fn call(
    state: SharedState,
    headers: &HeaderMap,
    procedure: &str,
    input: Value,
) -> Result<RpcOutput, AppError> {
    // A bad or expired session makes the caller anonymous; protected
    // procedures then reject with 401.
    let user = AuthUser::from_headers(headers, &state.config.jwt_secret).ok();
    let ctx = RpcContext { state, user };

    let result = dispatch(&ctx, procedure, input).await;
    if let Err(e) = &result {
        tracing::debug!(procedure, "procedure failed: {e}");
    }
    result
}

async fn dispatch(ctx: &RpcContext, procedure: &str, input: Value) -> Result<RpcOutput, AppError> {
    match procedure {
        "system.health" => system::health(ctx, input).await,
        "system.marketingStatus" => system::marketing_status(ctx).await,
        "auth.me" => auth::me(ctx).await,
        "auth.logout" => auth::logout(ctx).await,
        "access.info" => access::info(ctx, input).await,
        "access.validate" => access::validate(ctx, input).await,
        "access.checkIn" => access::check_in(ctx, input).await,
        "tickets.list" => tickets::list(ctx, input).await,
        "tickets.create" => tickets::create(ctx, input).await,
        "tickets.getById" => tickets::get_by_id(ctx, input).await,
        "tickets.cancel" => tickets::cancel(ctx, input).await,
        "tickets.markPrinted" => tickets::mark_printed(ctx, input).await,
        "tickets.markUsed" => tickets::mark_used(ctx, input).await,
        "ticketTypes.list" => ticket_types::list(ctx).await,
        "ticketTypes.create" => ticket_types::create(ctx, input).await,
        "ticketTypes.delete" => ticket_types::delete(ctx, input).await,
        "reports.sales" => reports::sales(ctx, input).await,
        "reports.stats" => reports::stats(ctx, input).await,
        "audit.list" => audit::list(ctx, input).await,
        _ => Err(AppError::NotFound(format!(
            "No procedure found on path \"{procedure}\""
        ))),
    }
}

/// Per-call context: shared state plus the caller, if authenticated.
pub struct RpcContext {
    pub state: SharedState,
    pub user: Option<AuthUser>,
}

impl RpcContext {
    pub fn pool(&self) -> &PgPool {
        &self.state.pool
    }

    pub fn user(&self) -> Result<&AuthUser, AppError> {
        self.user
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))
    }

    pub fn admin(&self) -> Result<&AuthUser, AppError> {
        let user = self.user()?;
        user.require_admin()?;
        Ok(user)
    }
}

pub fn parse_input<T: DeserializeOwned>(input: Value) -> Result<T, AppError> {
    serde_json::from_value(input).map_err(|e| AppError::BadRequest(format!("Invalid input: {e}")))
}

/// Inputs that are a bare entity id.
pub fn parse_id(input: Value) -> Result<i32, AppError> {
    let id: i32 = parse_input(input)?;
    if id <= 0 {
        return Err(AppError::BadRequest("Invalid input: id must be positive".to_string()));
    }
    Ok(id)
}

pub struct RpcOutput {
    data: Value,
    cookies: Option<CookieJar>,
}

impl RpcOutput {
    pub fn data<T: Serialize>(value: T) -> Result<Self, AppError> {
        let data = serde_json::to_value(value)
            .map_err(|e| AppError::Internal(format!("Failed to serialize result: {e}")))?;
        Ok(Self { data, cookies: None })
    }

    pub fn with_cookies(mut self, jar: CookieJar) -> Self {
        self.cookies = Some(jar);
        self
    }
}

impl IntoResponse for RpcOutput {
    fn into_response(self) -> Response {
        let body = Json(json!({ "result": { "data": self.data } }));
        match self.cookies {
            Some(jar) => (jar, body).into_response(),
            None => body.into_response(),
        }
    }
}
