use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{parse_input, tickets, RpcContext, RpcOutput};
use crate::access::classify;
use crate::db;
use crate::error::AppError;
use crate::models::TicketDetails;

#[derive(Deserialize)]
struct TokenInput {
    token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckInInput {
    ticket_id: i32,
}

/// What the public pass page shows for a token.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassInfo {
    pub id: i32,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub ticket_type_name: Option<String>,
    pub status: String,
    pub qr_token: String,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<TicketDetails> for PassInfo {
    fn from(t: TicketDetails) -> Self {
        Self {
            id: t.id,
            customer_name: t.customer_name,
            customer_email: t.customer_email,
            customer_phone: t.customer_phone,
            ticket_type_name: t.ticket_type_name,
            status: t.status,
            qr_token: t.qr_token,
            valid_until: t.valid_until,
            created_at: t.created_at,
        }
    }
}

fn token_from(input: Value) -> Result<String, AppError> {
    let input: TokenInput = parse_input(input)?;
    let token = input.token.trim().to_string();
    if token.is_empty() {
        return Err(AppError::BadRequest("Token is required".to_string()));
    }
    Ok(token)
}

pub async fn info(ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    let token = token_from(input)?;
    let ticket = db::tickets::find_details_by_token(ctx.pool(), &token).await?;
    RpcOutput::data(ticket.map(PassInfo::from))
}

pub async fn validate(ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    ctx.user()?;
    let token = token_from(input)?;
    let ticket = db::tickets::find_details_by_token(ctx.pool(), &token).await?;
    let outcome = classify(ticket.as_ref(), Utc::now());
    tracing::debug!(status = outcome.status(), "Validated ticket token");
    RpcOutput::data(outcome)
}

pub async fn check_in(ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    let user = ctx.user()?;
    let input: CheckInInput = parse_input(input)?;
    tickets::check_in(&ctx.state, user, input.ticket_id, "door").await?;
    RpcOutput::data(json!({ "success": true }))
}
