use std::sync::LazyLock;

use chrono::{Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{parse_id, parse_input, RpcContext, RpcOutput};
use crate::access::ensure_can_check_in;
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::db::tickets::NewTicket;
use crate::error::AppError;
use crate::marketing::Contact;
use crate::models::{PaymentMethod, Ticket, TicketListingView, TicketStatus, TicketView};
use crate::money;
use crate::state::AppState;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Input of `tickets.create`. Also sent by the offline reconciler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketInput {
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    pub ticket_type_id: i32,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl CreateTicketInput {
    /// Trims fields, turns blank optionals into `None`, and rejects bad input.
    pub fn normalize(mut self) -> Result<Self, AppError> {
        self.customer_name = self.customer_name.trim().to_string();
        if self.customer_name.is_empty() {
            return Err(AppError::BadRequest("Customer name is required".to_string()));
        }
        if self.customer_name.chars().count() > 255 {
            return Err(AppError::BadRequest("Customer name is too long".to_string()));
        }

        self.customer_email = blank_to_none(self.customer_email);
        if let Some(email) = &self.customer_email {
            if email.len() > 320 || !EMAIL_RE.is_match(email) {
                return Err(AppError::BadRequest("Invalid email address".to_string()));
            }
        }

        self.customer_phone = blank_to_none(self.customer_phone);
        if self.customer_phone.as_ref().is_some_and(|p| p.chars().count() > 20) {
            return Err(AppError::BadRequest("Phone number is too long".to_string()));
        }

        if self.ticket_type_id <= 0 {
            return Err(AppError::BadRequest("Invalid ticket type".to_string()));
        }

        if let Some(key) = &self.idempotency_key {
            if key.is_empty() || key.len() > 255 {
                return Err(AppError::BadRequest(
                    "Idempotency key must be 1 to 255 characters".to_string(),
                ));
            }
        }

        Ok(self)
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Deserialize, Default)]
struct ListInput {
    status: Option<TicketStatus>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelInput {
    ticket_id: i32,
    reason: String,
}

pub async fn list(ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    ctx.user()?;
    let input: Option<ListInput> = parse_input(input)?;
    let status = input.unwrap_or_default().status;

    let tickets = db::tickets::list(ctx.pool(), status).await?;
    RpcOutput::data(
        tickets
            .into_iter()
            .map(TicketListingView::from)
            .collect::<Vec<_>>(),
    )
}

pub async fn get_by_id(ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    ctx.user()?;
    let id = parse_id(input)?;
    let ticket = db::tickets::find_details_by_id(ctx.pool(), id).await?;
    RpcOutput::data(ticket.map(TicketListingView::from))
}

pub async fn create(ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    let user = ctx.user()?;
    let input: CreateTicketInput = parse_input(input)?;
    let input = input.normalize()?;

    if let Some(key) = input.idempotency_key.as_deref() {
        if let Some(existing) = db::tickets::find_by_idempotency_key(ctx.pool(), key).await? {
            tracing::info!(ticket_id = existing.id, "Replayed ticket creation for known key");
            return RpcOutput::data(TicketView::from(existing));
        }
    }

    let ticket = match create_ticket(&ctx.state, user, &input).await {
        Ok(ticket) => ticket,
        // Lost a race with a concurrent replay of the same key
        Err(e) if e.is_unique_violation() => {
            let existing = match input.idempotency_key.as_deref() {
                Some(key) => db::tickets::find_by_idempotency_key(ctx.pool(), key).await?,
                None => None,
            };
            return match existing {
                Some(existing) => RpcOutput::data(TicketView::from(existing)),
                None => Err(e),
            };
        }
        Err(e) => return Err(e),
    };

    tracing::info!(ticket_id = ticket.id, "Ticket sold");

    if let Some(email) = &input.customer_email {
        ctx.state.marketing.dispatch(Contact {
            name: input.customer_name.clone(),
            email: email.clone(),
            phone: input.customer_phone.clone(),
        });
    }

    RpcOutput::data(TicketView::from(ticket))
}

async fn create_ticket(
    state: &AppState,
    user: &AuthUser,
    input: &CreateTicketInput,
) -> Result<Ticket, AppError> {
    let mut tx = state.pool.begin().await?;

    let ticket_type = db::ticket_types::find_by_id(&mut *tx, input.ticket_type_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket type not found".to_string()))?;

    let customer = db::customers::create(
        &mut *tx,
        &input.customer_name,
        input.customer_email.as_deref(),
        input.customer_phone.as_deref(),
    )
    .await?;

    let qr_token = Uuid::new_v4().to_string();
    let valid_until = Utc::now() + Duration::hours(state.config.ticket_validity_hours);

    let ticket = db::tickets::create(
        &mut *tx,
        &NewTicket {
            customer_id: customer.id,
            ticket_type_id: ticket_type.id,
            price: ticket_type.price,
            payment_method: input.payment_method,
            qr_token: &qr_token,
            valid_until,
            idempotency_key: input.idempotency_key.as_deref(),
        },
    )
    .await?;

    db::audit::log(
        &mut *tx,
        "create",
        "ticket",
        ticket.id,
        Some(user.user_id),
        Some(&json!({
            "customerName": input.customer_name,
            "ticketType": ticket_type.name,
            "price": money::from_cents(ticket_type.price),
        })),
    )
    .await?;

    tx.commit().await?;
    Ok(ticket)
}

pub async fn cancel(ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    let user = ctx.user()?;
    let input: CancelInput = parse_input(input)?;
    let reason = input.reason.trim();
    if reason.is_empty() {
        return Err(AppError::BadRequest("Cancellation reason is required".to_string()));
    }

    let mut tx = ctx.pool().begin().await?;

    let ticket = db::tickets::find_by_id_for_update(&mut *tx, input.ticket_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    if ticket.status() != Some(TicketStatus::Active)
        || !db::tickets::cancel(&mut *tx, ticket.id, reason).await?
    {
        return Err(AppError::Conflict(
            "Only active tickets can be cancelled".to_string(),
        ));
    }

    db::audit::log(
        &mut *tx,
        "cancel",
        "ticket",
        ticket.id,
        Some(user.user_id),
        Some(&json!({ "reason": reason, "previousStatus": ticket.status })),
    )
    .await?;

    tx.commit().await?;
    tracing::info!(ticket_id = ticket.id, "Ticket cancelled");

    RpcOutput::data(json!({ "success": true }))
}

pub async fn mark_printed(ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    let user = ctx.user()?;
    let id = parse_id(input)?;

    let mut tx = ctx.pool().begin().await?;

    db::tickets::find_by_id_for_update(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    db::tickets::mark_printed(&mut *tx, id).await?;
    db::audit::log(&mut *tx, "print", "ticket", id, Some(user.user_id), None).await?;

    tx.commit().await?;
    RpcOutput::data(json!({ "success": true }))
}

pub async fn mark_used(ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    let user = ctx.user()?;
    let id = parse_id(input)?;
    check_in(&ctx.state, user, id, "manual").await?;
    RpcOutput::data(json!({ "success": true }))
}

/// Moves an active, unexpired ticket to `used` and records who let it in.
pub(crate) async fn check_in(
    state: &AppState,
    user: &AuthUser,
    ticket_id: i32,
    via: &str,
) -> Result<(), AppError> {
    let mut tx = state.pool.begin().await?;

    let ticket = db::tickets::find_by_id_for_update(&mut *tx, ticket_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    ensure_can_check_in(&ticket, Utc::now())
        .map_err(|refusal| AppError::Conflict(refusal.message().to_string()))?;

    if !db::tickets::mark_used(&mut *tx, ticket.id).await? {
        return Err(AppError::Conflict("Ticket already used".to_string()));
    }

    db::audit::log(
        &mut *tx,
        "use",
        "ticket",
        ticket.id,
        Some(user.user_id),
        Some(&json!({ "ticketId": ticket.id, "via": via })),
    )
    .await?;

    tx.commit().await?;
    tracing::info!(ticket_id = ticket.id, via, "Ticket checked in");
    Ok(())
}
