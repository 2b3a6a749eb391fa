use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::{PaymentMethod, Ticket, TicketDetails, TicketStatus};

const DETAILS_SELECT: &str = "SELECT t.id, t.customer_id, t.ticket_type_id,
        tt.name AS ticket_type_name,
        c.name AS customer_name, c.email AS customer_email, c.phone AS customer_phone,
        t.price, t.payment_method, t.status, t.cancelled_at, t.cancellation_reason,
        t.printed_at, t.used_at, t.qr_token, t.valid_until, t.created_at
    FROM tickets t
    LEFT JOIN ticket_types tt ON t.ticket_type_id = tt.id
    LEFT JOIN customers c ON t.customer_id = c.id";

pub struct NewTicket<'a> {
    pub customer_id: i32,
    pub ticket_type_id: i32,
    pub price: i32,
    pub payment_method: PaymentMethod,
    pub qr_token: &'a str,
    pub valid_until: DateTime<Utc>,
    pub idempotency_key: Option<&'a str>,
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    ticket: &NewTicket<'_>,
) -> Result<Ticket, sqlx::Error> {
    sqlx::query_as::<_, Ticket>(
        "INSERT INTO tickets
             (customer_id, ticket_type_id, price, payment_method, status, qr_token, valid_until, idempotency_key)
         VALUES ($1, $2, $3, $4, 'active', $5, $6, $7)
         RETURNING *",
    )
    .bind(ticket.customer_id)
    .bind(ticket.ticket_type_id)
    .bind(ticket.price)
    .bind(ticket.payment_method.as_str())
    .bind(ticket.qr_token)
    .bind(ticket.valid_until)
    .bind(ticket.idempotency_key)
    .fetch_one(executor)
    .await
}

/// Row-locks the ticket for the rest of the transaction.
pub async fn find_by_id_for_update<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: i32,
) -> Result<Option<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn find_by_idempotency_key<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    key: &str,
) -> Result<Option<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE idempotency_key = $1")
        .bind(key)
        .fetch_optional(executor)
        .await
}

pub async fn find_details_by_id(pool: &PgPool, id: i32) -> Result<Option<TicketDetails>, sqlx::Error> {
    sqlx::query_as::<_, TicketDetails>(&format!("{DETAILS_SELECT} WHERE t.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_details_by_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<TicketDetails>, sqlx::Error> {
    sqlx::query_as::<_, TicketDetails>(&format!("{DETAILS_SELECT} WHERE t.qr_token = $1 LIMIT 1"))
        .bind(token)
        .fetch_optional(pool)
        .await
}

pub async fn list(
    pool: &PgPool,
    status: Option<TicketStatus>,
) -> Result<Vec<TicketDetails>, sqlx::Error> {
    sqlx::query_as::<_, TicketDetails>(&format!(
        "{DETAILS_SELECT}
         WHERE ($1::text IS NULL OR t.status = $1)
         ORDER BY t.created_at DESC, t.id DESC"
    ))
    .bind(status.map(TicketStatus::as_str))
    .fetch_all(pool)
    .await
}

/// Tickets created within the inclusive range; a missing bound is open.
pub async fn list_created_between(
    pool: &PgPool,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<Vec<TicketDetails>, sqlx::Error> {
    sqlx::query_as::<_, TicketDetails>(&format!(
        "{DETAILS_SELECT}
         WHERE ($1::timestamptz IS NULL OR t.created_at >= $1)
           AND ($2::timestamptz IS NULL OR t.created_at <= $2)
         ORDER BY t.created_at ASC, t.id ASC"
    ))
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
}

/// Moves an active ticket to `cancelled`. Returns false if it was not active.
pub async fn cancel<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: i32,
    reason: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE tickets
         SET status = 'cancelled', cancelled_at = now(), cancellation_reason = $2, updated_at = now()
         WHERE id = $1 AND status = 'active'",
    )
    .bind(id)
    .bind(reason)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Moves an active ticket to `used`. Returns false if it was not active.
pub async fn mark_used<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE tickets
         SET status = 'used', used_at = now(), updated_at = now()
         WHERE id = $1 AND status = 'active'",
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn mark_printed<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: i32) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE tickets SET printed_at = now(), updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
