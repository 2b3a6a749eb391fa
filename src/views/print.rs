use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use chrono::{Duration, Utc};

use super::{format_date, format_datetime, qr};
use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::PaymentMethod;
use crate::money::format_brl;
use crate::reports::SalesStats;
use crate::routes::reports::RangeParams;
use crate::rpc::reports::check_range;
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "print/ticket.html")]
struct TicketPrintTemplate {
    event_name: String,
    id: i32,
    customer_name: String,
    ticket_type: String,
    price: String,
    created_date: String,
    valid_until: String,
    validity_hours: i64,
    qr_svg: String,
}

struct MethodRow {
    label: String,
    count: i64,
    total: String,
}

#[derive(Template)]
#[template(path = "print/report.html")]
struct ReportPrintTemplate {
    event_name: String,
    period: String,
    issued_at: String,
    total_sales: i64,
    total_revenue: String,
    total_active: i64,
    total_used: i64,
    total_cancelled: i64,
    methods: Vec<MethodRow>,
}

/// 58mm thermal ticket with the entry QR code.
pub async fn ticket(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = db::tickets::find_details_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

    let valid_until = ticket
        .valid_until
        .unwrap_or(ticket.created_at + Duration::hours(state.config.ticket_validity_hours));

    let template = TicketPrintTemplate {
        event_name: state.config.event_name.to_uppercase(),
        id: ticket.id,
        customer_name: ticket.customer_name.clone().unwrap_or_else(|| "N/A".to_string()),
        ticket_type: ticket
            .ticket_type_name
            .clone()
            .unwrap_or_else(|| "Padrão".to_string()),
        price: format_brl(i64::from(ticket.price)),
        created_date: format_date(ticket.created_at),
        valid_until: format_datetime(valid_until),
        validity_hours: state.config.ticket_validity_hours,
        qr_svg: qr::svg(&ticket.qr_token, 150).map_err(AppError::Internal)?,
    };

    let page = template
        .render()
        .map_err(|e| AppError::Internal(format!("Template error: {e}")))?;
    Ok(Html(page))
}

/// 58mm thermal sales summary for a date range.
pub async fn report(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<RangeParams>,
) -> Result<impl IntoResponse, AppError> {
    check_range(params.start_date, params.end_date)?;

    let tickets =
        db::tickets::list_created_between(&state.pool, params.start_date, params.end_date).await?;
    let stats = SalesStats::tally(&tickets);

    let period = format!(
        "{} a {}",
        params.start_date.map(format_date).unwrap_or_else(|| "início".to_string()),
        params.end_date.map(format_date).unwrap_or_else(|| "hoje".to_string()),
    );

    let methods = PaymentMethod::ALL
        .iter()
        .map(|&method| {
            let tally = stats.method(method);
            MethodRow {
                label: method.label().to_uppercase(),
                count: tally.count,
                total: format_brl(tally.total_cents),
            }
        })
        .collect();

    let template = ReportPrintTemplate {
        event_name: state.config.event_name.to_uppercase(),
        period,
        issued_at: format_datetime(Utc::now()),
        total_sales: stats.total_sales,
        total_revenue: format_brl(stats.total_revenue_cents),
        total_active: stats.total_active,
        total_used: stats.total_used,
        total_cancelled: stats.total_cancelled,
        methods,
    };

    let page = template
        .render()
        .map_err(|e| AppError::Internal(format!("Template error: {e}")))?;
    Ok(Html(page))
}
