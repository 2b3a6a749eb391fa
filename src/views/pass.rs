use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::Utc;

use super::{format_datetime, qr};
use crate::access::{classify, AccessCheck};
use crate::db;
use crate::error::AppError;
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "pass.html")]
struct PassTemplate {
    event_name: String,
    customer_name: String,
    ticket_type: String,
    status_label: &'static str,
    status_class: &'static str,
    valid_until: String,
    qr_svg: String,
}

#[derive(Template)]
#[template(path = "pass_not_found.html")]
struct PassNotFoundTemplate {
    event_name: String,
}

/// Public page behind the QR link: shows the holder and the ticket state.
pub async fn show(
    State(state): State<SharedState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let event_name = state.config.event_name.clone();

    let Some(ticket) = db::tickets::find_details_by_token(&state.pool, &token).await? else {
        let page = PassNotFoundTemplate { event_name }
            .render()
            .map_err(|e| AppError::Internal(format!("Template error: {e}")))?;
        return Ok((StatusCode::NOT_FOUND, Html(page)).into_response());
    };

    let (status_label, status_class) = match classify(Some(&ticket), Utc::now()) {
        AccessCheck::Valid { .. } => ("Válido", "valid"),
        AccessCheck::Used { .. } => ("Já utilizado", "used"),
        AccessCheck::Expired { .. } => ("Expirado", "expired"),
        AccessCheck::Invalid { .. } => ("Cancelado", "invalid"),
    };

    let page = PassTemplate {
        event_name,
        customer_name: ticket.customer_name.clone().unwrap_or_default(),
        ticket_type: ticket.ticket_type_name.clone().unwrap_or_default(),
        status_label,
        status_class,
        valid_until: ticket.valid_until.map(format_datetime).unwrap_or_default(),
        qr_svg: qr::svg(&ticket.qr_token, 220).map_err(AppError::Internal)?,
    }
    .render()
    .map_err(|e| AppError::Internal(format!("Template error: {e}")))?;

    Ok(Html(page).into_response())
}
