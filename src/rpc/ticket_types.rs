use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_id, parse_input, RpcContext, RpcOutput};
use crate::db;
use crate::error::AppError;
use crate::models::TicketTypeView;
use crate::money;

#[derive(Deserialize)]
struct CreateInput {
    name: String,
    description: Option<String>,
    price: f64,
}

pub async fn list(ctx: &RpcContext) -> Result<RpcOutput, AppError> {
    ctx.user()?;
    let types = db::ticket_types::list(ctx.pool()).await?;
    RpcOutput::data(types.into_iter().map(TicketTypeView::from).collect::<Vec<_>>())
}

pub async fn create(ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    let user = ctx.admin()?;
    let input: CreateInput = parse_input(input)?;

    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    if name.chars().count() > 255 {
        return Err(AppError::BadRequest("Name is too long".to_string()));
    }
    let description = input
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let price = money::to_cents(input.price).map_err(AppError::BadRequest)?;

    let mut tx = ctx.pool().begin().await?;
    let ticket_type = db::ticket_types::create(&mut *tx, name, description, price).await?;
    db::audit::log(
        &mut *tx,
        "create",
        "ticket_type",
        ticket_type.id,
        Some(user.user_id),
        Some(&json!({ "name": ticket_type.name, "price": money::from_cents(price) })),
    )
    .await?;
    tx.commit().await?;

    RpcOutput::data(TicketTypeView::from(ticket_type))
}

pub async fn delete(ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    let user = ctx.admin()?;
    let id = parse_id(input)?;

    let mut tx = ctx.pool().begin().await?;

    let ticket_type = db::ticket_types::find_by_id(&mut *tx, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket type not found".to_string()))?;

    match db::ticket_types::delete(&mut *tx, id).await.map_err(AppError::from) {
        Ok(_) => {}
        Err(e) if e.is_foreign_key_violation() => {
            return Err(AppError::Conflict(
                "Ticket type has tickets and cannot be deleted".to_string(),
            ));
        }
        Err(e) => return Err(e),
    }

    db::audit::log(
        &mut *tx,
        "delete",
        "ticket_type",
        id,
        Some(user.user_id),
        Some(&json!({ "name": ticket_type.name })),
    )
    .await?;
    tx.commit().await?;

    RpcOutput::data(json!({ "success": true }))
}
