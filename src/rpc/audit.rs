use serde::Deserialize;
use serde_json::Value;

use super::{parse_input, RpcContext, RpcOutput};
use crate::db;
use crate::error::AppError;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ListInput {
    limit: Option<i64>,
    offset: Option<i64>,
    entity_type: Option<String>,
    entity_id: Option<i32>,
}

/// Newest entries first, optionally narrowed to one entity.
pub async fn list(ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    ctx.admin()?;
    let input: Option<ListInput> = parse_input(input)?;
    let input = input.unwrap_or_default();

    let limit = input.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = input.offset.unwrap_or(0).max(0);

    let entries = match (input.entity_type.as_deref(), input.entity_id) {
        (Some(entity_type), Some(entity_id)) => {
            db::audit::list_for_entity(ctx.pool(), entity_type, entity_id, limit, offset).await?
        }
        (None, None) => db::audit::list(ctx.pool(), limit, offset).await?,
        _ => {
            return Err(AppError::BadRequest(
                "entityType and entityId must be given together".to_string(),
            ));
        }
    };

    RpcOutput::data(entries)
}
