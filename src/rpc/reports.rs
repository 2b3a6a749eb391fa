use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{parse_input, RpcContext, RpcOutput};
use crate::db;
use crate::error::AppError;
use crate::models::TicketListingView;
use crate::reports::SalesStats;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalesInput {
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StatsInput {
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

pub fn check_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(AppError::BadRequest(
                "startDate must not be after endDate".to_string(),
            ));
        }
    }
    Ok(())
}

pub async fn sales(ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    ctx.user()?;
    let input: SalesInput = parse_input(input)?;
    check_range(Some(input.start_date), Some(input.end_date))?;

    let tickets = db::tickets::list_created_between(
        ctx.pool(),
        Some(input.start_date),
        Some(input.end_date),
    )
    .await?;

    RpcOutput::data(
        tickets
            .into_iter()
            .map(TicketListingView::from)
            .collect::<Vec<_>>(),
    )
}

pub async fn stats(ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    ctx.user()?;
    let input: Option<StatsInput> = parse_input(input)?;
    let input = input.unwrap_or_default();
    check_range(input.start_date, input.end_date)?;

    let tickets =
        db::tickets::list_created_between(ctx.pool(), input.start_date, input.end_date).await?;
    RpcOutput::data(SalesStats::tally(&tickets).view())
}
