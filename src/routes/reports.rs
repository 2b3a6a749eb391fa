use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::reports::sales_csv;
use crate::rpc::reports::check_range;
use crate::state::SharedState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeParams {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

pub async fn export_csv(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Query(params): Query<RangeParams>,
) -> Result<impl IntoResponse, AppError> {
    check_range(params.start_date, params.end_date)?;

    let tickets =
        db::tickets::list_created_between(&state.pool, params.start_date, params.end_date).await?;
    let csv = sales_csv(&tickets).map_err(AppError::Internal)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"vendas.csv\""),
        ],
        csv,
    ))
}
