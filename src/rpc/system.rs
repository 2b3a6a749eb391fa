use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_input, RpcContext, RpcOutput};
use crate::error::AppError;

#[derive(Deserialize)]
struct HealthInput {
    timestamp: f64,
}

pub async fn health(_ctx: &RpcContext, input: Value) -> Result<RpcOutput, AppError> {
    let input: HealthInput = parse_input(input)?;
    if !input.timestamp.is_finite() || input.timestamp < 0.0 {
        return Err(AppError::BadRequest(
            "Invalid input: timestamp cannot be negative".to_string(),
        ));
    }
    RpcOutput::data(json!({ "ok": true }))
}

/// Which marketing sinks are configured, and whether their credentials work.
pub async fn marketing_status(ctx: &RpcContext) -> Result<RpcOutput, AppError> {
    ctx.admin()?;
    let report = ctx.state.marketing.status().await;
    RpcOutput::data(report)
}
