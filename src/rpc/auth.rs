use serde_json::Value;

use super::{RpcContext, RpcOutput};
use crate::auth::session::clear_session_cookie;
use crate::db;
use crate::error::AppError;

/// The signed-in user, or `null` for anonymous callers.
pub async fn me(ctx: &RpcContext) -> Result<RpcOutput, AppError> {
    let Some(user) = &ctx.user else {
        return RpcOutput::data(Value::Null);
    };
    let user = db::users::find_by_id(ctx.pool(), user.user_id).await?;
    RpcOutput::data(user)
}

pub async fn logout(ctx: &RpcContext) -> Result<RpcOutput, AppError> {
    let jar = clear_session_cookie(ctx.state.config.secure_cookies);
    Ok(RpcOutput::data(serde_json::json!({ "success": true }))?.with_cookies(jar))
}
