use sqlx::PgPool;

/// Log an audit event outside of any transaction. Failures are logged and
/// swallowed; status changes write their entry transactionally instead.
pub async fn log_event(
    pool: &PgPool,
    user_id: Option<i32>,
    action: &str,
    entity_type: &str,
    entity_id: i32,
    details: Option<serde_json::Value>,
) {
    if let Err(e) = crate::db::audit::log(
        pool,
        action,
        entity_type,
        entity_id,
        user_id,
        details.as_ref(),
    )
    .await
    {
        tracing::error!("Failed to log audit event: {e}");
    }
}
