use sqlx::PgPool;

use crate::models::AuditEntry;

pub async fn log<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    action: &str,
    entity_type: &str,
    entity_id: i32,
    user_id: Option<i32>,
    details: Option<&serde_json::Value>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO audit_log (action, entity_type, entity_id, user_id, details)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(action)
    .bind(entity_type)
    .bind(entity_id)
    .bind(user_id)
    .bind(details)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<AuditEntry>, sqlx::Error> {
    sqlx::query_as::<_, AuditEntry>(
        "SELECT * FROM audit_log ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn list_for_entity(
    pool: &PgPool,
    entity_type: &str,
    entity_id: i32,
    limit: i64,
    offset: i64,
) -> Result<Vec<AuditEntry>, sqlx::Error> {
    sqlx::query_as::<_, AuditEntry>(
        "SELECT * FROM audit_log WHERE entity_type = $1 AND entity_id = $2
         ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4",
    )
    .bind(entity_type)
    .bind(entity_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
