use sqlx::PgPool;

use crate::models::TicketType;

pub async fn list(pool: &PgPool) -> Result<Vec<TicketType>, sqlx::Error> {
    sqlx::query_as::<_, TicketType>("SELECT * FROM ticket_types ORDER BY id ASC")
        .fetch_all(pool)
        .await
}

pub async fn find_by_id<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    id: i32,
) -> Result<Option<TicketType>, sqlx::Error> {
    sqlx::query_as::<_, TicketType>("SELECT * FROM ticket_types WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    name: &str,
    description: Option<&str>,
    price_cents: i32,
) -> Result<TicketType, sqlx::Error> {
    sqlx::query_as::<_, TicketType>(
        "INSERT INTO ticket_types (name, description, price) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(name)
    .bind(description)
    .bind(price_cents)
    .fetch_one(executor)
    .await
}

/// Returns the number of deleted rows. Fails with a foreign-key violation
/// while tickets still reference the type.
pub async fn delete<'e, E: sqlx::PgExecutor<'e>>(executor: E, id: i32) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM ticket_types WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}
