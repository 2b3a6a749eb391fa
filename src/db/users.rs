use sqlx::PgPool;

use crate::models::user::{UpsertUser, ROLE_USER};
use crate::models::User;

/// Insert the user on first login, otherwise refresh the provided fields and
/// bump `last_signed_in`.
pub async fn upsert(pool: &PgPool, user: &UpsertUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (open_id, name, email, login_method, role, last_signed_in)
         VALUES ($1, $2, $3, $4, COALESCE($5, $6), now())
         ON CONFLICT (open_id) DO UPDATE SET
             name = COALESCE($2, users.name),
             email = COALESCE($3, users.email),
             login_method = COALESCE($4, users.login_method),
             role = COALESCE($5, users.role),
             updated_at = now(),
             last_signed_in = now()
         RETURNING *",
    )
    .bind(user.open_id)
    .bind(user.name)
    .bind(user.email)
    .bind(user.login_method)
    .bind(user.role)
    .bind(ROLE_USER)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}
