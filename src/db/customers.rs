use crate::models::Customer;

pub async fn create<'e, E: sqlx::PgExecutor<'e>>(
    executor: E,
    name: &str,
    email: Option<&str>,
    phone: Option<&str>,
) -> Result<Customer, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        "INSERT INTO customers (name, email, phone) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(name)
    .bind(email)
    .bind(phone)
    .fetch_one(executor)
    .await
}
