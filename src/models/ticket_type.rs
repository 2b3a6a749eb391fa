use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money;

/// A priced category of admission. `price` is stored in cents.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct TicketType {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketTypeView {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

impl From<TicketType> for TicketTypeView {
    fn from(t: TicketType) -> Self {
        Self {
            id: t.id,
            name: t.name,
            description: t.description,
            price: money::from_cents(t.price),
            created_at: t.created_at,
        }
    }
}
