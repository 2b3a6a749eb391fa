use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub open_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub login_method: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_signed_in: DateTime<Utc>,
}

/// Fields written on every login; `None` leaves the stored value untouched.
#[derive(Debug, Clone)]
pub struct UpsertUser<'a> {
    pub open_id: &'a str,
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub login_method: Option<&'a str>,
    pub role: Option<&'a str>,
}

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
