use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i32,
    pub action: String,
    pub entity_type: String,
    pub entity_id: i32,
    pub user_id: Option<i32>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
