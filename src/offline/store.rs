use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::OfflineError;
use crate::models::PaymentMethod;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub ticket_type_id: i32,
    pub quantity: u32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfflineSale {
    pub id: i64,
    pub client_key: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub items: Json<Vec<CartItem>>,
    pub payment_method: String,
    pub synced: bool,
    pub sync_attempts: i64,
    pub last_error: Option<String>,
}

impl OfflineSale {
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }

    pub fn ticket_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }
}

/// Terminal-local store of sales not yet acknowledged by the server.
#[derive(Debug, Clone)]
pub struct OfflineStore {
    pool: SqlitePool,
}

impl OfflineStore {
    /// Open (creating if needed) the queue at `url`, e.g.
    /// `sqlite://portaria-offline.db` or `sqlite::memory:`.
    pub async fn open(url: &str) -> Result<Self, OfflineError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // One long-lived connection: the queue is single-writer, and an
        // in-memory database lives only as long as its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations/offline")
            .run(&pool)
            .await
            .map_err(sqlx::Error::from)?;

        Ok(Self { pool })
    }

    pub async fn save_sale(
        &self,
        items: &[CartItem],
        payment_method: PaymentMethod,
    ) -> Result<i64, OfflineError> {
        self.save_sale_at(items, payment_method, Utc::now()).await
    }

    pub async fn save_sale_at(
        &self,
        items: &[CartItem],
        payment_method: PaymentMethod,
        at: DateTime<Utc>,
    ) -> Result<i64, OfflineError> {
        if items.is_empty() {
            return Err(OfflineError::InvalidSale("cart is empty".to_string()));
        }
        if let Some(item) = items.iter().find(|i| i.quantity == 0 || i.ticket_type_id <= 0) {
            return Err(OfflineError::InvalidSale(format!(
                "bad cart line for ticket type {}",
                item.ticket_type_id
            )));
        }

        let result = sqlx::query(
            "INSERT INTO offline_sales (client_key, timestamp, items, payment_method)
             VALUES (?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(at.timestamp_millis())
        .bind(Json(items))
        .bind(payment_method.as_str())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        tracing::info!(sale_id = id, "Sale saved offline");
        Ok(id)
    }

    pub async fn get(&self, id: i64) -> Result<Option<OfflineSale>, OfflineError> {
        let sale = sqlx::query_as::<_, OfflineSale>("SELECT * FROM offline_sales WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    /// Pending sales, oldest first.
    pub async fn unsynced(&self) -> Result<Vec<OfflineSale>, OfflineError> {
        let sales = sqlx::query_as::<_, OfflineSale>(
            "SELECT * FROM offline_sales WHERE synced = 0 ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    /// Pending sales queued after `after_id`, oldest first.
    pub async fn unsynced_after(&self, after_id: i64) -> Result<Vec<OfflineSale>, OfflineError> {
        let sales = sqlx::query_as::<_, OfflineSale>(
            "SELECT * FROM offline_sales WHERE synced = 0 AND id > ? ORDER BY id ASC",
        )
        .bind(after_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    /// Highest sale id ever queued, 0 for an empty queue.
    pub async fn latest_id(&self) -> Result<i64, OfflineError> {
        let (id,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(id), 0) FROM offline_sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn pending_count(&self) -> Result<i64, OfflineError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM offline_sales WHERE synced = 0")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    pub async fn mark_synced(&self, id: i64) -> Result<(), OfflineError> {
        sqlx::query("UPDATE offline_sales SET synced = 1, last_error = NULL WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn record_attempt(&self, id: i64, error: &str) -> Result<(), OfflineError> {
        sqlx::query(
            "UPDATE offline_sales SET sync_attempts = sync_attempts + 1, last_error = ? WHERE id = ?",
        )
        .bind(error)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete synced sales recorded before `now - retention`.
    pub async fn clean_old_synced(&self, retention: Duration) -> Result<u64, OfflineError> {
        let cutoff = (Utc::now() - retention).timestamp_millis();
        let result = sqlx::query("DELETE FROM offline_sales WHERE synced = 1 AND timestamp < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
