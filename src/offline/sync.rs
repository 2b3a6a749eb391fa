use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;

use super::{OfflineError, OfflineSale, OfflineStore, TicketSubmitter};
use crate::models::PaymentMethod;
use crate::rpc::tickets::CreateTicketInput;

pub const OFFLINE_CUSTOMER_NAME: &str = "Cliente (Venda Offline)";

/// How long synced sales stay in the local queue.
pub fn default_retention() -> chrono::Duration {
    chrono::Duration::days(7)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Another pass was already running; nothing was done.
    pub skipped: bool,
    pub synced: u64,
    pub failed: u64,
    pub tickets_created: u64,
    pub cleaned: u64,
}

/// Replays queued sales against the server, one at a time.
pub struct Reconciler<S> {
    store: OfflineStore,
    submitter: S,
    retention: chrono::Duration,
    syncing: AtomicBool,
}

struct SyncGuard<'a>(&'a AtomicBool);

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: TicketSubmitter> Reconciler<S> {
    pub fn new(store: OfflineStore, submitter: S) -> Self {
        Self {
            store,
            submitter,
            retention: default_retention(),
            syncing: AtomicBool::new(false),
        }
    }

    pub fn with_retention(mut self, retention: chrono::Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn store(&self) -> &OfflineStore {
        &self.store
    }

    /// Replay every unsynced sale.
    pub async fn sync_pending(&self) -> Result<SyncReport, OfflineError> {
        self.run_pass(None).await
    }

    /// Replay only the sales queued after `after_id`. Earlier failures wait
    /// for the next reconnect.
    pub async fn sync_queued_after(&self, after_id: i64) -> Result<SyncReport, OfflineError> {
        self.run_pass(Some(after_id)).await
    }

    async fn run_pass(&self, after_id: Option<i64>) -> Result<SyncReport, OfflineError> {
        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Sync already in progress");
            return Ok(SyncReport {
                skipped: true,
                ..SyncReport::default()
            });
        }
        let _guard = SyncGuard(&self.syncing);

        let pending = match after_id {
            Some(id) => self.store.unsynced_after(id).await?,
            None => self.store.unsynced().await?,
        };
        let mut report = SyncReport::default();

        if !pending.is_empty() {
            tracing::info!("Syncing {} offline sale(s)", pending.len());
        }

        for sale in &pending {
            match self.replay(sale).await {
                Ok(created) => {
                    self.store.mark_synced(sale.id).await?;
                    report.synced += 1;
                    report.tickets_created += created;
                    tracing::info!(sale_id = sale.id, tickets = created, "Offline sale synced");
                }
                Err(e) => {
                    tracing::warn!(sale_id = sale.id, "Offline sale sync failed: {e}");
                    self.store.record_attempt(sale.id, &e.to_string()).await?;
                    report.failed += 1;
                }
            }
        }

        report.cleaned = self.store.clean_old_synced(self.retention).await?;
        Ok(report)
    }

    /// Submit every ticket of a sale. Keys are derived from the sale so a
    /// retry after a partial failure only creates the missing tickets.
    async fn replay(&self, sale: &OfflineSale) -> Result<u64, OfflineError> {
        let payment_method = PaymentMethod::parse(&sale.payment_method).ok_or_else(|| {
            OfflineError::InvalidSale(format!("unknown payment method '{}'", sale.payment_method))
        })?;

        let mut created = 0;
        for (index, item) in sale.items.iter().enumerate() {
            for n in 0..item.quantity {
                let input = CreateTicketInput {
                    customer_name: OFFLINE_CUSTOMER_NAME.to_string(),
                    customer_email: None,
                    customer_phone: None,
                    ticket_type_id: item.ticket_type_id,
                    payment_method,
                    idempotency_key: Some(format!("{}:{index}:{n}", sale.client_key)),
                };
                self.submitter.create_ticket(&input).await?;
                created += 1;
            }
        }
        Ok(created)
    }

    /// Probe the server every `interval`. Every pending sale is replayed on
    /// each offline to online transition; while the server stays online only
    /// newly queued sales are sent. Returns once `shutdown` flips to true.
    pub async fn watch_connectivity(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut was_online = false;
        let mut seen_id = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let online = self.submitter.is_reachable().await;
            if online != was_online {
                tracing::info!(online, "Connectivity changed");
            }

            if online {
                match self.store.latest_id().await {
                    Ok(latest) => {
                        let result = if !was_online {
                            Some(self.sync_pending().await)
                        } else if latest > seen_id {
                            Some(self.sync_queued_after(seen_id).await)
                        } else {
                            None
                        };
                        match result {
                            Some(Ok(report)) if !report.skipped => seen_id = seen_id.max(latest),
                            Some(Err(e)) => tracing::error!("Offline sync failed: {e}"),
                            _ => {}
                        }
                    }
                    Err(e) => tracing::error!("Failed to read offline queue: {e}"),
                }
            }
            was_online = online;

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => {}
            }
        }

        tracing::debug!("Connectivity watcher stopped");
    }
}
