use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{watch, Mutex, Notify};

use portaria::models::PaymentMethod;
use portaria::offline::sync::OFFLINE_CUSTOMER_NAME;
use portaria::offline::{CartItem, OfflineError, OfflineStore, Reconciler, TicketSubmitter};
use portaria::rpc::tickets::CreateTicketInput;

/// In-process stand-in for the server: remembers idempotency keys the way
/// the real `tickets.create` does.
#[derive(Default)]
struct FakeServer {
    online: AtomicBool,
    created: Mutex<Vec<CreateTicketInput>>,
    keys: Mutex<HashSet<String>>,
    calls: AtomicUsize,
    /// Refuse every create, like a sale for a deleted ticket type.
    reject_all: AtomicBool,
    /// Fail the Nth call (1-based), once.
    fail_on_call: Mutex<Option<usize>>,
    /// When set, each create waits here before answering.
    gate: Option<Arc<Notify>>,
}

impl FakeServer {
    fn online() -> Self {
        let server = Self::default();
        server.online.store(true, Ordering::SeqCst);
        server
    }

    async fn created_count(&self) -> usize {
        self.created.lock().await.len()
    }
}

struct FakeSubmitter(Arc<FakeServer>);

#[async_trait]
impl TicketSubmitter for FakeSubmitter {
    async fn create_ticket(&self, input: &CreateTicketInput) -> Result<(), OfflineError> {
        let server = &self.0;
        if let Some(gate) = &server.gate {
            gate.notified().await;
        }
        if !server.online.load(Ordering::SeqCst) {
            return Err(OfflineError::Transport("connection refused".to_string()));
        }

        let call = server.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if server.reject_all.load(Ordering::SeqCst) {
            return Err(OfflineError::Rejected("Ticket type not found".to_string()));
        }
        {
            let mut fail = server.fail_on_call.lock().await;
            if *fail == Some(call) {
                *fail = None;
                return Err(OfflineError::Transport("connection reset".to_string()));
            }
        }

        let key = input.idempotency_key.clone().unwrap_or_default();
        if server.keys.lock().await.insert(key) {
            server.created.lock().await.push(input.clone());
        }
        Ok(())
    }

    async fn is_reachable(&self) -> bool {
        self.0.online.load(Ordering::SeqCst)
    }
}

async fn store() -> OfflineStore {
    OfflineStore::open("sqlite::memory:").await.unwrap()
}

fn cart(items: &[(i32, u32)]) -> Vec<CartItem> {
    items
        .iter()
        .map(|&(ticket_type_id, quantity)| CartItem {
            ticket_type_id,
            quantity,
        })
        .collect()
}

// ── Store ───────────────────────────────────────────────────────

#[tokio::test]
async fn saved_sales_are_pending_in_order() {
    let store = store().await;

    let first = store.save_sale(&cart(&[(1, 2)]), PaymentMethod::Pix).await.unwrap();
    let second = store
        .save_sale(&cart(&[(2, 1), (1, 1)]), PaymentMethod::Dinheiro)
        .await
        .unwrap();

    assert_eq!(store.pending_count().await.unwrap(), 2);

    let pending = store.unsynced().await.unwrap();
    assert_eq!(pending.iter().map(|s| s.id).collect::<Vec<_>>(), vec![first, second]);
    assert_ne!(pending[0].client_key, pending[1].client_key);
    assert_eq!(pending[0].payment_method, "pix");
    assert_eq!(pending[1].ticket_count(), 2);
    assert_eq!(pending[0].sync_attempts, 0);
    assert!(!pending[0].synced);
    assert!(pending[0].recorded_at().is_some());

    store.mark_synced(first).await.unwrap();
    assert_eq!(store.pending_count().await.unwrap(), 1);

    store.record_attempt(second, "timeout").await.unwrap();
    store.record_attempt(second, "refused").await.unwrap();
    let sale = store.get(second).await.unwrap().unwrap();
    assert_eq!(sale.sync_attempts, 2);
    assert_eq!(sale.last_error.as_deref(), Some("refused"));
}

#[tokio::test]
async fn empty_or_zero_quantity_carts_are_rejected() {
    let store = store().await;
    assert!(matches!(
        store.save_sale(&[], PaymentMethod::Pix).await,
        Err(OfflineError::InvalidSale(_))
    ));
    assert!(matches!(
        store.save_sale(&cart(&[(1, 0)]), PaymentMethod::Pix).await,
        Err(OfflineError::InvalidSale(_))
    ));
    assert_eq!(store.pending_count().await.unwrap(), 0);
}

#[tokio::test]
async fn clean_old_synced_keeps_recent_and_pending() {
    let store = store().await;
    let old = Utc::now() - chrono::Duration::days(10);

    let old_synced = store
        .save_sale_at(&cart(&[(1, 1)]), PaymentMethod::Pix, old)
        .await
        .unwrap();
    let old_pending = store
        .save_sale_at(&cart(&[(1, 1)]), PaymentMethod::Pix, old)
        .await
        .unwrap();
    let recent_synced = store.save_sale(&cart(&[(1, 1)]), PaymentMethod::Pix).await.unwrap();

    store.mark_synced(old_synced).await.unwrap();
    store.mark_synced(recent_synced).await.unwrap();

    let removed = store.clean_old_synced(chrono::Duration::days(7)).await.unwrap();
    assert_eq!(removed, 1);
    assert!(store.get(old_synced).await.unwrap().is_none());
    assert!(store.get(old_pending).await.unwrap().is_some());
    assert!(store.get(recent_synced).await.unwrap().is_some());
}

// ── Reconciler ──────────────────────────────────────────────────

#[tokio::test]
async fn sync_expands_quantities_into_single_tickets() {
    let server = Arc::new(FakeServer::online());
    let store = store().await;
    store
        .save_sale(&cart(&[(1, 2), (3, 1)]), PaymentMethod::Cartao)
        .await
        .unwrap();

    let reconciler = Reconciler::new(store, FakeSubmitter(server.clone()));
    let report = reconciler.sync_pending().await.unwrap();

    assert_eq!(report.synced, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.tickets_created, 3);
    assert_eq!(reconciler.store().pending_count().await.unwrap(), 0);

    let created = server.created.lock().await;
    assert_eq!(created.len(), 3);
    assert!(created.iter().all(|t| t.customer_name == OFFLINE_CUSTOMER_NAME));
    assert!(created.iter().all(|t| t.payment_method == PaymentMethod::Cartao));
    assert_eq!(
        created.iter().map(|t| t.ticket_type_id).collect::<Vec<_>>(),
        vec![1, 1, 3]
    );
    let keys: Vec<&str> = created
        .iter()
        .map(|t| t.idempotency_key.as_deref().unwrap())
        .collect();
    assert!(keys[0].ends_with(":0:0"));
    assert!(keys[1].ends_with(":0:1"));
    assert!(keys[2].ends_with(":1:0"));
}

#[tokio::test]
async fn failure_records_attempt_and_moves_on() {
    let server = Arc::new(FakeServer::online());
    *server.fail_on_call.lock().await = Some(2);

    let store = store().await;
    let first = store.save_sale(&cart(&[(1, 2)]), PaymentMethod::Pix).await.unwrap();
    let second = store.save_sale(&cart(&[(2, 1)]), PaymentMethod::Pix).await.unwrap();

    let reconciler = Reconciler::new(store, FakeSubmitter(server.clone()));
    let report = reconciler.sync_pending().await.unwrap();
    assert_eq!(report.synced, 1);
    assert_eq!(report.failed, 1);

    let store = reconciler.store();
    let failed = store.get(first).await.unwrap().unwrap();
    assert!(!failed.synced);
    assert_eq!(failed.sync_attempts, 1);
    assert!(failed.last_error.unwrap().contains("connection reset"));
    assert!(store.get(second).await.unwrap().unwrap().synced);

    // The retry only creates the ticket that is still missing
    let report = reconciler.sync_pending().await.unwrap();
    assert_eq!(report.synced, 1);
    assert_eq!(store.pending_count().await.unwrap(), 0);
    assert_eq!(server.created_count().await, 3);
}

#[tokio::test]
async fn offline_server_leaves_sales_pending() {
    let server = Arc::new(FakeServer::default());
    let store = store().await;
    let id = store.save_sale(&cart(&[(1, 1)]), PaymentMethod::Pix).await.unwrap();

    let reconciler = Reconciler::new(store, FakeSubmitter(server.clone()));
    let report = reconciler.sync_pending().await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(reconciler.store().pending_count().await.unwrap(), 1);
    assert_eq!(
        reconciler.store().get(id).await.unwrap().unwrap().sync_attempts,
        1
    );

    server.online.store(true, Ordering::SeqCst);
    let report = reconciler.sync_pending().await.unwrap();
    assert_eq!(report.synced, 1);
    assert_eq!(server.created_count().await, 1);
}

#[tokio::test]
async fn concurrent_sync_returns_immediately() {
    let gate = Arc::new(Notify::new());
    let server = Arc::new(FakeServer {
        gate: Some(gate.clone()),
        ..FakeServer::online()
    });
    let store = store().await;
    store.save_sale(&cart(&[(1, 1)]), PaymentMethod::Pix).await.unwrap();

    let reconciler = Arc::new(Reconciler::new(store, FakeSubmitter(server.clone())));

    let running = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move { reconciler.sync_pending().await })
    };

    // Let the first pass reach the gated submit
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = reconciler.sync_pending().await.unwrap();
    assert!(second.skipped);

    gate.notify_one();
    let first = running.await.unwrap().unwrap();
    assert!(!first.skipped);
    assert_eq!(first.synced, 1);
    assert_eq!(server.created_count().await, 1);
}

#[tokio::test]
async fn watcher_syncs_when_connectivity_returns() {
    let server = Arc::new(FakeServer::default());
    let store = store().await;
    store.save_sale(&cart(&[(1, 2)]), PaymentMethod::Dinheiro).await.unwrap();

    let reconciler = Arc::new(Reconciler::new(store, FakeSubmitter(server.clone())));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let watcher = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move {
            reconciler
                .watch_connectivity(Duration::from_millis(20), shutdown_rx)
                .await;
        })
    };

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(reconciler.store().pending_count().await.unwrap(), 1);

    server.online.store(true, Ordering::SeqCst);

    let mut synced = false;
    for _ in 0..50 {
        if reconciler.store().pending_count().await.unwrap() == 0 {
            synced = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(synced, "sale was not synced after reconnecting");
    assert_eq!(server.created_count().await, 2);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), watcher)
        .await
        .expect("watcher did not stop")
        .unwrap();
}

#[tokio::test]
async fn watcher_retries_failed_sales_only_on_reconnect() {
    let server = Arc::new(FakeServer::online());
    server.reject_all.store(true, Ordering::SeqCst);
    let store = store().await;
    let rejected = store.save_sale(&cart(&[(9, 1)]), PaymentMethod::Pix).await.unwrap();

    let reconciler = Arc::new(Reconciler::new(store, FakeSubmitter(server.clone())));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let watcher = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move {
            reconciler
                .watch_connectivity(Duration::from_millis(10), shutdown_rx)
                .await;
        })
    };

    let attempts = |id| {
        let reconciler = reconciler.clone();
        async move {
            reconciler.store().get(id).await.unwrap().unwrap().sync_attempts
        }
    };

    // Twenty probes in one online period
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(attempts(rejected).await, 1);
    assert_eq!(server.calls.load(Ordering::SeqCst), 1);

    // A sale queued while online goes out without retrying the old one
    let fresh = reconciler
        .store()
        .save_sale(&cart(&[(9, 1)]), PaymentMethod::Pix)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(attempts(fresh).await, 1);
    assert_eq!(attempts(rejected).await, 1);

    // Reconnecting retries everything once more
    server.online.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(60)).await;
    server.online.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(attempts(rejected).await, 2);
    assert_eq!(attempts(fresh).await, 2);

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), watcher)
        .await
        .expect("watcher did not stop")
        .unwrap();
}
