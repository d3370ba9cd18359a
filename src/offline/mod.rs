//! Connectivity-aware local persistence.
//!
//! Snapshots are saved under logical keys (latest write wins). Updates the
//! backend must receive go through the outbox and are only cleared once the
//! transport acknowledges them, giving at-least-once delivery.
//!
//! Storage failures never reach callers: `save` reports `false`, `load`
//! reports absence, and `sync` describes the failure in its outcome.
//!
//! A `save` and a concurrent `sync` touching the same key are not ordered
//! against each other; the database worker only serializes single statements.

pub mod connectivity;
pub mod transport;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{watch, Mutex};

use crate::db::{Database, OutboxEntry};

pub use connectivity::{spawn_connectivity_monitor, ConnectivityState};
pub use transport::{HttpTransport, SyncTransport, UnconfiguredTransport};

pub const INSPECTION_CURRENT_KEY: &str = "inspection_current";
pub const INSPECTION_COMPLETED_KEY: &str = "inspection_completed";
pub const JOB_UPDATES_KEY: &str = "jobUpdates";
pub const JOBS_CURRENT_KEY: &str = "jobs_current";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum SyncOutcome {
    /// Offline: nothing was sent.
    Offline,
    NothingPending,
    Delivered {
        delivered: usize,
        unacknowledged: usize,
    },
    Failed {
        attempted: usize,
        error: String,
    },
}

struct StoreInner {
    db: Database,
    transport: Arc<dyn SyncTransport>,
    connectivity: watch::Sender<ConnectivityState>,
    batch_size: usize,
    sync_gate: Mutex<()>,
}

#[derive(Clone)]
pub struct OfflineStore {
    inner: Arc<StoreInner>,
}

impl OfflineStore {
    pub fn new(
        db: Database,
        transport: Arc<dyn SyncTransport>,
        initial: ConnectivityState,
        batch_size: usize,
    ) -> Self {
        let (connectivity, _) = watch::channel(initial);
        Self {
            inner: Arc::new(StoreInner {
                db,
                transport,
                connectivity,
                batch_size: batch_size.max(1),
                sync_gate: Mutex::new(()),
            }),
        }
    }

    pub fn database(&self) -> &Database {
        &self.inner.db
    }

    pub fn connectivity(&self) -> ConnectivityState {
        *self.inner.connectivity.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.connectivity().is_online()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.inner.connectivity.subscribe()
    }

    /// Applies a platform connectivity signal. Only an Offline→Online
    /// transition syncs, and it syncs exactly once.
    pub async fn set_connectivity(&self, state: ConnectivityState) -> Option<SyncOutcome> {
        let previous = self.inner.connectivity.send_replace(state);
        if previous == state {
            return None;
        }

        info!("Connectivity changed: {previous:?} -> {state:?}");
        if state.is_online() {
            Some(self.sync().await)
        } else {
            None
        }
    }

    /// Best-effort write of `payload` under `key`; returns whether it was persisted.
    pub async fn save(&self, key: &str, payload: Value) -> bool {
        match self.inner.db.upsert_record(key, &payload, Utc::now()).await {
            Ok(()) => true,
            Err(err) => {
                error!("Failed to save offline data under {key}: {err:?}");
                false
            }
        }
    }

    /// Last payload saved under `key`; `None` if absent or unreadable.
    pub async fn load(&self, key: &str) -> Option<Value> {
        match self.inner.db.get_record(key).await {
            Ok(record) => record.map(|record| record.payload),
            Err(err) => {
                warn!("Failed to load offline data under {key}: {err:?}");
                None
            }
        }
    }

    /// Queues `payload` for delivery; returns the outbox entry id when persisted.
    pub async fn enqueue(&self, key: &str, payload: Value) -> Option<String> {
        let entry = OutboxEntry::pending(key, payload, Utc::now());
        match self.inner.db.insert_outbox_entry(&entry).await {
            Ok(()) => Some(entry.id),
            Err(err) => {
                error!("Failed to queue update under {key}: {err:?}");
                None
            }
        }
    }

    pub async fn pending_count(&self) -> u64 {
        match self.inner.db.count_pending_outbox().await {
            Ok(count) => count,
            Err(err) => {
                warn!("Failed to count pending updates: {err:?}");
                0
            }
        }
    }

    pub async fn prune_delivered(&self, delivered_before: DateTime<Utc>) -> usize {
        match self.inner.db.prune_delivered_outbox(delivered_before).await {
            Ok(removed) => removed,
            Err(err) => {
                warn!("Failed to prune delivered updates: {err:?}");
                0
            }
        }
    }

    /// Forwards pending outbox entries (oldest first, one batch, one transport
    /// call). A no-op while offline.
    pub async fn sync(&self) -> SyncOutcome {
        if !self.is_online() {
            return SyncOutcome::Offline;
        }

        let _gate = self.inner.sync_gate.lock().await;

        let pending = match self
            .inner
            .db
            .pending_outbox_entries(self.inner.batch_size)
            .await
        {
            Ok(pending) => pending,
            Err(err) => {
                error!("Failed to read pending updates: {err:?}");
                return SyncOutcome::Failed {
                    attempted: 0,
                    error: err.to_string(),
                };
            }
        };

        if pending.is_empty() {
            return SyncOutcome::NothingPending;
        }

        let ids: Vec<String> = pending.iter().map(|entry| entry.id.clone()).collect();
        info!("Syncing {} pending update(s)", ids.len());

        match self.inner.transport.deliver(&pending).await {
            Ok(acknowledged) => {
                let confirmed: Vec<String> = acknowledged
                    .into_iter()
                    .filter(|id| ids.contains(id))
                    .collect();
                let unconfirmed: Vec<String> = ids
                    .iter()
                    .filter(|id| !confirmed.contains(id))
                    .cloned()
                    .collect();

                let delivered = match self
                    .inner
                    .db
                    .mark_outbox_delivered(&confirmed, Utc::now())
                    .await
                {
                    Ok(updated) => updated,
                    Err(err) => {
                        // Entries stay pending and will be resent.
                        error!("Failed to record acknowledgements: {err:?}");
                        0
                    }
                };

                if !unconfirmed.is_empty() {
                    warn!("{} update(s) were not acknowledged", unconfirmed.len());
                    if let Err(err) = self
                        .inner
                        .db
                        .record_outbox_failure(&unconfirmed, "not acknowledged")
                        .await
                    {
                        error!("Failed to record unacknowledged updates: {err:?}");
                    }
                }

                SyncOutcome::Delivered {
                    delivered,
                    unacknowledged: ids.len() - delivered,
                }
            }
            Err(err) => {
                warn!("Sync failed, {} update(s) stay queued: {err:?}", ids.len());
                if let Err(record_err) = self
                    .inner
                    .db
                    .record_outbox_failure(&ids, &err.to_string())
                    .await
                {
                    error!("Failed to record sync failure: {record_err:?}");
                }
                SyncOutcome::Failed {
                    attempted: ids.len(),
                    error: err.to_string(),
                }
            }
        }
    }
}
