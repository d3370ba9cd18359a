use serde::{Deserialize, Serialize};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use super::OfflineStore;

// Set to true to log every connectivity signal
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectivityState {
    Online,
    Offline,
}

impl ConnectivityState {
    pub fn is_online(self) -> bool {
        matches!(self, ConnectivityState::Online)
    }
}

impl From<bool> for ConnectivityState {
    fn from(online: bool) -> Self {
        if online {
            ConnectivityState::Online
        } else {
            ConnectivityState::Offline
        }
    }
}

/// Feeds platform online/offline signals into the store until the signal
/// source closes or `cancel` fires.
pub fn spawn_connectivity_monitor(
    store: OfflineStore,
    mut signals: mpsc::Receiver<ConnectivityState>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                signal = signals.recv() => {
                    let Some(state) = signal else {
                        log_info!("connectivity signal source closed");
                        break;
                    };
                    log_debug!("connectivity signal: {state:?}");
                    store.set_connectivity(state).await;
                }
                _ = cancel.cancelled() => {
                    log_info!("connectivity monitor shutting down");
                    break;
                }
            }
        }
    })
}
