use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use log::info;
use tokio::{sync::Mutex, time};
use tokio_util::sync::CancellationToken;

use crate::narration::NarrationService;

use super::state::{AlertBoard, AlertLevel, SafetyAlert};

/// Safety alerts read out by urgency. Each alert is auto-announced at most once.
#[derive(Clone)]
pub struct AlertMonitor {
    board: Arc<Mutex<AlertBoard>>,
    narration: NarrationService,
    announce_delay: Duration,
    next_id: Arc<AtomicU32>,
    cancel_token: CancellationToken,
}

impl AlertMonitor {
    pub fn new(narration: NarrationService, announce_delay: Duration) -> Self {
        Self {
            board: Arc::new(Mutex::new(AlertBoard::new())),
            narration,
            announce_delay,
            next_id: Arc::new(AtomicU32::new(0)),
            cancel_token: CancellationToken::new(),
        }
    }

    pub async fn alerts(&self) -> Vec<SafetyAlert> {
        self.board.lock().await.sorted()
    }

    pub async fn active_count(&self) -> usize {
        self.board.lock().await.len()
    }

    /// Most urgent alert not yet read out.
    pub async fn priority_alert(&self) -> Option<SafetyAlert> {
        self.board.lock().await.priority_alert()
    }

    /// Adds an alert and schedules the most urgent unheard one to be read
    /// after the announce delay. Must be called inside a tokio runtime.
    pub async fn raise(&self, level: AlertLevel, message: &str, priority: u8) -> SafetyAlert {
        let alert = SafetyAlert {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            level,
            message: message.trim().to_string(),
            priority,
            raised_at: Utc::now(),
        };
        self.board.lock().await.raise(alert.clone());
        info!(
            "Alert {} raised ({}, P{}): {}",
            alert.id,
            level.as_str(),
            priority,
            alert.message
        );

        let monitor = self.clone();
        let token = self.cancel_token.clone();
        let delay = self.announce_delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(delay) => {
                    monitor.announce_next().await;
                }
                _ = token.cancelled() => {}
            }
        });

        alert
    }

    /// Reads the most urgent alert nobody has heard yet, if any.
    pub async fn announce_next(&self) -> Option<SafetyAlert> {
        let alert = {
            let mut board = self.board.lock().await;
            let alert = board.priority_alert()?;
            board.mark_spoken(alert.id);
            alert
        };
        self.narration.speak(&alert.message);
        Some(alert)
    }

    /// Reads one alert on request, heard or not.
    pub async fn speak_alert(&self, id: u32) -> Result<SafetyAlert> {
        let alert = {
            let mut board = self.board.lock().await;
            let alert = board
                .get(id)
                .cloned()
                .ok_or_else(|| anyhow!("no active alert {id}"))?;
            board.mark_spoken(id);
            alert
        };
        self.narration.speak(&alert.message);
        Ok(alert)
    }

    /// Reads every active alert in one utterance and marks them all heard.
    pub async fn speak_all(&self) -> String {
        let summary = {
            let mut board = self.board.lock().await;
            board.mark_all_spoken();
            board.summary()
        };
        self.narration.speak(&summary);
        summary
    }

    pub async fn dismiss(&self, id: u32) -> Result<SafetyAlert> {
        let alert = self
            .board
            .lock()
            .await
            .dismiss(id)
            .ok_or_else(|| anyhow!("no active alert {id}"))?;
        info!("Alert {id} dismissed");
        Ok(alert)
    }

    /// Drops announcements that are still waiting on their delay.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

/// Machine alerts shown on the operator dashboard at the start of a shift.
pub fn standard_alerts() -> Vec<(AlertLevel, &'static str, u8)> {
    vec![
        (AlertLevel::Danger, "Engine temperature high", 3),
        (AlertLevel::Warning, "Hydraulic fluid low", 2),
        (AlertLevel::Warning, "Scheduled maintenance due", 1),
    ]
}
