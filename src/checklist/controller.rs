use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    capture::PhotoLog,
    db::PhotoEvidence,
    narration::{NarrationSequence, NarrationService},
    offline::{OfflineStore, INSPECTION_COMPLETED_KEY, INSPECTION_CURRENT_KEY},
};

use super::state::{
    CheckStatus, ChecklistState, Inspection, InspectionCheck, InspectionOutcome,
};

/// Written once per finished inspection and queued for the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRecord {
    pub inspection_id: String,
    pub outcome: InspectionOutcome,
    pub completed_at: DateTime<Utc>,
    pub failed_checks: Vec<String>,
    pub inspection: Inspection,
}

#[derive(Clone)]
pub struct ChecklistEngine {
    state: Arc<Mutex<ChecklistState>>,
    guide: Arc<Mutex<Option<NarrationSequence>>>,
    store: OfflineStore,
    narration: NarrationService,
    photos: PhotoLog,
    guide_interval: Duration,
}

impl ChecklistEngine {
    pub fn new(
        inspection: Inspection,
        store: OfflineStore,
        narration: NarrationService,
        photos: PhotoLog,
        guide_interval: Duration,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ChecklistState::new(inspection))),
            guide: Arc::new(Mutex::new(None)),
            store,
            narration,
            photos,
            guide_interval,
        }
    }

    pub async fn snapshot(&self) -> ChecklistState {
        self.state.lock().await.clone()
    }

    pub async fn progress(&self) -> f64 {
        self.state.lock().await.inspection.progress()
    }

    /// Replaces the in-memory inspection with the last saved one, if any.
    pub async fn restore(&self) -> bool {
        let Some(payload) = self.store.load(INSPECTION_CURRENT_KEY).await else {
            return false;
        };

        match serde_json::from_value::<ChecklistState>(payload) {
            Ok(mut restored) => {
                restored.clamp_pointer();
                info!(
                    "Restored inspection {} at {}%",
                    restored.inspection.id,
                    restored.inspection.progress_percent()
                );
                *self.state.lock().await = restored;
                true
            }
            Err(err) => {
                warn!("Ignoring unreadable saved inspection: {err}");
                false
            }
        }
    }

    pub async fn record_result(&self, check_id: &str, status: CheckStatus) -> Result<InspectionCheck> {
        let mut state = self.state.lock().await;
        let check = state
            .inspection
            .record_result(check_id, status, Utc::now())?
            .clone();
        self.persist(&state).await;
        drop(state);

        let verdict = if status == CheckStatus::Failed {
            "failed"
        } else {
            "passed"
        };
        self.narration.speak(&format!("{} {verdict}", check.prompt));
        Ok(check)
    }

    pub async fn add_note(&self, check_id: &str, note: &str) -> Result<InspectionCheck> {
        let mut state = self.state.lock().await;
        let check = state.inspection.add_note(check_id, note)?.clone();
        self.persist(&state).await;
        Ok(check)
    }

    /// Reopens a completed or failed check for re-inspection.
    pub async fn reset_check(&self, check_id: &str) -> Result<InspectionCheck> {
        let mut state = self.state.lock().await;
        let check = state.inspection.reset(check_id)?.clone();
        self.persist(&state).await;
        drop(state);

        self.narration.speak(&format!("{} reset", check.prompt));
        Ok(check)
    }

    pub async fn attach_photo(&self, check_id: &str, bytes: Vec<u8>) -> Result<PhotoEvidence> {
        {
            let state = self.state.lock().await;
            if state.inspection.check(check_id).is_none() {
                bail!("unknown check '{check_id}'");
            }
        }
        self.photos.attach(check_id, bytes).await
    }

    /// Moves to the next section and announces it. Returns the section title.
    pub async fn advance_section(&self) -> Option<String> {
        self.move_section(ChecklistState::advance).await
    }

    pub async fn retreat_section(&self) -> Option<String> {
        self.move_section(ChecklistState::retreat).await
    }

    /// Reads the current section's prompts one by one at the configured interval.
    /// Returns how many prompts were scheduled.
    pub async fn voice_guide(&self) -> usize {
        let prompts: Vec<String> = {
            let state = self.state.lock().await;
            match state.current() {
                Some(section) => section.checks.iter().map(|check| check.prompt.clone()).collect(),
                None => return 0,
            }
        };

        let mut guide = self.guide.lock().await;
        if let Some(previous) = guide.take() {
            previous.cancel();
        }

        match self.narration.narrate_sequence(prompts, self.guide_interval) {
            Some(sequence) => {
                let scheduled = sequence.len();
                *guide = Some(sequence);
                scheduled
            }
            None => 0,
        }
    }

    pub async fn stop_guide(&self) {
        if let Some(sequence) = self.guide.lock().await.take() {
            sequence.cancel();
        }
    }

    pub async fn is_guiding(&self) -> bool {
        self.guide
            .lock()
            .await
            .as_ref()
            .map(|sequence| !sequence.is_cancelled() && !sequence.is_finished())
            .unwrap_or(false)
    }

    /// Finalizes the inspection. Every check must be completed or failed first,
    /// and an inspection is finalized at most once.
    pub async fn complete_inspection(&self) -> Result<CompletionRecord> {
        self.stop_guide().await;

        let mut state = self.state.lock().await;
        let completed_at = Utc::now();
        let outcome = state.mark_completed(completed_at)?;

        let inspection = &state.inspection;
        let record = CompletionRecord {
            inspection_id: inspection.id.clone(),
            outcome,
            completed_at,
            failed_checks: inspection
                .checks()
                .filter(|check| check.status == CheckStatus::Failed)
                .map(|check| check.id.clone())
                .collect(),
            inspection: inspection.clone(),
        };
        self.persist(&state).await;
        drop(state);

        let payload = serde_json::to_value(&record).context("failed to serialize completion record")?;
        self.store.save(INSPECTION_COMPLETED_KEY, payload.clone()).await;
        self.store.enqueue(INSPECTION_COMPLETED_KEY, payload).await;

        info!(
            "Inspection {} {} with {} failed check(s)",
            record.inspection_id,
            outcome.as_str(),
            record.failed_checks.len()
        );

        let announcement = match outcome {
            InspectionOutcome::Passed => "Inspection complete. All checks passed".to_string(),
            InspectionOutcome::Failed => format!(
                "Inspection complete. {} checks failed",
                record.failed_checks.len()
            ),
        };
        self.narration.speak(&announcement);

        Ok(record)
    }

    async fn move_section(&self, step: fn(&mut ChecklistState) -> bool) -> Option<String> {
        self.stop_guide().await;

        let title = {
            let mut state = self.state.lock().await;
            step(&mut state);
            let title = state.current().map(|section| section.title.clone());
            self.persist(&state).await;
            title
        }?;

        self.narration.speak(&title);
        Some(title)
    }

    async fn persist(&self, state: &ChecklistState) {
        match serde_json::to_value(state) {
            Ok(payload) => {
                self.store.save(INSPECTION_CURRENT_KEY, payload).await;
            }
            Err(err) => warn!("Failed to serialize inspection: {err}"),
        }
    }
}
