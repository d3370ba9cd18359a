use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    capabilities::Capability,
    narration::NarrationService,
    navigation::{Geolocation, NavigationSession, NavigationUpdate},
    offline::{OfflineStore, JOBS_CURRENT_KEY, JOB_UPDATES_KEY},
};

use super::state::{Job, JobBoard, JobCounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobAction {
    Start,
    Complete,
}

/// Status change queued for the dispatch backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    pub job_id: u32,
    pub action: JobAction,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone)]
pub struct JobEngine {
    board: Arc<Mutex<JobBoard>>,
    navigation: Arc<Mutex<Option<NavigationSession>>>,
    store: OfflineStore,
    narration: NarrationService,
    arrival_radius_m: f64,
}

impl JobEngine {
    pub fn new(
        board: JobBoard,
        store: OfflineStore,
        narration: NarrationService,
        arrival_radius_m: f64,
    ) -> Self {
        Self {
            board: Arc::new(Mutex::new(board)),
            navigation: Arc::new(Mutex::new(None)),
            store,
            narration,
            arrival_radius_m,
        }
    }

    pub async fn jobs(&self) -> Vec<Job> {
        self.board.lock().await.jobs().to_vec()
    }

    pub async fn counts(&self) -> JobCounts {
        self.board.lock().await.counts()
    }

    pub async fn high_priority_count(&self) -> usize {
        self.board.lock().await.high_priority_count()
    }

    /// Replaces the board with the last saved snapshot, if any.
    pub async fn restore(&self) -> bool {
        let Some(payload) = self.store.load(JOBS_CURRENT_KEY).await else {
            return false;
        };

        match serde_json::from_value::<JobBoard>(payload) {
            Ok(restored) => {
                info!("Restored {} job(s)", restored.jobs().len());
                *self.board.lock().await = restored;
                true
            }
            Err(err) => {
                warn!("Ignoring unreadable saved jobs: {err}");
                false
            }
        }
    }

    pub async fn start_job(&self, id: u32) -> Result<Job> {
        let mut board = self.board.lock().await;
        let job = board.start(id)?.clone();
        self.record(&board, id, JobAction::Start).await;
        drop(board);

        self.narration.speak(&format!("Started job: {}", job.title));
        Ok(job)
    }

    pub async fn complete_job(&self, id: u32) -> Result<Job> {
        let mut board = self.board.lock().await;
        let job = board.complete(id)?.clone();
        self.record(&board, id, JobAction::Complete).await;
        drop(board);

        self.narration.speak(&format!("Completed job: {}", job.title));
        Ok(job)
    }

    /// Reads a job's details aloud.
    pub async fn select_job(&self, id: u32) -> Result<Job> {
        let job = self.find(id).await?;
        self.narration.speak(&job.details_announcement());
        Ok(job)
    }

    /// Starts guidance to the job's site, ending any navigation already running.
    pub async fn focus_for_navigation(
        &self,
        id: u32,
        geolocation: &Capability<dyn Geolocation>,
    ) -> Result<Job> {
        let job = self.find(id).await?;

        let mut navigation = self.navigation.lock().await;
        if let Some(previous) = navigation.take() {
            previous.close().await?;
        }

        self.narration
            .speak(&format!("Starting navigation to {}", job.title));
        let session = NavigationSession::open(
            geolocation,
            job.coordinates,
            &job.title,
            self.narration.clone(),
            self.arrival_radius_m,
        )?;
        *navigation = Some(session);

        Ok(job)
    }

    pub async fn navigation_update(&self) -> Option<NavigationUpdate> {
        self.navigation
            .lock()
            .await
            .as_ref()
            .map(NavigationSession::current)
    }

    pub async fn read_navigation_instructions(&self) -> Option<u64> {
        self.navigation
            .lock()
            .await
            .as_ref()
            .and_then(NavigationSession::read_instructions)
    }

    pub async fn end_navigation(&self) -> Result<()> {
        match self.navigation.lock().await.take() {
            Some(session) => session.close().await,
            None => Ok(()),
        }
    }

    /// Narrates counts by status and the next high-priority job.
    pub async fn summarize(&self) -> String {
        let summary = self.board.lock().await.briefing_summary();
        self.narration.speak(&summary);
        summary
    }

    async fn find(&self, id: u32) -> Result<Job> {
        self.board
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown job {id}"))
    }

    async fn record(&self, board: &JobBoard, job_id: u32, action: JobAction) {
        let update = JobUpdate {
            job_id,
            action,
            timestamp: Utc::now(),
        };

        match serde_json::to_value(&update).context("failed to serialize job update") {
            Ok(payload) => {
                self.store.enqueue(JOB_UPDATES_KEY, payload).await;
            }
            Err(err) => warn!("{err:?}"),
        }

        match serde_json::to_value(board) {
            Ok(snapshot) => {
                self.store.save(JOBS_CURRENT_KEY, snapshot).await;
            }
            Err(err) => warn!("Failed to serialize job board: {err}"),
        }
    }
}
