pub mod alerts;
pub mod capabilities;
pub mod capture;
pub mod checklist;
pub mod console;
pub mod db;
pub mod jobs;
pub mod narration;
pub mod navigation;
pub mod offline;
pub mod settings;
pub mod utils;
pub mod voice;

use std::{path::Path, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use log::{info, warn};

use alerts::AlertMonitor;
use capabilities::Capability;
use capture::{Camera, PhotoLog};
use checklist::{pre_operation_inspection, ChecklistEngine};
use db::Database;
use jobs::{sample_board, JobEngine};
use narration::{NarrationService, SpeechSynthesizer, ViewTextSource};
use navigation::Geolocation;
use offline::{ConnectivityState, HttpTransport, OfflineStore, SyncTransport, UnconfiguredTransport};
use settings::{NarrationSettings, SettingsStore};
use voice::{SpeechRecognizer, VoiceControl};

const DEBUG_ENV: &str = "OPERATOR_ASSIST_DEBUG";

/// Device services handed in by the host. Anything left `Unavailable`
/// disables the features that depend on it.
#[derive(Default)]
pub struct Platform {
    pub synthesizer: Capability<dyn SpeechSynthesizer>,
    pub views: Capability<dyn ViewTextSource>,
    pub geolocation: Capability<dyn Geolocation>,
    pub camera: Capability<dyn Camera>,
    pub recognizer: Capability<dyn SpeechRecognizer>,
    /// Overrides the transport built from the sync settings.
    pub transport: Option<Arc<dyn SyncTransport>>,
}

pub struct OperatorAssistant {
    pub settings: SettingsStore,
    pub db: Database,
    pub narration: NarrationService,
    pub store: OfflineStore,
    pub photos: PhotoLog,
    pub checklist: ChecklistEngine,
    pub jobs: JobEngine,
    pub voice: VoiceControl,
    pub alerts: AlertMonitor,
    pub geolocation: Capability<dyn Geolocation>,
    pub camera: Capability<dyn Camera>,
}

impl OperatorAssistant {
    /// Opens (or creates) the local state under `data_dir` and rehydrates the
    /// last saved inspection and job board.
    pub async fn bootstrap(
        data_dir: &Path,
        platform: Platform,
        initial: ConnectivityState,
    ) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data dir {}", data_dir.display()))?;

        let settings = SettingsStore::new(data_dir.join("settings.json"))?;
        let db = Database::new(data_dir.join("operator-assist.sqlite3"))?;

        let narration = NarrationService::new(
            platform.synthesizer,
            platform.views,
            settings.narration(),
        );

        let transport = match platform.transport {
            Some(transport) => transport,
            None => build_transport(&settings),
        };
        let store = OfflineStore::new(db.clone(), transport, initial, settings.sync().batch_size);

        let photos = PhotoLog::new(
            db.clone(),
            narration.clone(),
            settings.capture().duplicate_threshold,
        );

        let checklist = ChecklistEngine::new(
            pre_operation_inspection(),
            store.clone(),
            narration.clone(),
            photos.clone(),
            settings.guide().interval(),
        );
        if !checklist.restore().await {
            info!("Starting a fresh pre-operation inspection");
        }

        let jobs = JobEngine::new(
            sample_board(),
            store.clone(),
            narration.clone(),
            settings.navigation().arrival_radius_m,
        );
        if !jobs.restore().await {
            info!("Loaded sample job board");
        }

        let voice = VoiceControl::new(platform.recognizer, narration.clone());
        let alerts = AlertMonitor::new(narration.clone(), settings.alerts().announce_delay());

        Ok(Self {
            settings,
            db,
            narration,
            store,
            photos,
            checklist,
            jobs,
            voice,
            alerts,
            geolocation: platform.geolocation,
            camera: platform.camera,
        })
    }

    /// Saves new voice defaults and applies them to the running narration.
    pub fn update_narration(&self, narration: NarrationSettings) -> Result<()> {
        self.settings.update_narration(narration.clone())?;
        self.narration.set_defaults(narration);
        info!("Narration defaults updated");
        Ok(())
    }

    /// Re-reads `settings.json`. Only the voice defaults apply live; the rest
    /// takes effect on the next start.
    pub fn reload_settings(&self) -> Result<()> {
        self.settings.reload()?;
        self.narration.set_defaults(self.settings.narration());
        Ok(())
    }

    /// One-paragraph shift status, as shown on the dashboard.
    pub async fn status_summary(&self) -> String {
        let counts = self.jobs.counts().await;
        format!(
            "Operator dashboard. Inspection {} percent complete. {} pending jobs, {} in progress, {} high priority. {} active alerts. {} updates waiting to sync.",
            self.checklist.progress().await.round(),
            counts.pending,
            counts.in_progress,
            self.jobs.high_priority_count().await,
            self.alerts.active_count().await,
            self.store.pending_count().await
        )
    }

    /// Speaks [`Self::status_summary`].
    pub async fn read_status(&self) -> Option<u64> {
        let summary = self.status_summary().await;
        self.narration.speak(&summary)
    }

    /// Silences narration and releases device watches.
    pub async fn shutdown(&self) -> Result<()> {
        self.alerts.shutdown();
        self.checklist.stop_guide().await;
        self.narration.stop();
        self.jobs.end_navigation().await
    }
}

fn build_transport(settings: &SettingsStore) -> Arc<dyn SyncTransport> {
    let sync = settings.sync();
    let Some(endpoint) = sync.endpoint.as_deref() else {
        info!("No sync endpoint configured; updates stay queued locally");
        return Arc::new(UnconfiguredTransport);
    };

    match HttpTransport::new(endpoint, Duration::from_secs(sync.timeout_secs)) {
        Ok(transport) => {
            info!("Syncing to {}", transport.sync_url());
            Arc::new(transport)
        }
        Err(err) => {
            warn!("Invalid sync endpoint {endpoint:?}: {err:?}");
            Arc::new(UnconfiguredTransport)
        }
    }
}

pub fn init_logging() {
    let debug_mode = std::env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    env_logger::Builder::from_default_env()
        .filter_level(if debug_mode {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();
}
